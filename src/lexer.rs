//! A module implementing lexical analysis (tokenization) of an input line.
//!
//! The grammar is deliberately small: tokens are separated by spaces, a line may hold
//! one double-quoted span (everything between the first and the last `"`), and an `=`
//! glued to a preceding word starts a new `=`-prefixed token. Quote characters are kept
//! in the tokens; consumers remove them with [`strip_quotes`].

use crate::error::ParseError;

struct LexingFSM {
    input: Vec<char>,
    pos: usize,
    /// Indices of the first and last `"` of the line, if there are at least two.
    quoted_span: Option<(usize, usize)>,
    /// Set after a separating space so that runs of spaces close only one token.
    still_whitespace: bool,
    buffer: String,
}

impl LexingFSM {
    /// Creates a new instance of the tokenizer state machine.
    ///
    /// Fails right away when the line contains exactly one quote character, since
    /// no span can be formed from it.
    fn new(line: &str) -> Result<Self, ParseError> {
        let input: Vec<char> = line.chars().collect();
        let first = input.iter().position(|&c| c == '"');
        let last = input.iter().rposition(|&c| c == '"');
        let quoted_span = match (first, last) {
            (Some(f), Some(l)) if f == l => return Err(ParseError::UnmatchedQuote),
            (Some(f), Some(l)) => Some((f, l)),
            _ => None,
        };
        Ok(LexingFSM {
            input,
            pos: 0,
            quoted_span,
            still_whitespace: false,
            buffer: String::new(),
        })
    }

    /// Walks the line once and returns the finished token sequence.
    fn make_tokens(&mut self) -> Result<Vec<String>, ParseError> {
        let mut out = Vec::new();

        while let Some(ch) = self.read_char() {
            let idx = self.pos - 1;
            if self.in_quoted_span(idx) {
                self.handle_quoted(ch);
            } else {
                self.handle_plain(ch, idx, &mut out);
            }
        }

        // End of line behaves like a separator that must not be inside the span
        if self.in_quoted_span(self.input.len()) {
            return Err(ParseError::UnterminatedAtEnd);
        }
        if !self.still_whitespace {
            out.push(std::mem::take(&mut self.buffer));
        }

        Ok(out)
    }

    fn read_char(&mut self) -> Option<char> {
        let ch = self.input.get(self.pos).copied();
        if ch.is_some() {
            self.pos += 1;
        }
        ch
    }

    fn in_quoted_span(&self, idx: usize) -> bool {
        matches!(self.quoted_span, Some((first, last)) if first <= idx && idx <= last)
    }

    fn handle_quoted(&mut self, ch: char) {
        self.still_whitespace = false;
        self.buffer.push(ch);
    }

    fn handle_plain(&mut self, ch: char, idx: usize, out: &mut Vec<String>) {
        match ch {
            ' ' => {
                if self.still_whitespace {
                    return;
                }
                self.still_whitespace = true;
                out.push(std::mem::take(&mut self.buffer));
            }
            '=' if idx > 0 && self.input[idx - 1] != ' ' => {
                self.still_whitespace = false;
                if self.buffer.ends_with('\\') {
                    // `\=` is a literal equals sign
                    self.buffer.pop();
                    self.buffer.push('=');
                } else {
                    out.push(std::mem::take(&mut self.buffer));
                    self.buffer.push('=');
                }
            }
            c => {
                self.still_whitespace = false;
                self.buffer.push(c);
            }
        }
    }
}

/// Splits an input line into tokens.
///
/// The first token is the command name (possibly empty), the rest are arguments,
/// control markers (`&`, `>`, `>>`, `>>>`) and `=`-prefixed assignment tokens.
/// Malformed quoting fails the whole line; no partial sequence is returned.
pub fn tokenize(line: &str) -> Result<Vec<String>, ParseError> {
    let mut lexer = LexingFSM::new(line)?;
    lexer.make_tokens()
}

/// Removes one layer of surrounding double quotes, if the string has them on both ends.
pub fn strip_quotes(s: &str) -> String {
    if s.len() >= 2 && s.starts_with('"') && s.ends_with('"') {
        s[1..s.len() - 1].to_string()
    } else {
        s.to_string()
    }
}

/// True for the sequences that carry no command at all.
pub fn is_no_command(tokens: &[String]) -> bool {
    tokens.first().is_none_or(|name| name.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn toks(line: &str) -> Vec<String> {
        tokenize(line).unwrap()
    }

    #[test]
    fn test_simple_command() {
        assert_eq!(toks("ls -la"), vec!["ls", "-la"]);
    }

    #[test]
    fn test_quoted_span_is_kept_verbatim() {
        assert_eq!(toks(r#"echo "a b" c"#), vec!["echo", "\"a b\"", "c"]);
    }

    #[test]
    fn test_single_quote_char_is_unmatched() {
        assert_eq!(tokenize(r#"echo "oops"#), Err(ParseError::UnmatchedQuote));
        assert_eq!(tokenize(r#"""#), Err(ParseError::UnmatchedQuote));
    }

    #[test]
    fn test_span_runs_from_first_to_last_quote() {
        assert_eq!(
            toks(r#"echo "a "b" c" d"#),
            vec!["echo", "\"a \"b\" c\"", "d"]
        );
    }

    #[test]
    fn test_empty_line_is_one_empty_token() {
        assert_eq!(toks(""), vec![""]);
        assert!(is_no_command(&toks("")));
        assert!(is_no_command(&[]));
    }

    #[test]
    fn test_consecutive_spaces_collapse() {
        assert_eq!(toks("ls    -la   /tmp"), vec!["ls", "-la", "/tmp"]);
    }

    #[test]
    fn test_trailing_space_adds_no_token() {
        assert_eq!(toks("ls -la  "), vec!["ls", "-la"]);
    }

    #[test]
    fn test_leading_space_emits_empty_command() {
        let tokens = toks(" ls");
        assert_eq!(tokens, vec!["", "ls"]);
        assert!(is_no_command(&tokens));
    }

    #[test]
    fn test_markers_are_plain_tokens() {
        assert_eq!(
            toks("ls -l >>> out.txt &"),
            vec!["ls", "-l", ">>>", "out.txt", "&"]
        );
    }

    #[test]
    fn test_glued_equals_starts_new_token() {
        assert_eq!(toks("env FOO=bar"), vec!["env", "FOO", "=bar"]);
    }

    #[test]
    fn test_glued_equals_keeps_quoted_value() {
        assert_eq!(
            toks(r#"alias ll="ls -la""#),
            vec!["alias", "ll", "=\"ls -la\""]
        );
    }

    #[test]
    fn test_spaced_equals_is_its_own_token() {
        assert_eq!(
            toks(r#"alias ll = "ls -la""#),
            vec!["alias", "ll", "=", "\"ls -la\""]
        );
    }

    #[test]
    fn test_equals_inside_quotes_does_not_split() {
        assert_eq!(toks(r#"echo "a=b""#), vec!["echo", "\"a=b\""]);
    }

    #[test]
    fn test_escaped_equals_is_literal() {
        assert_eq!(toks(r"make CFLAGS\=-O2"), vec!["make", "CFLAGS=-O2"]);
    }

    #[test]
    fn test_equals_at_line_start_does_not_split() {
        assert_eq!(toks("=x y"), vec!["=x", "y"]);
    }

    #[test]
    fn test_strip_quotes() {
        assert_eq!(strip_quotes("\"ls -la\""), "ls -la");
        assert_eq!(strip_quotes("plain"), "plain");
        assert_eq!(strip_quotes("\"half"), "\"half");
        assert_eq!(strip_quotes("\""), "\"");
        assert_eq!(strip_quotes("\"\""), "");
        assert_eq!(strip_quotes("a \"b\""), "a \"b\"");
    }
}
