//! Extraction of control markers (`&`, `>`, `>>`, `>>>`) from a token sequence.

use crate::error::ParseError;
use crate::lexer::strip_quotes;
use std::path::PathBuf;

/// Marker that sends a command to the background.
pub const BACKGROUND: &str = "&";
/// Marker for create-or-truncate output redirection.
pub const TRUNCATE: &str = ">";
/// Marker for create-or-append output redirection.
pub const APPEND: &str = ">>";
/// Marker for reverse-capture: capture stdout, reverse it, append to a file.
pub const REVERSE_CAPTURE: &str = ">>>";

/// Where the standard output of a command goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Redirection {
    /// Inherit the interpreter's stdout.
    None,
    /// `>`: create or truncate the file.
    Truncate(PathBuf),
    /// `>>`: create or append to the file.
    Append(PathBuf),
    /// `>>>`: capture the output, byte-reverse it and append it to the file.
    ReverseCapture(PathBuf),
}

impl Redirection {
    /// The marker this redirection was written with, if any.
    pub fn marker(&self) -> Option<&'static str> {
        match self {
            Redirection::None => None,
            Redirection::Truncate(_) => Some(TRUNCATE),
            Redirection::Append(_) => Some(APPEND),
            Redirection::ReverseCapture(_) => Some(REVERSE_CAPTURE),
        }
    }
}

/// A command line split into its argument list and execution modifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLine {
    /// Program name followed by its arguments, quotes already stripped.
    pub argv: Vec<String>,
    pub redirection: Redirection,
    pub background: bool,
}

fn is_redirect_marker(token: &str) -> bool {
    matches!(token, TRUNCATE | APPEND | REVERSE_CAPTURE)
}

fn is_marker(token: &str) -> bool {
    token == BACKGROUND || is_redirect_marker(token)
}

/// Splits `tokens` into arguments and modifiers.
///
/// Everything before the first marker is the argument list. After it only markers
/// and the one redirection target may follow, so `ls & foo` is rejected. At most one
/// redirection marker is accepted, it must be followed by a target, and only `&` may
/// come after the target.
pub fn parse_line(tokens: &[String]) -> Result<ParsedLine, ParseError> {
    let split = tokens
        .iter()
        .position(|t| is_marker(t))
        .unwrap_or(tokens.len());
    let argv = tokens[..split].iter().map(|t| strip_quotes(t)).collect();

    let mut background = false;
    let mut redirection = Redirection::None;
    let mut rest = tokens[split..].iter();

    while let Some(token) = rest.next() {
        let token = token.as_str();
        if token == BACKGROUND {
            background = true;
            continue;
        }
        if !is_redirect_marker(token) {
            return Err(ParseError::UnexpectedToken(token.to_string()));
        }
        if let Some(first) = redirection.marker() {
            return Err(ParseError::ConflictingRedirections {
                first: first.to_string(),
                second: token.to_string(),
            });
        }
        let target = match rest.next() {
            Some(t) if !is_marker(t) => PathBuf::from(strip_quotes(t)),
            _ => return Err(ParseError::MissingRedirectTarget(token.to_string())),
        };
        redirection = match token {
            TRUNCATE => Redirection::Truncate(target),
            APPEND => Redirection::Append(target),
            _ => Redirection::ReverseCapture(target),
        };
    }

    Ok(ParsedLine {
        argv,
        redirection,
        background,
    })
}
