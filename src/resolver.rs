//! Decides what a tokenized line means: nothing, a builtin, an alias expansion or a
//! program to run.

use crate::dispatch::{Invocation, Program};
use crate::error::{ParseError, Result};
use crate::external::resolve_program;
use crate::lexer::{is_no_command, strip_quotes};
use crate::parser::{Redirection, parse_line};
use crate::session::Session;

pub const EXIT: &str = "exit";
pub const REPORT: &str = "bello";
pub const ALIAS: &str = "alias";

/// Builtins that run in the interpreter itself, without redirection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Builtin {
    /// The report, printed straight to stdout.
    Report,
    /// Define or list aliases; carries the tokens after `alias`.
    Alias { args: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    NoOp,
    Exit,
    RunBuiltin(Builtin),
    /// Lines to dispatch in place of the input, one level deeper.
    ExpandAlias(Vec<String>),
    RunExternal(Invocation),
}

/// Resolves `tokens` against the session's alias table and search path.
///
/// Never mutates anything; the first matching rule wins.
pub fn resolve(tokens: &[String], session: &Session) -> Result<Action> {
    if is_no_command(tokens) {
        return Ok(Action::NoOp);
    }
    let name = tokens[0].as_str();
    let args = &tokens[1..];

    match name {
        EXIT => return Ok(Action::Exit),
        REPORT if args.is_empty() => return Ok(Action::RunBuiltin(Builtin::Report)),
        ALIAS => {
            return Ok(Action::RunBuiltin(Builtin::Alias {
                args: args.to_vec(),
            }));
        }
        _ => {}
    }

    let expansions: Vec<String> = session
        .aliases
        .lookup(name)
        .map(|value| expand(value, args))
        .collect();
    if !expansions.is_empty() {
        log::debug!("{} expands to {:?}", name, expansions);
        return Ok(Action::ExpandAlias(expansions));
    }

    let parsed = parse_line(tokens)?;
    let Some(program_name) = parsed.argv.first() else {
        // the line starts with a marker
        return Err(ParseError::UnexpectedToken(name.to_string()).into());
    };
    let program = if program_name == REPORT {
        Program::Report
    } else {
        Program::External(resolve_program(&session.env, program_name)?)
    };
    Ok(Action::RunExternal(Invocation {
        program,
        argv: parsed.argv,
        redirection: parsed.redirection,
        background: parsed.background,
    }))
}

fn expand(value: &str, args: &[String]) -> String {
    let line = if args.is_empty() {
        value.to_string()
    } else {
        format!("{} {}", value, args.join(" "))
    };
    strip_quotes(&line)
}

impl Action {
    /// Short description for logging.
    pub fn describe(&self) -> String {
        match self {
            Action::NoOp => "no-op".to_string(),
            Action::Exit => "exit".to_string(),
            Action::RunBuiltin(Builtin::Report) => REPORT.to_string(),
            Action::RunBuiltin(Builtin::Alias { .. }) => ALIAS.to_string(),
            Action::ExpandAlias(lines) => format!("alias expansion into {} line(s)", lines.len()),
            Action::RunExternal(inv) => match &inv.redirection {
                Redirection::None => format!("run {}", inv.name()),
                r => format!("run {} with {}", inv.name(), r.marker().unwrap_or_default()),
            },
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::env::Environment;
    use crate::error::ShellError;
    use crate::lexer::tokenize;
    use pretty_assertions::assert_eq;
    use std::path::{Path, PathBuf};

    fn session_in(dir: &Path) -> Session {
        let config = Config {
            alias_file: dir.join("aliases.txt"),
            ..Config::default()
        };
        let env = Environment::with_vars([("PATH", "/usr/bin:/bin")]);
        Session::new(config, env).unwrap()
    }

    fn resolve_line(line: &str, session: &Session) -> Result<Action> {
        resolve(&tokenize(line).unwrap(), session)
    }

    fn program_path(session: &Session, name: &str) -> PathBuf {
        resolve_program(&session.env, name).unwrap()
    }

    #[test]
    fn empty_name_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let session = session_in(dir.path());
        assert_eq!(resolve_line("", &session).unwrap(), Action::NoOp);
        assert_eq!(resolve_line(" ls", &session).unwrap(), Action::NoOp);
    }

    #[test]
    fn exit_wins_over_everything() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(dir.path());
        session.aliases.upsert("exit", "echo no").unwrap();
        assert_eq!(resolve_line("exit now", &session).unwrap(), Action::Exit);
    }

    #[test]
    fn bare_report_runs_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let session = session_in(dir.path());
        assert_eq!(
            resolve_line("bello", &session).unwrap(),
            Action::RunBuiltin(Builtin::Report)
        );
    }

    #[test]
    fn redirected_report_is_never_looked_up() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(dir.path());
        session.env.remove_var("PATH");

        let action = resolve_line("bello > out.txt &", &session).unwrap();
        assert_eq!(
            action,
            Action::RunExternal(Invocation {
                program: Program::Report,
                argv: vec!["bello".into()],
                redirection: Redirection::Truncate("out.txt".into()),
                background: true,
            })
        );
    }

    #[test]
    fn alias_builtin_gets_raw_arguments() {
        let dir = tempfile::tempdir().unwrap();
        let session = session_in(dir.path());
        assert_eq!(
            resolve_line(r#"alias ll = "ls -la""#, &session).unwrap(),
            Action::RunBuiltin(Builtin::Alias {
                args: vec!["ll".into(), "=".into(), "\"ls -la\"".into()],
            })
        );
    }

    #[test]
    fn alias_expands_with_arguments() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(dir.path());
        session.aliases.upsert("ll", "\"ls -la\"").unwrap();

        assert_eq!(
            resolve_line("ll -h", &session).unwrap(),
            Action::ExpandAlias(vec!["ls -la -h".into()])
        );
        assert_eq!(
            resolve_line("ll", &session).unwrap(),
            Action::ExpandAlias(vec!["ls -la".into()])
        );
    }

    #[test]
    fn external_program_with_markers() {
        let dir = tempfile::tempdir().unwrap();
        let session = session_in(dir.path());

        let action = resolve_line(r#"echo "a b" >>> rev.txt"#, &session).unwrap();
        assert_eq!(
            action,
            Action::RunExternal(Invocation {
                program: Program::External(program_path(&session, "echo")),
                argv: vec!["echo".into(), "a b".into()],
                redirection: Redirection::ReverseCapture("rev.txt".into()),
                background: false,
            })
        );
    }

    #[test]
    fn resolving_external_name_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let session = session_in(dir.path());
        let first = resolve_line("ls -la", &session).unwrap();
        let second = resolve_line("ls -la", &session).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn unknown_program_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let session = session_in(dir.path());
        assert!(matches!(
            resolve_line("definitely-not-a-program-42", &session),
            Err(ShellError::NotFound { name }) if name == "definitely-not-a-program-42"
        ));
    }

    #[test]
    fn missing_path_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(dir.path());
        session.env.remove_var("PATH");
        assert!(matches!(
            resolve_line("ls", &session),
            Err(ShellError::PathUnset)
        ));
    }

    #[test]
    fn line_starting_with_marker_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let session = session_in(dir.path());
        assert_eq!(
            resolve_line("> out.txt", &session).unwrap_err().to_string(),
            ShellError::from(ParseError::UnexpectedToken(">".into())).to_string()
        );
    }

    #[test]
    fn marker_errors_surface_before_lookup() {
        let dir = tempfile::tempdir().unwrap();
        let session = session_in(dir.path());
        assert!(matches!(
            resolve_line("nosuchprogram > a > b", &session),
            Err(ShellError::Parse(ParseError::ConflictingRedirections { .. }))
        ));
    }
}
