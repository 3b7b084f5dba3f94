use crate::command::ExitCode;
use crate::error::{AliasError, ShellError};
use crate::session::Session;
use anyhow::Result;
use argh::{EarlyExit, FromArgs};
use std::io::Write;

/// Built-in commands known to the shell at compile time.
///
/// Builtins are parsed using the [`argh`] crate (`FromArgs`) and executed directly
/// in-process without spawning a child process.
pub(crate) trait BuiltinCommand: Sized + FromArgs {
    /// Canonical name of the command, e.g. "alias" or "bello".
    fn name() -> &'static str;

    /// Executes the command, writing its output to `stdout`.
    ///
    /// Return value should follow shell conventions: 0 for success, non-zero for error.
    fn execute(self, stdout: &mut dyn Write, session: &mut Session) -> Result<ExitCode>;
}

/// Parses `args` for builtin `T` and runs it.
///
/// Usage errors and `--help` print argh's text to `stdout`. A nonzero exit code or an
/// error from the builtin body fails the dispatch.
pub(crate) fn run_builtin<T: BuiltinCommand>(
    args: &[&str],
    stdout: &mut dyn Write,
    session: &mut Session,
) -> Result<ExitCode, ShellError> {
    let name = T::name();
    let code = match T::from_args(&[name], args) {
        Ok(cmd) => cmd.execute(stdout, session).map_err(|error| ShellError::Builtin {
            name: name.to_string(),
            error,
        })?,
        Err(EarlyExit { output, status }) => {
            stdout
                .write_all(output.as_bytes())
                .map_err(|e| ShellError::io(format!("{name}: can't write usage"), e))?;
            if status.is_err() { 1 } else { 0 }
        }
    };
    match code {
        0 => Ok(0),
        code => Err(ShellError::BuiltinFailed {
            name: name.to_string(),
            code,
        }),
    }
}

#[derive(FromArgs)]
/// Define an alias with `alias <name> = <value>`, or list every alias when called
/// without arguments.
pub struct Alias {
    #[argh(positional, greedy)]
    /// the alias name, an equals sign and the replacement command.
    pub words: Vec<String>,
}

impl Alias {
    /// Splits `name = value` or `name =value` into its two halves.
    fn split_definition(&self) -> Result<(String, String), AliasError> {
        let (name, rest) = self.words.split_first().ok_or(AliasError::Usage)?;
        let mut value_words: Vec<&str> = match rest.split_first() {
            Some((eq, tail)) if eq == "=" => tail.iter().map(String::as_str).collect(),
            Some((first, tail)) if first.starts_with('=') => std::iter::once(&first[1..])
                .chain(tail.iter().map(String::as_str))
                .collect(),
            _ => return Err(AliasError::Usage),
        };
        value_words.retain(|w| !w.is_empty());
        if value_words.is_empty() {
            return Err(AliasError::Usage);
        }
        Ok((name.clone(), value_words.join(" ")))
    }
}

impl BuiltinCommand for Alias {
    fn name() -> &'static str {
        "alias"
    }

    fn execute(self, stdout: &mut dyn Write, session: &mut Session) -> Result<ExitCode> {
        if self.words.is_empty() {
            for entry in session.aliases.entries() {
                writeln!(stdout, "{}={}", entry.name, entry.value)?;
            }
            return Ok(0);
        }
        let (name, value) = self.split_definition()?;
        session.aliases.upsert(&name, &value)?;
        log::debug!("alias {} = {}", name, value);
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Print who and where you are: user, host, last command, terminal, shell, home,
/// current time and the number of running processes.
pub struct Bello {}

impl BuiltinCommand for Bello {
    fn name() -> &'static str {
        "bello"
    }

    fn execute(self, stdout: &mut dyn Write, session: &mut Session) -> Result<ExitCode> {
        let env = &session.env;
        let user = env.user_name();
        let now = chrono::Local::now().format("%a %b %e %H:%M:%S %Y");

        writeln!(stdout, "{}", user)?;
        writeln!(stdout, "{}", env.hostname())?;
        writeln!(stdout, "{}", session.last_command)?;
        writeln!(stdout, "{}", terminal_name().as_deref().unwrap_or("not a tty"))?;
        writeln!(stdout, "{}", env.get_var("SHELL").unwrap_or_default())?;
        writeln!(stdout, "{}", env.get_var("HOME").unwrap_or_default())?;
        writeln!(stdout, "{}", now)?;
        // the interpreter itself counts as one
        writeln!(stdout, "{}", session.processes.active() + 1)?;
        Ok(0)
    }
}

/// Device name of the terminal on stdin, if there is one.
#[cfg(unix)]
fn terminal_name() -> Option<String> {
    nix::unistd::ttyname(std::io::stdin())
        .ok()
        .map(|p| p.display().to_string())
}

#[cfg(not(unix))]
fn terminal_name() -> Option<String> {
    None
}
