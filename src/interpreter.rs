use crate::builtin::{Alias, Bello, BuiltinCommand, run_builtin};
use crate::command::ExitCode;
use crate::config::Config;
use crate::dispatch::{self, Outcome};
use crate::env::Environment;
use crate::error::{AliasError, Result, ShellError};
use crate::lexer::tokenize;
use crate::resolver::{Action, Builtin, resolve};
use crate::session::Session;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::io::{self, Write};

/// A line-oriented shell: tokenizes each line, resolves it and runs it.
///
/// Example
/// ```no_run
/// use myshell::{Config, Environment, Interpreter};
/// let mut sh = Interpreter::new(Config::default(), Environment::new()).unwrap();
/// sh.execute_line("echo hello world").unwrap();
/// ```
pub struct Interpreter {
    session: Session,
}

impl Interpreter {
    /// Creates an interpreter, loading the alias table named by `config`.
    pub fn new(config: Config, env: Environment) -> std::result::Result<Self, AliasError> {
        Ok(Self {
            session: Session::new(config, env)?,
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    /// Whether `exit` has been dispatched.
    pub fn should_exit(&self) -> bool {
        self.session.env.should_exit
    }

    /// Runs one top-level line.
    ///
    /// Finished background jobs are reclaimed first. The session's error flag is
    /// cleared before the line runs and set if it fails; a line that ran something
    /// successfully becomes the last command.
    pub fn execute_line(&mut self, line: &str) -> Result<Outcome> {
        self.session.processes.sweep();
        self.session.error = false;

        let result = self.dispatch(line, 0);
        match &result {
            Ok(Outcome::Idle) => {}
            Ok(_) => self.session.last_command = line.to_string(),
            Err(e) => {
                self.session.error = true;
                log::debug!("{:?} failed: {}", line, e);
            }
        }
        result
    }

    fn dispatch(&mut self, line: &str, depth: usize) -> Result<Outcome> {
        let limit = self.session.config.max_alias_depth;
        if depth > limit {
            return Err(ShellError::MaxDepthExceeded { depth: limit });
        }

        let tokens = tokenize(line)?;
        let action = resolve(&tokens, &self.session)?;
        log::debug!("[{}] {:?}: {}", depth, line, action.describe());

        match action {
            Action::NoOp => Ok(Outcome::Idle),
            Action::Exit => {
                self.session.env.should_exit = true;
                Ok(Outcome::Exit)
            }
            Action::RunBuiltin(Builtin::Report) => self.run_in_place::<Bello>(&[]),
            Action::RunBuiltin(Builtin::Alias { args }) => {
                let args: Vec<&str> = args.iter().map(String::as_str).collect();
                self.run_in_place::<Alias>(&args)
            }
            Action::ExpandAlias(lines) => {
                let mut outcome = Outcome::Idle;
                for expanded in &lines {
                    outcome = self.dispatch(expanded, depth + 1)?;
                    if outcome == Outcome::Exit {
                        break;
                    }
                }
                Ok(outcome)
            }
            Action::RunExternal(invocation) => dispatch::execute(&invocation, &mut self.session),
        }
    }

    fn run_in_place<T: BuiltinCommand>(&mut self, args: &[&str]) -> Result<Outcome> {
        let mut stdout = io::stdout().lock();
        let code: ExitCode = run_builtin::<T>(args, &mut stdout, &mut self.session)?;
        stdout
            .flush()
            .map_err(|e| ShellError::io("can't flush stdout", e))?;
        Ok(Outcome::Completed(code))
    }

    fn prompt(&self) -> String {
        let env = &self.session.env;
        format!(
            "{}@{} {} --- ",
            env.user_name(),
            env.hostname(),
            env.current_dir.display()
        )
    }

    /// Reads lines until `exit`, Ctrl-C or Ctrl-D.
    ///
    /// A failed line is reported on stderr and the loop goes on.
    pub fn repl(&mut self) -> rustyline::Result<()> {
        let mut rl = DefaultEditor::new()?;

        while !self.should_exit() {
            match rl.readline(&self.prompt()) {
                Ok(line) => {
                    rl.add_history_entry(line.as_str())?;
                    if let Err(e) = self.execute_line(&line) {
                        eprintln!("{e}");
                        eprintln!("!Error occurred!");
                    }
                }
                Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
                Err(err) => return Err(err),
            }
        }

        self.session.processes.sweep();
        if self.session.processes.pending() > 0 {
            log::info!(
                "leaving {} background job(s) running",
                self.session.processes.pending()
            );
        }
        Ok(())
    }
}
