use anyhow::Context;
use argh::FromArgs;
use myshell::config::DEFAULT_ALIAS_FILE;
use myshell::{Config, Environment, Interpreter};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

#[derive(FromArgs)]
/// An interactive shell with aliases, output redirection and reverse-capture.
struct Cli {
    /// file backing the alias table
    #[argh(option, default = "PathBuf::from(DEFAULT_ALIAS_FILE)")]
    alias_file: PathBuf,

    /// largest output in bytes a `>>>` redirection accepts
    #[argh(option, default = "1024")]
    capture_limit: usize,

    /// pause after starting a background job, in milliseconds
    #[argh(option, default = "1000")]
    background_delay_ms: u64,

    /// how deep alias expansions may nest
    #[argh(option, default = "16")]
    max_alias_depth: usize,

    /// run a single line and exit instead of prompting
    #[argh(option, short = 'c')]
    command: Option<String>,
}

impl Cli {
    fn config(&self) -> Config {
        Config {
            alias_file: self.alias_file.clone(),
            capture_limit: self.capture_limit,
            background_delay: Duration::from_millis(self.background_delay_ms),
            max_alias_depth: self.max_alias_depth,
        }
    }
}

fn main() -> anyhow::Result<ExitCode> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli: Cli = argh::from_env();
    let mut shell = Interpreter::new(cli.config(), Environment::new())
        .with_context(|| format!("can't start with alias file {}", cli.alias_file.display()))?;

    let Some(line) = cli.command else {
        shell.repl().context("prompt loop failed")?;
        return Ok(ExitCode::SUCCESS);
    };

    match shell.execute_line(&line) {
        Ok(_) => Ok(ExitCode::SUCCESS),
        Err(e) => {
            eprintln!("{e}");
            Ok(ExitCode::FAILURE)
        }
    }
}
