use crate::alias::AliasTable;
use crate::config::Config;
use crate::env::Environment;
use crate::error::AliasError;
use crate::registry::ProcessRegistry;

/// Mutable state threaded through every dispatch of one interpreter.
pub struct Session {
    pub config: Config,
    pub env: Environment,
    pub aliases: AliasTable,
    pub processes: ProcessRegistry,
    /// Text of the most recent top-level line that completed without error.
    pub last_command: String,
    /// Outcome of the most recent top-level line; cleared when a new one starts.
    pub error: bool,
}

impl Session {
    /// Creates a session, loading the alias table named by `config`.
    pub fn new(config: Config, env: Environment) -> Result<Self, AliasError> {
        let aliases = AliasTable::load(&config.alias_file)?;
        Ok(Self {
            config,
            env,
            aliases,
            processes: ProcessRegistry::new(),
            last_command: String::new(),
            error: false,
        })
    }
}
