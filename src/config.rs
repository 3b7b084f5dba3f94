use std::path::PathBuf;
use std::time::Duration;

/// Name of the alias file created in the start directory when none is given.
pub const DEFAULT_ALIAS_FILE: &str = "alias_config_file.txt";

/// Tunables of a shell session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// File backing the alias table.
    pub alias_file: PathBuf,
    /// Largest output, in bytes, a reverse-capture (`>>>`) will accept.
    pub capture_limit: usize,
    /// Pause after starting a background job so its first output lands before the
    /// next prompt. Best effort only.
    pub background_delay: Duration,
    /// How many alias expansions may nest before the line is rejected.
    pub max_alias_depth: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            alias_file: PathBuf::from(DEFAULT_ALIAS_FILE),
            capture_limit: 1024,
            background_delay: Duration::from_secs(1),
            max_alias_depth: 16,
        }
    }
}
