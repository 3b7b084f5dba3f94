use std::collections::HashMap;
use std::env as stdenv;
use std::path::PathBuf;

/// Mutable, user-level view of the process environment used by the interpreter.
///
/// The environment contains:
/// - `vars`: the variables visible to executed commands (and the source of `PATH`).
/// - `current_dir`: the working directory for command execution.
/// - `should_exit`: set by the `exit` builtin; the prompt loop stops when it sees it.
#[derive(Debug, Clone)]
pub struct Environment {
    /// Key-value store of environment variables (e.g., PATH, HOME).
    pub vars: HashMap<String, String>,
    /// The current working directory for command execution.
    pub current_dir: PathBuf,
    /// When set to true, indicates that an interactive loop should exit.
    pub should_exit: bool,
}

impl Environment {
    /// Capture the current process state into a new `Environment` instance.
    pub fn new() -> Self {
        let vars = stdenv::vars().collect();
        let current_dir = stdenv::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self {
            vars,
            current_dir,
            should_exit: false,
        }
    }

    /// An environment with only the given variables, rooted at the process cwd.
    pub fn with_vars<K, V>(vars: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
            current_dir: stdenv::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            should_exit: false,
        }
    }

    /// Get the value of a variable.
    ///
    /// Only `self.vars` is consulted, so a variable removed here stays removed
    /// for the children too.
    pub fn get_var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }

    /// Set or override a variable in `self.vars`.
    pub fn set_var(&mut self, key: impl Into<String>, val: impl Into<String>) {
        self.vars.insert(key.into(), val.into());
    }

    pub fn remove_var(&mut self, key: &str) -> Option<String> {
        self.vars.remove(key)
    }

    /// Name of this machine, falling back to `HOSTNAME` and then to "localhost".
    pub fn hostname(&self) -> String {
        whoami::fallible::hostname()
            .ok()
            .filter(|s| !s.is_empty())
            .or_else(|| self.get_var("HOSTNAME"))
            .unwrap_or_else(|| "localhost".to_string())
    }

    /// `USER` as seen by the children, or the account running the shell.
    pub fn user_name(&self) -> String {
        self.get_var("USER").unwrap_or_else(whoami::username)
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}
