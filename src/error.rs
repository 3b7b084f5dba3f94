//! Error types shared by every stage of the interpreter.

use std::io;
use std::path::PathBuf;

/// Errors produced while turning a line into tokens or an invocation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// The line holds a single `"` with nothing to pair it with.
    #[error("unmatched quote")]
    UnmatchedQuote,
    /// The scan hit the end of the line while inside the quoted span.
    #[error("line ended inside a quoted string")]
    UnterminatedAtEnd,
    /// A redirection marker was the last token.
    #[error("missing target after `{0}`")]
    MissingRedirectTarget(String),
    /// More than one of `>`, `>>`, `>>>` in a single line.
    #[error("conflicting redirections `{first}` and `{second}`")]
    ConflictingRedirections { first: String, second: String },
    /// A plain word where only a marker or redirection target may stand.
    #[error("unexpected token `{0}` among control markers")]
    UnexpectedToken(String),
}

/// Errors raised by the alias table and its backing file.
#[derive(Debug, thiserror::Error)]
pub enum AliasError {
    #[error("invalid alias name `{0}`")]
    InvalidName(String),
    #[error("usage: alias <name> = <value>")]
    Usage,
    #[error("can't read alias file {path}: {source}")]
    Load { path: PathBuf, source: io::Error },
    #[error("can't write alias file {path}: {source}")]
    Save { path: PathBuf, source: io::Error },
}

/// Everything that can make a single input line fail.
#[derive(Debug, thiserror::Error)]
pub enum ShellError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Alias(#[from] AliasError),

    #[error("PATH environment variable not found")]
    PathUnset,

    #[error("'{name}' not found in the PATH")]
    NotFound { name: String },

    #[error("failed to spawn {program}: {source}")]
    Spawn { program: String, source: io::Error },

    #[error("failed to execute {program}: {source}")]
    Exec { program: String, source: io::Error },

    #[error("{context}: {source}")]
    Io { context: String, source: io::Error },

    #[error("captured output exceeds {limit} bytes")]
    CaptureOverflow { limit: usize },

    #[error("{program} exited with status {code}")]
    ChildFailed { program: String, code: i32 },

    #[error("{program} terminated abnormally (status {code})")]
    ChildSignaled { program: String, code: i32 },

    #[error("alias expansion exceeded depth {depth}")]
    MaxDepthExceeded { depth: usize },

    #[error("{name}: {error:#}")]
    Builtin { name: String, error: anyhow::Error },

    #[error("{name} exited with status {code}")]
    BuiltinFailed { name: String, code: i32 },
}

impl ShellError {
    pub(crate) fn io(context: impl Into<String>, source: io::Error) -> Self {
        ShellError::Io {
            context: context.into(),
            source,
        }
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, ShellError>;
