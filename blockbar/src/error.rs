//! Error kinds shared by the engine
//!
//! Everything that can go wrong while rendering a tick or dispatching a click
//! is a `BarError`. Only the binary converts these into `anyhow` errors.

use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum BarError {
    #[error("interpreter not specified")]
    InterpreterMissing,

    #[error("'{0}' was not found in PATH")]
    InterpreterNotFound(String),

    #[error("command is empty")]
    EmptyCommand,

    #[error("cannot split command line '{line}': {source}")]
    InvalidCommandLine {
        line: String,
        #[source]
        source: shell_words::ParseError,
    },

    #[error("'{program}' failed: {source}")]
    ExecutionFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{program}' did not finish within {deadline:?}")]
    Timeout { program: String, deadline: Duration },

    #[error("failed to render field '{field}' of block '{block}': {source}")]
    FormatError {
        block: String,
        field: &'static str,
        #[source]
        source: minijinja::Error,
    },

    #[error("failed to parse click event: {0}")]
    EventParseError(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    ConfigError(String),

    #[error("failed to read configuration {}: {source}", path.display())]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse configuration: {0}")]
    ConfigSyntax(#[from] serde_yaml::Error),
}

pub type Result<T, E = BarError> = std::result::Result<T, E>;
