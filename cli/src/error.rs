use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    Message(String),

    #[error("invalid {what} '{input}': {reason}")]
    InvalidArgument {
        what: &'static str,
        input: String,
        reason: String,
    },

    #[error("config file not found: {0}")]
    ConfigNotFound(PathBuf),

    #[error("missing setting '{0}' (pass a flag or add it to the config file)")]
    MissingSetting(&'static str),

    #[error("could not read the count: {0}")]
    ReadFailed(String),

    #[error("transaction {status}: {reason}")]
    Transaction { status: String, reason: String },

    #[error(transparent)]
    Dapp(#[from] counter_dapp::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
