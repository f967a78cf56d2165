//! Crate error type.
//!
//! Nothing inside a tick can fail; errors only come out of configuration and
//! control-scheme construction.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DinoError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("unknown control name `{0}`")]
    UnknownControl(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed config file: {0}")]
    Json(#[from] serde_json::Error),
}

pub type DinoResult<T> = Result<T, DinoError>;
