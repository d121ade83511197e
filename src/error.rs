// ABOUTME: Application-wide error types for stagegate.
// ABOUTME: Uses thiserror for ergonomic error handling.

use std::path::PathBuf;
use thiserror::Error;

use crate::approval::{ApprovalError, CallbackError};
use crate::cm::{EngineError, WaitError};
use crate::itsm::ItsmError;
use crate::types::ObjectSpecError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration file not found in {0}")]
    ConfigNotFound(PathBuf),

    #[error("configuration section '{0}' is required for this command")]
    MissingSection(&'static str),

    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("invalid {0}: {1}")]
    InvalidParameter(&'static str, String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid object name: {0}")]
    ObjectSpec(#[from] ObjectSpecError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Wait(#[from] WaitError),

    #[error(transparent)]
    Itsm(#[from] ItsmError),

    #[error(transparent)]
    Callback(#[from] CallbackError),

    #[error(transparent)]
    Approval(#[from] ApprovalError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    /// Caller mistakes that no retry can fix.
    pub fn is_configuration(&self) -> bool {
        match self {
            Error::ConfigNotFound(_)
            | Error::MissingSection(_)
            | Error::MissingEnvVar(_)
            | Error::MissingParameter(_)
            | Error::InvalidParameter(..)
            | Error::InvalidConfig(_)
            | Error::ObjectSpec(_)
            | Error::Yaml(_) => true,
            Error::Engine(e) => e.is_not_found(),
            Error::Wait(WaitError::InvalidTimeout(_)) => true,
            Error::Wait(WaitError::Engine(e)) => e.is_not_found(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
