use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VitalsError {
    #[error("Terminal I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Terminal initialization failed: {0}")]
    Terminal(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    #[error("Invalid value for option {name}: {reason}")]
    InvalidOption { name: &'static str, reason: String },

    #[error("Collaborator failed: {0}")]
    Collaborator(String),

    /// A collaborator failure raised while dispatching `token`.
    #[error("process(\"{token}\") : {source}")]
    Dispatch {
        token: String,
        #[source]
        source: Box<VitalsError>,
    },
}

impl VitalsError {
    pub fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        VitalsError::InvalidOption {
            name,
            reason: reason.into(),
        }
    }

    /// Wraps `self` with the identity of the token being dispatched.
    pub fn in_dispatch(self, token: impl ToString) -> Self {
        VitalsError::Dispatch {
            token: token.to_string(),
            source: Box::new(self),
        }
    }
}

pub type Result<T> = std::result::Result<T, VitalsError>;
