use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid date of birth '{0}', expected DD-MM-YYYY")]
    InvalidDateOfBirth(String),
    #[error("invalid phone number '{0}', expected DDD-DDD-DDDD")]
    InvalidPhoneNumber(String),
}

/// Failures of the backing file. A missing file is not one of them.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not encode records for {path}: {reason}")]
    Serialize { path: PathBuf, reason: String },
}

#[derive(Debug, Error)]
pub enum ManagerError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("no patient ids left, the highest id 4294967295 is already in use")]
    IdsExhausted,
}

impl StoreError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }
}
