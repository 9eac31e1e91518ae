use crate::alarm::AlarmId;

/// Failure kinds surfaced to callers. `NotFound`, `CapacityExceeded` and
/// `InvalidOperation` are caller mistakes and are never retried internally;
/// `Storage` is transient and only the poll loop swallows it (with a logged
/// backoff) — direct mutations hand it back so the caller can resubmit.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("alarm {0} not found")]
    NotFound(AlarmId),

    #[error("maximum number of alarms ({max}) reached")]
    CapacityExceeded { max: usize },

    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    #[error("storage failure")]
    Storage(#[source] anyhow::Error),
}

impl Error {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Error::InvalidOperation(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
