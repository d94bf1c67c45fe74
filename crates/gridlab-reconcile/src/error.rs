//! Reconciliation error types.

use gridlab_bus::BusError;
use gridlab_core::error::GridlabError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("malformed message: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("failed to encode action: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("invalid component UUID: {0:?}")]
    InvalidUuid(String),

    #[error("status message is missing {0}")]
    MissingField(&'static str),

    #[error(transparent)]
    Store(#[from] GridlabError),

    #[error(transparent)]
    Bus(#[from] BusError),
}

impl ReconcileError {
    /// Problems with a single message. The message is dropped and the next
    /// one is unaffected.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ReconcileError::Decode(_)
                | ReconcileError::InvalidUuid(_)
                | ReconcileError::MissingField(_)
        )
    }
}

impl From<ReconcileError> for GridlabError {
    fn from(err: ReconcileError) -> Self {
        match err {
            ReconcileError::Store(e) => e,
            ReconcileError::Bus(e) => e.into(),
            ReconcileError::Encode(e) => GridlabError::Internal(e.to_string()),
            other => GridlabError::validation(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_errors_are_transient_store_errors_are_not() {
        assert!(ReconcileError::InvalidUuid("x".into()).is_transient());
        assert!(ReconcileError::MissingField("category").is_transient());
        assert!(!ReconcileError::Store(GridlabError::Database("down".into())).is_transient());
        assert!(!ReconcileError::Bus(BusError::Disconnected).is_transient());
    }
}
