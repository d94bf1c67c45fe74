//! Bus error types.

use gridlab_core::error::GridlabError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BusError {
    #[error("bus session is disconnected")]
    Disconnected,

    #[error("unknown exchange: {0}")]
    UnknownExchange(String),

    /// The queue already has its consumer.
    #[error("queue {0} is closed to new consumers")]
    Closed(String),
}

impl From<BusError> for GridlabError {
    fn from(err: BusError) -> Self {
        GridlabError::Bus(err.to_string())
    }
}
