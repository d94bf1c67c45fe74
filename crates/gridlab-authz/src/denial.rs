//! Authorization failures and their client-facing shape.

use gridlab_core::error::GridlabError;
use gridlab_core::models::resource::ResourceKind;
use serde_json::json;
use uuid::Uuid;

/// Response category of a denial.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialStatus {
    /// Malformed input, such as an unparsable id.
    BadRequest,
    /// The target or one of its owners does not exist.
    NotFound,
    /// Policy or resource state forbids the operation.
    Unprocessable,
    /// The store failed unexpectedly.
    Internal,
}

impl DenialStatus {
    pub fn status_code(self) -> u16 {
        match self {
            DenialStatus::BadRequest => 400,
            DenialStatus::NotFound => 404,
            DenialStatus::Unprocessable => 422,
            DenialStatus::Internal => 500,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct Denial {
    pub status: DenialStatus,
    pub message: String,
}

impl Denial {
    pub fn new(status: DenialStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(DenialStatus::BadRequest, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(DenialStatus::NotFound, message)
    }

    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self::new(DenialStatus::Unprocessable, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(DenialStatus::Internal, message)
    }

    /// Classify a failed load of `kind`/`id`.
    pub fn from_load_error(kind: ResourceKind, id: Uuid, err: GridlabError) -> Self {
        if err.is_not_found() {
            Self::not_found(format!("{kind} {id} not found"))
        } else {
            Self::internal(err.to_string())
        }
    }

    pub fn status_code(&self) -> u16 {
        self.status.status_code()
    }

    /// JSON error body returned to API callers.
    pub fn body(&self) -> serde_json::Value {
        json!({
            "success": false,
            "message": self.message,
        })
    }
}

impl From<Denial> for GridlabError {
    fn from(denial: Denial) -> Self {
        match denial.status {
            DenialStatus::BadRequest => GridlabError::Validation {
                message: denial.message,
            },
            DenialStatus::NotFound | DenialStatus::Unprocessable => {
                GridlabError::AuthorizationDenied {
                    reason: denial.message,
                }
            }
            DenialStatus::Internal => GridlabError::Internal(denial.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_has_success_false_and_message() {
        let denial = Denial::unprocessable("scenario is locked");
        assert_eq!(denial.status_code(), 422);
        assert_eq!(
            denial.body(),
            json!({"success": false, "message": "scenario is locked"})
        );
    }

    #[test]
    fn load_errors_are_classified() {
        let id = Uuid::new_v4();
        let missing = Denial::from_load_error(
            ResourceKind::Signal,
            id,
            GridlabError::not_found("signal", id),
        );
        assert_eq!(missing.status, DenialStatus::NotFound);
        assert_eq!(missing.status_code(), 404);

        let broken = Denial::from_load_error(
            ResourceKind::Signal,
            id,
            GridlabError::Database("connection reset".into()),
        );
        assert_eq!(broken.status_code(), 500);
    }
}
