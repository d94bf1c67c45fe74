//! Error types for the GridLab backend.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GridlabError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Entity already exists: {entity}")]
    AlreadyExists { entity: String },

    #[error("Authorization denied: {reason}")]
    AuthorizationDenied { reason: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    /// The entity is still referenced; deleting it later will succeed once
    /// the references are gone.
    #[error("Deletion postponed: {entity} {id} is still referenced by {references} record(s)")]
    DeletionPostponed {
        entity: String,
        id: String,
        references: u64,
    },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Message bus error: {0}")]
    Bus(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl GridlabError {
    pub fn not_found(entity: &str, id: impl ToString) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_deletion_postponed(&self) -> bool {
        matches!(self, Self::DeletionPostponed { .. })
    }
}

pub type GridlabResult<T> = Result<T, GridlabError>;
