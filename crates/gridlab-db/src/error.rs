//! Database-specific error types and conversions.

use gridlab_core::error::GridlabError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    /// A statement was accepted by the server but failed to execute.
    #[error("Query failed: {0}")]
    Query(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    /// A stored value could not be mapped back onto the domain model.
    #[error("Invalid stored value: {0}")]
    Conversion(String),
}

impl DbError {
    pub(crate) fn not_found(entity: &str, id: impl ToString) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }
}

impl From<DbError> for GridlabError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => GridlabError::NotFound { entity, id },
            other => GridlabError::Database(other.to_string()),
        }
    }
}
