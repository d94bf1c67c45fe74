//! SurrealDB repository implementations.

mod component;
mod configuration;
mod loader;
mod owned;
mod scenario;
mod user;

pub use component::SurrealComponentRepository;
pub use configuration::SurrealConfigurationRepository;
pub use loader::SurrealResourceLoader;
pub use owned::{
    SurrealDashboardRepository, SurrealFileRepository, SurrealResultRepository,
    SurrealSignalRepository, SurrealWidgetRepository,
};
pub use scenario::SurrealScenarioRepository;
pub use user::SurrealUserRepository;

use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

fn total(rows: &[CountRow]) -> u64 {
    rows.first().map(|r| r.total).unwrap_or(0)
}

fn parse_uuid(field: &str, value: &str) -> Result<Uuid, DbError> {
    Uuid::parse_str(value).map_err(|e| DbError::Conversion(format!("invalid {field} UUID: {e}")))
}
