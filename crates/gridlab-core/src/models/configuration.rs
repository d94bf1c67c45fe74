//! Component configuration domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Binds an infrastructure component into a scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentConfiguration {
    pub id: Uuid,
    pub scenario_id: Uuid,
    /// UUID of the referenced infrastructure component.
    pub ic_id: Uuid,
    pub name: String,
    pub start_parameters: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateConfiguration {
    pub scenario_id: Uuid,
    pub ic_id: Uuid,
    pub name: String,
    pub start_parameters: Option<serde_json::Value>,
}
