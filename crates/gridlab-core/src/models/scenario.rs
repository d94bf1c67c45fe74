//! Scenario domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    /// A locked scenario only accepts reads from non-admin members.
    pub is_locked: bool,
    pub start_parameters: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateScenario {
    pub name: String,
    pub description: String,
    pub start_parameters: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateScenario {
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_locked: Option<bool>,
    pub start_parameters: Option<serde_json::Value>,
}
