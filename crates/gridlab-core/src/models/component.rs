//! Infrastructure component domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::GridlabError;

/// State assigned when a component has not reported one yet.
pub const STATE_UNKNOWN: &str = "unknown";

/// Terminal state: the external component no longer exists.
pub const STATE_GONE: &str = "gone";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InfrastructureComponent {
    /// External identifier; also the record key.
    pub uuid: Uuid,
    pub name: String,
    pub category: String,
    pub component_type: String,
    pub location: String,
    pub description: String,
    pub websocket_url: String,
    pub api_url: String,
    pub state: String,
    /// Seconds since the component started, as last reported.
    pub uptime: f64,
    /// Set once at creation; externally managed components are only
    /// mutated through the message bus.
    pub managed_externally: bool,
    pub manager: Option<Uuid>,
    pub status_update_raw: serde_json::Value,
    pub start_parameter_schema: serde_json::Value,
    pub create_parameter_schema: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub state_updated_at: DateTime<Utc>,
}

impl InfrastructureComponent {
    pub fn is_gone(&self) -> bool {
        self.state == STATE_GONE
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateComponent {
    /// `None` lets the store generate a fresh UUID.
    pub uuid: Option<Uuid>,
    pub name: String,
    pub category: String,
    pub component_type: String,
    pub location: String,
    pub description: String,
    pub websocket_url: String,
    pub api_url: String,
    pub state: Option<String>,
    pub uptime: Option<f64>,
    pub managed_externally: bool,
    pub manager: Option<Uuid>,
    pub status_update_raw: Option<serde_json::Value>,
    pub start_parameter_schema: Option<serde_json::Value>,
    pub create_parameter_schema: Option<serde_json::Value>,
}

impl CreateComponent {
    /// A component needs at least a category and a type.
    pub fn validate(&self) -> Result<(), GridlabError> {
        require("category", &self.category)?;
        require("type", &self.component_type)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateComponent {
    pub name: Option<String>,
    pub category: Option<String>,
    pub component_type: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub websocket_url: Option<String>,
    pub api_url: Option<String>,
    pub state: Option<String>,
    pub uptime: Option<f64>,
    /// `Some(Some(id))` = set, `Some(None)` = clear, `None` = no change.
    pub manager: Option<Option<Uuid>>,
    pub status_update_raw: Option<serde_json::Value>,
    pub start_parameter_schema: Option<serde_json::Value>,
    pub create_parameter_schema: Option<serde_json::Value>,
}

impl UpdateComponent {
    /// Merging onto a valid record can only break it by blanking a
    /// required field.
    pub fn validate(&self) -> Result<(), GridlabError> {
        if let Some(category) = &self.category {
            require("category", category)?;
        }
        if let Some(component_type) = &self.component_type {
            require("type", component_type)?;
        }
        Ok(())
    }
}

fn require(field: &str, value: &str) -> Result<(), GridlabError> {
    if value.trim().is_empty() {
        return Err(GridlabError::validation(format!(
            "component {field} must not be empty"
        )));
    }
    Ok(())
}
