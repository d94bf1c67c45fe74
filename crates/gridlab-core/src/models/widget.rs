//! Widget domain model. Layout properties are opaque to the backend.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Widget {
    pub id: Uuid,
    pub dashboard_id: Uuid,
    pub name: String,
    pub widget_type: String,
    pub custom_properties: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateWidget {
    pub dashboard_id: Uuid,
    pub name: String,
    pub widget_type: String,
    pub custom_properties: Option<serde_json::Value>,
}
