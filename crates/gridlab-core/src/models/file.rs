//! File metadata. Blob contents are stored elsewhere.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct File {
    pub id: Uuid,
    pub scenario_id: Uuid,
    pub name: String,
    pub content_type: String,
    pub size: u64,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFile {
    pub scenario_id: Uuid,
    pub name: String,
    pub content_type: String,
    pub size: u64,
}
