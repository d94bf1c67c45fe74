//! Dashboard domain model.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dashboard {
    pub id: Uuid,
    pub scenario_id: Uuid,
    pub name: String,
    pub grid: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDashboard {
    pub scenario_id: Uuid,
    pub name: String,
    pub grid: u32,
}
