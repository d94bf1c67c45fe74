//! Signal domain model.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SignalDirection {
    In,
    Out,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signal {
    pub id: Uuid,
    pub config_id: Uuid,
    pub name: String,
    pub unit: String,
    pub index: u32,
    pub direction: SignalDirection,
    pub scaling_factor: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSignal {
    pub config_id: Uuid,
    pub name: String,
    pub unit: String,
    pub index: u32,
    pub direction: SignalDirection,
    pub scaling_factor: Option<f64>,
}
