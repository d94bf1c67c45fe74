//! Wire format of messages exchanged with infrastructure components.
//!
//! Every optional field is an `Option`, so a field that was not sent is
//! never confused with one that was sent empty.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ReconcileError;

/// A status report (or command) received from the bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusMessage {
    /// Present on commands. Status reports leave it out.
    pub action: Option<String>,
    pub when: Option<f64>,
    /// Commands may leave this out entirely.
    #[serde(default)]
    pub properties: Properties,
    pub status: Option<Status>,
    pub schema: Option<Schema>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Properties {
    pub uuid: String,
    pub name: Option<String>,
    pub category: Option<String>,
    #[serde(rename = "type")]
    pub component_type: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub ws_url: Option<String>,
    pub api_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Status {
    pub state: Option<String>,
    pub version: Option<String>,
    pub uptime: Option<f64>,
    pub result: Option<Value>,
    pub error: Option<Value>,
    pub managed_by: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Schema {
    pub start: Option<Value>,
    pub create: Option<Value>,
}

impl StatusMessage {
    /// Decode a message body, returning the typed message together with
    /// the raw JSON it was read from.
    pub fn decode(body: &[u8]) -> Result<(Self, Value), ReconcileError> {
        let raw: Value = serde_json::from_slice(body)?;
        let message = Self::deserialize(&raw)?;
        Ok((message, raw))
    }

    pub fn is_command(&self) -> bool {
        self.action.as_deref().is_some_and(|a| !a.is_empty())
    }

    pub fn state(&self) -> Option<&str> {
        self.status.as_ref().and_then(|s| s.state.as_deref())
    }
}

/// An action addressed to a component.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentAction {
    pub name: String,
    pub parameters: Option<Value>,
}

impl ComponentAction {
    pub fn named(name: impl Into<String>, parameters: Option<Value>) -> Self {
        Self {
            name: name.into(),
            parameters,
        }
    }

    /// Ask for a full status report.
    pub fn ping() -> Self {
        Self::named("ping", None)
    }

    pub fn start(parameters: Value) -> Self {
        Self::named("start", Some(parameters))
    }

    pub fn stop() -> Self {
        Self::named("stop", None)
    }

    pub fn reset() -> Self {
        Self::named("reset", None)
    }

    pub fn shutdown() -> Self {
        Self::named("shutdown", None)
    }

    /// Ask a manager component to bring up a new component with the given
    /// properties.
    pub fn create(properties: Value) -> Self {
        Self::named("create", Some(properties))
    }

    pub(crate) fn into_message(self) -> ActionMessage {
        ActionMessage {
            action: self.name,
            when: Utc::now().timestamp(),
            parameters: self.parameters,
        }
    }
}

/// Outbound body of an action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionMessage {
    pub action: String,
    /// Unix time in seconds.
    pub when: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Value>,
}
