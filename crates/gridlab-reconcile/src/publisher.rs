//! Outbound actions to infrastructure components.

use std::sync::Arc;

use gridlab_bus::{BusSession, Headers};
use tracing::debug;
use uuid::Uuid;

use crate::error::ReconcileError;
use crate::message::ComponentAction;

/// Publishes actions onto the components' exchange. A `uuid` header
/// addresses a single component; without it every component receives the
/// action.
pub struct ActionPublisher<B: BusSession> {
    bus: Arc<B>,
    exchange: String,
}

impl<B: BusSession> Clone for ActionPublisher<B> {
    fn clone(&self) -> Self {
        Self {
            bus: Arc::clone(&self.bus),
            exchange: self.exchange.clone(),
        }
    }
}

impl<B: BusSession> ActionPublisher<B> {
    pub fn new(bus: Arc<B>, exchange: impl Into<String>) -> Self {
        Self {
            bus,
            exchange: exchange.into(),
        }
    }

    pub fn bus(&self) -> &Arc<B> {
        &self.bus
    }

    /// Ask one component for a full status report.
    pub async fn send_ping(&self, uuid: Uuid) -> Result<(), ReconcileError> {
        self.send_action(uuid, ComponentAction::ping()).await
    }

    /// Ask every component for a full status report.
    pub async fn broadcast_ping(&self) -> Result<(), ReconcileError> {
        self.publish(ComponentAction::ping(), Headers::new()).await
    }

    pub async fn send_action(
        &self,
        uuid: Uuid,
        action: ComponentAction,
    ) -> Result<(), ReconcileError> {
        let mut headers = Headers::new();
        headers.insert("uuid".into(), uuid.to_string());
        self.publish(action, headers).await
    }

    async fn publish(&self, action: ComponentAction, headers: Headers) -> Result<(), ReconcileError> {
        let name = action.name.clone();
        let body = serde_json::to_vec(&action.into_message()).map_err(ReconcileError::Encode)?;

        self.bus.publish(&self.exchange, body, headers).await?;
        debug!(exchange = %self.exchange, action = %name, "Published action");
        Ok(())
    }
}
