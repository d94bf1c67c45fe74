//! The bus session seam.

use std::collections::BTreeMap;

use tokio::sync::mpsc;

use crate::error::BusError;

/// Message headers, e.g. the `uuid` a message is addressed to.
pub type Headers = BTreeMap<String, String>;

/// One message received from a queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub body: Vec<u8>,
    pub headers: Headers,
}

/// Receiving end of a queue. Yields deliveries in arrival order and ends
/// when the session disconnects.
#[derive(Debug)]
pub struct Subscription {
    queue: String,
    receiver: mpsc::UnboundedReceiver<Delivery>,
}

impl Subscription {
    pub fn new(queue: impl Into<String>, receiver: mpsc::UnboundedReceiver<Delivery>) -> Self {
        Self {
            queue: queue.into(),
            receiver,
        }
    }

    pub fn queue(&self) -> &str {
        &self.queue
    }

    /// The next delivery, or `None` once the subscription has ended.
    pub async fn next(&mut self) -> Option<Delivery> {
        self.receiver.recv().await
    }
}

/// A connection to the message bus.
///
/// Sessions are shared by handle; nothing in the workspace keeps a global
/// session.
pub trait BusSession: Send + Sync {
    /// Start consuming `queue`.
    fn subscribe(
        &self,
        queue: &str,
    ) -> impl Future<Output = Result<Subscription, BusError>> + Send;

    /// Publish `payload` to every queue bound to `exchange`.
    fn publish(
        &self,
        exchange: &str,
        payload: Vec<u8>,
        headers: Headers,
    ) -> impl Future<Output = Result<(), BusError>> + Send;

    fn is_connected(&self) -> bool;
}
