//! In-process transport with fanout exchanges.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::error::BusError;
use crate::session::{BusSession, Delivery, Headers, Subscription};

/// A message as it was handed to [`BusSession::publish`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedMessage {
    pub exchange: String,
    pub body: Vec<u8>,
    pub headers: Headers,
}

struct Queue {
    sender: mpsc::UnboundedSender<Delivery>,
    /// Held until the first subscriber takes it; messages published before
    /// that are buffered in the channel.
    receiver: Option<mpsc::UnboundedReceiver<Delivery>>,
}

impl Queue {
    fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            sender,
            receiver: Some(receiver),
        }
    }
}

#[derive(Default)]
struct Topology {
    /// Exchange name to bound queue names.
    exchanges: HashMap<String, Vec<String>>,
    queues: HashMap<String, Queue>,
    published: Vec<PublishedMessage>,
}

/// Bus session backed by in-process channels.
///
/// Every exchange fans out to all queues bound to it. Each queue has a
/// single consumer. Published messages are recorded and can be inspected
/// with [`InMemoryBus::published`].
pub struct InMemoryBus {
    topology: Mutex<Topology>,
    connected: AtomicBool,
}

impl Default for InMemoryBus {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBus {
    pub fn new() -> Self {
        Self {
            topology: Mutex::new(Topology::default()),
            connected: AtomicBool::new(true),
        }
    }

    pub fn declare_exchange(&self, exchange: &str) {
        self.topology
            .lock()
            .exchanges
            .entry(exchange.to_string())
            .or_default();
    }

    /// Bind `queue` to `exchange`, declaring both if needed.
    pub fn bind(&self, queue: &str, exchange: &str) {
        let mut topology = self.topology.lock();
        topology
            .queues
            .entry(queue.to_string())
            .or_insert_with(Queue::new);
        let bound = topology.exchanges.entry(exchange.to_string()).or_default();
        if !bound.iter().any(|q| q == queue) {
            bound.push(queue.to_string());
        }
        debug!(queue, exchange, "Bound queue");
    }

    /// Every message published so far, oldest first.
    pub fn published(&self) -> Vec<PublishedMessage> {
        self.topology.lock().published.clone()
    }

    /// Drop the connection. Open subscriptions end after draining what
    /// they already received, and later calls fail with
    /// [`BusError::Disconnected`].
    pub fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
        let mut topology = self.topology.lock();
        topology.queues.clear();
        topology.exchanges.clear();
        info!("In-memory bus disconnected");
    }
}

impl BusSession for InMemoryBus {
    async fn subscribe(&self, queue: &str) -> Result<Subscription, BusError> {
        if !self.is_connected() {
            return Err(BusError::Disconnected);
        }

        let mut topology = self.topology.lock();
        let receiver = topology
            .queues
            .entry(queue.to_string())
            .or_insert_with(Queue::new)
            .receiver
            .take()
            .ok_or_else(|| BusError::Closed(queue.to_string()))?;

        debug!(queue, "Subscribed");
        Ok(Subscription::new(queue, receiver))
    }

    async fn publish(
        &self,
        exchange: &str,
        payload: Vec<u8>,
        headers: Headers,
    ) -> Result<(), BusError> {
        if !self.is_connected() {
            return Err(BusError::Disconnected);
        }

        let mut topology = self.topology.lock();
        let bound = topology
            .exchanges
            .get(exchange)
            .ok_or_else(|| BusError::UnknownExchange(exchange.to_string()))?;

        for queue in bound {
            let Some(target) = topology.queues.get(queue) else {
                continue;
            };
            let delivery = Delivery {
                body: payload.clone(),
                headers: headers.clone(),
            };
            if target.sender.send(delivery).is_err() {
                debug!(queue = %queue, "Consumer gone, message dropped");
            }
        }

        topology.published.push(PublishedMessage {
            exchange: exchange.to_string(),
            body: payload,
            headers,
        });
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}
