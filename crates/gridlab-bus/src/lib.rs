//! GridLab Bus: the publish/subscribe session used to talk to
//! infrastructure components.
//!
//! [`BusSession`] is the transport seam. [`InMemoryBus`] implements it
//! with named fanout exchanges and per-queue channels.

mod error;
mod memory;
mod session;

pub use error::BusError;
pub use memory::{InMemoryBus, PublishedMessage};
pub use session::{BusSession, Delivery, Headers, Subscription};
