//! GridLab Reconcile: keeps the infrastructure component registry in
//! step with status reports arriving over the message bus.
//!
//! - [`Reconciler`] applies one status message to the store.
//! - [`run_consumer`] feeds a subscription into the reconciler, one
//!   message at a time.
//! - [`ActionPublisher`] sends pings and actions to components.
//! - [`ComponentService`] is the direct API path for components that are
//!   not managed over the bus.
//! - [`GoneSweeper`] and [`spawn_periodic`] retry postponed deletions and
//!   drive periodic work.

pub mod consumer;
pub mod engine;
pub mod error;
pub mod message;
pub mod publisher;
pub mod service;
pub mod sweep;
pub mod tasks;

pub use consumer::{ConsumerExit, run_consumer};
pub use engine::{Outcome, Reconciler};
pub use error::ReconcileError;
pub use message::{ComponentAction, StatusMessage};
pub use publisher::ActionPublisher;
pub use service::ComponentService;
pub use sweep::{GoneSweeper, SweepReport};
pub use tasks::spawn_periodic;
