//! The status consuming loop.

use gridlab_bus::{BusSession, Subscription};
use gridlab_core::repository::ComponentRepository;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::engine::Reconciler;

/// Why [`run_consumer`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumerExit {
    /// The shutdown token was cancelled.
    Shutdown,
    /// The subscription ended; reconnecting is up to the caller.
    Disconnected,
}

/// Feed every delivery on `subscription` through the reconciler, one at a
/// time, until shutdown or disconnect. A failing message never stops the
/// loop.
pub async fn run_consumer<R, B>(
    reconciler: &Reconciler<R, B>,
    mut subscription: Subscription,
    shutdown: CancellationToken,
) -> ConsumerExit
where
    R: ComponentRepository,
    B: BusSession,
{
    info!(queue = subscription.queue(), "Consuming component status");

    loop {
        let delivery = tokio::select! {
            biased;
            _ = shutdown.cancelled() => {
                info!("Status consumer shutting down");
                return ConsumerExit::Shutdown;
            }
            delivery = subscription.next() => delivery,
        };

        let Some(delivery) = delivery else {
            warn!(queue = subscription.queue(), "Status subscription ended");
            return ConsumerExit::Disconnected;
        };

        match reconciler.handle_message(&delivery.body).await {
            Ok(outcome) => debug!(?outcome, "Status message applied"),
            Err(e) if e.is_transient() => warn!(error = %e, "Dropped status message"),
            Err(e) => error!(error = %e, "Failed to apply status message"),
        }
    }
}
