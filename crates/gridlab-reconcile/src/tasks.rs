//! Cancellable periodic tasks.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Run `task` every `period` until `shutdown` is cancelled. The first run
/// happens immediately. A run that is still in progress when shutdown is
/// requested finishes first.
///
/// # Panics
///
/// Panics if `period` is zero.
pub fn spawn_periodic<F, Fut>(
    name: &'static str,
    period: Duration,
    shutdown: CancellationToken,
    mut task: F,
) -> JoinHandle<()>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => task().await,
            }
        }
        debug!(task = name, "Periodic task stopped");
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn runs_until_cancelled() {
        let runs = Arc::new(AtomicUsize::new(0));
        let shutdown = CancellationToken::new();

        let counter = Arc::clone(&runs);
        let handle = spawn_periodic("count", Duration::from_secs(10), shutdown.clone(), move || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });

        tokio::time::sleep(Duration::from_secs(25)).await;
        shutdown.cancel();
        handle.await.unwrap();

        // t = 0, 10, 20
        assert_eq!(runs.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_before_start_never_runs() {
        let runs = Arc::new(AtomicUsize::new(0));
        let shutdown = CancellationToken::new();
        shutdown.cancel();

        let counter = Arc::clone(&runs);
        spawn_periodic("never", Duration::from_secs(1), shutdown, move || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        })
        .await
        .unwrap();

        assert_eq!(runs.load(Ordering::SeqCst), 0);
    }
}
