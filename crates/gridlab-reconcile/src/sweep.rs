//! Retrying deletions that were postponed while a component was still
//! referenced.

use gridlab_core::error::GridlabResult;
use gridlab_core::models::component::STATE_GONE;
use gridlab_core::repository::ComponentRepository;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Counts from one [`GoneSweeper::sweep`] pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub deleted: usize,
    pub postponed: usize,
}

#[derive(Clone)]
pub struct GoneSweeper<R: ComponentRepository> {
    components: R,
}

impl<R: ComponentRepository> GoneSweeper<R> {
    pub fn new(components: R) -> Self {
        Self { components }
    }

    /// Delete `uuid` if it is in the gone state and nothing references it
    /// any more. Returns whether the row was removed.
    ///
    /// State and references are checked by the delete itself, so a
    /// component revived by a status report in the meantime is kept.
    pub async fn retry(&self, uuid: Uuid) -> GridlabResult<bool> {
        let removed = self.components.delete_if_gone(uuid).await?;
        if removed {
            info!(%uuid, "Removed gone component");
        } else {
            debug!(%uuid, "Component not removed");
        }
        Ok(removed)
    }

    /// Retry every gone component. A failure on one component is logged
    /// and the pass continues.
    pub async fn sweep(&self) -> GridlabResult<SweepReport> {
        let gone = self.components.list_by_state(STATE_GONE).await?;
        let mut report = SweepReport::default();

        for component in gone {
            match self.retry(component.uuid).await {
                Ok(true) => report.deleted += 1,
                Ok(false) => report.postponed += 1,
                Err(e) => warn!(uuid = %component.uuid, error = %e, "Gone sweep failed"),
            }
        }

        if report.deleted > 0 {
            info!(
                deleted = report.deleted,
                postponed = report.postponed,
                "Gone sweep finished"
            );
        }
        Ok(report)
    }
}
