//! Direct API operations on infrastructure components.
//!
//! Components that report over the bus belong to the reconciler; this
//! service only mutates the ones that do not.

use gridlab_bus::BusSession;
use gridlab_core::error::{GridlabError, GridlabResult};
use gridlab_core::models::component::{
    CreateComponent, InfrastructureComponent, UpdateComponent,
};
use gridlab_core::repository::{ComponentRepository, ConfigurationRepository};
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use crate::message::ComponentAction;
use crate::publisher::ActionPublisher;
use crate::sweep::GoneSweeper;

pub struct ComponentService<R, C, B>
where
    R: ComponentRepository + Clone,
    C: ConfigurationRepository,
    B: BusSession,
{
    components: R,
    configurations: C,
    publisher: ActionPublisher<B>,
    sweeper: GoneSweeper<R>,
}

impl<R, C, B> ComponentService<R, C, B>
where
    R: ComponentRepository + Clone,
    C: ConfigurationRepository,
    B: BusSession,
{
    pub fn new(components: R, configurations: C, publisher: ActionPublisher<B>) -> Self {
        Self {
            sweeper: GoneSweeper::new(components.clone()),
            components,
            configurations,
            publisher,
        }
    }

    /// Register a component that is not managed over the bus.
    pub async fn create(&self, input: CreateComponent) -> GridlabResult<InfrastructureComponent> {
        if input.managed_externally {
            return Err(managed_externally());
        }
        let created = self.components.create(input).await?;
        info!(uuid = %created.uuid, name = %created.name, "Created component");
        Ok(created)
    }

    pub async fn update(
        &self,
        uuid: Uuid,
        input: UpdateComponent,
    ) -> GridlabResult<InfrastructureComponent> {
        self.locally_managed(uuid).await?;
        self.components.update(uuid, input).await
    }

    /// Delete a locally managed component. Fails with
    /// [`GridlabError::DeletionPostponed`] while configurations reference
    /// it.
    pub async fn delete(&self, uuid: Uuid) -> GridlabResult<()> {
        self.locally_managed(uuid).await?;
        self.components.delete(uuid).await?;
        info!(%uuid, "Deleted component");
        Ok(())
    }

    /// Ask `manager` to bring up a new component. Nothing is stored here;
    /// the component is registered when it first reports its status.
    pub async fn request_managed_create(
        &self,
        manager: Uuid,
        properties: Value,
    ) -> GridlabResult<()> {
        self.components.get(manager).await?;
        self.publisher
            .send_action(manager, ComponentAction::create(properties))
            .await?;
        info!(%manager, "Requested component creation");
        Ok(())
    }

    /// Send an action to an existing component.
    pub async fn send_action(&self, uuid: Uuid, action: ComponentAction) -> GridlabResult<()> {
        self.components.get(uuid).await?;
        self.publisher.send_action(uuid, action).await?;
        Ok(())
    }

    /// Remove a configuration, then retry the deletion of the component it
    /// referenced in case that was postponed.
    pub async fn remove_configuration(&self, config_id: Uuid) -> GridlabResult<()> {
        let config = self.configurations.get_by_id(config_id).await?;
        self.configurations.delete(config_id).await?;

        if let Err(e) = self.sweeper.retry(config.ic_id).await {
            warn!(uuid = %config.ic_id, error = %e, "Retrying gone deletion failed");
        }
        Ok(())
    }

    async fn locally_managed(&self, uuid: Uuid) -> GridlabResult<InfrastructureComponent> {
        let component = self.components.get(uuid).await?;
        if component.managed_externally {
            return Err(managed_externally());
        }
        Ok(component)
    }
}

fn managed_externally() -> GridlabError {
    GridlabError::AuthorizationDenied {
        reason: "component is managed externally".into(),
    }
}
