//! SurrealDB implementation of [`ResourceLoader`], dispatching each
//! resource kind to its repository.

use gridlab_core::error::GridlabResult;
use gridlab_core::models::resource::{ResourceInstance, ResourceKind};
use gridlab_core::models::user::User;
use gridlab_core::repository::{
    ComponentRepository, ConfigurationRepository, DashboardRepository, FileRepository,
    ResourceLoader, ResultRepository, ScenarioRepository, SignalRepository, UserRepository,
    WidgetRepository,
};
use surrealdb::{Connection, Surreal};
use uuid::Uuid;

use super::{
    SurrealComponentRepository, SurrealConfigurationRepository, SurrealDashboardRepository,
    SurrealFileRepository, SurrealResultRepository, SurrealScenarioRepository,
    SurrealSignalRepository, SurrealUserRepository, SurrealWidgetRepository,
};

/// Loads any protected record from SurrealDB.
#[derive(Clone)]
pub struct SurrealResourceLoader<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealResourceLoader<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> ResourceLoader for SurrealResourceLoader<C> {
    async fn load(&self, kind: ResourceKind, id: Uuid) -> GridlabResult<ResourceInstance> {
        let db = self.db.clone();
        let instance = match kind {
            ResourceKind::User => {
                ResourceInstance::User(SurrealUserRepository::new(db).get_by_id(id).await?)
            }
            ResourceKind::Scenario => ResourceInstance::Scenario(
                SurrealScenarioRepository::new(db).get_by_id(id).await?,
            ),
            ResourceKind::ComponentConfiguration => ResourceInstance::ComponentConfiguration(
                SurrealConfigurationRepository::new(db).get_by_id(id).await?,
            ),
            ResourceKind::Signal => {
                ResourceInstance::Signal(SurrealSignalRepository::new(db).get_by_id(id).await?)
            }
            ResourceKind::Dashboard => ResourceInstance::Dashboard(
                SurrealDashboardRepository::new(db).get_by_id(id).await?,
            ),
            ResourceKind::Widget => {
                ResourceInstance::Widget(SurrealWidgetRepository::new(db).get_by_id(id).await?)
            }
            ResourceKind::File => {
                ResourceInstance::File(SurrealFileRepository::new(db).get_by_id(id).await?)
            }
            ResourceKind::Result => {
                ResourceInstance::Result(SurrealResultRepository::new(db).get_by_id(id).await?)
            }
            ResourceKind::InfrastructureComponent | ResourceKind::ComponentAction => {
                ResourceInstance::InfrastructureComponent(
                    SurrealComponentRepository::new(db).get(id).await?,
                )
            }
        };
        Ok(instance)
    }

    async fn scenario_member(&self, scenario_id: Uuid, user_id: Uuid) -> GridlabResult<User> {
        SurrealScenarioRepository::new(self.db.clone())
            .get_member(scenario_id, user_id)
            .await
    }
}
