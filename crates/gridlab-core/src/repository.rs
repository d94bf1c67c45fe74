//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Every lookup distinguishes
//! [`GridlabError::NotFound`](crate::error::GridlabError::NotFound) from
//! other storage failures so callers can branch on absence.

use uuid::Uuid;

use crate::error::GridlabResult;
use crate::models::{
    component::{CreateComponent, InfrastructureComponent, UpdateComponent},
    configuration::{ComponentConfiguration, CreateConfiguration},
    dashboard::{CreateDashboard, Dashboard},
    file::{CreateFile, File},
    resource::{ResourceInstance, ResourceKind},
    result::{CreateSimulationResult, SimulationResult},
    scenario::{CreateScenario, Scenario, UpdateScenario},
    signal::{CreateSignal, Signal},
    user::{CreateUser, UpdateUser, User},
    widget::{CreateWidget, Widget},
};

/// Pagination parameters for list queries.
#[derive(Debug, Clone)]
pub struct Pagination {
    pub offset: u64,
    pub limit: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 50,
        }
    }
}

/// A paginated result set.
#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

// ---------------------------------------------------------------------------
// Infrastructure components
// ---------------------------------------------------------------------------

pub trait ComponentRepository: Send + Sync {
    fn create(
        &self,
        input: CreateComponent,
    ) -> impl Future<Output = GridlabResult<InfrastructureComponent>> + Send;
    fn get(&self, uuid: Uuid) -> impl Future<Output = GridlabResult<InfrastructureComponent>> + Send;
    /// Apply the present fields and stamp `state_updated_at`.
    fn update(
        &self,
        uuid: Uuid,
        input: UpdateComponent,
    ) -> impl Future<Output = GridlabResult<InfrastructureComponent>> + Send;
    /// Delete unless configurations still reference the component, in which
    /// case `DeletionPostponed` is returned and the row is left untouched.
    fn delete(&self, uuid: Uuid) -> impl Future<Output = GridlabResult<()>> + Send;
    /// Delete only if the component is in the `gone` state and nothing
    /// references it, checked in the same statement as the delete. Returns
    /// whether a row was removed.
    fn delete_if_gone(&self, uuid: Uuid) -> impl Future<Output = GridlabResult<bool>> + Send;
    /// Number of configurations referencing the component.
    fn count_configurations(&self, uuid: Uuid) -> impl Future<Output = GridlabResult<u64>> + Send;
    fn list(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = GridlabResult<PaginatedResult<InfrastructureComponent>>> + Send;
    fn list_by_state(
        &self,
        state: &str,
    ) -> impl Future<Output = GridlabResult<Vec<InfrastructureComponent>>> + Send;
}

// ---------------------------------------------------------------------------
// Users & scenarios
// ---------------------------------------------------------------------------

pub trait UserRepository: Send + Sync {
    fn create(&self, input: CreateUser) -> impl Future<Output = GridlabResult<User>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = GridlabResult<User>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateUser,
    ) -> impl Future<Output = GridlabResult<User>> + Send;
}

pub trait ScenarioRepository: Send + Sync {
    fn create(&self, input: CreateScenario) -> impl Future<Output = GridlabResult<Scenario>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = GridlabResult<Scenario>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateScenario,
    ) -> impl Future<Output = GridlabResult<Scenario>> + Send;
    fn delete(&self, id: Uuid) -> impl Future<Output = GridlabResult<()>> + Send;

    /// Grant a user access to a scenario (creates a `has_access` edge).
    fn add_user(
        &self,
        scenario_id: Uuid,
        user_id: Uuid,
    ) -> impl Future<Output = GridlabResult<()>> + Send;

    /// Revoke a user's access to a scenario.
    fn remove_user(
        &self,
        scenario_id: Uuid,
        user_id: Uuid,
    ) -> impl Future<Output = GridlabResult<()>> + Send;

    /// The associated user, or `NotFound` if the user has no access.
    fn get_member(
        &self,
        scenario_id: Uuid,
        user_id: Uuid,
    ) -> impl Future<Output = GridlabResult<User>> + Send;
}

// ---------------------------------------------------------------------------
// Scenario-owned records
// ---------------------------------------------------------------------------

pub trait ConfigurationRepository: Send + Sync {
    fn create(
        &self,
        input: CreateConfiguration,
    ) -> impl Future<Output = GridlabResult<ComponentConfiguration>> + Send;
    fn get_by_id(
        &self,
        id: Uuid,
    ) -> impl Future<Output = GridlabResult<ComponentConfiguration>> + Send;
    fn delete(&self, id: Uuid) -> impl Future<Output = GridlabResult<()>> + Send;
    fn list_by_scenario(
        &self,
        scenario_id: Uuid,
    ) -> impl Future<Output = GridlabResult<Vec<ComponentConfiguration>>> + Send;
}

pub trait SignalRepository: Send + Sync {
    fn create(&self, input: CreateSignal) -> impl Future<Output = GridlabResult<Signal>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = GridlabResult<Signal>> + Send;
    fn delete(&self, id: Uuid) -> impl Future<Output = GridlabResult<()>> + Send;
}

pub trait DashboardRepository: Send + Sync {
    fn create(
        &self,
        input: CreateDashboard,
    ) -> impl Future<Output = GridlabResult<Dashboard>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = GridlabResult<Dashboard>> + Send;
    fn delete(&self, id: Uuid) -> impl Future<Output = GridlabResult<()>> + Send;
}

pub trait WidgetRepository: Send + Sync {
    fn create(&self, input: CreateWidget) -> impl Future<Output = GridlabResult<Widget>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = GridlabResult<Widget>> + Send;
    fn delete(&self, id: Uuid) -> impl Future<Output = GridlabResult<()>> + Send;
}

pub trait FileRepository: Send + Sync {
    fn create(&self, input: CreateFile) -> impl Future<Output = GridlabResult<File>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = GridlabResult<File>> + Send;
    fn delete(&self, id: Uuid) -> impl Future<Output = GridlabResult<()>> + Send;
}

pub trait ResultRepository: Send + Sync {
    fn create(
        &self,
        input: CreateSimulationResult,
    ) -> impl Future<Output = GridlabResult<SimulationResult>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = GridlabResult<SimulationResult>> + Send;
    fn delete(&self, id: Uuid) -> impl Future<Output = GridlabResult<()>> + Send;
}

// ---------------------------------------------------------------------------
// Authorization lookups
// ---------------------------------------------------------------------------

/// Uniform read access to every protected record, used by the permission
/// cascade.
pub trait ResourceLoader: Send + Sync {
    /// Load a record of the given kind. `ComponentAction` resolves to the
    /// targeted infrastructure component.
    fn load(
        &self,
        kind: ResourceKind,
        id: Uuid,
    ) -> impl Future<Output = GridlabResult<ResourceInstance>> + Send;

    /// The user as associated with the scenario, or `NotFound`.
    fn scenario_member(
        &self,
        scenario_id: Uuid,
        user_id: Uuid,
    ) -> impl Future<Output = GridlabResult<User>> + Send;
}
