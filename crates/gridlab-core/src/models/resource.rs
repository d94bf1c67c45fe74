//! Resource kinds and loaded resource instances.
//!
//! Used by the authorization layer to load any protected record through a
//! single entry point and to walk its ownership chain.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::component::InfrastructureComponent;
use super::configuration::ComponentConfiguration;
use super::dashboard::Dashboard;
use super::file::File;
use super::result::SimulationResult;
use super::scenario::Scenario;
use super::signal::Signal;
use super::user::User;
use super::widget::Widget;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    User,
    Scenario,
    ComponentConfiguration,
    Signal,
    Dashboard,
    Widget,
    File,
    Result,
    InfrastructureComponent,
    /// Sending an action (start, stop, ...) to an infrastructure component.
    ComponentAction,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::User => "user",
            ResourceKind::Scenario => "scenario",
            ResourceKind::ComponentConfiguration => "component_configuration",
            ResourceKind::Signal => "signal",
            ResourceKind::Dashboard => "dashboard",
            ResourceKind::Widget => "widget",
            ResourceKind::File => "file",
            ResourceKind::Result => "result",
            ResourceKind::InfrastructureComponent => "infrastructure_component",
            ResourceKind::ComponentAction => "component_action",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A protected record loaded from the store.
#[derive(Debug, Clone)]
pub enum ResourceInstance {
    User(User),
    Scenario(Scenario),
    ComponentConfiguration(ComponentConfiguration),
    Signal(Signal),
    Dashboard(Dashboard),
    Widget(Widget),
    File(File),
    Result(SimulationResult),
    InfrastructureComponent(InfrastructureComponent),
}

impl ResourceInstance {
    pub fn kind(&self) -> ResourceKind {
        match self {
            ResourceInstance::User(_) => ResourceKind::User,
            ResourceInstance::Scenario(_) => ResourceKind::Scenario,
            ResourceInstance::ComponentConfiguration(_) => ResourceKind::ComponentConfiguration,
            ResourceInstance::Signal(_) => ResourceKind::Signal,
            ResourceInstance::Dashboard(_) => ResourceKind::Dashboard,
            ResourceInstance::Widget(_) => ResourceKind::Widget,
            ResourceInstance::File(_) => ResourceKind::File,
            ResourceInstance::Result(_) => ResourceKind::Result,
            ResourceInstance::InfrastructureComponent(_) => ResourceKind::InfrastructureComponent,
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            ResourceInstance::User(u) => u.id,
            ResourceInstance::Scenario(s) => s.id,
            ResourceInstance::ComponentConfiguration(c) => c.id,
            ResourceInstance::Signal(s) => s.id,
            ResourceInstance::Dashboard(d) => d.id,
            ResourceInstance::Widget(w) => w.id,
            ResourceInstance::File(f) => f.id,
            ResourceInstance::Result(r) => r.id,
            ResourceInstance::InfrastructureComponent(ic) => ic.uuid,
        }
    }

    /// The id stored in the record's owning foreign key, if it has an owner.
    pub fn owner_id(&self) -> Option<Uuid> {
        match self {
            ResourceInstance::ComponentConfiguration(c) => Some(c.scenario_id),
            ResourceInstance::Signal(s) => Some(s.config_id),
            ResourceInstance::Dashboard(d) => Some(d.scenario_id),
            ResourceInstance::Widget(w) => Some(w.dashboard_id),
            ResourceInstance::File(f) => Some(f.scenario_id),
            ResourceInstance::Result(r) => Some(r.scenario_id),
            ResourceInstance::User(_)
            | ResourceInstance::Scenario(_)
            | ResourceInstance::InfrastructureComponent(_) => None,
        }
    }
}
