//! Ownership descriptors for the scenario resource tree.

use gridlab_core::models::resource::ResourceKind;

/// One upward link in the ownership tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ownership {
    pub parent: ResourceKind,
    /// Field on the child that holds the parent id.
    pub foreign_key: &'static str,
    /// Reads stop at this link without consulting the scenario.
    pub read_skips_scenario: bool,
}

impl Ownership {
    const fn to(parent: ResourceKind, foreign_key: &'static str) -> Self {
        Self {
            parent,
            foreign_key,
            read_skips_scenario: false,
        }
    }
}

/// The parent link of `kind`, or `None` for scenarios and for kinds that
/// sit outside the scenario tree.
pub fn ownership(kind: ResourceKind) -> Option<Ownership> {
    match kind {
        ResourceKind::ComponentConfiguration => {
            Some(Ownership::to(ResourceKind::Scenario, "scenario_id"))
        }
        ResourceKind::Signal => Some(Ownership::to(
            ResourceKind::ComponentConfiguration,
            "config_id",
        )),
        ResourceKind::Dashboard => Some(Ownership::to(ResourceKind::Scenario, "scenario_id")),
        ResourceKind::Widget => Some(Ownership::to(ResourceKind::Dashboard, "dashboard_id")),
        ResourceKind::File => Some(Ownership {
            read_skips_scenario: true,
            ..Ownership::to(ResourceKind::Scenario, "scenario_id")
        }),
        ResourceKind::Result => Some(Ownership::to(ResourceKind::Scenario, "scenario_id")),
        ResourceKind::Scenario
        | ResourceKind::User
        | ResourceKind::InfrastructureComponent
        | ResourceKind::ComponentAction => None,
    }
}
