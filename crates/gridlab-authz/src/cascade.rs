//! The permission cascade.

use gridlab_core::models::component::InfrastructureComponent;
use gridlab_core::models::resource::{ResourceInstance, ResourceKind};
use gridlab_core::models::scenario::Scenario;
use gridlab_core::models::user::User;
use gridlab_core::repository::ResourceLoader;
use tracing::debug;
use uuid::Uuid;

use crate::denial::Denial;
use crate::ownership::ownership;
use crate::policy::policy;
use crate::request::{Actor, Operation, Target};

pub const ROLE_NOT_PERMITTED: &str =
    "role not permitted for this operation on this resource kind";
pub const NO_SCENARIO_ACCESS: &str = "user has no access to scenario";
pub const USER_INACTIVE: &str = "user is not active";
pub const SCENARIO_LOCKED: &str = "scenario is locked";
pub const COMPONENT_MANAGED_EXTERNALLY: &str =
    "component is managed externally and cannot be changed directly";
pub const FOREIGN_USER: &str = "users may only access their own account";

/// Result of [`PermissionCascade::authorize`].
#[derive(Debug)]
pub enum Authorization {
    /// The loaded target when one was resolved, so callers need not load it
    /// again.
    Allowed(Option<ResourceInstance>),
    Denied(Denial),
}

impl Authorization {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Authorization::Allowed(_))
    }

    pub fn into_result(self) -> Result<Option<ResourceInstance>, Denial> {
        match self {
            Authorization::Allowed(instance) => Ok(instance),
            Authorization::Denied(denial) => Err(denial),
        }
    }
}

/// Authorizes operations by combining the role policy with a walk up the
/// ownership chain of the target record.
///
/// The cascade only reads from the store and holds no state of its own.
#[derive(Clone)]
pub struct PermissionCascade<L: ResourceLoader> {
    loader: L,
}

impl<L: ResourceLoader> PermissionCascade<L> {
    pub fn new(loader: L) -> Self {
        Self { loader }
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    /// Decide whether `actor` may perform `op` on `target` of `kind`.
    pub async fn authorize(
        &self,
        actor: &Actor,
        kind: ResourceKind,
        op: Operation,
        target: Target,
    ) -> Authorization {
        match self.check(actor, kind, op, target).await {
            Ok(instance) => Authorization::Allowed(instance),
            Err(denial) => {
                debug!(
                    user_id = %actor.user_id,
                    role = %actor.role,
                    kind = %kind,
                    operation = %op,
                    status = denial.status_code(),
                    reason = %denial.message,
                    "Authorization denied"
                );
                Authorization::Denied(denial)
            }
        }
    }

    async fn check(
        &self,
        actor: &Actor,
        kind: ResourceKind,
        op: Operation,
        target: Target,
    ) -> Result<Option<ResourceInstance>, Denial> {
        if !policy(&actor.role, kind, op) {
            return Err(Denial::unprocessable(ROLE_NOT_PERMITTED));
        }

        let id = match (op, target) {
            (Operation::Create, _) | (Operation::Read, Target::Collection) => return Ok(None),
            (_, Target::Collection) => {
                return Err(Denial::bad_request(format!("{op} on {kind} requires an id")));
            }
            (_, Target::Instance(id)) => id,
        };

        let instance = self.resolve(kind, id).await?;
        self.check_instance(actor, kind, op, &instance).await?;
        Ok(Some(instance))
    }

    async fn check_instance(
        &self,
        actor: &Actor,
        kind: ResourceKind,
        op: Operation,
        instance: &ResourceInstance,
    ) -> Result<(), Denial> {
        match instance {
            ResourceInstance::Scenario(scenario) => {
                return self.check_scenario(actor, op, scenario).await;
            }
            ResourceInstance::User(user) => return check_user(actor, user),
            ResourceInstance::InfrastructureComponent(component) => {
                return check_component(kind, op, component);
            }
            _ => {}
        }

        let mut child_kind = instance.kind();
        let mut parent_id = instance.owner_id();

        // Walk one link at a time, re-resolving every parent, until the
        // owning scenario is reached.
        loop {
            let link = ownership(child_kind)
                .ok_or_else(|| Denial::internal(format!("{child_kind} has no owner")))?;

            if link.read_skips_scenario && op == Operation::Read {
                return Ok(());
            }

            let id = parent_id.ok_or_else(|| {
                Denial::internal(format!("{child_kind} is missing {}", link.foreign_key))
            })?;

            let parent = self.resolve(link.parent, id).await?;
            if let ResourceInstance::Scenario(scenario) = &parent {
                return self.check_scenario(actor, op, scenario).await;
            }

            child_kind = parent.kind();
            parent_id = parent.owner_id();
        }
    }

    async fn check_scenario(
        &self,
        actor: &Actor,
        op: Operation,
        scenario: &Scenario,
    ) -> Result<(), Denial> {
        if actor.is_admin() {
            return Ok(());
        }

        let member = match self
            .loader
            .scenario_member(scenario.id, actor.user_id)
            .await
        {
            Ok(member) => member,
            Err(e) if e.is_not_found() => return Err(Denial::unprocessable(NO_SCENARIO_ACCESS)),
            Err(e) => return Err(Denial::internal(e.to_string())),
        };

        if !member.active {
            return Err(Denial::unprocessable(USER_INACTIVE));
        }

        if scenario.is_locked && op != Operation::Read {
            return Err(Denial::unprocessable(SCENARIO_LOCKED));
        }

        Ok(())
    }

    async fn resolve(&self, kind: ResourceKind, id: Uuid) -> Result<ResourceInstance, Denial> {
        self.loader
            .load(kind, id)
            .await
            .map_err(|e| Denial::from_load_error(kind, id, e))
    }
}

fn check_user(actor: &Actor, user: &User) -> Result<(), Denial> {
    if actor.is_admin() || actor.user_id == user.id {
        Ok(())
    } else {
        Err(Denial::unprocessable(FOREIGN_USER))
    }
}

fn check_component(
    kind: ResourceKind,
    op: Operation,
    component: &InfrastructureComponent,
) -> Result<(), Denial> {
    // Sending an action only needs the component to exist.
    if kind == ResourceKind::ComponentAction {
        return Ok(());
    }

    match op {
        Operation::Update | Operation::Delete if component.managed_externally => {
            Err(Denial::unprocessable(COMPONENT_MANAGED_EXTERNALLY))
        }
        _ => Ok(()),
    }
}
