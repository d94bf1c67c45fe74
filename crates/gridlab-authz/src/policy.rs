//! Static role/kind policy table.
//!
//! The table only answers whether a role may perform an operation on a
//! kind at all. Per-record state is checked by the cascade.

use gridlab_core::models::resource::ResourceKind;
use gridlab_core::models::user::UserRole;

use crate::request::Operation;

/// Allowed operations for one (role, kind) cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Permissions {
    pub create: bool,
    pub read: bool,
    pub update: bool,
    pub delete: bool,
}

impl Permissions {
    pub const NONE: Self = Self::new(false, false, false, false);
    pub const READ: Self = Self::new(false, true, false, false);
    pub const READ_UPDATE: Self = Self::new(false, true, true, false);
    pub const ALL: Self = Self::new(true, true, true, true);

    const fn new(create: bool, read: bool, update: bool, delete: bool) -> Self {
        Self {
            create,
            read,
            update,
            delete,
        }
    }

    pub fn allows(&self, op: Operation) -> bool {
        match op {
            Operation::Create => self.create,
            Operation::Read => self.read,
            Operation::Update => self.update,
            Operation::Delete => self.delete,
        }
    }
}

/// The table cell for a known role.
pub fn permissions(role: UserRole, kind: ResourceKind) -> Permissions {
    use ResourceKind as K;

    match (role, kind) {
        (UserRole::Admin, _) => Permissions::ALL,

        (UserRole::User, K::User) => Permissions::READ_UPDATE,
        (UserRole::User, K::InfrastructureComponent) => Permissions::READ,
        (UserRole::User, K::ComponentAction) => Permissions::READ_UPDATE,
        (
            UserRole::User,
            K::Scenario
            | K::ComponentConfiguration
            | K::Signal
            | K::Dashboard
            | K::Widget
            | K::File
            | K::Result,
        ) => Permissions::ALL,

        (UserRole::Guest, K::User) => Permissions::READ_UPDATE,
        (UserRole::Guest, _) => Permissions::READ,

        (UserRole::Download, K::File) => Permissions::READ,
        (UserRole::Download, _) => Permissions::NONE,
    }
}

/// Whether `role` may perform `op` on `kind`. Unknown roles may do
/// nothing.
pub fn policy(role: &str, kind: ResourceKind, op: Operation) -> bool {
    role.parse::<UserRole>()
        .map(|role| permissions(role, kind).allows(op))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_KINDS: [ResourceKind; 10] = [
        ResourceKind::User,
        ResourceKind::Scenario,
        ResourceKind::ComponentConfiguration,
        ResourceKind::Signal,
        ResourceKind::Dashboard,
        ResourceKind::Widget,
        ResourceKind::File,
        ResourceKind::Result,
        ResourceKind::InfrastructureComponent,
        ResourceKind::ComponentAction,
    ];

    const ALL_OPS: [Operation; 4] = [
        Operation::Create,
        Operation::Read,
        Operation::Update,
        Operation::Delete,
    ];

    #[test]
    fn admin_may_do_everything() {
        for kind in ALL_KINDS {
            for op in ALL_OPS {
                assert!(policy("Admin", kind, op), "Admin {op} {kind}");
            }
        }
    }

    #[test]
    fn unknown_role_may_do_nothing() {
        for kind in ALL_KINDS {
            for op in ALL_OPS {
                assert!(!policy("root", kind, op));
                assert!(!policy("admin", kind, op));
            }
        }
    }

    #[test]
    fn guest_is_read_only_except_own_user() {
        assert!(!policy("Guest", ResourceKind::Scenario, Operation::Create));
        assert!(policy("Guest", ResourceKind::Scenario, Operation::Read));
        assert!(!policy("Guest", ResourceKind::Signal, Operation::Update));
        assert!(policy("Guest", ResourceKind::User, Operation::Update));
        assert!(!policy("Guest", ResourceKind::User, Operation::Delete));
    }

    #[test]
    fn user_cannot_mutate_components_directly() {
        assert!(policy("User", ResourceKind::InfrastructureComponent, Operation::Read));
        for op in [Operation::Create, Operation::Update, Operation::Delete] {
            assert!(!policy("User", ResourceKind::InfrastructureComponent, op));
        }
        assert!(policy("User", ResourceKind::ComponentAction, Operation::Update));
        assert!(!policy("User", ResourceKind::User, Operation::Create));
    }

    #[test]
    fn download_role_only_reads_files() {
        for kind in ALL_KINDS {
            for op in ALL_OPS {
                let expected = kind == ResourceKind::File && op == Operation::Read;
                assert_eq!(policy("Download", kind, op), expected, "Download {op} {kind}");
            }
        }
    }
}
