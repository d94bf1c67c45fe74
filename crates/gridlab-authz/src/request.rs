//! Inputs to an authorization decision.

use std::fmt;

use gridlab_core::models::user::UserRole;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::denial::Denial;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Create => "create",
            Operation::Read => "read",
            Operation::Update => "update",
            Operation::Delete => "delete",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The authenticated caller, as established by the upstream
/// authentication layer. The role is trusted verbatim.
#[derive(Debug, Clone)]
pub struct Actor {
    pub user_id: Uuid,
    pub role: String,
}

impl Actor {
    pub fn new(user_id: Uuid, role: impl Into<String>) -> Self {
        Self {
            user_id,
            role: role.into(),
        }
    }

    /// The parsed role, or `None` for a role this backend does not know.
    pub fn role(&self) -> Option<UserRole> {
        self.role.parse().ok()
    }

    pub fn is_admin(&self) -> bool {
        self.role() == Some(UserRole::Admin)
    }
}

/// What a request operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// The kind as a whole: listing, or creating a new record.
    Collection,
    /// One existing record.
    Instance(Uuid),
}

impl Target {
    /// Parse an id taken from a request path or body.
    pub fn parse(raw: &str) -> Result<Self, Denial> {
        Uuid::parse_str(raw.trim())
            .map(Target::Instance)
            .map_err(|_| Denial::bad_request(format!("invalid id: {raw:?}")))
    }

    pub fn id(&self) -> Option<Uuid> {
        match self {
            Target::Collection => None,
            Target::Instance(id) => Some(*id),
        }
    }
}
