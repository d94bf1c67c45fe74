//! GridLab Authz: role policy and the permission cascade.
//!
//! Every request is first checked against a static role/kind policy. When
//! it targets an existing record, the record is loaded and its ownership
//! chain is walked up to the owning scenario, where membership, the
//! member's active flag and the scenario lock decide.

pub mod cascade;
pub mod denial;
pub mod ownership;
pub mod policy;
pub mod request;

pub use cascade::{Authorization, PermissionCascade};
pub use denial::{Denial, DenialStatus};
pub use request::{Actor, Operation, Target};
