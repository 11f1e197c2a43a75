//! Shared primitive types used across the entire engine.

use serde::{Deserialize, Serialize};

/// A stable, unique identifier for any entity (user, complaint, zone, squad).
pub type EntityId = String;

/// Identity of a user as yielded by the authentication layer.
pub type UserId = String;

/// Identity of a complaint.
pub type ComplaintId = String;

/// Identity of a geographic zone.
pub type ZoneId = String;

/// Identity of a squad.
pub type SquadId = String;

/// The role attached to an authenticated request. Authentication itself is
/// an external concern: callers hand the engine a `(UserId, Role)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Citizen,
    Official,
    Supervisor,
    Admin,
}

impl Role {
    /// Supervisors and admins share the elevated-rights tier.
    pub fn is_elevated(self) -> bool {
        matches!(self, Role::Supervisor | Role::Admin)
    }
}
