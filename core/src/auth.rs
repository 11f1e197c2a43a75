//! Authorization table.
//!
//! RULE: every mutating desk operation authorizes through this one table.
//! No call site checks role strings ad hoc; the `(operation, role,
//! ownership)` triple decides, in exactly one place.

use crate::{
    error::{DeskError, DeskResult},
    types::Role,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Submit,
    UpdateStatus,
    UpdateProgress,
    Reassign,
    Vote,
    Comment,
    RequestReopen,
    AssignZone,
    UpdateSettings,
    ReplaceTopology,
}

/// The actor's relationship to the complaint being acted on. Both false
/// for operations with no target complaint (submit, settings).
#[derive(Debug, Clone, Copy, Default)]
pub struct Ownership {
    pub is_submitter: bool,
    pub is_assignee: bool,
}

/// The single allow/deny table.
pub fn is_allowed(op: Operation, role: Role, own: Ownership) -> bool {
    use Operation::*;
    match (op, role) {
        (Submit, Role::Citizen) => true,
        (Submit, _) => false,

        // Citizens never set status directly; they comment or request
        // a reopen instead.
        (UpdateStatus, Role::Official) => own.is_assignee,
        (UpdateStatus, r) => r.is_elevated(),

        (UpdateProgress, Role::Official) => own.is_assignee,
        (UpdateProgress, r) => r.is_elevated(),

        (Reassign, r) => r.is_elevated(),

        (UpdateSettings, Role::Admin) | (ReplaceTopology, Role::Admin) => true,
        (UpdateSettings, _) | (ReplaceTopology, _) => false,

        // Any authenticated identity may vote; the anonymous variant is
        // handled upstream with a synthetic identity.
        (Vote, _) => true,

        (Comment, Role::Citizen) => own.is_submitter,
        (Comment, Role::Official) => own.is_assignee,
        (Comment, r) => r.is_elevated(),

        (RequestReopen, Role::Citizen) => own.is_submitter,
        (RequestReopen, _) => false,

        (AssignZone, Role::Citizen) => false,
        (AssignZone, _) => true,
    }
}

/// Check the table and fail with an actionable reason.
pub fn authorize(op: Operation, role: Role, own: Ownership) -> DeskResult<()> {
    if is_allowed(op, role, own) {
        return Ok(());
    }
    let reason = match op {
        Operation::Submit => "only citizens submit complaints",
        Operation::UpdateStatus => {
            "only the assigned official or a supervisor/admin may change status"
        }
        Operation::UpdateProgress => {
            "only the assigned official or a supervisor/admin may update progress"
        }
        Operation::Reassign => "only a supervisor or admin may reassign",
        Operation::Vote => "voting requires an identity",
        Operation::Comment => "only participants of a complaint may comment",
        Operation::RequestReopen => "only the submitter may request a reopen",
        Operation::AssignZone => "only officials may assign zones manually",
        Operation::UpdateSettings => "only an admin may change escalation settings",
        Operation::ReplaceTopology => "only an admin may replace the zone topology",
    };
    Err(DeskError::forbidden(reason))
}
