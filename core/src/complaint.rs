//! Complaint domain types: the central record, its audit timeline, and the
//! enums governing the lifecycle.
//!
//! RULE: a complaint is never physically deleted. Closure is a terminal
//! status, not a removal, and timeline entries are immutable once written.

use crate::escalation::EscalationLevel;
use crate::types::{ComplaintId, SquadId, UserId, ZoneId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Pending,
    InProgress,
    Resolved,
    Closed,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Pending => "pending",
            Status::InProgress => "in_progress",
            Status::Resolved => "resolved",
            Status::Closed => "closed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Status::Pending),
            "in_progress" => Some(Status::InProgress),
            "resolved" => Some(Status::Resolved),
            "closed" => Some(Status::Closed),
            _ => None,
        }
    }

    /// The exact state-machine edges. Closed is terminal; nothing reopens
    /// a closed complaint through the normal surface.
    pub fn can_transition_to(self, to: Status) -> bool {
        matches!(
            (self, to),
            (Status::Pending, Status::InProgress)
                | (Status::InProgress, Status::Resolved)
                | (Status::Pending, Status::Closed)
                | (Status::InProgress, Status::Closed)
                | (Status::Resolved, Status::Closed)
        )
    }

    pub fn is_terminal(self) -> bool {
        self == Status::Closed
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Roads,
    WaterSupply,
    Electricity,
    Sanitation,
    StreetLighting,
    PublicSafety,
    Other,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Roads,
        Category::WaterSupply,
        Category::Electricity,
        Category::Sanitation,
        Category::StreetLighting,
        Category::PublicSafety,
        Category::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Roads => "roads",
            Category::WaterSupply => "water_supply",
            Category::Electricity => "electricity",
            Category::Sanitation => "sanitation",
            Category::StreetLighting => "street_lighting",
            Category::PublicSafety => "public_safety",
            Category::Other => "other",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Category::ALL.into_iter().find(|c| c.as_str() == s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "low" => Some(Severity::Low),
            "medium" => Some(Severity::Medium),
            "high" => Some(Severity::High),
            "critical" => Some(Severity::Critical),
            _ => None,
        }
    }
}

/// Opaque handle into the external attachment store. The engine never
/// interprets file bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentRef {
    pub filename: String,
    pub content_type: String,
    pub storage_path: String,
}

/// Where the citizen says the problem is. Coordinates are optional; zone
/// and squad are filled by the resolver at submission time (or later by
/// hand) and are a point-in-time decision.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Location {
    pub address: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub zone_id: Option<ZoneId>,
    pub squad_id: Option<SquadId>,
}

/// One immutable audit record. `seq` is per-complaint insertion order;
/// `created_at` is server-assigned and monotonic non-decreasing within
/// a complaint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub complaint_id: ComplaintId,
    pub seq: i64,
    pub action: String,
    pub actor_id: UserId,
    pub comment: Option<String>,
    pub evidence: Vec<AttachmentRef>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Complaint {
    pub complaint_id: ComplaintId,
    pub title: String,
    pub description: String,
    pub category: Category,
    pub severity: Severity,
    pub status: Status,
    pub progress: u8,
    pub submitter_id: UserId,
    pub assignee_id: Option<UserId>,
    pub location: Location,
    pub attachments: Vec<AttachmentRef>,
    pub resolution_evidence: Vec<AttachmentRef>,
    /// Last classified level. Cache for change detection only; display
    /// always recomputes from age and live settings.
    pub escalation_cached: EscalationLevel,
    pub escalation_checked_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
