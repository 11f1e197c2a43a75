//! The complaint desk: the state machine at the center of the engine.
//!
//! Owns the store, the zone resolver, the live escalation settings, the
//! clock, and the notification sink. Every inbound action is authorized
//! through the table in `auth`, validated against the complaint's current
//! state, applied atomically, and recorded as exactly one timeline entry.
//!
//! RULES:
//!   - Closed is terminal: no status/progress mutation, comments allowed.
//!   - Progress never regresses.
//!   - Escalation is recomputed on every read; the cached level only
//!     decides whether to fire a notification.
//!   - Notification delivery is fire-and-forget: a sink failure is logged
//!     and never rolls back a committed change.

use crate::{
    auth::{authorize, Operation, Ownership},
    category,
    clock::Clock,
    complaint::{AttachmentRef, Category, Complaint, Location, Severity, Status, TimelineEntry},
    config::{EscalationSettings, StatsConfig, Topology},
    error::{DeskError, DeskResult},
    escalation::{self, EscalationLevel},
    notify::{NotificationKind, NotificationSink},
    stats::{self, DeskStats, StatsScope},
    store::DeskStore,
    types::{Role, ZoneId},
    zone::ZoneResolver,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Everything a citizen hands over at submission time. Category and
/// severity are optional: the keyword suggester fills a missing category
/// and severity defaults to medium.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitRequest {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub severity: Option<Severity>,
    pub address: String,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lng: Option<f64>,
    #[serde(default)]
    pub attachments: Vec<AttachmentRef>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct VoteOutcome {
    pub added: bool,
    pub count: i64,
}

pub struct ComplaintDesk {
    store: DeskStore,
    resolver: ZoneResolver,
    settings: EscalationSettings,
    stats_config: StatsConfig,
    clock: Box<dyn Clock>,
    sink: Box<dyn NotificationSink>,
}

impl ComplaintDesk {
    pub fn new(
        store: DeskStore,
        topology: Topology,
        settings: EscalationSettings,
        stats_config: StatsConfig,
        clock: Box<dyn Clock>,
        sink: Box<dyn NotificationSink>,
    ) -> DeskResult<Self> {
        settings.validate()?;
        topology.validate()?;
        Ok(Self {
            store,
            resolver: ZoneResolver::new(topology),
            settings,
            stats_config,
            clock,
            sink,
        })
    }

    // ── Inbound actions ────────────────────────────────────────────

    /// Create a complaint: status=pending, progress=0, one `submitted`
    /// timeline entry. Zone resolution is attempted once, here; a miss
    /// leaves zone/squad unset without failing the submission.
    pub fn submit(&self, citizen_id: &str, role: Role, req: SubmitRequest) -> DeskResult<Complaint> {
        authorize(Operation::Submit, role, Ownership::default())?;
        if req.title.trim().is_empty() || req.description.trim().is_empty() {
            return Err(DeskError::InvalidInput {
                reason: "title and description must be non-empty".into(),
            });
        }

        let category = req.category.unwrap_or_else(|| {
            let text = format!("{} {}", req.title, req.description);
            category::suggest(&text).unwrap_or(Category::Other)
        });

        let (zone_id, squad_id) = match (req.lat, req.lng) {
            (Some(lat), Some(lng)) => match self.resolver.resolve(lat, lng) {
                Some((z, s)) => (Some(z), Some(s)),
                None => {
                    log::debug!("no zone contains ({lat}, {lng}); leaving complaint unrouted");
                    (None, None)
                }
            },
            _ => (None, None),
        };

        let now = self.clock.now();
        let complaint = Complaint {
            complaint_id: Uuid::new_v4().to_string(),
            title: req.title,
            description: req.description,
            category,
            severity: req.severity.unwrap_or(Severity::Medium),
            status: Status::Pending,
            progress: 0,
            submitter_id: citizen_id.to_string(),
            assignee_id: None,
            location: Location {
                address: req.address,
                lat: req.lat,
                lng: req.lng,
                zone_id,
                squad_id,
            },
            attachments: req.attachments,
            resolution_evidence: Vec::new(),
            escalation_cached: EscalationLevel::Green,
            escalation_checked_at: Some(now),
            created_at: now,
            updated_at: now,
        };

        let entry = self.entry(&complaint.complaint_id, citizen_id, "submitted", None, vec![]);
        self.store.create_complaint(&complaint, &entry)?;
        log::info!(
            "complaint {} submitted by {citizen_id} category={} zone={:?}",
            complaint.complaint_id,
            complaint.category.as_str(),
            complaint.location.zone_id,
        );
        Ok(complaint)
    }

    /// Drive the status machine along one of its edges. Citizens never set
    /// status directly; officials act only on their own assignments.
    pub fn update_status(
        &self,
        actor_id: &str,
        role: Role,
        complaint_id: &str,
        new_status: Status,
        comment: Option<String>,
        evidence: Vec<AttachmentRef>,
    ) -> DeskResult<Complaint> {
        let mut complaint = self.store.get_complaint(complaint_id)?;
        authorize(Operation::UpdateStatus, role, self.ownership(&complaint, actor_id))?;

        if !complaint.status.can_transition_to(new_status) {
            return Err(DeskError::InvalidTransition {
                from: complaint.status,
                to: new_status,
            });
        }

        let from = complaint.status;
        complaint.status = new_status;
        if new_status == Status::Resolved {
            // Invariant: resolved <=> progress == 100.
            complaint.progress = 100;
            complaint.resolution_evidence.extend(evidence.clone());
        }
        complaint.updated_at = self.clock.now();

        let entry = self.entry(
            complaint_id,
            actor_id,
            new_status.as_str(),
            comment,
            evidence,
        );
        self.store.apply_update(&complaint, &entry)?;
        log::info!("complaint {complaint_id}: {} -> {} by {actor_id}", from.as_str(), new_status.as_str());

        match new_status {
            Status::Resolved => self.send(
                &complaint.submitter_id,
                NotificationKind::Resolution,
                &format!("your complaint '{}' has been resolved", complaint.title),
                complaint_id,
            ),
            Status::InProgress | Status::Closed => self.send(
                &complaint.submitter_id,
                NotificationKind::StatusUpdate,
                &format!("your complaint '{}' is now {}", complaint.title, new_status.as_str()),
                complaint_id,
            ),
            _ => {}
        }
        Ok(complaint)
    }

    /// Record work progress. Input is clamped to [0,100]; a value below
    /// the stored one is rejected, never silently overwritten. Reaching
    /// 100 resolves the complaint in the same call and notifies the
    /// submitter; partial progress on a pending complaint starts work.
    pub fn update_progress(
        &self,
        actor_id: &str,
        role: Role,
        complaint_id: &str,
        progress: i64,
        notes: Option<String>,
        evidence: Vec<AttachmentRef>,
    ) -> DeskResult<Complaint> {
        let mut complaint = self.store.get_complaint(complaint_id)?;
        authorize(Operation::UpdateProgress, role, self.ownership(&complaint, actor_id))?;

        if complaint.status == Status::Resolved || complaint.status == Status::Closed {
            return Err(DeskError::InvalidTransition {
                from: complaint.status,
                to: complaint.status,
            });
        }

        let requested = progress.clamp(0, 100) as u8;
        if requested < complaint.progress {
            return Err(DeskError::InvalidProgress {
                current: complaint.progress,
                requested,
            });
        }

        complaint.progress = requested;
        let resolved = requested >= 100;
        if resolved {
            complaint.status = Status::Resolved;
            complaint.resolution_evidence.extend(evidence.clone());
        } else if requested > 0 && complaint.status == Status::Pending {
            complaint.status = Status::InProgress;
        }
        complaint.updated_at = self.clock.now();

        let action = if resolved { "resolved" } else { "progress_updated" };
        let entry = self.entry(complaint_id, actor_id, action, notes, evidence);
        self.store.apply_update(&complaint, &entry)?;
        log::info!("complaint {complaint_id}: progress={requested} by {actor_id}");

        if resolved {
            self.send(
                &complaint.submitter_id,
                NotificationKind::Resolution,
                &format!("your complaint '{}' has been resolved", complaint.title),
                complaint_id,
            );
        }
        Ok(complaint)
    }

    /// Hand the complaint to a different official. Elevated roles only;
    /// status and progress are untouched.
    pub fn reassign(
        &self,
        actor_id: &str,
        role: Role,
        complaint_id: &str,
        new_assignee: &str,
    ) -> DeskResult<Complaint> {
        let mut complaint = self.store.get_complaint(complaint_id)?;
        authorize(Operation::Reassign, role, self.ownership(&complaint, actor_id))?;

        complaint.assignee_id = Some(new_assignee.to_string());
        complaint.updated_at = self.clock.now();

        let entry = self.entry(
            complaint_id,
            actor_id,
            "assigned",
            Some(format!("assigned to {new_assignee}")),
            vec![],
        );
        self.store.apply_update(&complaint, &entry)?;
        log::info!("complaint {complaint_id}: assigned to {new_assignee} by {actor_id}");
        Ok(complaint)
    }

    /// Toggle the caller's vote. A None actor is the anonymous public
    /// variant: it gets a synthetic one-shot identity, so it can never
    /// retract (or double-count) a previous anonymous vote.
    pub fn vote(&self, actor_id: Option<&str>, complaint_id: &str) -> DeskResult<VoteOutcome> {
        let voter = match actor_id {
            Some(id) => id.to_string(),
            None => format!("anon-{}", Uuid::new_v4()),
        };
        let (added, count) = self
            .store
            .toggle_vote(complaint_id, &voter, self.clock.now())?;
        log::debug!("complaint {complaint_id}: vote {} by {voter}, count={count}", if added { "added" } else { "removed" });
        Ok(VoteOutcome { added, count })
    }

    /// Append a comment. Allowed in every status, including closed; the
    /// timeline stays open even when the lifecycle is over.
    pub fn comment(
        &self,
        actor_id: &str,
        role: Role,
        complaint_id: &str,
        text: &str,
        evidence: Vec<AttachmentRef>,
    ) -> DeskResult<TimelineEntry> {
        let complaint = self.store.get_complaint(complaint_id)?;
        authorize(Operation::Comment, role, self.ownership(&complaint, actor_id))?;
        if text.trim().is_empty() {
            return Err(DeskError::InvalidInput {
                reason: "comment text must be non-empty".into(),
            });
        }
        let entry = self.entry(complaint_id, actor_id, "comment", Some(text.to_string()), evidence);
        self.store.append_timeline(&entry)
    }

    /// The submitter's only lever on a finished complaint: ask for it to
    /// be looked at again. Appends a timeline entry and notifies the
    /// responsible party; status is not changed.
    pub fn request_reopen(
        &self,
        actor_id: &str,
        role: Role,
        complaint_id: &str,
        reason: &str,
    ) -> DeskResult<TimelineEntry> {
        let complaint = self.store.get_complaint(complaint_id)?;
        authorize(Operation::RequestReopen, role, self.ownership(&complaint, actor_id))?;
        if complaint.status != Status::Resolved && complaint.status != Status::Closed {
            return Err(DeskError::InvalidInput {
                reason: format!(
                    "complaint is {}; only resolved or closed complaints can be reopened",
                    complaint.status.as_str()
                ),
            });
        }

        let entry = self.entry(
            complaint_id,
            actor_id,
            "reopen_requested",
            Some(reason.to_string()),
            vec![],
        );
        let stored = self.store.append_timeline(&entry)?;

        if let Some(target) = complaint
            .assignee_id
            .as_deref()
            .or(self.settings.auto_escalation_target.as_deref())
        {
            self.send(
                target,
                NotificationKind::ReopenRequested,
                &format!("reopen requested on '{}': {reason}", complaint.title),
                complaint_id,
            );
        }
        Ok(stored)
    }

    /// Manual routing for complaints that submitted outside every
    /// configured zone box.
    pub fn assign_zone(
        &self,
        actor_id: &str,
        role: Role,
        complaint_id: &str,
        zone_id: &ZoneId,
    ) -> DeskResult<Complaint> {
        let mut complaint = self.store.get_complaint(complaint_id)?;
        authorize(Operation::AssignZone, role, self.ownership(&complaint, actor_id))?;

        let zone = self
            .resolver
            .topology()
            .zone(zone_id)
            .ok_or_else(|| DeskError::not_found("zone", zone_id.clone()))?;
        complaint.location.zone_id = Some(zone.zone_id.clone());
        complaint.location.squad_id = Some(zone.squad_id.clone());
        complaint.updated_at = self.clock.now();

        let entry = self.entry(
            complaint_id,
            actor_id,
            "zone_assigned",
            Some(format!("routed to zone {zone_id}")),
            vec![],
        );
        self.store.apply_update(&complaint, &entry)?;
        Ok(complaint)
    }

    // ── Configuration ──────────────────────────────────────────────

    /// Admin-only. Takes effect on the next classification; existing
    /// timeline entries are never re-stamped.
    pub fn update_escalation_settings(
        &mut self,
        actor_id: &str,
        role: Role,
        settings: EscalationSettings,
    ) -> DeskResult<()> {
        authorize(Operation::UpdateSettings, role, Ownership::default())?;
        settings.validate()?;
        log::info!(
            "escalation settings updated by {actor_id}: yellow={} red={}",
            settings.yellow_threshold_days,
            settings.red_threshold_days,
        );
        self.settings = settings;
        Ok(())
    }

    /// Admin-only. Existing zone assignments are point-in-time decisions
    /// and stay as they are.
    pub fn replace_topology(
        &mut self,
        actor_id: &str,
        role: Role,
        topology: Topology,
    ) -> DeskResult<()> {
        authorize(Operation::ReplaceTopology, role, Ownership::default())?;
        topology.validate()?;
        log::info!(
            "topology replaced by {actor_id}: {} zones, {} squads",
            topology.zones.len(),
            topology.squads.len(),
        );
        self.resolver = ZoneResolver::new(topology);
        Ok(())
    }

    pub fn escalation_settings(&self) -> &EscalationSettings {
        &self.settings
    }

    pub fn topology(&self) -> &Topology {
        self.resolver.topology()
    }

    // ── Reads ──────────────────────────────────────────────────────

    /// Fetch one complaint with its escalation level freshly classified.
    /// An upward change against the cached level fires an escalation
    /// notification (once) when the settings ask for it.
    pub fn complaint(&self, complaint_id: &str) -> DeskResult<Complaint> {
        let complaint = self.store.get_complaint(complaint_id)?;
        self.refresh_escalation(complaint)
    }

    /// Complaints visible to a scope, each with a fresh escalation level.
    pub fn complaints_for(&self, scope: &StatsScope) -> DeskResult<Vec<Complaint>> {
        let complaints = match scope {
            StatsScope::All => self.store.all_complaints()?,
            StatsScope::SubmittedBy(user) => self.store.complaints_by_submitter(user)?,
            StatsScope::AssignedTo(user) => self.store.complaints_by_assignee(user)?,
        };
        complaints
            .into_iter()
            .map(|c| self.refresh_escalation(c))
            .collect()
    }

    pub fn timeline(&self, complaint_id: &str) -> DeskResult<Vec<TimelineEntry>> {
        self.store.list_timeline(complaint_id)
    }

    pub fn vote_count(&self, complaint_id: &str) -> DeskResult<i64> {
        self.store.vote_count(complaint_id)
    }

    /// Aggregate snapshot scoped by role: citizens see their own
    /// submissions, officials their assignments, elevated roles see all.
    pub fn stats(&self, actor_id: &str, role: Role) -> DeskResult<DeskStats> {
        let scope = StatsScope::for_role(role, actor_id);
        stats::compute(&self.store, &scope, &self.stats_config, self.clock.now())
    }

    // ── Internals ──────────────────────────────────────────────────

    fn ownership(&self, complaint: &Complaint, actor_id: &str) -> Ownership {
        Ownership {
            is_submitter: complaint.submitter_id == actor_id,
            is_assignee: complaint.assignee_id.as_deref() == Some(actor_id),
        }
    }

    fn entry(
        &self,
        complaint_id: &str,
        actor_id: &str,
        action: &str,
        comment: Option<String>,
        evidence: Vec<AttachmentRef>,
    ) -> TimelineEntry {
        TimelineEntry {
            complaint_id: complaint_id.to_string(),
            seq: 0, // assigned by the store
            action: action.to_string(),
            actor_id: actor_id.to_string(),
            comment,
            evidence,
            created_at: self.clock.now(),
        }
    }

    fn refresh_escalation(&self, mut complaint: Complaint) -> DeskResult<Complaint> {
        let now = self.clock.now();
        let level = escalation::classify(complaint.created_at, now, &self.settings)?;

        if level > complaint.escalation_cached {
            if self.settings.notify_on_escalation {
                if let Some(target) = complaint
                    .assignee_id
                    .as_deref()
                    .or(self.settings.auto_escalation_target.as_deref())
                {
                    self.send(
                        target,
                        NotificationKind::Escalation,
                        &format!(
                            "complaint '{}' escalated to {}",
                            complaint.title,
                            level.as_str()
                        ),
                        &complaint.complaint_id,
                    );
                } else {
                    log::warn!(
                        "complaint {} escalated to {} with no assignee or escalation target",
                        complaint.complaint_id,
                        level.as_str(),
                    );
                }
            }
            self.store
                .update_escalation_cache(&complaint.complaint_id, level, now)?;
        } else if complaint.escalation_checked_at.is_none() {
            self.store
                .update_escalation_cache(&complaint.complaint_id, level, now)?;
        }

        complaint.escalation_cached = level;
        complaint.escalation_checked_at = Some(now);
        Ok(complaint)
    }

    /// Fire-and-forget dispatch. The state change this follows is already
    /// committed; a sink failure must never surface to the caller.
    fn send(&self, user_id: &str, kind: NotificationKind, message: &str, complaint_id: &str) {
        if let Err(e) = self.sink.notify(user_id, kind, message, complaint_id) {
            log::warn!("notification sink failed for user={user_id} complaint={complaint_id}: {e}");
        }
    }

    /// Direct store access for tooling and tests.
    pub fn store(&self) -> &DeskStore {
        &self.store
    }
}
