use super::{enum_from_sql, json_from_sql, ts_from_sql, ts_to_sql, DeskStore};
use crate::{
    complaint::{Category, Complaint, Location, Severity, Status, TimelineEntry},
    error::{DeskError, DeskResult},
    escalation::EscalationLevel,
};
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};

fn complaint_row_mapper(row: &rusqlite::Row<'_>) -> rusqlite::Result<Complaint> {
    let category_raw: String = row.get(3)?;
    let severity_raw: String = row.get(4)?;
    let status_raw: String = row.get(5)?;
    let attachments_raw: String = row.get(14)?;
    let evidence_raw: String = row.get(15)?;
    let level_raw: String = row.get(16)?;
    let checked_raw: Option<String> = row.get(17)?;
    let created_raw: String = row.get(18)?;
    let updated_raw: String = row.get(19)?;

    Ok(Complaint {
        complaint_id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        category: enum_from_sql(3, &category_raw, Category::parse(&category_raw))?,
        severity: enum_from_sql(4, &severity_raw, Severity::parse(&severity_raw))?,
        status: enum_from_sql(5, &status_raw, Status::parse(&status_raw))?,
        progress: row.get::<_, i64>(6)? as u8,
        submitter_id: row.get(7)?,
        assignee_id: row.get(8)?,
        location: Location {
            address: row.get(9)?,
            lat: row.get(10)?,
            lng: row.get(11)?,
            zone_id: row.get(12)?,
            squad_id: row.get(13)?,
        },
        attachments: json_from_sql(14, &attachments_raw)?,
        resolution_evidence: json_from_sql(15, &evidence_raw)?,
        escalation_cached: enum_from_sql(16, &level_raw, EscalationLevel::parse(&level_raw))?,
        escalation_checked_at: checked_raw.as_deref().map(|s| ts_from_sql(17, s)).transpose()?,
        created_at: ts_from_sql(18, &created_raw)?,
        updated_at: ts_from_sql(19, &updated_raw)?,
    })
}

const COMPLAINT_COLUMNS: &str = "complaint_id, title, description, category, severity, status,
        progress, submitter_id, assignee_id, address, lat, lng, zone_id, squad_id,
        attachments, resolution_evidence, escalation_cached, escalation_checked_at,
        created_at, updated_at";

impl DeskStore {
    // ── Complaint ──────────────────────────────────────────────────

    /// Insert a fresh complaint together with its submission timeline
    /// entry, atomically.
    pub fn create_complaint(&self, c: &Complaint, entry: &TimelineEntry) -> DeskResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO complaint (
                complaint_id, title, description, category, severity, status,
                progress, submitter_id, assignee_id, address, lat, lng, zone_id, squad_id,
                attachments, resolution_evidence, escalation_cached, escalation_checked_at,
                created_at, updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14,
                       ?15, ?16, ?17, ?18, ?19, ?20)",
            params![
                &c.complaint_id,
                &c.title,
                &c.description,
                c.category.as_str(),
                c.severity.as_str(),
                c.status.as_str(),
                c.progress as i64,
                &c.submitter_id,
                c.assignee_id.as_deref(),
                &c.location.address,
                c.location.lat,
                c.location.lng,
                c.location.zone_id.as_deref(),
                c.location.squad_id.as_deref(),
                serde_json::to_string(&c.attachments)?,
                serde_json::to_string(&c.resolution_evidence)?,
                c.escalation_cached.as_str(),
                c.escalation_checked_at.as_ref().map(ts_to_sql),
                ts_to_sql(&c.created_at),
                ts_to_sql(&c.updated_at),
            ],
        )?;
        Self::append_entry_on(&tx, entry)?;
        tx.commit()?;
        Ok(())
    }

    pub fn get_complaint(&self, complaint_id: &str) -> DeskResult<Complaint> {
        let sql = format!("SELECT {COMPLAINT_COLUMNS} FROM complaint WHERE complaint_id = ?1");
        self.conn
            .query_row(&sql, params![complaint_id], complaint_row_mapper)
            .optional()?
            .ok_or_else(|| DeskError::not_found("complaint", complaint_id))
    }

    pub fn complaint_exists(&self, complaint_id: &str) -> DeskResult<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM complaint WHERE complaint_id = ?1",
            params![complaint_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Write back every mutable field of the complaint and append the
    /// timeline entry describing the change, in one transaction.
    pub fn apply_update(&self, c: &Complaint, entry: &TimelineEntry) -> DeskResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        let changed = tx.execute(
            "UPDATE complaint SET
                status = ?1, progress = ?2, assignee_id = ?3, category = ?4,
                severity = ?5, zone_id = ?6, squad_id = ?7,
                resolution_evidence = ?8, updated_at = ?9
             WHERE complaint_id = ?10",
            params![
                c.status.as_str(),
                c.progress as i64,
                c.assignee_id.as_deref(),
                c.category.as_str(),
                c.severity.as_str(),
                c.location.zone_id.as_deref(),
                c.location.squad_id.as_deref(),
                serde_json::to_string(&c.resolution_evidence)?,
                ts_to_sql(&c.updated_at),
                &c.complaint_id,
            ],
        )?;
        if changed == 0 {
            return Err(DeskError::not_found("complaint", &c.complaint_id));
        }
        Self::append_entry_on(&tx, entry)?;
        tx.commit()?;
        Ok(())
    }

    /// Change-detection cache only; never a source of truth for display,
    /// so no timeline entry is written.
    pub fn update_escalation_cache(
        &self,
        complaint_id: &str,
        level: EscalationLevel,
        checked_at: DateTime<Utc>,
    ) -> DeskResult<()> {
        self.conn.execute(
            "UPDATE complaint SET escalation_cached = ?1, escalation_checked_at = ?2
             WHERE complaint_id = ?3",
            params![level.as_str(), ts_to_sql(&checked_at), complaint_id],
        )?;
        Ok(())
    }

    // ── Listings ───────────────────────────────────────────────────

    pub fn all_complaints(&self) -> DeskResult<Vec<Complaint>> {
        let sql = format!("SELECT {COMPLAINT_COLUMNS} FROM complaint ORDER BY created_at ASC");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], complaint_row_mapper)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn complaints_by_submitter(&self, submitter_id: &str) -> DeskResult<Vec<Complaint>> {
        let sql = format!(
            "SELECT {COMPLAINT_COLUMNS} FROM complaint
             WHERE submitter_id = ?1 ORDER BY created_at ASC"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![submitter_id], complaint_row_mapper)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn complaints_by_assignee(&self, assignee_id: &str) -> DeskResult<Vec<Complaint>> {
        let sql = format!(
            "SELECT {COMPLAINT_COLUMNS} FROM complaint
             WHERE assignee_id = ?1 ORDER BY created_at ASC"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![assignee_id], complaint_row_mapper)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn complaint_count(&self) -> DeskResult<i64> {
        self.conn
            .query_row("SELECT COUNT(*) FROM complaint", [], |row| row.get(0))
            .map_err(Into::into)
    }
}
