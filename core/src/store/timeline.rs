use super::{json_from_sql, ts_from_sql, ts_to_sql, DeskStore};
use crate::{
    complaint::TimelineEntry,
    error::{DeskError, DeskResult},
};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

fn entry_row_mapper(row: &rusqlite::Row<'_>) -> rusqlite::Result<TimelineEntry> {
    let evidence_raw: String = row.get(5)?;
    let created_raw: String = row.get(6)?;
    Ok(TimelineEntry {
        complaint_id: row.get(0)?,
        seq: row.get(1)?,
        action: row.get(2)?,
        actor_id: row.get(3)?,
        comment: row.get(4)?,
        evidence: json_from_sql(5, &evidence_raw)?,
        created_at: ts_from_sql(6, &created_raw)?,
    })
}

impl DeskStore {
    // ── Timeline ───────────────────────────────────────────────────
    //
    // Append-only. There is deliberately no update or delete here.

    /// Append on an existing connection/transaction. Assigns the next seq
    /// and stamps `created_at` as max(now, previous entry's timestamp) so
    /// timestamps never run backwards within a complaint.
    pub(super) fn append_entry_on(
        conn: &Connection,
        entry: &TimelineEntry,
    ) -> DeskResult<TimelineEntry> {
        let last: Option<(i64, String)> = conn
            .query_row(
                "SELECT seq, created_at FROM timeline_entry
                 WHERE complaint_id = ?1 ORDER BY seq DESC LIMIT 1",
                params![&entry.complaint_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let (seq, floor) = match last {
            Some((prev_seq, raw)) => (prev_seq + 1, Some(ts_from_sql(1, &raw)?)),
            None => (1, None),
        };
        let created_at = match floor {
            Some(f) if f > entry.created_at => f,
            _ => entry.created_at,
        };

        conn.execute(
            "INSERT INTO timeline_entry
                (complaint_id, seq, action, actor_id, comment, evidence, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                &entry.complaint_id,
                seq,
                &entry.action,
                &entry.actor_id,
                entry.comment.as_deref(),
                serde_json::to_string(&entry.evidence)?,
                ts_to_sql(&created_at),
            ],
        )?;

        Ok(TimelineEntry {
            seq,
            created_at,
            ..entry.clone()
        })
    }

    /// Standalone append (comments, reopen requests). Fails with NotFound
    /// when the complaint does not exist.
    pub fn append_timeline(&self, entry: &TimelineEntry) -> DeskResult<TimelineEntry> {
        if !self.complaint_exists(&entry.complaint_id)? {
            return Err(DeskError::not_found("complaint", &entry.complaint_id));
        }
        let tx = self.conn.unchecked_transaction()?;
        let stored = Self::append_entry_on(&tx, entry)?;
        tx.commit()?;
        Ok(stored)
    }

    /// All entries in append order. Restartable: re-reading yields the
    /// same sequence until a new append occurs.
    pub fn list_timeline(&self, complaint_id: &str) -> DeskResult<Vec<TimelineEntry>> {
        if !self.complaint_exists(complaint_id)? {
            return Err(DeskError::not_found("complaint", complaint_id));
        }
        let mut stmt = self.conn.prepare(
            "SELECT complaint_id, seq, action, actor_id, comment, evidence, created_at
             FROM timeline_entry WHERE complaint_id = ?1 ORDER BY seq ASC",
        )?;
        let rows = stmt.query_map(params![complaint_id], entry_row_mapper)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn timeline_len(&self, complaint_id: &str) -> DeskResult<i64> {
        self.conn
            .query_row(
                "SELECT COUNT(*) FROM timeline_entry WHERE complaint_id = ?1",
                params![complaint_id],
                |row| row.get(0),
            )
            .map_err(Into::into)
    }

    /// Timestamp of the most recent entry with the given action label.
    pub fn last_action_at(
        &self,
        complaint_id: &str,
        action: &str,
    ) -> DeskResult<Option<DateTime<Utc>>> {
        let raw: Option<String> = self
            .conn
            .query_row(
                "SELECT created_at FROM timeline_entry
                 WHERE complaint_id = ?1 AND action = ?2
                 ORDER BY seq DESC LIMIT 1",
                params![complaint_id, action],
                |row| row.get(0),
            )
            .optional()?;
        raw.as_deref()
            .map(|s| ts_from_sql(0, s))
            .transpose()
            .map_err(Into::into)
    }
}
