use super::{ts_to_sql, DeskStore};
use crate::error::{DeskError, DeskResult};
use chrono::{DateTime, Utc};
use rusqlite::params;

impl DeskStore {
    // ── Vote ledger ────────────────────────────────────────────────
    //
    // A set of voter identities, never a counter: a retried request can
    // only flip membership, not double-count.

    /// Flip the voter's membership. Returns (added, new_count). The
    /// delete-then-insert pair and the count read share one transaction
    /// so concurrent toggles never lose an update.
    pub fn toggle_vote(
        &self,
        complaint_id: &str,
        voter_id: &str,
        now: DateTime<Utc>,
    ) -> DeskResult<(bool, i64)> {
        if !self.complaint_exists(complaint_id)? {
            return Err(DeskError::not_found("complaint", complaint_id));
        }

        let tx = self.conn.unchecked_transaction()?;
        let removed = tx.execute(
            "DELETE FROM complaint_vote WHERE complaint_id = ?1 AND voter_id = ?2",
            params![complaint_id, voter_id],
        )?;
        let added = removed == 0;
        if added {
            tx.execute(
                "INSERT INTO complaint_vote (complaint_id, voter_id, voted_at)
                 VALUES (?1, ?2, ?3)",
                params![complaint_id, voter_id, ts_to_sql(&now)],
            )?;
        }
        let count: i64 = tx.query_row(
            "SELECT COUNT(*) FROM complaint_vote WHERE complaint_id = ?1",
            params![complaint_id],
            |row| row.get(0),
        )?;
        tx.commit()?;
        Ok((added, count))
    }

    pub fn vote_count(&self, complaint_id: &str) -> DeskResult<i64> {
        self.conn
            .query_row(
                "SELECT COUNT(*) FROM complaint_vote WHERE complaint_id = ?1",
                params![complaint_id],
                |row| row.get(0),
            )
            .map_err(Into::into)
    }

    pub fn has_voted(&self, complaint_id: &str, voter_id: &str) -> DeskResult<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM complaint_vote
             WHERE complaint_id = ?1 AND voter_id = ?2",
            params![complaint_id, voter_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }
}
