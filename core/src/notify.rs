//! Outbound notification seam.
//!
//! Delivery is fire-and-forget: the desk commits its state change first
//! and a sink failure is logged, never propagated. Email/SMS transports
//! live behind this trait, outside the engine.

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Resolution,
    StatusUpdate,
    Escalation,
    ReopenRequested,
}

pub trait NotificationSink: Send {
    fn notify(
        &self,
        user_id: &str,
        kind: NotificationKind,
        message: &str,
        complaint_id: &str,
    ) -> anyhow::Result<()>;
}

/// Default sink: structured log lines only.
#[derive(Debug, Default)]
pub struct LogSink;

impl NotificationSink for LogSink {
    fn notify(
        &self,
        user_id: &str,
        kind: NotificationKind,
        message: &str,
        complaint_id: &str,
    ) -> anyhow::Result<()> {
        log::info!("notify user={user_id} kind={kind:?} complaint={complaint_id}: {message}");
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentNotification {
    pub user_id: String,
    pub kind: NotificationKind,
    pub message: String,
    pub complaint_id: String,
}

/// Test sink: records everything it is handed.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    sent: Arc<Mutex<Vec<SentNotification>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<SentNotification> {
        self.sent.lock().expect("sink lock poisoned").clone()
    }
}

impl NotificationSink for RecordingSink {
    fn notify(
        &self,
        user_id: &str,
        kind: NotificationKind,
        message: &str,
        complaint_id: &str,
    ) -> anyhow::Result<()> {
        self.sent
            .lock()
            .expect("sink lock poisoned")
            .push(SentNotification {
                user_id: user_id.to_string(),
                kind,
                message: message.to_string(),
                complaint_id: complaint_id.to_string(),
            });
        Ok(())
    }
}
