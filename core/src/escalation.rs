//! Escalation classifier: a pure function of complaint age and the
//! configured thresholds.
//!
//! Classification is evaluated lazily at read time, because the passage
//! of time alone changes the answer. The level cached on the complaint
//! row exists only so the desk can detect an upward change and fire a
//! notification once; it is never authoritative for display.

use crate::{config::EscalationSettings, error::DeskResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscalationLevel {
    Green,
    Yellow,
    Red,
}

impl EscalationLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            EscalationLevel::Green => "green",
            EscalationLevel::Yellow => "yellow",
            EscalationLevel::Red => "red",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "green" => Some(EscalationLevel::Green),
            "yellow" => Some(EscalationLevel::Yellow),
            "red" => Some(EscalationLevel::Red),
            _ => None,
        }
    }
}

/// Age in whole days: `floor((now - created_at) / 1 day)`. A clock that
/// reads before the creation instant classifies as age zero.
pub fn age_days(created_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - created_at).num_days().max(0)
}

/// Map complaint age to a level. Fails with `InvalidConfiguration` when
/// the thresholds are not ordered, rather than producing a nonsensical
/// level ordering.
pub fn classify(
    created_at: DateTime<Utc>,
    now: DateTime<Utc>,
    settings: &EscalationSettings,
) -> DeskResult<EscalationLevel> {
    settings.validate()?;
    let age = age_days(created_at, now);
    let level = if age >= settings.red_threshold_days {
        EscalationLevel::Red
    } else if age >= settings.yellow_threshold_days {
        EscalationLevel::Yellow
    } else {
        EscalationLevel::Green
    };
    Ok(level)
}
