//! Engine configuration: escalation thresholds, zone/squad topology, and
//! statistics tuning. Loaded from JSON files at startup; the escalation
//! settings and topology can be hot-replaced through admin-only desk
//! operations and take effect on the next call that reads them.

use crate::{
    error::{DeskError, DeskResult},
    types::{SquadId, UserId, ZoneId},
};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscalationSettings {
    pub yellow_threshold_days: i64,
    pub red_threshold_days: i64,
    #[serde(default = "default_notify")]
    pub notify_on_escalation: bool,
    /// Who gets the escalation notification when a complaint has no
    /// assignee. None means unassigned escalations are log-only.
    #[serde(default)]
    pub auto_escalation_target: Option<UserId>,
}

fn default_notify() -> bool {
    true
}

impl EscalationSettings {
    /// Thresholds must be ordered, otherwise the classifier would produce
    /// a nonsensical level ordering.
    pub fn validate(&self) -> DeskResult<()> {
        if self.yellow_threshold_days < 0 || self.red_threshold_days < 0 {
            return Err(DeskError::InvalidConfiguration {
                reason: "escalation thresholds must be non-negative".into(),
            });
        }
        if self.yellow_threshold_days > self.red_threshold_days {
            return Err(DeskError::InvalidConfiguration {
                reason: format!(
                    "yellow threshold ({}) exceeds red threshold ({})",
                    self.yellow_threshold_days, self.red_threshold_days
                ),
            });
        }
        Ok(())
    }
}

impl Default for EscalationSettings {
    fn default() -> Self {
        Self {
            yellow_threshold_days: 45,
            red_threshold_days: 60,
            notify_on_escalation: true,
            auto_escalation_target: None,
        }
    }
}

/// A named bounding box routed to one squad. Boxes may overlap; the
/// resolver takes the first match in file order, so order is priority.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneConfig {
    pub zone_id: ZoneId,
    pub label: String,
    pub squad_id: SquadId,
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl ZoneConfig {
    pub fn contains(&self, lat: f64, lng: f64) -> bool {
        lat >= self.min_lat && lat <= self.max_lat && lng >= self.min_lng && lng <= self.max_lng
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SquadConfig {
    pub squad_id: SquadId,
    pub label: String,
    pub supervisor: UserId,
    pub members: Vec<UserId>,
}

/// Zones partition the operating area; squads own zones. Configuration
/// data, never created or edited through complaint actions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Topology {
    pub zones: Vec<ZoneConfig>,
    pub squads: Vec<SquadConfig>,
}

impl Topology {
    pub fn from_json_str(s: &str) -> DeskResult<Self> {
        let topology: Topology = serde_json::from_str(s)?;
        topology.validate()?;
        Ok(topology)
    }

    pub fn load(path: &Path) -> DeskResult<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("reading {}: {e}", path.display()))?;
        Self::from_json_str(&raw)
    }

    /// Every zone must point at a configured squad.
    pub fn validate(&self) -> DeskResult<()> {
        for zone in &self.zones {
            if !self.squads.iter().any(|s| s.squad_id == zone.squad_id) {
                return Err(DeskError::InvalidConfiguration {
                    reason: format!(
                        "zone '{}' references unknown squad '{}'",
                        zone.zone_id, zone.squad_id
                    ),
                });
            }
        }
        Ok(())
    }

    pub fn squad(&self, squad_id: &str) -> Option<&SquadConfig> {
        self.squads.iter().find(|s| s.squad_id == squad_id)
    }

    pub fn zone(&self, zone_id: &str) -> Option<&ZoneConfig> {
        self.zones.iter().find(|z| z.zone_id == zone_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsConfig {
    /// Days since assignment after which an unfinished complaint counts
    /// as overdue.
    pub overdue_after_days: i64,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            overdue_after_days: 7,
        }
    }
}

impl EscalationSettings {
    pub fn from_json_str(s: &str) -> DeskResult<Self> {
        let settings: EscalationSettings = serde_json::from_str(s)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn load(path: &Path) -> DeskResult<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("reading {}: {e}", path.display()))?;
        Self::from_json_str(&raw)
    }
}
