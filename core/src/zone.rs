//! Zone resolver: maps a coordinate pair to the responsible zone and
//! squad by scanning the configured bounding boxes in priority order.
//!
//! Resolution is a point-in-time decision made once at submission. It is
//! never re-evaluated when topology changes; an unresolved complaint is
//! assigned by hand later.

use crate::{
    config::Topology,
    types::{SquadId, ZoneId},
};

#[derive(Debug, Clone)]
pub struct ZoneResolver {
    topology: Topology,
}

impl ZoneResolver {
    pub fn new(topology: Topology) -> Self {
        Self { topology }
    }

    /// First box containing the point wins; boxes may overlap, so config
    /// order is priority order. None is a degraded success: the complaint
    /// is still created, just unrouted.
    pub fn resolve(&self, lat: f64, lng: f64) -> Option<(ZoneId, SquadId)> {
        self.topology
            .zones
            .iter()
            .find(|zone| zone.contains(lat, lng))
            .map(|zone| (zone.zone_id.clone(), zone.squad_id.clone()))
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }
}
