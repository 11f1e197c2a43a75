//! CivicDesk core: the complaint lifecycle & escalation engine.
//!
//! Tracks citizen-submitted civic complaints from submission to
//! resolution: an append-only audit timeline per complaint, a role-aware
//! state machine over status and progress, lazy time-based escalation
//! classification, bounding-box routing to responsible squads, a
//! deduplicated vote ledger, and on-demand aggregate statistics.
//!
//! Transport (HTTP, RPC), file storage, and auth token mechanics are
//! external collaborators: callers hand the desk an authenticated
//! `(user, role)` pair and opaque attachment references.

pub mod auth;
pub mod category;
pub mod clock;
pub mod complaint;
pub mod config;
pub mod desk;
pub mod error;
pub mod escalation;
pub mod notify;
pub mod stats;
pub mod store;
pub mod types;
pub mod zone;
