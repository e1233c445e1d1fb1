//! `rollcall-recon` — attendance reconciliation engine.
//!
//! Pure engine crate: receives a pre-loaded roster and session records,
//! returns the presence matrix and ranked summary. No CLI or IO
//! dependencies.

pub mod aggregate;
pub mod config;
pub mod engine;
pub mod error;
pub mod model;
pub mod normalize;

pub use aggregate::summarize;
pub use config::ReconConfig;
pub use engine::{load_roster, reconcile};
pub use error::ReconError;
pub use model::{
    AttendanceReport, PresenceMatrix, ReconOutput, Resolution, Roster, RosterEntry,
    SessionRecord, UnresolvedEntry,
};
pub use normalize::canonical_key;
