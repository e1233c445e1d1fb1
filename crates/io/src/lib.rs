//! `rollcall-io` — file I/O for rollcall.
//!
//! Roster CSV reading (with encoding fallback), check-in workbook import,
//! and report export. All reconciliation logic lives in `rollcall-recon`.

pub mod report;
pub mod roster;
pub mod sessions;
