use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::Serialize;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// The authoritative participant list, loaded once per run.
///
/// `attribute_names` gives the order and labels of the passthrough columns;
/// every entry's `attributes` vector is parallel to it. `identifier_name`
/// is the label of the identifier column, kept for report headers.
#[derive(Debug, Clone)]
pub struct Roster {
    pub identifier_name: String,
    pub attribute_names: Vec<String>,
    pub entries: Vec<RosterEntry>,
}

/// One known participant. `identifier` is the canonical match key; the
/// attributes are opaque passthrough values (name fields, group, ...).
#[derive(Debug, Clone)]
pub struct RosterEntry {
    pub identifier: String,
    pub attributes: Vec<String>,
}

/// One attendance-collection event: a date plus the raw check-in strings
/// exactly as entered, in input order.
#[derive(Debug, Clone)]
pub struct SessionRecord {
    pub date: NaiveDate,
    pub raw_identifiers: Vec<String>,
}

// ---------------------------------------------------------------------------
// Resolution protocol
// ---------------------------------------------------------------------------

/// Operator answer for a check-in key with no roster match.
///
/// `Corrected` carries an already-canonical replacement key; callers that
/// accept free-form operator input normalize it before constructing this.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Corrected(String),
    Ignore,
    Abort,
}

// ---------------------------------------------------------------------------
// Presence matrix
// ---------------------------------------------------------------------------

/// Sparse identifier × session-date table. A cell is either marked present
/// or absent entirely; there is no explicit "absent" value.
#[derive(Debug, Clone, Default)]
pub struct PresenceMatrix {
    cells: BTreeMap<String, BTreeSet<NaiveDate>>,
}

impl PresenceMatrix {
    pub fn mark(&mut self, identifier: &str, date: NaiveDate) {
        self.cells.entry(identifier.to_string()).or_default().insert(date);
    }

    pub fn is_present(&self, identifier: &str, date: NaiveDate) -> bool {
        self.cells.get(identifier).is_some_and(|dates| dates.contains(&date))
    }

    /// Number of distinct session dates this identifier was present on.
    pub fn times_present(&self, identifier: &str) -> usize {
        self.cells.get(identifier).map_or(0, |dates| dates.len())
    }

    /// Number of identifiers marked present on `date`.
    pub fn present_on(&self, date: NaiveDate) -> usize {
        self.cells.values().filter(|dates| dates.contains(&date)).count()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Engine findings
// ---------------------------------------------------------------------------

/// A check-in that matched nothing on the roster and was not corrected to a
/// roster identifier at the time it was encountered. The key is canonical.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnresolvedEntry {
    pub raw_identifier: String,
    pub date: NaiveDate,
}

/// Non-fatal finding accumulated during a run and reported with the result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Incident {
    /// The roster contains this identifier more than once; the occurrence's
    /// matrix update was skipped rather than picking an entry arbitrarily.
    DuplicateIdentifier { key: String, date: NaiveDate },
    /// The operator supplied a corrected key that is not on the roster
    /// either. The original unresolved record stands.
    CorrectionMiss {
        original: String,
        corrected: String,
        date: NaiveDate,
    },
}

impl std::fmt::Display for Incident {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateIdentifier { key, date } => {
                write!(f, "'{key}' matches multiple roster entries ({date})")
            }
            Self::CorrectionMiss { original, corrected, date } => {
                write!(f, "correction '{corrected}' for '{original}' not on the roster ({date})")
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Engine output
// ---------------------------------------------------------------------------

/// Everything one `reconcile` call produces. Held in memory so the report
/// can be re-emitted (e.g. after a failed write) without re-prompting.
#[derive(Debug, Clone, Default)]
pub struct ReconOutput {
    pub matrix: PresenceMatrix,
    pub unresolved: Vec<UnresolvedEntry>,
    pub incidents: Vec<Incident>,
    /// Session dates in input order, one per supplied session.
    pub session_dates: Vec<NaiveDate>,
    /// Date of the first session processed (input order, not min).
    pub first_session_date: Option<NaiveDate>,
    /// Date of the last session processed (input order, not max).
    pub last_session_date: Option<NaiveDate>,
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct ReportMeta {
    pub name: String,
    pub engine_version: String,
    pub run_at: String,
    pub first_session_date: Option<NaiveDate>,
    pub last_session_date: Option<NaiveDate>,
}

/// One ranked row of the final table. `presence` is parallel to the
/// report's `session_dates`.
#[derive(Debug, Clone, Serialize)]
pub struct AttendanceRow {
    pub identifier: String,
    pub attributes: Vec<String>,
    pub presence: Vec<bool>,
    pub times_present: usize,
}

/// The ranked attendance summary: participants with at least one session,
/// sorted by `times_present` descending (ties keep roster order), plus a
/// per-session totals row. The totals row carries no `times_present`; it
/// lives in `session_totals`, not in `rows`.
#[derive(Debug, Clone, Serialize)]
pub struct AttendanceReport {
    pub meta: ReportMeta,
    pub identifier_name: String,
    pub attribute_names: Vec<String>,
    pub session_dates: Vec<NaiveDate>,
    pub rows: Vec<AttendanceRow>,
    pub session_totals: Vec<usize>,
}
