use chrono::Utc;

use crate::model::{AttendanceReport, AttendanceRow, ReconOutput, ReportMeta, Roster};

/// Fold the presence matrix into the ranked attendance summary.
///
/// Participants with zero attendance are dropped; the rest sort by
/// `times_present` descending, ties keeping roster input order.
pub fn summarize(name: &str, roster: &Roster, outcome: &ReconOutput) -> AttendanceReport {
    let mut rows: Vec<AttendanceRow> = roster
        .entries
        .iter()
        .filter_map(|entry| {
            let times_present = outcome.matrix.times_present(&entry.identifier);
            if times_present == 0 {
                return None;
            }
            Some(AttendanceRow {
                identifier: entry.identifier.clone(),
                attributes: entry.attributes.clone(),
                presence: outcome
                    .session_dates
                    .iter()
                    .map(|&date| outcome.matrix.is_present(&entry.identifier, date))
                    .collect(),
                times_present,
            })
        })
        .collect();

    // Vec::sort_by is stable, which is what keeps ties in roster order.
    rows.sort_by(|a, b| b.times_present.cmp(&a.times_present));

    let session_totals = outcome
        .session_dates
        .iter()
        .map(|&date| outcome.matrix.present_on(date))
        .collect();

    AttendanceReport {
        meta: ReportMeta {
            name: name.to_string(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: Utc::now().to_rfc3339(),
            first_session_date: outcome.first_session_date,
            last_session_date: outcome.last_session_date,
        },
        identifier_name: roster.identifier_name.clone(),
        attribute_names: roster.attribute_names.clone(),
        session_dates: outcome.session_dates.clone(),
        rows,
        session_totals,
    }
}
