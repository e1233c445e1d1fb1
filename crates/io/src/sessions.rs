// Check-in workbook import (one sheet per session)

use std::path::Path;

use calamine::{open_workbook_auto, Data, Range, Reader, Sheets};
use chrono::NaiveDate;

use rollcall_recon::config::SessionsConfig;
use rollcall_recon::model::SessionRecord;

/// Load session records from the workbook, one per sheet after the
/// configured leading metadata sheets. Sheet order is preserved; the
/// engine treats it as session order.
pub fn load(path: &Path, config: &SessionsConfig) -> Result<Vec<SessionRecord>, String> {
    let mut workbook: Sheets<_> =
        open_workbook_auto(path).map_err(|e| format!("{}: {e}", path.display()))?;
    let sheet_names: Vec<String> = workbook.sheet_names().to_vec();

    if sheet_names.len() <= config.skip_sheets {
        return Err(format!(
            "{}: no session sheets after skipping {} leading sheet(s)",
            path.display(),
            config.skip_sheets
        ));
    }

    let mut sessions = Vec::new();
    for sheet_name in sheet_names.iter().skip(config.skip_sheets) {
        let range = workbook
            .worksheet_range(sheet_name)
            .map_err(|e| format!("sheet '{sheet_name}': {e}"))?;

        let date = session_date(&range, config).ok_or_else(|| {
            format!(
                "sheet '{sheet_name}': no session date at row {}, column {}",
                config.date_row + 1,
                config.date_column + 1
            )
        })?;

        let answer_col = answer_column(&range, &config.answer_column).ok_or_else(|| {
            format!(
                "sheet '{sheet_name}': no '{}' column header",
                config.answer_column
            )
        })?;

        let mut raw_identifiers = Vec::new();
        if let Some((end_row, _)) = range.end() {
            for row in config.first_answer_row..=end_row {
                if let Some(text) = cell_text(range.get_value((row, answer_col))) {
                    raw_identifiers.push(text);
                }
            }
        }

        sessions.push(SessionRecord {
            date,
            raw_identifiers,
        });
    }

    Ok(sessions)
}

fn session_date(range: &Range<Data>, config: &SessionsConfig) -> Option<NaiveDate> {
    match range.get_value((config.date_row, config.date_column))? {
        Data::String(s) | Data::DateTimeIso(s) => parse_iso_prefix(s),
        Data::DateTime(dt) => excel_serial_date(dt.as_f64()),
        _ => None,
    }
}

/// Export dates are `YYYY-MM-DD`, sometimes with a time suffix.
fn parse_iso_prefix(s: &str) -> Option<NaiveDate> {
    let prefix = s.trim().get(..10)?;
    NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok()
}

/// Serial day count in the 1900 date system (epoch 1899-12-30).
fn excel_serial_date(serial: f64) -> Option<NaiveDate> {
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch.checked_add_signed(chrono::Duration::days(serial.floor() as i64))
}

/// Column (absolute index) whose first-row header matches `header`.
fn answer_column(range: &Range<Data>, header: &str) -> Option<u32> {
    let (_, end_col) = range.end()?;
    (0..=end_col).find(|&col| {
        matches!(range.get_value((0, col)), Some(Data::String(s)) if s.trim() == header)
    })
}

/// Render a check-in cell the way it was typed, skipping blanks.
fn cell_text(cell: Option<&Data>) -> Option<String> {
    let text = match cell? {
        Data::Empty => return None,
        Data::String(s) => s.trim().to_string(),
        Data::Float(n) => {
            if n.fract() == 0.0 && n.abs() < 1e15 {
                format!("{}", *n as i64)
            } else {
                format!("{n}")
            }
        }
        Data::Int(n) => format!("{n}"),
        Data::Bool(b) => {
            if *b {
                "TRUE".into()
            } else {
                "FALSE".into()
            }
        }
        other => other.to_string(),
    };
    (!text.is_empty()).then_some(text)
}
