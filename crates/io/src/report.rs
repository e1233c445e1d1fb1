// Report export (xlsx): ranked attendance table plus the unresolved list.

use std::path::Path;

use chrono::NaiveDate;
use rust_xlsxwriter::{Format, Workbook, Worksheet};

use rollcall_recon::model::{AttendanceReport, UnresolvedEntry};

/// Session column headers use the short day.month form.
fn short_date(date: NaiveDate) -> String {
    date.format("%d.%m").to_string()
}

/// Write the report workbook: sheet "Attendance" with the ranked table and
/// trailing totals row, and sheet "Not found" with the unresolved list when
/// there is one. A failed write leaves the caller free to retry with the
/// same in-memory report.
pub fn write(
    path: &Path,
    report: &AttendanceReport,
    unresolved: &[UnresolvedEntry],
) -> Result<(), String> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();

    let sheet = workbook.add_worksheet();
    sheet
        .set_name("Attendance")
        .map_err(|e| format!("cannot create sheet: {e}"))?;
    write_attendance(sheet, report, &header).map_err(|e| format!("cannot write report: {e}"))?;

    if !unresolved.is_empty() {
        let sheet = workbook.add_worksheet();
        sheet
            .set_name("Not found")
            .map_err(|e| format!("cannot create sheet: {e}"))?;
        write_unresolved(sheet, report, unresolved, &header)
            .map_err(|e| format!("cannot write report: {e}"))?;
    }

    workbook
        .save(path)
        .map_err(|e| format!("cannot save {}: {e}", path.display()))
}

fn write_attendance(
    sheet: &mut Worksheet,
    report: &AttendanceReport,
    header: &Format,
) -> Result<(), rust_xlsxwriter::XlsxError> {
    let mut col: u16 = 0;
    sheet.write_string_with_format(0, col, &report.identifier_name, header)?;
    for name in &report.attribute_names {
        col += 1;
        sheet.write_string_with_format(0, col, name, header)?;
    }
    for &date in &report.session_dates {
        col += 1;
        sheet.write_string_with_format(0, col, &short_date(date), header)?;
    }
    col += 1;
    sheet.write_string_with_format(0, col, "Times present", header)?;
    let times_col = col;

    let mut row: u32 = 0;
    for entry in &report.rows {
        row += 1;
        let mut col: u16 = 0;
        sheet.write_string(row, col, &entry.identifier)?;
        for value in &entry.attributes {
            col += 1;
            sheet.write_string(row, col, value)?;
        }
        for &present in &entry.presence {
            col += 1;
            if present {
                sheet.write_number(row, col, 1.0)?;
            }
        }
        sheet.write_number(row, times_col, entry.times_present as f64)?;
    }

    // Totals row: per-session counts only, no times-present value.
    row += 1;
    let first_date_col = 1 + report.attribute_names.len() as u16;
    for (i, &total) in report.session_totals.iter().enumerate() {
        sheet.write_number(row, first_date_col + i as u16, total as f64)?;
    }

    Ok(())
}

fn write_unresolved(
    sheet: &mut Worksheet,
    report: &AttendanceReport,
    unresolved: &[UnresolvedEntry],
    header: &Format,
) -> Result<(), rust_xlsxwriter::XlsxError> {
    sheet.write_string_with_format(0, 0, &report.identifier_name, header)?;
    sheet.write_string_with_format(0, 1, "Date", header)?;
    for (i, entry) in unresolved.iter().enumerate() {
        let row = i as u32 + 1;
        sheet.write_string(row, 0, &entry.raw_identifier)?;
        sheet.write_string(row, 1, &short_date(entry.date))?;
    }
    Ok(())
}
