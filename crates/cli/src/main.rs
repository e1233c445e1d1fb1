// Rollcall CLI - attendance reconciliation, headless

mod exit_codes;
mod prompt;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use exit_codes::{
    EXIT_ABORTED, EXIT_ERROR, EXIT_INTEGRITY, EXIT_INVALID_CONFIG, EXIT_REPORT_WRITE,
    EXIT_SUCCESS, EXIT_UNRESOLVED, EXIT_USAGE,
};
use rollcall_recon::error::ReconError;
use rollcall_recon::model::{AttendanceReport, Incident, ReconOutput, UnresolvedEntry};
use rollcall_recon::{summarize, ReconConfig};

#[derive(Parser)]
#[command(name = "rollcall")]
#[command(about = "Attendance reconciliation for free-text check-ins")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run reconciliation from a TOML config file
    #[command(after_help = "\
Examples:
  rollcall run attendance.toml
  rollcall run attendance.toml --interactive
  rollcall run attendance.toml --output week-12.xlsx
  rollcall run attendance.toml --json > report.json")]
    Run {
        /// Path to the run config file
        config: PathBuf,

        /// Prompt for corrections when a check-in has no roster match
        #[arg(long, short = 'i')]
        interactive: bool,

        /// Report path (default: derived from the sessions file and dates)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Print the report as JSON to stdout
        #[arg(long)]
        json: bool,
    },

    /// Validate a run config without reconciling
    #[command(after_help = "\
Examples:
  rollcall validate attendance.toml")]
    Validate {
        /// Path to the run config file
        config: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            config,
            interactive,
            output,
            json,
        } => cmd_run(config, interactive, output, json),
        Commands::Validate { config } => cmd_validate(config),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError {
            code,
            message,
            hint,
        }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    fn usage(msg: impl Into<String>) -> Self {
        Self {
            code: EXIT_USAGE,
            message: msg.into(),
            hint: None,
        }
    }

    fn io(msg: impl Into<String>) -> Self {
        Self {
            code: EXIT_ERROR,
            message: msg.into(),
            hint: None,
        }
    }

    fn config(msg: impl Into<String>) -> Self {
        Self {
            code: EXIT_INVALID_CONFIG,
            message: msg.into(),
            hint: None,
        }
    }
}

// ============================================================================
// run
// ============================================================================

fn cmd_run(
    config_path: PathBuf,
    interactive: bool,
    output: Option<PathBuf>,
    json: bool,
) -> Result<(), CliError> {
    let config_str = std::fs::read_to_string(&config_path)
        .map_err(|e| CliError::io(format!("cannot read config: {e}")))?;
    let config = ReconConfig::from_toml(&config_str).map_err(|e| CliError::config(e.to_string()))?;

    // Data files are resolved relative to the config file's directory
    let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));
    let roster_path = base_dir.join(&config.roster.file);
    let sessions_path = base_dir.join(&config.sessions.file);

    let roster = rollcall_io::roster::load(&roster_path, &config.roster).map_err(CliError::io)?;
    let sessions =
        rollcall_io::sessions::load(&sessions_path, &config.sessions).map_err(CliError::io)?;

    let result = if interactive {
        if !atty::is(atty::Stream::Stdin) {
            return Err(CliError::usage("--interactive requires a terminal on stdin"));
        }
        let mut resolve = prompt::stdin_resolver();
        rollcall_recon::reconcile(&roster, &sessions, Some(&mut resolve))
    } else {
        rollcall_recon::reconcile(&roster, &sessions, None)
    };

    let out = match result {
        Ok(out) => out,
        Err(err @ ReconError::Aborted { .. }) => {
            return Err(CliError {
                code: EXIT_ABORTED,
                message: err.to_string(),
                hint: None,
            });
        }
        Err(err) => return Err(CliError::io(err.to_string())),
    };

    let report = summarize(&config.name, &roster, &out);

    // Human summary to stderr
    eprintln!(
        "{} session(s): {} of {} roster entries attended at least once",
        report.session_dates.len(),
        report.rows.len(),
        roster.entries.len(),
    );
    if out.unresolved.is_empty() {
        eprintln!("all check-ins matched the roster");
    } else {
        eprintln!("{} check-in(s) not on the roster:", out.unresolved.len());
        for entry in &out.unresolved {
            eprintln!("  {} ({})", entry.raw_identifier, entry.date);
        }
    }
    for incident in &out.incidents {
        eprintln!("warning: {incident}");
    }

    let output_path = match output {
        Some(path) => path,
        None => config
            .output
            .file
            .as_ref()
            .map(|f| base_dir.join(f))
            .unwrap_or_else(|| default_output_path(&sessions_path, &out)),
    };

    write_with_retry(&output_path, &report, &out.unresolved, interactive)?;
    eprintln!("wrote {}", output_path.display());

    if json {
        let payload = serde_json::json!({
            "report": &report,
            "unresolved": &out.unresolved,
            "incidents": &out.incidents,
        });
        let rendered = serde_json::to_string_pretty(&payload)
            .map_err(|e| CliError::io(format!("JSON serialization error: {e}")))?;
        println!("{rendered}");
    }

    if !out.unresolved.is_empty() {
        return Err(CliError {
            code: EXIT_UNRESOLVED,
            message: "unresolved identifiers remain".into(),
            hint: None,
        });
    }
    if out
        .incidents
        .iter()
        .any(|i| matches!(i, Incident::DuplicateIdentifier { .. }))
    {
        return Err(CliError {
            code: EXIT_INTEGRITY,
            message: "roster integrity violations reported".into(),
            hint: None,
        });
    }

    Ok(())
}

/// Default report path: beside the sessions file, first/last session dates
/// in the name.
fn default_output_path(sessions_path: &Path, out: &ReconOutput) -> PathBuf {
    let stem = sessions_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("attendance");
    let name = match (out.first_session_date, out.last_session_date) {
        (Some(first), Some(last)) => format!("{stem}_from_{first}_to_{last}.xlsx"),
        _ => format!("{stem}_attendance.xlsx"),
    };
    sessions_path.with_file_name(name)
}

/// Write the report; in interactive mode offer retries without re-running
/// reconciliation (the report is already in memory).
fn write_with_retry(
    path: &Path,
    report: &AttendanceReport,
    unresolved: &[UnresolvedEntry],
    interactive: bool,
) -> Result<(), CliError> {
    loop {
        match rollcall_io::report::write(path, report, unresolved) {
            Ok(()) => return Ok(()),
            Err(err) => {
                if interactive && prompt::confirm_retry(path, &err) {
                    continue;
                }
                return Err(CliError {
                    code: EXIT_REPORT_WRITE,
                    message: err,
                    hint: Some("close the file if it is open and run again".into()),
                });
            }
        }
    }
}

// ============================================================================
// validate
// ============================================================================

fn cmd_validate(config_path: PathBuf) -> Result<(), CliError> {
    let config_str = std::fs::read_to_string(&config_path)
        .map_err(|e| CliError::io(format!("cannot read config: {e}")))?;
    let config = ReconConfig::from_toml(&config_str).map_err(|e| CliError::config(e.to_string()))?;

    let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));
    for file in [&config.roster.file, &config.sessions.file] {
        let path = base_dir.join(file);
        if !path.exists() {
            return Err(CliError::config(format!("{} does not exist", path.display())));
        }
    }

    eprintln!("config OK: \"{}\"", config.name);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn output_name_embeds_first_and_last_dates() {
        let out = ReconOutput {
            first_session_date: Some(d("2025-09-01")),
            last_session_date: Some(d("2025-11-24")),
            ..Default::default()
        };
        let path = default_output_path(Path::new("/data/checkins.xlsx"), &out);
        assert_eq!(
            path,
            Path::new("/data/checkins_from_2025-09-01_to_2025-11-24.xlsx")
        );
    }

    #[test]
    fn output_name_without_sessions_falls_back() {
        let out = ReconOutput::default();
        let path = default_output_path(Path::new("checkins.xlsx"), &out);
        assert_eq!(path, Path::new("checkins_attendance.xlsx"));
    }
}
