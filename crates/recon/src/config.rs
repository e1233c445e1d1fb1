use serde::Deserialize;

use crate::error::ReconError;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct ReconConfig {
    pub name: String,
    pub roster: RosterConfig,
    pub sessions: SessionsConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

// ---------------------------------------------------------------------------
// Roster source
// ---------------------------------------------------------------------------

/// Shape of the roster CSV. Group exports are typically headerless, so the
/// column names are declared here; a file with its own header row sets
/// `has_headers` and may omit `columns`.
#[derive(Debug, Clone, Deserialize)]
pub struct RosterConfig {
    pub file: String,
    #[serde(default)]
    pub columns: Vec<String>,
    /// Which column holds the canonical match key.
    pub identifier: String,
    #[serde(default)]
    pub has_headers: bool,
    /// Columns to leave out of the report entirely.
    #[serde(default)]
    pub drop: Vec<String>,
}

// ---------------------------------------------------------------------------
// Session source
// ---------------------------------------------------------------------------

/// Shape of the check-in workbook: one sheet per session after
/// `skip_sheets` leading metadata sheets, the session date in a fixed
/// cell, and the free-text answers in a named column below the preamble.
/// Defaults match a Mentimeter spreadsheet export.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionsConfig {
    pub file: String,
    #[serde(default = "default_skip_sheets")]
    pub skip_sheets: usize,
    #[serde(default = "default_date_row")]
    pub date_row: u32,
    #[serde(default = "default_date_column")]
    pub date_column: u32,
    #[serde(default = "default_answer_column")]
    pub answer_column: String,
    /// First sheet row (0-based) that holds an answer.
    #[serde(default = "default_first_answer_row")]
    pub first_answer_row: u32,
}

fn default_skip_sheets() -> usize {
    1
}

fn default_date_row() -> u32 {
    1
}

fn default_date_column() -> u32 {
    1
}

fn default_answer_column() -> String {
    "Question 1".into()
}

fn default_first_answer_row() -> u32 {
    8
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputConfig {
    /// Report path. When unset the filename is derived from the sessions
    /// file and the first/last session dates.
    #[serde(default)]
    pub file: Option<String>,
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ReconConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: ReconConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        let roster = &self.roster;

        if !roster.has_headers && roster.columns.is_empty() {
            return Err(ReconError::ConfigValidation(
                "roster.columns is required when the roster file has no header row".into(),
            ));
        }

        // With a header row the real column set is only known at load time;
        // these checks apply to the declared list.
        if !roster.columns.is_empty() {
            if !roster.columns.contains(&roster.identifier) {
                return Err(ReconError::ConfigValidation(format!(
                    "roster.identifier '{}' is not in roster.columns",
                    roster.identifier
                )));
            }
            for dropped in &roster.drop {
                if !roster.columns.contains(dropped) {
                    return Err(ReconError::ConfigValidation(format!(
                        "roster.drop column '{dropped}' is not in roster.columns"
                    )));
                }
            }
        }

        if roster.drop.contains(&roster.identifier) {
            return Err(ReconError::ConfigValidation(format!(
                "roster.identifier '{}' cannot be dropped",
                roster.identifier
            )));
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
