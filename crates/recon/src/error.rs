use std::fmt;

#[derive(Debug)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (identifier not in columns, bad drop, etc.).
    ConfigValidation(String),
    /// A configured column is not present in the roster data.
    MissingColumn { column: String },
    /// CSV read error in the roster data.
    Csv(String),
    /// The operator cancelled during interactive correction. Fatal: the
    /// run stops and no output is produced.
    Aborted { key: String },
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::MissingColumn { column } => {
                write!(f, "roster: missing column '{column}'")
            }
            Self::Csv(msg) => write!(f, "roster CSV error: {msg}"),
            Self::Aborted { key } => {
                write!(f, "aborted by operator while resolving '{key}'")
            }
        }
    }
}

impl std::error::Error for ReconError {}
