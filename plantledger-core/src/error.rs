use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Month index {0} is out of range, expected 0-11")]
    InvalidMonth(u32),

    #[error("Year {0} cannot be represented on the calendar")]
    InvalidYear(i32),

    #[error("'{0}' is not a valid period key, expected YYYY-MM")]
    InvalidPeriodKey(String),

    #[error("A reporting period must be set before computing a rollup")]
    PeriodNotDefined,

    #[error("Subtask '{0}' not found")]
    SubtaskNotFound(String),

    #[error("Subtask id '{0}' appears more than once in the plan")]
    DuplicateSubtask(String),

    #[error("Cannot move subtask '{0}' under its own descendant '{1}'")]
    InvalidMove(String, String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Storage unavailable: {0}")]
    Storage(String),

    /// A collaborator fetch failed; the rollup was not computed.
    #[error("Failed to load {what}: {source}")]
    LoadFailed {
        what: String,
        #[source]
        source: Box<LedgerError>,
    },

    /// The upsert failed; the caller still holds the recomputed record.
    #[error("Failed to save monthly expense '{key}': {source}")]
    SaveFailed {
        key: String,
        #[source]
        source: Box<LedgerError>,
    },

    #[error("I/O error for file '{0}': {1}")]
    FileIO(String, #[source] std::io::Error),

    #[error("Failed to parse YAML from '{0}': {1}")]
    YamlParsing(String, #[source] serde_yaml::Error),

    #[error("Failed to write YAML to '{0}': {1}")]
    YamlWriting(String, #[source] serde_yaml::Error),

    #[error("Failed to encode JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to write CSV '{0}': {1}")]
    CsvError(String, #[source] csv::Error),
}

impl LedgerError {
    pub fn load_failed(what: impl Into<String>, source: LedgerError) -> Self {
        LedgerError::LoadFailed {
            what: what.into(),
            source: Box::new(source),
        }
    }

    pub fn save_failed(key: impl Into<String>, source: LedgerError) -> Self {
        LedgerError::SaveFailed {
            key: key.into(),
            source: Box::new(source),
        }
    }
}
