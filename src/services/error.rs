// src/services/error.rs
use std::fmt;

/// Failures of the price pipeline. None of these are fatal to the
/// service; callers fall back or surface a status message.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineError {
    /// No usable rows after the header line.
    ParseFailure,
    FetchFailure { source: String, reason: String },
    BaselineNotFound { requested: String },
    MalformedBaseline { input: String },
    Storage(String),
}

impl PipelineError {
    pub fn fetch(source: impl Into<String>, reason: impl fmt::Display) -> Self {
        PipelineError::FetchFailure {
            source: source.into(),
            reason: reason.to_string(),
        }
    }

    /// Text shown next to the baseline input.
    pub fn user_message(&self) -> String {
        match self {
            PipelineError::BaselineNotFound { .. } => {
                "No price data available for this date or nearby dates.".to_string()
            }
            PipelineError::MalformedBaseline { .. } => "Invalid date format.".to_string(),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PipelineError::ParseFailure => write!(f, "No usable price rows in CSV"),
            PipelineError::FetchFailure { source, reason } => {
                write!(f, "Fetch from {} failed: {}", source, reason)
            }
            PipelineError::BaselineNotFound { requested } => {
                write!(f, "No price within range of {}", requested)
            }
            PipelineError::MalformedBaseline { input } => {
                write!(f, "Malformed baseline date: {:?}", input)
            }
            PipelineError::Storage(msg) => write!(f, "Storage error: {}", msg),
        }
    }
}

impl std::error::Error for PipelineError {}
