use std::fmt;

use thiserror::Error;

/// Field-level validation failure. Carried as data, never raised past step validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub reason: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.reason)
    }
}

/// Rejection reported by a submission backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("submission failed: {cause}")]
pub struct SubmissionError {
    pub cause: String,
}

impl SubmissionError {
    pub fn new(cause: impl Into<String>) -> Self {
        Self {
            cause: cause.into(),
        }
    }
}

/// Fault raised by a presentation layer implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("presentation failure: {0}")]
pub struct PresentationError(pub String);

/// Fault raised by an analytics sink. Always swallowed by the wizard.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("analytics failure: {0}")]
pub struct AnalyticsError(pub String);

/// Error type for configuration, storage and front-end failures.
#[derive(Debug, Error)]
pub enum WizardError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("Unknown field `{0}`")]
    UnknownField(String),
    #[error("`{option}` is not an option for `{field}`")]
    UnknownOption { field: String, option: String },
    #[error(transparent)]
    Submission(#[from] SubmissionError),
    #[error(transparent)]
    Presentation(#[from] PresentationError),
    #[error(transparent)]
    Prompt(#[from] dialoguer::Error),
}
