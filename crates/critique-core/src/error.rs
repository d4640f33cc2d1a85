use thiserror::Error;

use crate::NotifyLevel;

/// Reasons a `/critique` invocation stops before submitting a prompt
#[derive(Error, Debug)]
pub enum CritiqueError {
    #[error("{0}")]
    Usage(String),

    #[error("/critique requires interactive mode")]
    NotInteractive,

    #[error("Cannot access {path}: {source}")]
    Access {
        path: String,
        source: std::io::Error,
    },

    #[error("Not a regular file: {path}")]
    NotAFile { path: String },

    #[error("Cannot read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("{path} appears to be a binary file; only text can be critiqued")]
    Binary { path: String },

    #[error("No assistant response to critique. Pass a file path, or ask the model something first.")]
    NoAssistantResponse,
}

/// Broad grouping used to pick how loudly an error is reported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Bad flags or arguments
    Usage,
    /// Filesystem problems with the target
    Environment,
    /// The host is not in a state where a critique makes sense
    Precondition,
}

impl CritiqueError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            CritiqueError::Usage(_) => ErrorCategory::Usage,
            CritiqueError::Access { .. }
            | CritiqueError::NotAFile { .. }
            | CritiqueError::Read { .. }
            | CritiqueError::Binary { .. } => ErrorCategory::Environment,
            CritiqueError::NotInteractive | CritiqueError::NoAssistantResponse => {
                ErrorCategory::Precondition
            }
        }
    }

    pub fn notify_level(&self) -> NotifyLevel {
        match self.category() {
            ErrorCategory::Usage | ErrorCategory::Environment => NotifyLevel::Error,
            ErrorCategory::Precondition => NotifyLevel::Warning,
        }
    }
}
