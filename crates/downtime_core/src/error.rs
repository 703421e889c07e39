use serde::{Deserialize, Serialize};
use std::fmt;

/// Structured error shared by the engine's boundary checks, the report store and the host.
///
/// `code` is stable and machine-matchable (`INPUT_*`, `DB_*`, `REPORT_*`); `details` carries
/// the underlying library message when there is one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppError {
    pub code: String,
    pub message: String,
    pub details: Option<String>,
    pub retryable: bool,
}

impl AppError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
            retryable: false,
        }
    }

    /// Boundary validation failure (bad label, unparseable date, non-positive period).
    pub fn invalid_input(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(code, message)
    }

    /// Wrap a SQLite failure. Busy/locked databases are the only retryable case.
    pub fn db(code: impl Into<String>, message: impl Into<String>, err: rusqlite::Error) -> Self {
        let retryable = matches!(
            err.sqlite_error_code(),
            Some(rusqlite::ErrorCode::DatabaseBusy) | Some(rusqlite::ErrorCode::DatabaseLocked)
        );
        Self::new(code, message)
            .with_details(err.to_string())
            .with_retryable(retryable)
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_retryable(mut self, retryable: bool) -> Self {
        self.retryable = retryable;
        self
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.details {
            Some(details) => write!(f, "[{}] {} ({details})", self.code, self.message),
            None => write!(f, "[{}] {}", self.code, self.message),
        }
    }
}

impl std::error::Error for AppError {}
