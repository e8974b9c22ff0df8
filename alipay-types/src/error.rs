//! Error types for the gateway integration.

use crate::domain::Discrepancy;

/// Domain-level errors (business rule violations and untrusted-input rejections).
#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error(
        "Alipay: received data with missing reference ({}) or txn_id ({})",
        or_none(.reference),
        or_none(.txn_id)
    )]
    MissingReference {
        reference: Option<String>,
        txn_id: Option<String>,
    },

    #[error("Alipay: received data for reference {reference}; no order found")]
    NoMatchingTransaction { reference: String },

    #[error("Alipay: received data for reference {reference}; multiple order found ({count})")]
    AmbiguousReference { reference: String, count: usize },

    #[error("Alipay: invalid notification for reference {reference}: {}", format_discrepancies(.discrepancies))]
    Validation {
        reference: String,
        discrepancies: Vec<Discrepancy>,
    },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

fn or_none(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("None")
}

fn format_discrepancies(discrepancies: &[Discrepancy]) -> String {
    discrepancies
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Repository-level errors (data access failures).
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Transaction error: {0}")]
    Transaction(String),

    #[error("Entity not found")]
    NotFound,

    #[error("Conflict: {0}")]
    Conflict(String),
}

/// Application-level errors (for HTTP responses).
///
/// Maps cleanly to HTTP status codes.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Invalid notification: {}", format_discrepancies(.0))]
    Validation(Vec<Discrepancy>),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation { discrepancies, .. } => AppError::Validation(discrepancies),
            DomainError::NoMatchingTransaction { .. } => AppError::NotFound(err.to_string()),
            DomainError::Configuration(msg) => AppError::Configuration(msg),
            e => AppError::BadRequest(e.to_string()),
        }
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::Domain(e) => e.into(),
            RepoError::NotFound => AppError::NotFound("Resource not found".into()),
            RepoError::Database(e) => AppError::Internal(e),
            RepoError::Transaction(e) => AppError::Internal(e),
            RepoError::Conflict(e) => AppError::Conflict(e),
        }
    }
}
