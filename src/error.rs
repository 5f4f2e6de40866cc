//! Error types for each subsystem. Display strings of `ValidationError` and
//! `AuthError` are shown to users verbatim; the others only reach the logs.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Question text is required.")]
    MissingQuestionText,

    #[error("Please provide at least one option.")]
    MissingOptions,

    #[error("Unknown question type '{0}'.")]
    UnknownQuestionType(String),

    #[error("Please complete all required fields.")]
    IncompleteReport,

    #[error("Please describe the other reason.")]
    MissingOtherReason,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Invalid stored JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid stored value: {0}")]
    InvalidState(String),

    #[error("{kind} '{id}' not found")]
    NotFound { kind: &'static str, id: String },

    #[error("Swap rejected: {0}")]
    SwapRejected(String),
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Sign-in failed. Please check your credentials.")]
    InvalidCredentials,

    #[error("Access denied. This account is not an admin.")]
    AccessDenied,

    #[error("Session expired. Please sign in again.")]
    UnknownSession,

    #[error("Unable to hash password: {0}")]
    Hash(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Why a submission token could not be admitted.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GuardError {
    #[error("unknown or expired submission token")]
    Unknown,

    #[error("submission already in flight")]
    InFlight,

    #[error("submission already completed")]
    Consumed,
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unable to sign service-account assertion: {0}")]
    Assertion(#[from] jsonwebtoken::errors::Error),

    #[error("Sheets API returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Unable to access {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid settings JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum WebError {
    #[error("Unable to bind {addr}: {reason}")]
    Bind { addr: String, reason: String },

    #[error("Unable to read request body: {0}")]
    Body(#[from] std::io::Error),

    #[error("Request body exceeds {limit} bytes")]
    BodyTooLarge { limit: u64 },

    #[error("Template render failed: {0}")]
    Template(#[from] tera::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}
