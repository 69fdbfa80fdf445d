//! Error types for the store and the reconciler.

use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

/// Failures surfaced by an [`IntervalStore`](crate::db::IntervalStore).
///
/// The variants follow the stages of talking to the storage engine. Each one
/// carries the engine's diagnostic message and nothing else.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to open database: {0}")]
    Open(String),

    #[error("Failed to execute statement: {0}")]
    Execution(String),

    #[error("Failed to prepare statement: {0}")]
    Prepare(String),

    #[error("Failed to bind parameters: {0}")]
    Bind(String),

    #[error("Failed to step or commit: {0}")]
    Step(String),

    #[error("Snapshot error: {0}")]
    Snapshot(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

impl StoreError {
    pub fn open(err: rusqlite::Error) -> Self {
        classify(err, StoreError::Open)
    }

    pub fn execution(err: rusqlite::Error) -> Self {
        classify(err, StoreError::Execution)
    }

    pub fn prepare(err: rusqlite::Error) -> Self {
        classify(err, StoreError::Prepare)
    }

    pub fn step(err: rusqlite::Error) -> Self {
        classify(err, StoreError::Step)
    }

    pub fn snapshot(err: impl std::fmt::Display) -> Self {
        StoreError::Snapshot(err.to_string())
    }
}

/// Parameter problems are reported as binding failures no matter which call
/// produced them.
fn classify(err: rusqlite::Error, fallback: fn(String) -> StoreError) -> StoreError {
    let is_bind = matches!(
        err,
        rusqlite::Error::InvalidParameterCount(..)
            | rusqlite::Error::InvalidParameterName(_)
            | rusqlite::Error::ToSqlConversionFailure(_)
    );

    if is_bind {
        StoreError::Bind(err.to_string())
    } else {
        fallback(err.to_string())
    }
}

/// Failures returned by [`Timeline`](crate::timeline::Timeline) operations.
#[derive(Debug, Error)]
pub enum TimelineError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Window end {end} is before its start {start}")]
    InvalidInterval {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    #[error("No active or recent fast to stop")]
    NothingToStop,

    #[error("Window {0} not found")]
    WindowNotFound(Uuid),

    #[error("Regimen {0} not found")]
    RegimenNotFound(Uuid),

    #[error("Invalid regimen: {0}")]
    InvalidRegimen(String),
}

impl TimelineError {
    /// Whether the error was caused by caller input rather than the store.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidInterval { .. } | Self::NothingToStop | Self::InvalidRegimen(_)
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::WindowNotFound(_) | Self::RegimenNotFound(_))
    }
}

pub type Result<T, E = TimelineError> = std::result::Result<T, E>;
