//! Shared error types for the services crate.

use thiserror::Error;

use rollcall_core::model::{AnswerSheetError, GateError, RosterError, SessionError};
use storage::repository::StorageError;

/// Errors emitted by the attendance workflow.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AttendanceError {
    #[error("no active academic year is configured")]
    NoActiveYear,
    #[error("attendance session is finalized")]
    Finalized,
    #[error(transparent)]
    Roster(#[from] RosterError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<GateError> for AttendanceError {
    fn from(_: GateError) -> Self {
        Self::Finalized
    }
}

/// Errors emitted by the quiz attempt workflow.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AttemptError {
    #[error("attempt already submitted")]
    Submitted,
    #[error(transparent)]
    AnswerSheet(#[from] AnswerSheetError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<GateError> for AttemptError {
    fn from(_: GateError) -> Self {
        Self::Submitted
    }
}

/// Errors emitted while reading configuration.
#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("API URL must not be empty")]
    EmptyApiUrl,
    #[error("locale must not be empty")]
    EmptyLocale,
    #[error("invalid autosave delay (milliseconds expected): {raw}")]
    InvalidAutosaveDelay { raw: String },
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
