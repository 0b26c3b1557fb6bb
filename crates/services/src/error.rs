//! Shared error types for the services crate.

use thiserror::Error;

use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;
use vault_core::model::{ModuleError, ModuleId, TaskError};
use vault_core::quiz::QuizError;

/// Errors emitted by drill services.
///
/// Store failures never appear here: telemetry and remediation writes are
/// best-effort and only logged.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DrillError {
    #[error(transparent)]
    Quiz(#[from] QuizError),
}

/// Errors emitted by `DashboardService::try_snapshot`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DashboardError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `BoardService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BoardError {
    #[error(transparent)]
    Task(#[from] TaskError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `ModuleService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum VaultError {
    #[error("no study module with id {0}")]
    UnknownModule(ModuleId),
    #[error(transparent)]
    Module(#[from] ModuleError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
}
