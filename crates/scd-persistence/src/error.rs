//! Errores de persistencia.
//! Mapea errores de Diesel / conexión a variantes semánticas y éstas al
//! `StoreError` del core.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use scd_core::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("unique violation: {0}")]
    UniqueViolation(String),
    #[error("check violation: {0}")]
    CheckViolation(String),
    #[error("not found")]
    NotFound,
    #[error("serialization conflict (retryable)")]
    SerializationConflict,
    #[error("transient IO / connection pool error: {0}")]
    TransientIo(String),
    #[error("table '{0}' does not exist")]
    MissingTable(String),
    #[error("table '{0}' already exists")]
    TableExists(String),
    #[error("schema mismatch: {0}")]
    Schema(String),
    #[error("configuration: {0}")]
    Config(String),
    #[error("unknown database error: {0}")]
    Unknown(String),
}

impl PersistenceError {
    /// Conflictos de serialización, deadlocks y caídas de conexión: la misma
    /// operación puede tener éxito al repetirse.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::SerializationConflict | Self::TransientIo(_) => true,
            Self::Unknown(msg) => {
                let m = msg.to_lowercase();
                ["deadlock detected", "could not serialize access", "connection closed", "connection refused", "timeout"]
                    .iter()
                    .any(|needle| m.contains(needle))
            }
            _ => false,
        }
    }
}

impl From<DieselError> for PersistenceError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::NotFound => Self::NotFound,
            DieselError::DatabaseError(kind, info) => match kind {
                DatabaseErrorKind::UniqueViolation => Self::UniqueViolation(info.message().to_string()),
                DatabaseErrorKind::CheckViolation => Self::CheckViolation(info.message().to_string()),
                DatabaseErrorKind::SerializationFailure => Self::SerializationConflict,
                DatabaseErrorKind::ClosedConnection => Self::TransientIo(info.message().to_string()),
                other => Self::Unknown(format!("db error kind {:?}: {}", other, info.message())),
            },
            DieselError::DeserializationError(e) => Self::Unknown(format!("deser: {e}")),
            DieselError::SerializationError(e) => Self::Unknown(format!("ser: {e}")),
            DieselError::BrokenTransactionManager => Self::TransientIo("broken transaction manager".into()),
            DieselError::RollbackErrorOnCommit { rollback_error, commit_error } => {
                Self::Unknown(format!("rollback={rollback_error}; commit={commit_error}"))
            }
            other => Self::Unknown(format!("unhandled diesel error: {other:?}")),
        }
    }
}

impl From<PersistenceError> for StoreError {
    fn from(err: PersistenceError) -> Self {
        match err {
            PersistenceError::UniqueViolation(m) => StoreError::Conflict(m),
            PersistenceError::SerializationConflict => StoreError::Conflict("serialization conflict".into()),
            PersistenceError::TransientIo(m) => StoreError::Connectivity(m),
            PersistenceError::MissingTable(t) => StoreError::MissingTable(t),
            PersistenceError::TableExists(t) => StoreError::TableExists(t),
            PersistenceError::Schema(m) | PersistenceError::CheckViolation(m) => StoreError::SchemaMismatch(m),
            other => StoreError::Backend(other.to_string()),
        }
    }
}
