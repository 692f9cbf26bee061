//! Errores del motor de reconciliación.
//!
//! Tres familias, alineadas con la política de propagación del orquestador:
//! - `ValidationError`: fatal para una llamada de merge, se detecta antes de
//!   cualquier escritura.
//! - `StoreError`: cualquier fallo del `TableStore` (conectividad, conflicto,
//!   esquema).
//! - `ReconcileError`: envoltorio que usan los componentes para propagar con
//!   `?` hasta la frontera por tabla.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub enum ValidationError {
    #[error("primary key column list is empty")]
    EmptyPrimaryKey,
    #[error("key column '{0}' is not present in the batch schema")]
    MissingKeyColumn(String),
    #[error("load timestamp column '{0}' is not present in the batch schema")]
    MissingLoadTimestampColumn(String),
    #[error("invalid load timestamp {value:?} in row {row}")]
    InvalidLoadTimestamp { row: usize, value: Option<String> },
    #[error("column '{0}' collides with a reserved system column")]
    ReservedColumn(String),
}

#[derive(Debug, Error, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub enum StoreError {
    #[error("table '{0}' does not exist")]
    MissingTable(String),
    #[error("table '{0}' already exists")]
    TableExists(String),
    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),
    #[error("write conflict: {0}")]
    Conflict(String),
    #[error("store connectivity: {0}")]
    Connectivity(String),
    #[error("store backend: {0}")]
    Backend(String),
}

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ReconcileError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),
    #[error("no table configured for identifier '{0}'")]
    UnknownTable(String),
    #[error("store operation failed: {0}")]
    Store(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reconcile_error_messages_include_cause() {
        let e: ReconcileError = ValidationError::MissingKeyColumn("id".into()).into();
        assert_eq!(e.to_string(), "validation failed: key column 'id' is not present in the batch schema");
        let s: ReconcileError = StoreError::Connectivity("refused".into()).into();
        assert!(s.to_string().contains("refused"));
    }
}
