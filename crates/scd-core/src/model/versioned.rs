//! Fila versionada: la unidad persistida en el `TableStore`.
use serde::{Deserialize, Serialize};

use super::record::{key_tuple_of, KeyTuple, RowValues};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionedRecord {
    /// Atributos de la fuente (incluye llaves y timestamp de carga).
    pub values: RowValues,
    /// Identidad de fila: hash de las columnas llave.
    pub key_hash: String,
    /// Fingerprint de contenido sobre las columnas comparables.
    pub row_hash: String,
    pub source_system: String,
    pub active: bool,
    pub deleted: bool,
}

impl VersionedRecord {
    /// Fila "actual": activa y no borrada. A lo sumo una por llave.
    pub fn is_current(&self) -> bool {
        self.active && !self.deleted
    }

    pub fn is_tombstone(&self) -> bool {
        self.deleted
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.values.get(column).and_then(|v| v.as_deref())
    }

    pub fn key_tuple(&self, key_columns: &[String]) -> KeyTuple {
        key_tuple_of(&self.values, key_columns)
    }
}
