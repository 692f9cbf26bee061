//! Registro de entrada: mapeo ordenado de columnas a valores string.
//!
//! Los valores son `Option<String>` porque la fuente puede entregar nulos; la
//! normalización nulo -> vacío ocurre al hashear y al comparar llaves, nunca
//! al almacenar (el valor original se persiste tal cual).
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::hashing::coalesce;

/// Valores de llave primaria en el orden configurado, normalizados (nulo ==
/// vacío). Es la unidad de los joins por llave.
pub type KeyTuple = Vec<String>;

pub type RowValues = IndexMap<String, Option<String>>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub values: RowValues,
    /// Secuencia de llegada dentro del batch. Artefacto interno para el
    /// desempate de la deduplicación; no se persiste.
    #[serde(default)]
    pub seq: u64,
}

impl Record {
    pub fn new(values: RowValues) -> Self {
        Self { values, seq: 0 }
    }

    /// Atajo para tests y adaptadores: pares `(columna, valor)`.
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
        where K: Into<String>,
              V: Into<String>,
              I: IntoIterator<Item = (K, Option<V>)>
    {
        let values = pairs.into_iter().map(|(k, v)| (k.into(), v.map(Into::into))).collect();
        Self::new(values)
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.values.get(column).and_then(|v| v.as_deref())
    }

    pub fn key_tuple(&self, key_columns: &[String]) -> KeyTuple {
        key_tuple_of(&self.values, key_columns)
    }
}

pub(crate) fn key_tuple_of(values: &RowValues, key_columns: &[String]) -> KeyTuple {
    key_columns.iter()
               .map(|c| coalesce(values.get(c.as_str()).and_then(|v| v.as_deref())).to_string())
               .collect()
}
