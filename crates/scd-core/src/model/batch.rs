//! Batch: un arribo lógico de registros para una tabla destino.
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use super::record::{Record, RowValues};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Batch {
    /// Identificador de la fuente (p.ej. nombre del archivo snapshot). De su
    /// primer token se deriva la tabla lógica.
    pub source_id: String,
    /// Esquema ordenado del batch.
    pub columns: Vec<String>,
    pub rows: Vec<Record>,
    /// Tamaño de la entrada en bytes (sólo para el descriptor del outcome).
    #[serde(default)]
    pub source_bytes: u64,
}

impl Batch {
    /// Construye un batch con filas que ya traen su timestamp de carga. La
    /// secuencia de llegada se asigna por posición.
    pub fn from_rows(source_id: impl Into<String>, columns: Vec<String>, rows: Vec<Record>) -> Self {
        let rows = rows.into_iter()
                       .enumerate()
                       .map(|(i, mut r)| {
                           r.seq = i as u64;
                           r
                       })
                       .collect();
        Self { source_id: source_id.into(),
               columns,
               rows,
               source_bytes: 0 }
    }

    /// Ingesta: estampa cada fila con el timestamp de carga (RFC 3339, UTC) en
    /// `load_ts_column` y agrega la columna al esquema si no existe.
    pub fn ingest(source_id: impl Into<String>,
                  mut columns: Vec<String>,
                  rows: Vec<RowValues>,
                  load_ts_column: &str,
                  load_ts: DateTime<Utc>)
                  -> Self {
        if !columns.iter().any(|c| c == load_ts_column) {
            columns.push(load_ts_column.to_string());
        }
        let stamp = format_load_ts(load_ts);
        let rows = rows.into_iter()
                       .map(|mut values| {
                           values.insert(load_ts_column.to_string(), Some(stamp.clone()));
                           Record::new(values)
                       })
                       .collect();
        Self::from_rows(source_id, columns, rows)
    }

    pub fn with_source_bytes(mut self, bytes: u64) -> Self {
        self.source_bytes = bytes;
        self
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }
}

pub fn format_load_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use indexmap::IndexMap;

    #[test]
    fn ingest_stamps_rows_and_extends_schema() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let mut row = IndexMap::new();
        row.insert("id".to_string(), Some("1".to_string()));
        let b = Batch::ingest("customer_1.csv", vec!["id".into()], vec![row.clone(), row], "load_timestamp", ts);
        assert_eq!(b.columns, vec!["id".to_string(), "load_timestamp".to_string()]);
        assert_eq!(b.rows[0].get("load_timestamp"), Some("2024-01-02T03:04:05.000000Z"));
        assert_eq!(b.rows[1].seq, 1);
    }
}
