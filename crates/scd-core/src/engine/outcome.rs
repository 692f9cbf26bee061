//! Registro de resultado por batch (para el colaborador de auditoría).
//!
//! `OutcomeBuilder` se crea con valores por defecto definidos y se va
//! completando a medida que avanza la reconciliación, de modo que un fallo en
//! cualquier punto produce un registro completo sin depender de qué pasos
//! alcanzaron a ejecutarse.
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::Batch;
use crate::registry::ResolvedTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    Success,
    Failed,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Success => "Success",
            RunStatus::Failed => "Failed",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOutcome {
    pub run_id: Uuid,
    pub table_id: String,
    pub staging_table: String,
    pub target_table: String,
    pub status: RunStatus,
    pub input_rows: u64,
    pub deduplicated_rows: u64,
    /// Conteo de la tabla destino después del merge (0 si no se alcanzó).
    pub target_rows: u64,
    /// Tamaño legible de la entrada, p.ej. `"1.50 MB"`.
    pub input_size: String,
    pub message: String,
    pub recorded_at: DateTime<Utc>,
}

/// Tamaño en base 1024 con dos decimales (bytes sin decimales).
pub fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["KB", "MB", "GB", "TB", "PB"];
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.2} {}", UNITS[unit])
}

#[derive(Debug, Clone)]
pub struct OutcomeBuilder {
    run_id: Uuid,
    table_id: String,
    staging_table: String,
    target_table: String,
    input_rows: u64,
    deduplicated_rows: u64,
    target_rows: u64,
    input_size: String,
}

impl OutcomeBuilder {
    pub fn new(run_id: Uuid, table: &ResolvedTable, batch: &Batch) -> Self {
        Self { run_id,
               table_id: table.table_id.clone(),
               staging_table: table.staging_table.clone(),
               target_table: table.target_table.clone(),
               input_rows: batch.len() as u64,
               deduplicated_rows: 0,
               target_rows: 0,
               input_size: human_size(batch.source_bytes) }
    }

    pub fn deduplicated_rows(&mut self, n: usize) -> &mut Self {
        self.deduplicated_rows = n as u64;
        self
    }

    pub fn target_rows(&mut self, n: u64) -> &mut Self {
        self.target_rows = n;
        self
    }

    fn finish(self, status: RunStatus, message: String) -> RunOutcome {
        RunOutcome { run_id: self.run_id,
                     table_id: self.table_id,
                     staging_table: self.staging_table,
                     target_table: self.target_table,
                     status,
                     input_rows: self.input_rows,
                     deduplicated_rows: self.deduplicated_rows,
                     target_rows: self.target_rows,
                     input_size: self.input_size,
                     message,
                     recorded_at: Utc::now() }
    }

    pub fn success(self, message: impl Into<String>) -> RunOutcome {
        self.finish(RunStatus::Success, message.into())
    }

    pub fn failure(self, error: &impl fmt::Display) -> RunOutcome {
        self.finish(RunStatus::Failed, error.to_string())
    }
}
