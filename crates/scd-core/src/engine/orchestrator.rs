//! Orquestador por tabla.
//!
//! Máquina de estados de una tabla en una corrida:
//!
//! ```text
//! NoTarget     -> Bootstrap -> Done
//! TargetExists -> Reconcile -> Done
//! ```
//!
//! Cualquier error dentro de `Bootstrap` o `Reconcile` se convierte en un
//! outcome `Failed` y la corrida sigue con el siguiente batch.
use std::collections::{BTreeMap, HashSet};

use log::{debug, error, info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::audit::{AuditSink, InMemoryAuditSink};
use super::outcome::{OutcomeBuilder, RunOutcome, RunStatus};
use crate::errors::{ReconcileError, StoreError};
use crate::model::{Batch, KeyTuple, VersionedRecord};
use crate::reconcile::{current_state_by_key, deduplicate, detect_changes, merge, reconcile_deletions, validate_batch,
                       Fingerprinter};
use crate::registry::{table_id_for_source, ResolvedTable, TableRegistry};
use crate::store::{InMemoryTableStore, TableStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TableState {
    NoTarget,
    Bootstrap,
    TargetExists,
    Reconcile,
    Done,
}

impl TableState {
    pub fn next(self) -> Self {
        match self {
            TableState::NoTarget => TableState::Bootstrap,
            TableState::TargetExists => TableState::Reconcile,
            TableState::Bootstrap | TableState::Reconcile | TableState::Done => TableState::Done,
        }
    }
}

/// Resumen de lo aplicado sobre una tabla en una corrida exitosa.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSummary {
    pub bootstrapped: bool,
    pub new: usize,
    pub changed: usize,
    pub resurrected: usize,
    pub unchanged: usize,
    pub retired: usize,
    pub inserted: usize,
    pub tombstoned: usize,
}

impl TableSummary {
    /// Número de filas escritas o mutadas.
    pub fn writes(&self) -> usize {
        self.retired + self.inserted + self.tombstoned
    }

    fn message(&self) -> String {
        if self.bootstrapped {
            format!("bootstrap: inserted {} rows", self.inserted)
        } else {
            format!("merged: new={} changed={} resurrected={} unchanged={} retired={} inserted={} tombstoned={}",
                    self.new, self.changed, self.resurrected, self.unchanged, self.retired, self.inserted, self.tombstoned)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchDisposition {
    Processed(RunOutcome),
    /// Tabla no configurada: se omite sin outcome.
    Skipped { source_id: String, table_id: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedBatch {
    pub source_id: String,
    pub table_id: String,
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: Uuid,
    pub outcomes: Vec<RunOutcome>,
    pub skipped: Vec<SkippedBatch>,
    /// Fallo de la escritura de auditoría (no aborta la corrida).
    pub audit_error: Option<StoreError>,
}

impl RunReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.status == RunStatus::Success).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.status == RunStatus::Failed).count()
    }
}

/// Motor de reconciliación SCD2 sobre un `TableStore`.
#[derive(Debug)]
pub struct Reconciler<S, A>
    where S: TableStore,
          A: AuditSink
{
    store: S,
    audit: A,
    registry: TableRegistry,
}

impl Reconciler<InMemoryTableStore, InMemoryAuditSink> {
    /// Reconciliador con store y auditoría en memoria.
    pub fn in_memory(registry: TableRegistry) -> Self {
        Self::new(InMemoryTableStore::new(), InMemoryAuditSink::new(), registry)
    }
}

impl<S, A> Reconciler<S, A>
    where S: TableStore,
          A: AuditSink
{
    pub fn new(store: S, audit: A, registry: TableRegistry) -> Self {
        Self { store, audit, registry }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn audit(&self) -> &A {
        &self.audit
    }

    pub fn registry(&self) -> &TableRegistry {
        &self.registry
    }

    /// Procesa un batch aislado con un `run_id` propio. No escribe auditoría.
    pub fn process_batch(&self, batch: &Batch) -> BatchDisposition {
        self.process_in_run(Uuid::new_v4(), batch)
    }

    fn process_in_run(&self, run_id: Uuid, batch: &Batch) -> BatchDisposition {
        let Some(table) = self.registry.resolve(&batch.source_id) else {
            let table_id = table_id_for_source(&batch.source_id);
            warn!("skip batch source={} table_id={table_id}: no table configured", batch.source_id);
            return BatchDisposition::Skipped { source_id: batch.source_id.clone(),
                                               table_id };
        };
        let mut outcome = OutcomeBuilder::new(run_id, &table, batch);
        let result = self.reconcile_table(&table, batch, &mut outcome);
        let outcome = match result {
            Ok(summary) => {
                info!("table={} target={} rows_in={} writes={} {}",
                      table.table_id,
                      table.target_table,
                      batch.len(),
                      summary.writes(),
                      summary.message());
                outcome.success(summary.message())
            }
            Err(e) => {
                error!("table={} target={} source={} failed: {e}", table.table_id, table.target_table, batch.source_id);
                outcome.failure(&e)
            }
        };
        BatchDisposition::Processed(outcome)
    }

    fn reconcile_table(&self,
                       table: &ResolvedTable,
                       batch: &Batch,
                       outcome: &mut OutcomeBuilder)
                       -> Result<TableSummary, ReconcileError> {
        let keys = &table.key_columns;
        let load_ts = self.registry.load_ts_column.as_str();
        validate_batch(batch, keys, load_ts)?;

        let deduped = deduplicate(batch, keys, load_ts)?;
        outcome.deduplicated_rows(deduped.len());
        let fingerprinter = Fingerprinter::new(&batch.columns, keys, load_ts, &self.registry.source_system);
        let candidates: Vec<VersionedRecord> = deduped.iter().map(|r| fingerprinter.version(r)).collect();

        let entry = if self.store.exists(&table.target_table)? {
            TableState::TargetExists
        } else {
            TableState::NoTarget
        };
        let step = entry.next();
        debug!("table={} {entry:?} -> {step:?}", table.table_id);
        let summary = match step {
            TableState::Bootstrap => self.bootstrap(table, batch, candidates)?,
            _ => self.reconcile(table, candidates)?,
        };
        debug!("table={} {step:?} -> {:?}", table.table_id, step.next());
        outcome.target_rows(self.store.count(&table.target_table)?);
        Ok(summary)
    }

    fn bootstrap(&self, table: &ResolvedTable, batch: &Batch, rows: Vec<VersionedRecord>) -> Result<TableSummary, ReconcileError> {
        self.store.bootstrap_write(&table.target_table, &batch.columns, &rows)?;
        Ok(TableSummary { bootstrapped: true,
                          new: rows.len(),
                          inserted: rows.len(),
                          ..TableSummary::default() })
    }

    fn reconcile(&self, table: &ResolvedTable, candidates: Vec<VersionedRecord>) -> Result<TableSummary, ReconcileError> {
        let keys = &table.key_columns;
        let view = self.store.read_current_and_tombstoned(&table.target_table)?;
        let batch_keys: HashSet<KeyTuple> = candidates.iter().map(|c| c.key_tuple(keys)).collect();

        let state = current_state_by_key(&view, keys);
        let changes = detect_changes(candidates, &state, keys);
        let counts = merge(&self.store, &table.target_table, keys, &changes)?;
        let tombstoned = reconcile_deletions(&self.store, &table.target_table, keys, &view, &batch_keys)?;

        Ok(TableSummary { bootstrapped: false,
                          new: changes.new,
                          changed: changes.changed,
                          resurrected: changes.resurrected,
                          unchanged: changes.unchanged,
                          retired: counts.retired,
                          inserted: counts.inserted,
                          tombstoned })
    }

    /// Procesa los batches en orden y escribe la auditoría una sola vez al
    /// final.
    pub fn run(&self, batches: &[Batch]) -> RunReport {
        let run_id = Uuid::new_v4();
        let dispositions = batches.iter().map(|b| self.process_in_run(run_id, b)).collect();
        self.finish_run(run_id, dispositions)
    }

    /// Igual que `run`, pero tablas distintas avanzan en paralelo. Los batches
    /// de una misma tabla destino se procesan en orden de llegada dentro de un
    /// único grupo, así nunca hay dos merges en vuelo sobre la misma tabla.
    pub fn run_parallel(&self, batches: &[Batch]) -> RunReport {
        let run_id = Uuid::new_v4();
        let mut groups: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for (i, b) in batches.iter().enumerate() {
            let group = self.registry
                            .resolve(&b.source_id)
                            .map(|t| t.target_table)
                            .unwrap_or_else(|| table_id_for_source(&b.source_id));
            groups.entry(group).or_default().push(i);
        }
        let mut indexed: Vec<(usize, BatchDisposition)> =
            groups.into_par_iter()
                  .flat_map_iter(|(_, idxs)| {
                      idxs.into_iter()
                          .map(|i| (i, self.process_in_run(run_id, &batches[i])))
                          .collect::<Vec<_>>()
                  })
                  .collect();
        indexed.sort_by_key(|(i, _)| *i);
        self.finish_run(run_id, indexed.into_iter().map(|(_, d)| d).collect())
    }

    fn finish_run(&self, run_id: Uuid, dispositions: Vec<BatchDisposition>) -> RunReport {
        let mut outcomes = Vec::new();
        let mut skipped = Vec::new();
        for d in dispositions {
            match d {
                BatchDisposition::Processed(o) => outcomes.push(o),
                BatchDisposition::Skipped { source_id, table_id } => skipped.push(SkippedBatch { source_id, table_id }),
            }
        }
        let audit_error = if outcomes.is_empty() {
            None
        } else {
            self.audit.record(&outcomes).err()
        };
        if let Some(e) = &audit_error {
            error!("run={run_id} audit write failed: {e}");
        }
        info!("run={run_id} processed={} skipped={}", outcomes.len(), skipped.len());
        RunReport { run_id,
                    outcomes,
                    skipped,
                    audit_error }
    }
}
