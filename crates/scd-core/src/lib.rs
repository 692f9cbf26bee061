//! scd-core: motor de merge versionado (SCD tipo 2).
//!
//! Reconcilia snapshots periódicos contra una tabla con historia: una única
//! fila vigente por llave, versiones reemplazadas retenidas y llaves ausentes
//! marcadas como tombstone. Las operaciones son idempotentes: reprocesar el
//! mismo batch no produce escrituras.
pub mod constants;
pub mod engine;
pub mod errors;
pub mod hashing;
pub mod model;
pub mod reconcile;
pub mod registry;
pub mod relational;
pub mod store;

pub use engine::{AuditSink, BatchDisposition, InMemoryAuditSink, Reconciler, RunOutcome, RunReport, RunStatus};
pub use errors::{ReconcileError, StoreError, ValidationError};
pub use model::{Batch, KeyTuple, Record, VersionedRecord};
pub use registry::{TableConfig, TableRegistry};
pub use store::{FlagUpdate, InMemoryTableStore, MergeCounts, MergePlan, RowPredicate, TableStore};
