//! Orquestación de corridas: secuencia dedup -> detect -> merge -> delete por
//! tabla, outcomes por batch y escritura única de auditoría.

pub mod audit;
pub mod orchestrator;
pub mod outcome;

pub use audit::{AuditSink, InMemoryAuditSink};
pub use orchestrator::{BatchDisposition, Reconciler, RunReport, SkippedBatch, TableState, TableSummary};
pub use outcome::{human_size, OutcomeBuilder, RunOutcome, RunStatus};
