//! scdflow
//!
//! Fachada del motor de merge versionado (SCD tipo 2):
//! - Reexporta `scd_core` (modelo, componentes y orquestador) y
//!   `scd_persistence` (backend Postgres).
//! - `config`: configuración de la aplicación desde variables de entorno.
//! - `pipeline`: armado del reconciliador a partir de la configuración.

pub mod config;
pub mod pipeline;

pub use scd_core;
pub use scd_persistence;

pub use config::{AppConfig, ConfigError};
pub use pipeline::{build_in_memory_reconciler, build_pg_reconciler, build_reconciler_from_env, PgReconciler};
pub use scd_core::{Batch, Reconciler, RunOutcome, RunReport, RunStatus, TableConfig, TableRegistry};
