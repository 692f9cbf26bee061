//! Modelo de datos: registros de entrada, batches y filas versionadas.

pub mod batch;
pub mod record;
pub mod versioned;

pub use batch::{format_load_ts, Batch};
pub use record::{KeyTuple, Record, RowValues};
pub use versioned::VersionedRecord;
