//! Componentes del merge versionado, de hoja a raíz:
//! fingerprint -> dedup -> detect -> merge -> delete.
//!
//! Cada componente es una función sobre datos explícitos; el único estado
//! compartido es el `TableStore`, y sólo `merge` y `delete` escriben en él.

pub mod dedup;
pub mod delete;
pub mod detect;
pub mod fingerprint;
pub mod merge;
pub mod validate;

pub use dedup::deduplicate;
pub use delete::{keys_to_tombstone, reconcile_deletions};
pub use detect::{current_state_by_key, detect_changes, ChangeKind, ChangeSet, ClassifiedRow};
pub use fingerprint::{compare_columns, key_fingerprint, row_fingerprint, Fingerprinter};
pub use merge::{merge, plan_merge};
pub use validate::validate_batch;
