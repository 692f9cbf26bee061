//! Reconciliación de borrados: llaves vigentes en el store que no llegaron en
//! el batch se marcan como tombstone (`active = false, deleted = true`).
use std::collections::HashSet;

use log::{debug, warn};

use crate::errors::StoreError;
use crate::model::{KeyTuple, VersionedRecord};
use crate::relational::key_set_difference;
use crate::store::{FlagUpdate, RowPredicate, TableStore};

/// Anti-join entre llaves vigentes y llaves del batch. Sin repetidos, en el
/// orden de la vista.
pub fn keys_to_tombstone(view: &[VersionedRecord], batch_keys: &HashSet<KeyTuple>, key_columns: &[String]) -> Vec<KeyTuple> {
    let mut seen = HashSet::new();
    let current = view.iter()
                      .filter(|r| r.is_current())
                      .map(|r| r.key_tuple(key_columns))
                      .filter(|k| seen.insert(k.clone()))
                      .map(|k| (k.clone(), k));
    key_set_difference(current, batch_keys)
}

pub fn reconcile_deletions<S: TableStore + ?Sized>(store: &S,
                                                   table: &str,
                                                   key_columns: &[String],
                                                   view: &[VersionedRecord],
                                                   batch_keys: &HashSet<KeyTuple>)
                                                   -> Result<usize, StoreError> {
    let missing = keys_to_tombstone(view, batch_keys, key_columns);
    if missing.is_empty() {
        return Ok(0);
    }
    if batch_keys.is_empty() {
        warn!("delete: empty batch for table={table}; tombstoning all {} current keys", missing.len());
    }
    let affected = store.conditional_update(table, RowPredicate::Current, key_columns, &missing, FlagUpdate::tombstone())?;
    debug!("delete:done table={table} candidates={} affected={affected}", missing.len());
    Ok(affected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryTableStore;
    use indexmap::IndexMap;

    fn v(id: &str, active: bool, deleted: bool) -> VersionedRecord {
        let mut values = IndexMap::new();
        values.insert("id".to_string(), Some(id.to_string()));
        VersionedRecord { values,
                          key_hash: id.to_string(),
                          row_hash: String::new(),
                          source_system: "t".into(),
                          active,
                          deleted }
    }

    fn key(id: &str) -> KeyTuple {
        vec![id.to_string()]
    }

    #[test]
    fn only_current_keys_absent_from_batch_are_tombstoned() {
        let view = vec![v("1", true, false), v("2", true, false), v("3", false, true)];
        let batch_keys: HashSet<KeyTuple> = [key("1")].into_iter().collect();
        assert_eq!(keys_to_tombstone(&view, &batch_keys, &["id".to_string()]), vec![key("2")]);
    }

    #[test]
    fn empty_batch_tombstones_every_current_key() {
        let store = InMemoryTableStore::new();
        let rows = vec![v("1", true, false), v("2", true, false)];
        store.bootstrap_write("t", &["id".to_string()], &rows).expect("bootstrap");
        let view = store.read_current_and_tombstoned("t").expect("read");
        let n = reconcile_deletions(&store, "t", &["id".to_string()], &view, &HashSet::new()).expect("delete");
        assert_eq!(n, 2);
        assert!(store.rows("t").iter().all(|r| r.is_tombstone() && !r.active));
        // Reproceso: ya no hay filas vigentes.
        let view = store.read_current_and_tombstoned("t").expect("read");
        assert_eq!(reconcile_deletions(&store, "t", &["id".to_string()], &view, &HashSet::new()).expect("delete"), 0);
    }
}
