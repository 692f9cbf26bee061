//! Merge: retiro de versiones vigentes reemplazadas e inserción de las nuevas.
use log::debug;

use super::detect::ChangeSet;
use crate::errors::StoreError;
use crate::store::{MergeCounts, MergePlan, TableStore};

/// Retira sólo llaves con fila vigente previa (`Changed`); nuevas y
/// resucitadas no tienen nada que retirar. Inserta todas las filas del set.
pub fn plan_merge(change_set: &ChangeSet) -> MergePlan {
    let retire = change_set.rows
                           .iter()
                           .filter(|r| r.kind.retires_prior())
                           .map(|r| r.key.clone())
                           .collect();
    let insert = change_set.rows
                           .iter()
                           .map(|r| {
                               let mut rec = r.record.clone();
                               rec.active = true;
                               rec.deleted = false;
                               rec
                           })
                           .collect();
    MergePlan { retire, insert }
}

pub fn merge<S: TableStore + ?Sized>(store: &S,
                                     table: &str,
                                     key_columns: &[String],
                                     change_set: &ChangeSet)
                                     -> Result<MergeCounts, StoreError> {
    let plan = plan_merge(change_set);
    if plan.is_empty() {
        debug!("merge:skip table={table} (no changes)");
        return Ok(MergeCounts::default());
    }
    let counts = store.apply_merge(table, key_columns, &plan)?;
    debug!("merge:done table={table} retired={} inserted={}", counts.retired, counts.inserted);
    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconcile::detect::{current_state_by_key, detect_changes};
    use crate::store::{InMemoryTableStore, TableStore};
    use crate::model::VersionedRecord;
    use indexmap::IndexMap;

    fn v(id: &str, name: &str, active: bool, deleted: bool) -> VersionedRecord {
        let mut values = IndexMap::new();
        values.insert("id".to_string(), Some(id.to_string()));
        values.insert("name".to_string(), Some(name.to_string()));
        VersionedRecord { values,
                          key_hash: id.to_string(),
                          row_hash: name.to_string(),
                          source_system: "t".into(),
                          active,
                          deleted }
    }

    fn keys() -> Vec<String> {
        vec!["id".to_string()]
    }

    #[test]
    fn plan_retires_only_changed_keys() {
        let view = vec![v("1", "a", true, false), v("2", "b", false, true)];
        let state = current_state_by_key(&view, &keys());
        let set = detect_changes(vec![v("1", "a2", true, false), v("2", "b", true, false), v("3", "c", true, false)],
                                 &state,
                                 &keys());
        let plan = plan_merge(&set);
        assert_eq!(plan.retire, vec![vec!["1".to_string()]]);
        assert_eq!(plan.insert.len(), 3);
        assert!(plan.insert.iter().all(VersionedRecord::is_current));
    }

    #[test]
    fn merge_keeps_one_current_row_per_key() {
        let store = InMemoryTableStore::new();
        let cols = vec!["id".to_string(), "name".to_string()];
        store.bootstrap_write("t", &cols, &[v("1", "a", true, false)]).expect("bootstrap");
        let view = store.read_current_and_tombstoned("t").expect("read");
        let state = current_state_by_key(&view, &keys());
        let set = detect_changes(vec![v("1", "b", true, false)], &state, &keys());
        let counts = merge(&store, "t", &keys(), &set).expect("merge");
        assert_eq!((counts.retired, counts.inserted), (1, 1));
        let rows = store.rows("t");
        assert_eq!(rows.iter().filter(|r| r.is_current()).count(), 1);
        assert_eq!(rows[1].get("name"), Some("b"));
    }

    #[test]
    fn empty_change_set_skips_store() {
        let store = InMemoryTableStore::new();
        let counts = merge(&store, "missing", &keys(), &ChangeSet::default()).expect("no-op");
        assert_eq!(counts, MergeCounts::default());
    }
}
