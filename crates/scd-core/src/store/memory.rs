//! Backend en memoria del `TableStore`.
//!
//! Cada tabla es una partición independiente dentro de un `DashMap`, de modo
//! que corridas sobre tablas distintas pueden avanzar en paralelo sin un lock
//! global. Dentro de una tabla las operaciones toman el lock de su entrada.
use std::collections::HashSet;

use dashmap::DashMap;
use log::debug;

use super::{FlagUpdate, MergeCounts, MergePlan, RowPredicate, TableStore};
use crate::constants::is_system_column;
use crate::errors::StoreError;
use crate::model::{KeyTuple, VersionedRecord};

#[derive(Debug, Clone, Default)]
struct MemTable {
    columns: Vec<String>,
    rows: Vec<VersionedRecord>,
}

impl MemTable {
    /// Alinea los valores de la fila al esquema de la tabla (faltantes ->
    /// nulo). Columnas desconocidas son un error de esquema.
    fn conform(&self, table: &str, row: &VersionedRecord) -> Result<VersionedRecord, StoreError> {
        if let Some(extra) = row.values.keys().find(|c| !self.columns.contains(*c)) {
            return Err(StoreError::SchemaMismatch(format!("column '{extra}' does not exist in table '{table}'")));
        }
        let mut out = row.clone();
        out.values = self.columns
                         .iter()
                         .map(|c| (c.clone(), row.values.get(c).cloned().flatten()))
                         .collect();
        Ok(out)
    }
}

#[derive(Debug, Default)]
pub struct InMemoryTableStore {
    tables: DashMap<String, MemTable>,
}

impl InMemoryTableStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Todas las filas de la tabla (históricas incluidas), en orden de
    /// inserción. Vacío si la tabla no existe.
    pub fn rows(&self, table: &str) -> Vec<VersionedRecord> {
        self.tables.get(table).map(|t| t.rows.clone()).unwrap_or_default()
    }
}

impl TableStore for InMemoryTableStore {
    fn exists(&self, table: &str) -> Result<bool, StoreError> {
        Ok(self.tables.contains_key(table))
    }

    fn read_current_and_tombstoned(&self, table: &str) -> Result<Vec<VersionedRecord>, StoreError> {
        let t = self.tables
                    .get(table)
                    .ok_or_else(|| StoreError::MissingTable(table.to_string()))?;
        Ok(t.rows.iter().filter(|r| r.active || r.deleted).cloned().collect())
    }

    fn conditional_update(&self,
                          table: &str,
                          predicate: RowPredicate,
                          key_columns: &[String],
                          keys: &[KeyTuple],
                          set: FlagUpdate)
                          -> Result<usize, StoreError> {
        let mut t = self.tables
                        .get_mut(table)
                        .ok_or_else(|| StoreError::MissingTable(table.to_string()))?;
        let wanted: HashSet<&KeyTuple> = keys.iter().collect();
        let mut affected = 0;
        for row in t.rows.iter_mut() {
            if predicate.matches(row) && wanted.contains(&row.key_tuple(key_columns)) {
                set.apply(row);
                affected += 1;
            }
        }
        debug!("conditional_update table={table} predicate={predicate:?} keys={} affected={affected}", keys.len());
        Ok(affected)
    }

    fn append(&self, table: &str, rows: &[VersionedRecord]) -> Result<(), StoreError> {
        let mut t = self.tables
                        .get_mut(table)
                        .ok_or_else(|| StoreError::MissingTable(table.to_string()))?;
        let conformed = rows.iter().map(|r| t.conform(table, r)).collect::<Result<Vec<_>, _>>()?;
        t.rows.extend(conformed);
        debug!("append table={table} rows={}", rows.len());
        Ok(())
    }

    fn bootstrap_write(&self, table: &str, columns: &[String], rows: &[VersionedRecord]) -> Result<(), StoreError> {
        if let Some(c) = columns.iter().find(|c| is_system_column(c)) {
            return Err(StoreError::SchemaMismatch(format!("column '{c}' is reserved")));
        }
        let mut fresh = MemTable { columns: columns.to_vec(),
                                   rows: Vec::with_capacity(rows.len()) };
        for r in rows {
            let conformed = fresh.conform(table, r)?;
            fresh.rows.push(conformed);
        }
        match self.tables.entry(table.to_string()) {
            dashmap::mapref::entry::Entry::Occupied(_) => Err(StoreError::TableExists(table.to_string())),
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(fresh);
                debug!("bootstrap_write table={table} rows={}", rows.len());
                Ok(())
            }
        }
    }

    fn count(&self, table: &str) -> Result<u64, StoreError> {
        self.tables
            .get(table)
            .map(|t| t.rows.len() as u64)
            .ok_or_else(|| StoreError::MissingTable(table.to_string()))
    }

    /// Bajo el lock de la entrada: primero se conforman todas las filas
    /// nuevas, después se retira y se extiende. Un error de esquema no deja
    /// ninguna mutación aplicada.
    fn apply_merge(&self, table: &str, key_columns: &[String], plan: &MergePlan) -> Result<MergeCounts, StoreError> {
        let mut t = self.tables
                        .get_mut(table)
                        .ok_or_else(|| StoreError::MissingTable(table.to_string()))?;
        let conformed = plan.insert
                            .iter()
                            .map(|r| t.conform(table, r))
                            .collect::<Result<Vec<_>, _>>()?;
        let wanted: HashSet<&KeyTuple> = plan.retire.iter().collect();
        let retire = FlagUpdate::retire();
        let mut retired = 0;
        for row in t.rows.iter_mut() {
            if row.is_current() && wanted.contains(&row.key_tuple(key_columns)) {
                retire.apply(row);
                retired += 1;
            }
        }
        t.rows.extend(conformed);
        debug!("apply_merge table={table} retired={retired} inserted={}", plan.insert.len());
        Ok(MergeCounts { retired,
                         inserted: plan.insert.len() })
    }
}
