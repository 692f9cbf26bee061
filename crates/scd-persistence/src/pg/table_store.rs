//! `TableStore` sobre Postgres.
//!
//! Cada tabla destino tiene las columnas de la fuente (todas `text`) más las
//! columnas de sistema. Las lecturas devuelven la fila completa como `jsonb`
//! (`to_jsonb(t)`) y se reordenan según `information_schema.columns`.
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Bool, Jsonb, Text};
use indexmap::IndexMap;
use log::debug;
use serde_json::Value;

use scd_core::constants::{is_system_column, ACTIVE_COLUMN, DELETED_COLUMN, KEY_HASH_COLUMN, ROW_HASH_COLUMN,
                          SOURCE_SYSTEM_COLUMN};
use scd_core::{FlagUpdate, KeyTuple, MergeCounts, MergePlan, RowPredicate, StoreError, TableStore, VersionedRecord};

use super::{with_retry, ConnectionProvider};
use crate::error::PersistenceError;
use crate::sql;

#[derive(QueryableByName, Debug)]
struct JsonRow {
    #[diesel(sql_type = Jsonb)]
    payload: Value,
}

#[derive(QueryableByName, Debug)]
struct CountRow {
    #[diesel(sql_type = BigInt)]
    count: i64,
}

#[derive(QueryableByName, Debug)]
struct PresentRow {
    #[diesel(sql_type = Bool)]
    present: bool,
}

#[derive(QueryableByName, Debug)]
struct ColumnRow {
    #[diesel(sql_type = Text)]
    name: String,
}

pub struct PgTableStore<P: ConnectionProvider> {
    pub provider: P,
}

impl<P: ConnectionProvider> PgTableStore<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// Elimina la tabla si existe (tests y reprocesos manuales).
    pub fn drop_table(&self, table: &str) -> Result<(), StoreError> {
        with_retry(|| {
            let mut conn = self.provider.connection()?;
            diesel::sql_query(format!("DROP TABLE IF EXISTS {}", sql::quote_ident(table))).execute(&mut conn)?;
            Ok(())
        })?;
        Ok(())
    }
}

fn table_exists(conn: &mut PgConnection, table: &str) -> Result<bool, PersistenceError> {
    let row: PresentRow = diesel::sql_query("SELECT EXISTS (SELECT 1 FROM information_schema.tables \
                                             WHERE table_schema = current_schema() AND table_name = $1) AS present")
        .bind::<Text, _>(table)
        .get_result(conn)?;
    Ok(row.present)
}

fn table_columns(conn: &mut PgConnection, table: &str) -> Result<Vec<String>, PersistenceError> {
    let rows: Vec<ColumnRow> = diesel::sql_query("SELECT column_name::text AS name FROM information_schema.columns \
                                                  WHERE table_schema = current_schema() AND table_name = $1 \
                                                  ORDER BY ordinal_position")
        .bind::<Text, _>(table)
        .load(conn)?;
    if rows.is_empty() {
        return Err(PersistenceError::MissingTable(table.to_string()));
    }
    Ok(rows.into_iter().map(|r| r.name).collect())
}

fn text_field(payload: &Value, column: &str) -> Result<String, PersistenceError> {
    payload.get(column)
           .and_then(Value::as_str)
           .map(str::to_string)
           .ok_or_else(|| PersistenceError::Schema(format!("column '{column}' missing or not text")))
}

fn bool_field(payload: &Value, column: &str) -> Result<bool, PersistenceError> {
    payload.get(column)
           .and_then(Value::as_bool)
           .ok_or_else(|| PersistenceError::Schema(format!("column '{column}' missing or not boolean")))
}

fn version_from_payload(columns: &[String], payload: &Value) -> Result<VersionedRecord, PersistenceError> {
    let values: IndexMap<String, Option<String>> =
        columns.iter()
               .filter(|c| !is_system_column(c))
               .map(|c| (c.clone(), payload.get(c.as_str()).and_then(Value::as_str).map(str::to_string)))
               .collect();
    Ok(VersionedRecord { values,
                         key_hash: text_field(payload, KEY_HASH_COLUMN)?,
                         row_hash: text_field(payload, ROW_HASH_COLUMN)?,
                         source_system: text_field(payload, SOURCE_SYSTEM_COLUMN)?,
                         active: bool_field(payload, ACTIVE_COLUMN)?,
                         deleted: bool_field(payload, DELETED_COLUMN)? })
}

fn update_flags(conn: &mut PgConnection,
                table: &str,
                predicate: RowPredicate,
                key_columns: &[String],
                keys: &[KeyTuple],
                set: FlagUpdate)
                -> Result<usize, PersistenceError> {
    if keys.is_empty() {
        return Ok(0);
    }
    let Some(stmt) = sql::conditional_update(table, predicate, key_columns, set) else {
        return Ok(0);
    };
    if !table_exists(conn, table)? {
        return Err(PersistenceError::MissingTable(table.to_string()));
    }
    let affected = diesel::sql_query(stmt).bind::<Jsonb, _>(sql::keys_payload(key_columns, keys))
                                          .execute(conn)?;
    Ok(affected)
}

fn insert_versions(conn: &mut PgConnection, table: &str, rows: &[VersionedRecord]) -> Result<(), PersistenceError> {
    if rows.is_empty() {
        return Ok(());
    }
    let columns = table_columns(conn, table)?;
    for row in rows {
        if let Some(extra) = row.values.keys().find(|c| !columns.contains(*c)) {
            return Err(PersistenceError::Schema(format!("column '{extra}' not in table '{table}'")));
        }
    }
    diesel::sql_query(sql::insert_rows(table)).bind::<Jsonb, _>(sql::rows_payload(rows))
                                              .execute(conn)?;
    Ok(())
}

impl<P: ConnectionProvider> TableStore for PgTableStore<P> {
    fn exists(&self, table: &str) -> Result<bool, StoreError> {
        let present = with_retry(|| {
            let mut conn = self.provider.connection()?;
            table_exists(&mut conn, table)
        })?;
        Ok(present)
    }

    fn read_current_and_tombstoned(&self, table: &str) -> Result<Vec<VersionedRecord>, StoreError> {
        debug!("read_current_and_tombstoned:start table={table}");
        let rows = with_retry(|| {
            let mut conn = self.provider.connection()?;
            let columns = table_columns(&mut conn, table)?;
            let payloads: Vec<JsonRow> = diesel::sql_query(sql::select_current_and_tombstoned(table)).load(&mut conn)?;
            payloads.iter()
                    .map(|r| version_from_payload(&columns, &r.payload))
                    .collect::<Result<Vec<_>, _>>()
        })?;
        debug!("read_current_and_tombstoned:done table={table} rows={}", rows.len());
        Ok(rows)
    }

    fn conditional_update(&self,
                          table: &str,
                          predicate: RowPredicate,
                          key_columns: &[String],
                          keys: &[KeyTuple],
                          set: FlagUpdate)
                          -> Result<usize, StoreError> {
        let affected = with_retry(|| {
            let mut conn = self.provider.connection()?;
            update_flags(&mut conn, table, predicate, key_columns, keys, set)
        })?;
        debug!("conditional_update table={table} predicate={predicate:?} keys={} affected={affected}", keys.len());
        Ok(affected)
    }

    fn append(&self, table: &str, rows: &[VersionedRecord]) -> Result<(), StoreError> {
        with_retry(|| {
            let mut conn = self.provider.connection()?;
            insert_versions(&mut conn, table, rows)
        })?;
        debug!("append table={table} rows={}", rows.len());
        Ok(())
    }

    fn bootstrap_write(&self, table: &str, columns: &[String], rows: &[VersionedRecord]) -> Result<(), StoreError> {
        if let Some(reserved) = columns.iter().find(|c| is_system_column(c)) {
            return Err(StoreError::SchemaMismatch(format!("source column '{reserved}' is reserved")));
        }
        debug!("bootstrap_write:start table={table} columns={} rows={}", columns.len(), rows.len());
        with_retry(|| {
            let mut conn = self.provider.connection()?;
            conn.build_transaction()
                .read_write()
                .run::<_, PersistenceError, _>(|tx| {
                    if table_exists(tx, table)? {
                        return Err(PersistenceError::TableExists(table.to_string()));
                    }
                    diesel::sql_query(sql::create_table(table, columns)).execute(tx)?;
                    diesel::sql_query(sql::create_current_key_index(table)).execute(tx)?;
                    insert_versions(tx, table, rows)
                })
        })?;
        debug!("bootstrap_write:done table={table}");
        Ok(())
    }

    fn count(&self, table: &str) -> Result<u64, StoreError> {
        let count = with_retry(|| {
            let mut conn = self.provider.connection()?;
            if !table_exists(&mut conn, table)? {
                return Err(PersistenceError::MissingTable(table.to_string()));
            }
            let row: CountRow = diesel::sql_query(sql::count_rows(table)).get_result(&mut conn)?;
            Ok(row.count)
        })?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    /// Retiro + inserción en una única transacción: ningún lector observa
    /// la llave sin fila vigente ni con dos.
    fn apply_merge(&self, table: &str, key_columns: &[String], plan: &MergePlan) -> Result<MergeCounts, StoreError> {
        if plan.is_empty() {
            return Ok(MergeCounts::default());
        }
        debug!("apply_merge:start table={table} retire={} insert={}", plan.retire.len(), plan.insert.len());
        let retired = with_retry(|| {
            let mut conn = self.provider.connection()?;
            conn.build_transaction()
                .read_write()
                .run::<_, PersistenceError, _>(|tx| {
                    let retired =
                        update_flags(tx, table, RowPredicate::Current, key_columns, &plan.retire, FlagUpdate::retire())?;
                    insert_versions(tx, table, &plan.insert)?;
                    Ok(retired)
                })
        })?;
        debug!("apply_merge:done table={table} retired={retired} inserted={}", plan.insert.len());
        Ok(MergeCounts { retired,
                         inserted: plan.insert.len() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn payload_is_reordered_by_table_columns() {
        let columns: Vec<String> = ["id", "name", "key_hash", "row_hash", "source_system", "is_active", "is_deleted"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let payload = json!({
            "is_active": true, "is_deleted": false, "key_hash": "k", "row_hash": "r",
            "name": null, "id": "7", "source_system": "crm"
        });
        let v = version_from_payload(&columns, &payload).expect("valid payload");
        assert_eq!(v.values.keys().collect::<Vec<_>>(), vec!["id", "name"]);
        assert_eq!(v.get("name"), None);
        assert!(v.is_current());
    }

    #[test]
    fn payload_without_flags_is_schema_error() {
        let columns = vec!["id".to_string()];
        let err = version_from_payload(&columns, &json!({"id": "1", "key_hash": "k"})).unwrap_err();
        assert!(matches!(err, PersistenceError::Schema(_)));
    }
}
