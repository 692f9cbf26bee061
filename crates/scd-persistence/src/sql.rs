//! Render de SQL dinámico para las tablas destino.
//!
//! Las tablas SCD2 tienen el esquema del batch (todas las columnas `text`)
//! más las columnas de sistema, por lo que no pueden declararse con
//! `diesel::table!`. Los identificadores siempre se citan; los valores viajan
//! como parámetro `jsonb` ($1), nunca interpolados.
use serde_json::{Map, Value};

use scd_core::constants::{ACTIVE_COLUMN, DELETED_COLUMN, KEY_HASH_COLUMN, ROW_HASH_COLUMN, SOURCE_SYSTEM_COLUMN};
use scd_core::{FlagUpdate, KeyTuple, RowPredicate, VersionedRecord};

/// Cita un identificador Postgres (comillas dobles, duplicando las internas).
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

pub fn create_table(table: &str, columns: &[String]) -> String {
    let mut defs: Vec<String> = columns.iter().map(|c| format!("{} text", quote_ident(c))).collect();
    defs.push(format!("{} text NOT NULL", quote_ident(KEY_HASH_COLUMN)));
    defs.push(format!("{} text NOT NULL", quote_ident(ROW_HASH_COLUMN)));
    defs.push(format!("{} text NOT NULL", quote_ident(SOURCE_SYSTEM_COLUMN)));
    defs.push(format!("{} boolean NOT NULL", quote_ident(ACTIVE_COLUMN)));
    defs.push(format!("{} boolean NOT NULL", quote_ident(DELETED_COLUMN)));
    format!("CREATE TABLE {} ({})", quote_ident(table), defs.join(", "))
}

/// Índice único parcial: a lo sumo una fila vigente por llave, garantizado
/// también por la base de datos.
pub fn create_current_key_index(table: &str) -> String {
    format!("CREATE UNIQUE INDEX {} ON {} ({}) WHERE {} AND NOT {}",
            quote_ident(&format!("{table}_current_key_uq")),
            quote_ident(table),
            quote_ident(KEY_HASH_COLUMN),
            quote_ident(ACTIVE_COLUMN),
            quote_ident(DELETED_COLUMN))
}

pub fn select_current_and_tombstoned(table: &str) -> String {
    format!("SELECT to_jsonb(t) AS payload FROM {} t WHERE t.{} OR t.{}",
            quote_ident(table),
            quote_ident(ACTIVE_COLUMN),
            quote_ident(DELETED_COLUMN))
}

pub fn count_rows(table: &str) -> String {
    format!("SELECT COUNT(*) AS count FROM {}", quote_ident(table))
}

/// `INSERT ... SELECT` desde un arreglo jsonb de objetos; las columnas
/// ausentes quedan en NULL.
pub fn insert_rows(table: &str) -> String {
    let t = quote_ident(table);
    format!("INSERT INTO {t} SELECT * FROM jsonb_populate_recordset(NULL::{t}, $1)")
}

fn predicate_sql(predicate: RowPredicate) -> String {
    let active = format!("tgt.{}", quote_ident(ACTIVE_COLUMN));
    let deleted = format!("tgt.{}", quote_ident(DELETED_COLUMN));
    match predicate {
        RowPredicate::Current => format!("{active} AND NOT {deleted}"),
    }
}

/// Update condicional con join por llave contra `jsonb_to_recordset($1)`.
/// La comparación de llaves trata nulo como vacío, igual que `KeyTuple`.
/// `None` si `set` no fija ninguna columna.
pub fn conditional_update(table: &str, predicate: RowPredicate, key_columns: &[String], set: FlagUpdate) -> Option<String> {
    let mut assignments = Vec::new();
    if let Some(a) = set.active {
        assignments.push(format!("{} = {a}", quote_ident(ACTIVE_COLUMN)));
    }
    if let Some(d) = set.deleted {
        assignments.push(format!("{} = {d}", quote_ident(DELETED_COLUMN)));
    }
    if assignments.is_empty() {
        return None;
    }
    let src_cols: Vec<String> = key_columns.iter().map(|k| format!("{} text", quote_ident(k))).collect();
    let mut conditions = vec![format!("({})", predicate_sql(predicate))];
    conditions.extend(key_columns.iter().map(|k| {
                                        let q = quote_ident(k);
                                        format!("COALESCE(tgt.{q}, '') = COALESCE(src.{q}, '')")
                                    }));
    Some(format!("UPDATE {} AS tgt SET {} FROM jsonb_to_recordset($1) AS src({}) WHERE {}",
                 quote_ident(table),
                 assignments.join(", "),
                 src_cols.join(", "),
                 conditions.join(" AND ")))
}

/// Llaves como arreglo jsonb de objetos `{columna: valor}`.
pub fn keys_payload(key_columns: &[String], keys: &[KeyTuple]) -> Value {
    Value::Array(keys.iter()
                     .map(|k| {
                         let obj: Map<String, Value> =
                             key_columns.iter().cloned().zip(k.iter().map(|v| Value::String(v.clone()))).collect();
                         Value::Object(obj)
                     })
                     .collect())
}

pub fn row_payload(row: &VersionedRecord) -> Value {
    let mut obj: Map<String, Value> = row.values
                                         .iter()
                                         .map(|(k, v)| (k.clone(), v.clone().map(Value::String).unwrap_or(Value::Null)))
                                         .collect();
    obj.insert(KEY_HASH_COLUMN.into(), Value::String(row.key_hash.clone()));
    obj.insert(ROW_HASH_COLUMN.into(), Value::String(row.row_hash.clone()));
    obj.insert(SOURCE_SYSTEM_COLUMN.into(), Value::String(row.source_system.clone()));
    obj.insert(ACTIVE_COLUMN.into(), Value::Bool(row.active));
    obj.insert(DELETED_COLUMN.into(), Value::Bool(row.deleted));
    Value::Object(obj)
}

pub fn rows_payload(rows: &[VersionedRecord]) -> Value {
    Value::Array(rows.iter().map(row_payload).collect())
}
