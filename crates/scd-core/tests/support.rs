//! Utilidades compartidas por los tests de integración del core.
#![allow(dead_code)]

use chrono::{TimeZone, Utc};
use indexmap::IndexMap;
use scd_core::constants::DEFAULT_LOAD_TS_COLUMN;
use scd_core::{Batch, InMemoryTableStore, TableConfig, TableRegistry, VersionedRecord};

pub fn registry() -> TableRegistry {
    TableRegistry::new("crm").with_table("customer", TableConfig::new(["id"]))
              .with_table("orders", TableConfig::new(["order_id", "line"]).with_target("fact_orders"))
}

/// Snapshot de `customer` cargado el día `day` de enero de 2024.
pub fn customers(day: u32, rows: &[(&str, Option<&str>)]) -> Batch {
    let ts = Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap();
    let rows = rows.iter()
                   .map(|(id, name)| {
                       let mut m = IndexMap::new();
                       m.insert("id".to_string(), Some(id.to_string()));
                       m.insert("name".to_string(), name.map(str::to_string));
                       m
                   })
                   .collect();
    Batch::ingest(format!("CUSTOMER_202401{day:02}.csv"),
                  vec!["id".into(), "name".into()],
                  rows,
                  DEFAULT_LOAD_TS_COLUMN,
                  ts).with_source_bytes(2048)
}

pub fn rows_for(store: &InMemoryTableStore, table: &str, id: &str) -> Vec<VersionedRecord> {
    store.rows(table).into_iter().filter(|r| r.get("id") == Some(id)).collect()
}

pub fn current_count(store: &InMemoryTableStore, table: &str, id: &str) -> usize {
    rows_for(store, table, id).iter().filter(|r| r.is_current()).count()
}
