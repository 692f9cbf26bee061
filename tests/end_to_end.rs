//! Flujo completo: registro JSON en disco -> configuración -> corridas
//! diarias sobre el backend en memoria.
use std::path::PathBuf;

use chrono::{TimeZone, Utc};
use indexmap::IndexMap;
use scdflow::scd_core::constants::DEFAULT_LOAD_TS_COLUMN;
use scdflow::{build_in_memory_reconciler, AppConfig, Batch, RunStatus};
use uuid::Uuid;

const REGISTRY: &str = r#"{
  "source_system": "erp",
  "tables": {
    "customer": { "key_columns": ["id"], "target_table": "dim_customer" },
    "orders":   { "key_columns": ["order_id", "line"], "target_table": "fact_orders", "staging_table": "stg_orders" }
  }
}"#;

fn write_registry() -> PathBuf {
    let path = std::env::temp_dir().join(format!("scd_tables_{}.json", Uuid::new_v4().simple()));
    std::fs::write(&path, REGISTRY).expect("write registry");
    path
}

fn batch(source_id: &str, day: u32, columns: &[&str], rows: &[&[Option<&str>]]) -> Batch {
    let ts = Utc.with_ymd_and_hms(2024, 3, day, 6, 0, 0).unwrap();
    let rows = rows.iter()
                   .map(|values| {
                       columns.iter()
                              .zip(values.iter())
                              .map(|(c, v)| (c.to_string(), v.map(str::to_string)))
                              .collect::<IndexMap<_, _>>()
                   })
                   .collect();
    Batch::ingest(source_id,
                  columns.iter().map(|c| c.to_string()).collect(),
                  rows,
                  DEFAULT_LOAD_TS_COLUMN,
                  ts).with_source_bytes(1536)
}

#[test]
fn daily_snapshots_build_history_per_table() {
    let path = write_registry();
    let config = AppConfig { tables_config: path.clone(),
                             source_system: Some("erp-eu".into()),
                             database: None };
    let engine = build_in_memory_reconciler(&config).expect("reconciler");
    assert_eq!(engine.registry().source_system, "erp-eu");

    let cust = ["id", "name"];
    let ord = ["order_id", "line", "qty"];
    let day1 = vec![batch("in/CUSTOMER_20240301.csv", 1, &cust, &[&[Some("1"), Some("Ada")], &[Some("2"), Some("Bob")]]),
                    batch("in/ORDERS_20240301.csv", 1, &ord, &[&[Some("A"), Some("1"), Some("3")], &[Some("A"), Some("2"), None]]),
                    batch("in/VENDOR_20240301.csv", 1, &["id"], &[&[Some("9")]])];
    let r1 = engine.run_parallel(&day1);
    assert_eq!(r1.succeeded(), 2);
    assert_eq!(r1.skipped.len(), 1);
    assert_eq!(r1.skipped[0].table_id, "vendor");
    assert_eq!(r1.outcomes[1].staging_table, "stg_orders");
    assert_eq!(r1.outcomes[0].input_size, "1.50 KB");

    // Día 2: cambia el cliente 1, desaparece el 2; la línea A/2 recibe qty.
    let day2 = vec![batch("in/CUSTOMER_20240302.csv", 2, &cust, &[&[Some("1"), Some("Ada L.")]]),
                    batch("in/ORDERS_20240302.csv", 2, &ord, &[&[Some("A"), Some("1"), Some("3")], &[Some("A"), Some("2"), Some("1")]])];
    let r2 = engine.run(&day2);
    assert!(r2.outcomes.iter().all(|o| o.status == RunStatus::Success));
    assert_eq!(r2.outcomes[0].target_rows, 3);
    assert_eq!(r2.outcomes[1].target_rows, 3);

    let customers = engine.store().rows("dim_customer");
    assert_eq!(customers.iter().filter(|r| r.is_current()).count(), 1);
    assert!(customers.iter().any(|r| r.get("id") == Some("2") && r.is_tombstone()));
    assert!(customers.iter().all(|r| r.source_system == "erp-eu"));

    // Día 3: el cliente 2 reaparece; reprocesar el día 3 no escribe nada.
    let day3 = vec![batch("in/CUSTOMER_20240303.csv", 3, &cust, &[&[Some("1"), Some("Ada L.")], &[Some("2"), Some("Bob")]])];
    engine.run(&day3);
    let before = engine.store().rows("dim_customer");
    engine.run(&day3);
    assert_eq!(engine.store().rows("dim_customer"), before);
    let bob: Vec<_> = before.iter().filter(|r| r.get("id") == Some("2")).collect();
    assert_eq!(bob.iter().filter(|r| r.is_current()).count(), 1);
    assert_eq!(bob.len(), 2);

    let audited = engine.audit().outcomes();
    assert_eq!(audited.len(), 6);
    assert!(audited.iter().all(|o| o.status == RunStatus::Success));

    std::fs::remove_file(path).ok();
}
