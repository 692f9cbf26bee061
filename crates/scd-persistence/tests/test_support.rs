#![allow(dead_code)]

use chrono::{TimeZone, Utc};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use scd_core::constants::DEFAULT_LOAD_TS_COLUMN;
use scd_core::Batch;
use scd_persistence::config::DbConfig;
use scd_persistence::pg::{build_pool, PgPool, PoolProvider};
use uuid::Uuid;

pub static TEST_POOL: Lazy<Option<PgPool>> = Lazy::new(|| {
    if std::env::var("DATABASE_URL").is_err() {
        return None;
    }
    let cfg = DbConfig::from_env().ok()?;
    match build_pool(&cfg.url, 1, 4) {
        Ok(p) => Some(p),
        Err(e) => {
            eprintln!("No se pudo construir pool de test: {e}");
            None
        }
    }
});

/// Proveedor sobre el pool compartido; `None` (y aviso) sin DATABASE_URL.
pub fn provider() -> Option<PoolProvider> {
    match TEST_POOL.as_ref() {
        Some(pool) => Some(PoolProvider { pool: pool.clone() }),
        None => {
            eprintln!("DATABASE_URL no definido: omitiendo test");
            None
        }
    }
}

/// Nombre de tabla único por test para no compartir estado entre corridas.
pub fn unique_table(prefix: &str) -> String {
    format!("{prefix}_{}", Uuid::new_v4().simple())
}

pub fn customers(source_id: &str, day: u32, rows: &[(&str, Option<&str>)]) -> Batch {
    let ts = Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap();
    let rows = rows.iter()
                   .map(|(id, name)| {
                       let mut m = IndexMap::new();
                       m.insert("id".to_string(), Some(id.to_string()));
                       m.insert("name".to_string(), name.map(str::to_string));
                       m
                   })
                   .collect();
    Batch::ingest(source_id, vec!["id".into(), "name".into()], rows, DEFAULT_LOAD_TS_COLUMN, ts)
}
