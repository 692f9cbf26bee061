//! Armado del reconciliador a partir de `AppConfig`.
use log::info;

use scd_core::{InMemoryAuditSink, InMemoryTableStore, Reconciler};
use scd_persistence::pg::build_pool;
use scd_persistence::{PgAuditSink, PgTableStore, PoolProvider};

use crate::config::{AppConfig, ConfigError};

pub type PgReconciler = Reconciler<PgTableStore<PoolProvider>, PgAuditSink<PoolProvider>>;

/// Reconciliador sobre Postgres: pool migrado, tablas destino y auditoría en
/// la misma base.
pub fn build_pg_reconciler(config: &AppConfig) -> Result<PgReconciler, ConfigError> {
    let db = config.database.as_ref().ok_or(ConfigError::MissingVar("DATABASE_URL"))?;
    let registry = config.load_registry()?;
    let pool = build_pool(&db.url, db.min_connections, db.max_connections)?;
    info!("pg reconciler ready: tables={} source_system={}", registry.tables.len(), registry.source_system);
    let provider = PoolProvider { pool };
    Ok(Reconciler::new(PgTableStore::new(provider.clone()), PgAuditSink::new(provider), registry))
}

pub fn build_in_memory_reconciler(config: &AppConfig) -> Result<Reconciler<InMemoryTableStore, InMemoryAuditSink>, ConfigError> {
    Ok(Reconciler::in_memory(config.load_registry()?))
}

/// `AppConfig::from_env` + `build_pg_reconciler`.
pub fn build_reconciler_from_env() -> Result<PgReconciler, ConfigError> {
    let config = AppConfig::from_env()?;
    build_pg_reconciler(&config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn pg_reconciler_requires_database() {
        let cfg = AppConfig { tables_config: PathBuf::from("tables.json"),
                              source_system: None,
                              database: None };
        assert!(matches!(build_pg_reconciler(&cfg), Err(ConfigError::MissingVar("DATABASE_URL"))));
    }
}
