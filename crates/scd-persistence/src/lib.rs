//! scd-persistence
//!
//! Backend Postgres (Diesel) del motor SCD2: implementaciones de `TableStore`
//! y `AuditSink` más utilidades de conexión y migraciones.
//!
//! Módulos:
//! - `pg`: pool r2d2, retry ante errores transitorios y los dos backends.
//! - `sql`: render de SQL dinámico (tablas destino con esquema por batch).
//! - `migrations`: runner embebido de migraciones Diesel (tabla de auditoría).
//! - `config`: carga de configuración desde .env.
//! - `schema`: tablas Diesel de esquema fijo.

pub mod config;
pub mod error;
pub mod migrations;
pub mod pg;
pub mod schema;
pub mod sql;

pub use config::init_dotenv;
pub use error::PersistenceError;
pub use pg::{build_dev_pool_from_env, build_pool, ConnectionProvider, PgAuditSink, PgPool, PgTableStore, PoolProvider};
