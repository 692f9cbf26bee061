//! Implementaciones Postgres (Diesel) de los traits del core.
//!
//! - `PgTableStore`: tablas destino SCD2 con SQL dinámico; `apply_merge`
//!   ejecuta retiro + inserción en una única transacción.
//! - `PgAuditSink`: outcomes de corrida en `scd_run_outcomes` (esquema fijo).
//!
//! Cada operación del store corre dentro de `with_retry`: sólo los errores
//! transitorios (`PersistenceError::is_transient`) se reintentan, hasta tres
//! veces. El motor no reintenta nada por encima de esto.

mod audit;
mod table_store;

pub use audit::{OutcomeRow, PgAuditSink};
pub use table_store::PgTableStore;

use diesel::prelude::*;
use diesel::r2d2::{self, ConnectionManager};
use log::warn;

use crate::error::PersistenceError;
use crate::migrations::run_pending_migrations;

/// Alias de tipo para el pool r2d2 de conexiones Postgres.
pub type PgPool = r2d2::Pool<ConnectionManager<PgConnection>>;

pub type PgPooledConnection = r2d2::PooledConnection<ConnectionManager<PgConnection>>;

/// Proveedor abstracto de conexiones.
///
/// Permite inyectar un pool real o simular en tests sin acoplar a r2d2.
pub trait ConnectionProvider: Send + Sync + 'static {
    fn connection(&self) -> Result<PgPooledConnection, PersistenceError>;
}

/// Implementación concreta de `ConnectionProvider` respaldada por un `PgPool`.
#[derive(Clone)]
pub struct PoolProvider {
    pub pool: PgPool,
}

impl ConnectionProvider for PoolProvider {
    fn connection(&self) -> Result<PgPooledConnection, PersistenceError> {
        self.pool
            .get()
            .map_err(|e| PersistenceError::TransientIo(format!("pool error: {e}")))
    }
}

/// Esperas entre intentos de una operación del store (ms). Un merge de tabla
/// fallido por conflicto de serialización con otra corrida se reintenta
/// completo, dentro de su propia transacción.
const RETRY_BACKOFF_MS: [u64; 3] = [15, 30, 45];

pub(crate) fn with_retry<F, T>(mut op: F) -> Result<T, PersistenceError>
    where F: FnMut() -> Result<T, PersistenceError>
{
    let mut waits = RETRY_BACKOFF_MS.iter();
    loop {
        let err = match op() {
            Ok(v) => return Ok(v),
            Err(e) => e,
        };
        match waits.next() {
            Some(ms) if err.is_transient() => {
                warn!("store op transient failure, retrying in {ms}ms: {err}");
                std::thread::sleep(std::time::Duration::from_millis(*ms));
            }
            _ => return Err(err),
        }
    }
}

/// `(min_idle, max_size)` del pool: ambos al menos 1 y `min <= max`.
fn pool_bounds(min_size: u32, max_size: u32) -> (u32, u32) {
    let max = max_size.max(1);
    let min = min_size.max(1);
    if min > max {
        warn!("DATABASE_MIN_CONNECTIONS={min} > DATABASE_MAX_CONNECTIONS={max}; using {max}");
    }
    (min.min(max), max)
}

/// Pool r2d2 listo para el motor: la tabla `scd_run_outcomes` queda migrada
/// antes de devolverlo. Las tablas destino las crea `bootstrap_write`.
pub fn build_pool(database_url: &str, min_size: u32, max_size: u32) -> Result<PgPool, PersistenceError> {
    let (min, max) = pool_bounds(min_size, max_size);
    let pool = r2d2::Pool::builder().min_idle(Some(min))
                                    .max_size(max)
                                    .build(ConnectionManager::<PgConnection>::new(database_url))
                                    .map_err(|e| PersistenceError::TransientIo(format!("pool build: {e}")))?;
    let mut conn = pool.get()
                       .map_err(|e| PersistenceError::TransientIo(format!("pool get for migrations: {e}")))?;
    run_pending_migrations(&mut conn)?;
    drop(conn);
    Ok(pool)
}

/// Pool desde `DATABASE_URL` y los tamaños de `DbConfig` (carga `.env`).
pub fn build_dev_pool_from_env() -> Result<PgPool, PersistenceError> {
    let cfg = crate::config::DbConfig::from_env()?;
    build_pool(&cfg.url, cfg.min_connections, cfg.max_connections)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn retry_stops_after_three_transient_failures() {
        let calls = Cell::new(0);
        let r: Result<(), PersistenceError> = with_retry(|| {
            calls.set(calls.get() + 1);
            Err(PersistenceError::TransientIo("down".into()))
        });
        assert!(r.is_err());
        assert_eq!(calls.get(), 4);
    }

    #[test]
    fn pool_bounds_clamp_sizes() {
        assert_eq!(pool_bounds(2, 16), (2, 16));
        assert_eq!(pool_bounds(0, 0), (1, 1));
        assert_eq!(pool_bounds(8, 4), (4, 4));
    }

    #[test]
    fn non_retryable_error_returns_immediately() {
        let calls = Cell::new(0);
        let r: Result<(), PersistenceError> = with_retry(|| {
            calls.set(calls.get() + 1);
            Err(PersistenceError::Schema("bad".into()))
        });
        assert!(matches!(r, Err(PersistenceError::Schema(_))));
        assert_eq!(calls.get(), 1);
    }
}
