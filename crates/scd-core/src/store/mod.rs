//! Contrato del almacenamiento destino (`TableStore`) y backend en memoria.
//!
//! El motor sólo necesita seis operaciones sobre una tabla: existencia,
//! lectura filtrada del estado vigente, update condicional por llave, append,
//! creación inicial y conteo. `apply_merge` compone retiro + inserción
//! respetando el orden retire -> insert; los backends lo sobrescriben para
//! aplicarlo de forma atómica (memoria: bajo el lock de la tabla; Postgres:
//! en una sola transacción).

mod memory;
mod types;

pub use memory::InMemoryTableStore;
pub use types::{FlagUpdate, MergeCounts, MergePlan, RowPredicate};

use crate::errors::StoreError;
use crate::model::{KeyTuple, VersionedRecord};

pub trait TableStore: Send + Sync {
    fn exists(&self, table: &str) -> Result<bool, StoreError>;

    /// Filas con `active = true` o `deleted = true`: la disposición más
    /// reciente de cada llave.
    fn read_current_and_tombstoned(&self, table: &str) -> Result<Vec<VersionedRecord>, StoreError>;

    /// Actualiza las filas que cumplen `predicate` y cuya llave (comparación
    /// nulo == vacío) está en `keys`. Devuelve filas afectadas; cero no es
    /// error.
    fn conditional_update(&self,
                          table: &str,
                          predicate: RowPredicate,
                          key_columns: &[String],
                          keys: &[KeyTuple],
                          set: FlagUpdate)
                          -> Result<usize, StoreError>;

    fn append(&self, table: &str, rows: &[VersionedRecord]) -> Result<(), StoreError>;

    /// Crea la tabla con el esquema `columns` (atributos de la fuente; las
    /// columnas de sistema las agrega el backend) y escribe `rows`.
    fn bootstrap_write(&self, table: &str, columns: &[String], rows: &[VersionedRecord]) -> Result<(), StoreError>;

    fn count(&self, table: &str) -> Result<u64, StoreError>;

    /// Retiro de filas vigentes seguido de la inserción de las nuevas
    /// versiones. Invertir el orden expondría dos filas vigentes por llave.
    fn apply_merge(&self, table: &str, key_columns: &[String], plan: &MergePlan) -> Result<MergeCounts, StoreError> {
        let retired = if plan.retire.is_empty() {
            0
        } else {
            self.conditional_update(table, RowPredicate::Current, key_columns, &plan.retire, FlagUpdate::retire())?
        };
        if !plan.insert.is_empty() {
            self.append(table, &plan.insert)?;
        }
        Ok(MergeCounts { retired,
                         inserted: plan.insert.len() })
    }
}
