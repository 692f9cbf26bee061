//! Constantes del motor de reconciliación.
//!
//! Agrupa los nombres de las columnas de sistema que el motor agrega a cada
//! fila persistida. Estas columnas son reservadas: un batch que declare una
//! columna con el mismo nombre se rechaza en validación.

/// Hash de las columnas llave (identidad de fila, distinto del fingerprint de
/// cambio).
pub const KEY_HASH_COLUMN: &str = "key_hash";
/// Fingerprint de contenido sobre las columnas comparables.
pub const ROW_HASH_COLUMN: &str = "row_hash";
/// Etiqueta constante del sistema origen (por despliegue).
pub const SOURCE_SYSTEM_COLUMN: &str = "source_system";
pub const ACTIVE_COLUMN: &str = "is_active";
pub const DELETED_COLUMN: &str = "is_deleted";

/// Columnas de sistema en el orden en que se anexan al esquema de la tabla
/// destino.
pub const SYSTEM_COLUMNS: [&str; 5] = [KEY_HASH_COLUMN, ROW_HASH_COLUMN, SOURCE_SYSTEM_COLUMN, ACTIVE_COLUMN, DELETED_COLUMN];

/// Nombre por defecto de la columna con el timestamp de carga (asignado en la
/// ingesta, no por la fuente).
pub const DEFAULT_LOAD_TS_COLUMN: &str = "load_timestamp";

/// Etiqueta de sistema origen usada cuando la configuración no define otra.
pub const DEFAULT_SOURCE_SYSTEM: &str = "snapshot";

/// Delimitador que separa el identificador lógico de tabla del resto del
/// nombre del archivo fuente (`CUSTOMER_20240101.csv` -> `customer`).
pub const SOURCE_ID_DELIMITER: char = '_';

/// Prefijo de la tabla de staging derivada cuando la configuración no la fija.
pub const STAGING_TABLE_PREFIX: &str = "tmp_";

pub fn is_system_column(name: &str) -> bool {
    SYSTEM_COLUMNS.contains(&name)
}
