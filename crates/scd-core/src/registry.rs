//! Configuración estática por tabla y resolución de la tabla lógica a partir
//! del identificador de la fuente.
//!
//! El registro se deserializa desde JSON, p.ej.:
//!
//! ```json
//! {
//!   "source_system": "crm",
//!   "tables": {
//!     "customer": { "key_columns": ["customer_id"], "target_table": "dim_customer" }
//!   }
//! }
//! ```
use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_LOAD_TS_COLUMN, DEFAULT_SOURCE_SYSTEM, SOURCE_ID_DELIMITER, STAGING_TABLE_PREFIX};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableConfig {
    /// Columnas de la llave primaria, en orden.
    pub key_columns: Vec<String>,
    /// Tabla destino; por defecto el identificador de la tabla.
    #[serde(default)]
    pub target_table: Option<String>,
    /// Tabla de staging reportada en el outcome; por defecto `tmp_<id>`.
    #[serde(default)]
    pub staging_table: Option<String>,
}

impl TableConfig {
    pub fn new<S: Into<String>>(key_columns: impl IntoIterator<Item = S>) -> Self {
        Self { key_columns: key_columns.into_iter().map(Into::into).collect(),
               target_table: None,
               staging_table: None }
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target_table = Some(target.into());
        self
    }
}

/// Tabla ya resuelta: identificador + nombres efectivos.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTable {
    pub table_id: String,
    pub target_table: String,
    pub staging_table: String,
    pub key_columns: Vec<String>,
}

fn default_load_ts_column() -> String {
    DEFAULT_LOAD_TS_COLUMN.to_string()
}

fn default_source_system() -> String {
    DEFAULT_SOURCE_SYSTEM.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRegistry {
    #[serde(default = "default_source_system")]
    pub source_system: String,
    #[serde(default = "default_load_ts_column")]
    pub load_ts_column: String,
    #[serde(default)]
    pub tables: BTreeMap<String, TableConfig>,
}

impl Default for TableRegistry {
    fn default() -> Self {
        Self { source_system: default_source_system(),
               load_ts_column: default_load_ts_column(),
               tables: BTreeMap::new() }
    }
}

impl TableRegistry {
    pub fn new(source_system: impl Into<String>) -> Self {
        Self { source_system: source_system.into(),
               ..Self::default() }
    }

    /// Registra (o reemplaza) una tabla. El identificador se guarda en
    /// minúsculas para coincidir con `table_id_for_source`.
    pub fn with_table(mut self, table_id: &str, config: TableConfig) -> Self {
        self.tables.insert(table_id.to_lowercase(), config);
        self
    }

    pub fn from_json_str(raw: &str) -> Result<Self, serde_json::Error> {
        let mut registry: Self = serde_json::from_str(raw)?;
        registry.tables = std::mem::take(&mut registry.tables).into_iter()
                                                                .map(|(k, v)| (k.to_lowercase(), v))
                                                                .collect();
        Ok(registry)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw).map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    pub fn get(&self, table_id: &str) -> Option<&TableConfig> {
        self.tables.get(table_id)
    }

    /// Resuelve la tabla de un batch por convención de nombre. `None` si el
    /// token no está configurado.
    pub fn resolve(&self, source_id: &str) -> Option<ResolvedTable> {
        let table_id = table_id_for_source(source_id);
        let cfg = self.tables.get(&table_id)?;
        Some(ResolvedTable { target_table: cfg.target_table.clone().unwrap_or_else(|| table_id.clone()),
                             staging_table: cfg.staging_table
                                               .clone()
                                               .unwrap_or_else(|| format!("{STAGING_TABLE_PREFIX}{table_id}")),
                             key_columns: cfg.key_columns.clone(),
                             table_id })
    }
}

/// Identificador lógico de tabla: nombre de archivo (sin directorios), token
/// previo al primer `_`, en minúsculas. Sin delimitador se usa el nombre sin
/// extensión.
pub fn table_id_for_source(source_id: &str) -> String {
    let file_name = source_id.rsplit(['/', '\\']).next().unwrap_or(source_id);
    let token = match file_name.split_once(SOURCE_ID_DELIMITER) {
        Some((head, _)) => head,
        None => file_name.split('.').next().unwrap_or(file_name),
    };
    token.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_id_uses_token_before_first_delimiter() {
        assert_eq!(table_id_for_source("CUSTOMER_20240101_full.csv"), "customer");
        assert_eq!(table_id_for_source("landing/2024/Orders_x.parquet"), "orders");
        assert_eq!(table_id_for_source("Product.csv"), "product");
    }

    #[test]
    fn resolve_applies_defaults_and_skips_unknown() {
        let reg = TableRegistry::new("crm").with_table("Customer", TableConfig::new(["id"]));
        let t = reg.resolve("CUSTOMER_1.csv").expect("configured");
        assert_eq!(t.table_id, "customer");
        assert_eq!(t.target_table, "customer");
        assert_eq!(t.staging_table, "tmp_customer");
        assert!(reg.resolve("vendor_1.csv").is_none());
    }

    #[test]
    fn registry_from_json_fills_defaults() {
        let raw = r#"{"tables": {"ORDERS": {"key_columns": ["a","b"], "target_table": "fact_orders"}}}"#;
        let reg = TableRegistry::from_json_str(raw).expect("valid json");
        assert_eq!(reg.source_system, DEFAULT_SOURCE_SYSTEM);
        assert_eq!(reg.load_ts_column, DEFAULT_LOAD_TS_COLUMN);
        let t = reg.resolve("orders_2024.csv").expect("configured");
        assert_eq!(t.target_table, "fact_orders");
        assert_eq!(t.key_columns, vec!["a".to_string(), "b".to_string()]);
    }
}
