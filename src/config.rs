//! Configuración central de la aplicación.
//! Carga variables de entorno (.env) y resuelve el registro de tablas y la
//! conexión a Postgres.
use std::env;
use std::path::PathBuf;

use once_cell::sync::Lazy;
use thiserror::Error;

use scd_core::TableRegistry;
use scd_persistence::config::DbConfig;
use scd_persistence::PersistenceError;

/// Ruta del JSON con el registro de tablas (obligatoria).
pub const TABLES_CONFIG_VAR: &str = "SCD_TABLES_CONFIG";
/// Sobrescribe el `source_system` del registro.
pub const SOURCE_SYSTEM_VAR: &str = "SCD_SOURCE_SYSTEM";

static DOTENV_LOADED: Lazy<()> = Lazy::new(|| {
    let _ = dotenvy::dotenv();
});

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable {0} not set")]
    MissingVar(&'static str),
    #[error("cannot load table registry '{}': {source}", path.display())]
    Registry {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub tables_config: PathBuf,
    pub source_system: Option<String>,
    /// `None` cuando `DATABASE_URL` no está definido (sólo backend en memoria).
    pub database: Option<DbConfig>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Lazy::force(&DOTENV_LOADED);
        let database = match env::var("DATABASE_URL") {
            Ok(_) => Some(DbConfig::from_env()?),
            Err(_) => None,
        };
        Self::from_vars(|name| env::var(name).ok(), database)
    }

    /// Igual que `from_env` con un lookup explícito de variables.
    pub fn from_vars<F>(lookup: F, database: Option<DbConfig>) -> Result<Self, ConfigError>
        where F: Fn(&str) -> Option<String>
    {
        let tables_config = lookup(TABLES_CONFIG_VAR).filter(|v| !v.trim().is_empty())
                                                     .ok_or(ConfigError::MissingVar(TABLES_CONFIG_VAR))?;
        let source_system = lookup(SOURCE_SYSTEM_VAR).filter(|v| !v.trim().is_empty());
        Ok(Self { tables_config: PathBuf::from(tables_config),
                  source_system,
                  database })
    }

    /// Lee el registro de tablas y aplica el override de `source_system`.
    pub fn load_registry(&self) -> Result<TableRegistry, ConfigError> {
        let mut registry = TableRegistry::from_json_file(&self.tables_config).map_err(|source| ConfigError::Registry {
                                                                                  path: self.tables_config.clone(),
                                                                                  source,
                                                                              })?;
        if let Some(tag) = &self.source_system {
            registry.source_system = tag.clone();
        }
        Ok(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn tables_config_is_required() {
        let env = vars(&[(SOURCE_SYSTEM_VAR, "crm")]);
        let err = AppConfig::from_vars(|k| env.get(k).cloned(), None).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar(TABLES_CONFIG_VAR)));
    }

    #[test]
    fn blank_source_system_is_ignored() {
        let env = vars(&[(TABLES_CONFIG_VAR, "tables.json"), (SOURCE_SYSTEM_VAR, "  ")]);
        let cfg = AppConfig::from_vars(|k| env.get(k).cloned(), None).expect("config");
        assert_eq!(cfg.tables_config, PathBuf::from("tables.json"));
        assert_eq!(cfg.source_system, None);
    }

    #[test]
    fn missing_registry_file_is_reported_with_path() {
        let cfg = AppConfig { tables_config: PathBuf::from("/nonexistent/tables.json"),
                              source_system: None,
                              database: None };
        let err = cfg.load_registry().unwrap_err();
        assert!(err.to_string().contains("/nonexistent/tables.json"));
    }
}
