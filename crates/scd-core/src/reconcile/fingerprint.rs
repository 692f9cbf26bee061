//! Fingerprints de fila.
//!
//! - `row_fingerprint`: hash de contenido (BLAKE3) sobre las columnas
//!   comparables, base de la detección de cambios.
//! - `key_fingerprint`: hash de identidad (SHA-256) sobre las columnas llave.
//!
//! Ambos son null-safe: nulo y cadena vacía hashean igual.
use crate::hashing::{canonical_values, hash_str, sha256_hex};
use crate::model::{Record, RowValues, VersionedRecord};

/// Todas las columnas salvo llaves y timestamp de carga, ordenadas por
/// nombre: el fingerprint no depende del orden de columnas del snapshot.
pub fn compare_columns(columns: &[String], key_columns: &[String], load_ts_column: &str) -> Vec<String> {
    let mut out: Vec<String> = columns.iter()
                                      .filter(|c| c.as_str() != load_ts_column && !key_columns.contains(*c))
                                      .cloned()
                                      .collect();
    out.sort();
    out.dedup();
    out
}

fn canonical_of(values: &RowValues, columns: &[String]) -> String {
    canonical_values(columns.iter().map(|c| values.get(c.as_str()).and_then(|v| v.as_deref())))
}

/// Con `compare_columns` vacío (tabla sólo-llave) el resultado es constante.
pub fn row_fingerprint(values: &RowValues, compare_columns: &[String]) -> String {
    hash_str(&canonical_of(values, compare_columns))
}

pub fn key_fingerprint(values: &RowValues, key_columns: &[String]) -> String {
    sha256_hex(&canonical_of(values, key_columns))
}

/// Convierte registros deduplicados en versiones candidatas.
#[derive(Debug, Clone)]
pub struct Fingerprinter {
    key_columns: Vec<String>,
    compare_columns: Vec<String>,
    source_system: String,
}

impl Fingerprinter {
    pub fn new(columns: &[String], key_columns: &[String], load_ts_column: &str, source_system: &str) -> Self {
        Self { key_columns: key_columns.to_vec(),
               compare_columns: compare_columns(columns, key_columns, load_ts_column),
               source_system: source_system.to_string() }
    }

    pub fn compare_columns(&self) -> &[String] {
        &self.compare_columns
    }

    /// Nueva versión vigente (`active = true, deleted = false`).
    pub fn version(&self, record: &Record) -> VersionedRecord {
        VersionedRecord { key_hash: key_fingerprint(&record.values, &self.key_columns),
                          row_hash: row_fingerprint(&record.values, &self.compare_columns),
                          values: record.values.clone(),
                          source_system: self.source_system.clone(),
                          active: true,
                          deleted: false }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn compare_columns_exclude_keys_and_load_ts() {
        let out = compare_columns(&cols(&["id", "name", "ts", "city"]), &cols(&["id"]), "ts");
        assert_eq!(out, cols(&["city", "name"]));
    }

    #[test]
    fn reordered_schema_hashes_identically() {
        let a = Fingerprinter::new(&cols(&["id", "name", "city", "ts"]), &cols(&["id"]), "ts", "crm");
        let b = Fingerprinter::new(&cols(&["id", "city", "ts", "name"]), &cols(&["id"]), "ts", "crm");
        let ra = Record::from_pairs([("id", Some("1")), ("name", Some("ada")), ("city", Some("paris")), ("ts", Some("t1"))]);
        let rb = Record::from_pairs([("id", Some("1")), ("city", Some("paris")), ("ts", Some("t2")), ("name", Some("ada"))]);
        assert_eq!(a.version(&ra).row_hash, b.version(&rb).row_hash);
    }

    #[test]
    fn null_and_empty_hash_identically() {
        let a = Record::from_pairs([("id", Some("1")), ("name", None::<&str>)]);
        let b = Record::from_pairs([("id", Some("1")), ("name", Some(""))]);
        let cmp = cols(&["name"]);
        assert_eq!(row_fingerprint(&a.values, &cmp), row_fingerprint(&b.values, &cmp));
    }

    #[test]
    fn different_payloads_hash_differently() {
        let a = Record::from_pairs([("id", Some("1")), ("name", Some("x"))]);
        let b = Record::from_pairs([("id", Some("1")), ("name", Some("y"))]);
        let cmp = cols(&["name"]);
        assert_ne!(row_fingerprint(&a.values, &cmp), row_fingerprint(&b.values, &cmp));
    }

    #[test]
    fn key_only_table_has_constant_fingerprint() {
        let a = Record::from_pairs([("id", Some("1"))]);
        let b = Record::from_pairs([("id", Some("2"))]);
        assert_eq!(row_fingerprint(&a.values, &[]), row_fingerprint(&b.values, &[]));
        assert_eq!(row_fingerprint(&a.values, &[]).len(), 64);
        assert_ne!(key_fingerprint(&a.values, &cols(&["id"])), key_fingerprint(&b.values, &cols(&["id"])));
    }

    #[test]
    fn version_marks_row_current() {
        let fp = Fingerprinter::new(&cols(&["id", "name", "ts"]), &cols(&["id"]), "ts", "crm");
        let v = fp.version(&Record::from_pairs([("id", Some("1")), ("name", Some("a")), ("ts", Some("t"))]));
        assert!(v.is_current());
        assert_eq!(v.source_system, "crm");
        assert_eq!(fp.compare_columns(), &cols(&["name"])[..]);
    }
}
