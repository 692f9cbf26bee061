//! Módulo de hashing y canonicalización de valores de fila.

pub mod canonical;
pub mod hash;

pub use canonical::{canonical_values, coalesce};
pub use hash::{hash_str, sha256_hex};
