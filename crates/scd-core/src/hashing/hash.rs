//! Hash helpers – abstracción para poder cambiar de algoritmo sin tocar el
//! resto del motor.

use blake3::Hasher;
use sha2::{Digest, Sha256};

/// Hashea un string con BLAKE3 y devuelve hex (64 caracteres).
pub fn hash_str(input: &str) -> String {
    let mut h = Hasher::new();
    h.update(input.as_bytes());
    h.finalize().to_hex().to_string()
}

/// SHA-256 en hex. Se usa para la identidad de fila (hash de llaves).
pub fn sha256_hex(input: &str) -> String {
    let digest = Sha256::digest(input.as_bytes());
    digest.iter().map(|b| format!("{b:02x}")).collect()
}
