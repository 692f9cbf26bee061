//! Representación canónica de una secuencia de valores de columna.
//!
//! Los valores ausentes/nulos se normalizan a cadena vacía antes de
//! serializar, de modo que `None` y `Some("")` producen el mismo texto. La
//! salida es un arreglo JSON (las comillas y escapes evitan ambigüedad entre
//! `["a,b"]` y `["a","b"]`).

/// Normaliza un valor nulo a la representación vacía canónica.
#[inline]
pub fn coalesce(value: Option<&str>) -> &str {
    value.unwrap_or("")
}

pub fn canonical_values<'a, I>(values: I) -> String
    where I: IntoIterator<Item = Option<&'a str>>
{
    let items: Vec<String> = values.into_iter()
                                   .map(|v| serde_json::Value::String(coalesce(v).to_string()).to_string())
                                   .collect();
    format!("[{}]", items.join(","))
}
