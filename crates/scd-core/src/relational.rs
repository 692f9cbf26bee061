//! Operaciones relacionales explícitas que el motor necesita de cualquier
//! backend: selección top-1 por llave (ventana particionada por llave y
//! ordenada de forma descendente) y diferencia de conjuntos de llaves
//! (anti-join). Las implementaciones de `TableStore` (memoria, SQL) deben
//! preservar esta misma semántica.
use std::collections::HashSet;
use std::hash::Hash;

use indexmap::map::Entry;
use indexmap::IndexMap;

/// Devuelve, por cada llave distinta, el elemento con mayor orden. En empate
/// exacto se conserva el primero visto. La salida respeta el orden de primera
/// aparición de cada llave.
pub fn top_one_per_key<K, O, T, I>(rows: I) -> Vec<T>
    where K: Eq + Hash,
          O: Ord,
          I: IntoIterator<Item = (K, O, T)>
{
    let mut best: IndexMap<K, (O, T)> = IndexMap::new();
    for (key, order, row) in rows {
        match best.entry(key) {
            Entry::Vacant(slot) => {
                slot.insert((order, row));
            }
            Entry::Occupied(mut slot) => {
                if order > slot.get().0 {
                    slot.insert((order, row));
                }
            }
        }
    }
    best.into_values().map(|(_, row)| row).collect()
}

/// Anti-join: elementos de `left` cuya llave no aparece en `right`.
pub fn key_set_difference<K, T, I>(left: I, right: &HashSet<K>) -> Vec<T>
    where K: Eq + Hash,
          I: IntoIterator<Item = (K, T)>
{
    left.into_iter().filter(|(k, _)| !right.contains(k)).map(|(_, row)| row).collect()
}
