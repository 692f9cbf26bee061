//! Detección de cambios: left join por llave entre las versiones candidatas
//! y la vista de estado vigente del store.
//!
//! Reglas por fila candidata:
//! - sin fila en el store -> `New`
//! - fila previa borrada (tombstone) -> `Resurrected`, sin mirar el fingerprint
//! - fila previa vigente con fingerprint distinto -> `Changed`
//! - fila previa vigente con fingerprint igual -> `Unchanged` (se descarta)
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::model::{KeyTuple, VersionedRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChangeKind {
    New,
    Resurrected,
    Changed,
    Unchanged,
}

impl ChangeKind {
    /// Todo salvo `Unchanged` produce una nueva versión vigente.
    pub fn is_change(&self) -> bool {
        !matches!(self, ChangeKind::Unchanged)
    }

    /// Sólo `Changed` tiene una fila vigente previa que retirar.
    pub fn retires_prior(&self) -> bool {
        matches!(self, ChangeKind::Changed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedRow {
    pub kind: ChangeKind,
    pub key: KeyTuple,
    pub record: VersionedRecord,
}

/// Resultado de la detección: sólo las filas que cambian, más contadores.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    pub rows: Vec<ClassifiedRow>,
    pub new: usize,
    pub resurrected: usize,
    pub changed: usize,
    pub unchanged: usize,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn push(&mut self, kind: ChangeKind, key: KeyTuple, record: VersionedRecord) {
        match kind {
            ChangeKind::New => self.new += 1,
            ChangeKind::Resurrected => self.resurrected += 1,
            ChangeKind::Changed => self.changed += 1,
            ChangeKind::Unchanged => {
                self.unchanged += 1;
                return;
            }
        }
        self.rows.push(ClassifiedRow { kind, key, record });
    }
}

/// Disposición más reciente por llave. Una llave resucitada conserva su
/// tombstone junto a la nueva fila vigente: la vigente prevalece.
pub fn current_state_by_key<'a>(view: &'a [VersionedRecord],
                                key_columns: &[String])
                                -> HashMap<KeyTuple, &'a VersionedRecord> {
    let mut state: HashMap<KeyTuple, &VersionedRecord> = HashMap::with_capacity(view.len());
    for row in view {
        let key = row.key_tuple(key_columns);
        let keep_existing = state.get(&key).is_some_and(|existing| existing.is_current());
        if !keep_existing {
            state.insert(key, row);
        }
    }
    state
}

fn classify(candidate: &VersionedRecord, prior: Option<&VersionedRecord>) -> ChangeKind {
    match prior {
        None => ChangeKind::New,
        Some(p) if p.deleted => ChangeKind::Resurrected,
        Some(p) if p.row_hash != candidate.row_hash => ChangeKind::Changed,
        Some(_) => ChangeKind::Unchanged,
    }
}

pub fn detect_changes(candidates: Vec<VersionedRecord>,
                      state: &HashMap<KeyTuple, &VersionedRecord>,
                      key_columns: &[String])
                      -> ChangeSet {
    let mut out = ChangeSet::default();
    for candidate in candidates {
        let key = candidate.key_tuple(key_columns);
        let kind = classify(&candidate, state.get(&key).copied());
        out.push(kind, key, candidate);
    }
    out
}
