use serde::{Deserialize, Serialize};

use crate::model::{KeyTuple, VersionedRecord};

/// Predicado estático de un update condicional. Retiros y tombstones sólo
/// tocan la fila vigente de cada llave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RowPredicate {
    /// `active = true AND deleted = false`
    Current,
}

impl RowPredicate {
    pub fn matches(&self, row: &VersionedRecord) -> bool {
        match self {
            RowPredicate::Current => row.is_current(),
        }
    }
}

/// Valores a fijar; `None` deja la columna intacta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FlagUpdate {
    pub active: Option<bool>,
    pub deleted: Option<bool>,
}

impl FlagUpdate {
    /// Retiro por cambio: la fila pasa a histórica, `deleted` sin tocar.
    pub fn retire() -> Self {
        Self { active: Some(false),
               deleted: None }
    }

    /// Retiro por ausencia en el snapshot: la fila queda como tombstone.
    pub fn tombstone() -> Self {
        Self { active: Some(false),
               deleted: Some(true) }
    }

    pub fn apply(&self, row: &mut VersionedRecord) {
        if let Some(a) = self.active {
            row.active = a;
        }
        if let Some(d) = self.deleted {
            row.deleted = d;
        }
    }
}

/// Mutaciones de un merge para una tabla y una corrida.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergePlan {
    /// Llaves cuya fila vigente debe retirarse.
    pub retire: Vec<KeyTuple>,
    /// Nuevas versiones vigentes (`active = true, deleted = false`).
    pub insert: Vec<VersionedRecord>,
}

impl MergePlan {
    pub fn is_empty(&self) -> bool {
        self.retire.is_empty() && self.insert.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeCounts {
    pub retired: usize,
    pub inserted: usize,
}
