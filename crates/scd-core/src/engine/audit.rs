//! Colaborador de auditoría: recibe los outcomes de una corrida en una sola
//! escritura.
use std::sync::Mutex;

use super::outcome::RunOutcome;
use crate::errors::StoreError;

pub trait AuditSink: Send + Sync {
    fn record(&self, outcomes: &[RunOutcome]) -> Result<(), StoreError>;
}

/// Sink en memoria (tests y ejecuciones sin auditoría persistente).
#[derive(Debug, Default)]
pub struct InMemoryAuditSink {
    inner: Mutex<Vec<RunOutcome>>,
}

impl InMemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn outcomes(&self) -> Vec<RunOutcome> {
        self.inner.lock().map(|v| v.clone()).unwrap_or_default()
    }
}

impl AuditSink for InMemoryAuditSink {
    fn record(&self, outcomes: &[RunOutcome]) -> Result<(), StoreError> {
        let mut guard = self.inner
                            .lock()
                            .map_err(|_| StoreError::Backend("audit sink lock poisoned".into()))?;
        guard.extend_from_slice(outcomes);
        Ok(())
    }
}
