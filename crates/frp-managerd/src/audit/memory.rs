use std::collections::HashMap;
use std::sync::Mutex;

use super::{AuditEntry, AuditError, AuditSink};
use crate::dispatch::OperationKind;

/// Keeps audit entries in process memory.
///
/// Useful for ephemeral deployments and tests; nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    entries: Mutex<HashMap<OperationKind, Vec<AuditEntry>>>,
}

impl MemoryAuditSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl AuditSink for MemoryAuditSink {
    fn append(&self, kind: OperationKind, entry: &AuditEntry) -> Result<(), AuditError> {
        let mut entries = self.entries.lock().map_err(|_| AuditError::Poisoned)?;
        entries.entry(kind).or_default().push(entry.clone());
        Ok(())
    }

    fn entries(&self, kind: OperationKind) -> Result<Vec<AuditEntry>, AuditError> {
        let entries = self.entries.lock().map_err(|_| AuditError::Poisoned)?;
        Ok(entries.get(&kind).cloned().unwrap_or_default())
    }
}
