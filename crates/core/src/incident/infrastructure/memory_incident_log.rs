use std::sync::{Arc, Mutex};

use crate::incident::domain::incident::Incident;
use crate::incident::domain::incident_log::IncidentLog;
use crate::incident::infrastructure::sqlite_incident_log::IncidentLogError;

/// Incident log kept in memory, for dry runs and tests.
///
/// Clones share the same entries, so a caller can keep one handle while the
/// sink owns another.
#[derive(Clone, Default)]
pub struct MemoryIncidentLog {
    entries: Arc<Mutex<Vec<Incident>>>,
}

impl MemoryIncidentLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Result<Vec<Incident>, IncidentLogError> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .map_err(|_| IncidentLogError::Poisoned)
    }
}

impl IncidentLog for MemoryIncidentLog {
    fn append(&mut self, incident: &Incident) -> Result<(), Box<dyn std::error::Error>> {
        self.entries
            .lock()
            .map_err(|_| IncidentLogError::Poisoned)?
            .push(incident.clone());
        Ok(())
    }
}
