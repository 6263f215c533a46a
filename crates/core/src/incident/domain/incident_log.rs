use crate::incident::domain::incident::Incident;

/// Append-only incident store. The engine never reads, updates or deletes
/// entries through this interface.
pub trait IncidentLog: Send {
    fn append(&mut self, incident: &Incident) -> Result<(), Box<dyn std::error::Error>>;
}
