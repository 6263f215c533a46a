use crate::shared::frame::Frame;

/// Persists the frame that triggered an incident.
pub trait SnapshotStore: Send {
    /// Stores `frame` under a name derived from `hint` and returns a stable
    /// reference (typically a path) for the incident record.
    fn store(&self, frame: &Frame, hint: &str) -> Result<String, Box<dyn std::error::Error>>;
}
