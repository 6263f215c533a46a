use crate::shared::bounding_box::BoundingBox;
use crate::tracking::domain::subject_associator::{KnownSubject, SubjectAssociator};
use crate::tracking::domain::subject_state::SubjectId;

/// Index-based pseudo-identity: the n-th frontal detection is subject n.
///
/// Cheap and stateless, but identities swap whenever the detector reorders
/// its output or someone enters or leaves the frame.
#[derive(Debug, Default)]
pub struct PositionalAssociator;

impl PositionalAssociator {
    pub fn new() -> Self {
        Self
    }
}

impl SubjectAssociator for PositionalAssociator {
    fn associate(&mut self, _known: &[KnownSubject], detections: &[BoundingBox]) -> Vec<SubjectId> {
        (1..=detections.len() as SubjectId).collect()
    }

    fn release(&mut self, _id: SubjectId) {}
}
