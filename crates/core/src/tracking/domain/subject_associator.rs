use crate::shared::bounding_box::BoundingBox;
use crate::tracking::domain::subject_state::SubjectId;

/// A subject the tracker still remembers, including ones inside their
/// grace window that were not seen last tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct KnownSubject {
    pub id: SubjectId,
    pub last_box: BoundingBox,
}

/// Decides which subject each frontal detection of a tick belongs to.
pub trait SubjectAssociator: Send {
    /// Returns one id per detection, in detection order. Ids are distinct
    /// within a tick; detections that match nobody get a fresh id.
    fn associate(&mut self, known: &[KnownSubject], detections: &[BoundingBox]) -> Vec<SubjectId>;

    /// Called when the tracker discards a subject, so its id can be reused.
    fn release(&mut self, id: SubjectId);
}
