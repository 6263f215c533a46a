use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::Frame;

/// Raw detector output for one frame, grouped by detection kind.
///
/// Profile boxes must already be in the frame's own (unmirrored)
/// coordinates.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawDetections {
    pub frontal: Vec<BoundingBox>,
    pub profile_left: Vec<BoundingBox>,
    pub profile_right: Vec<BoundingBox>,
}

/// Domain interface for the external face/profile detector.
///
/// Implementations may be stateful (e.g. replay cursors), hence `&mut self`.
pub trait FaceDetector: Send {
    fn detect(&mut self, frame: &Frame) -> Result<RawDetections, Box<dyn std::error::Error>>;
}
