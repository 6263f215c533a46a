use crate::detection::domain::face_detector::{FaceDetector, RawDetections};
use crate::shared::frame::Frame;

/// Decorator for detectors that only recognise left-facing profiles.
///
/// Runs the inner detector a second time on the mirrored frame; left
/// profiles found there are right profiles in the original frame and are
/// mapped back with [`BoundingBox::unmirror`]. Frontal results from the
/// mirrored pass are discarded so each face is reported once.
///
/// The replay CLI does not use it: recorded detections already carry both
/// profile orientations. It wraps live model detectors that only find left
/// profiles.
///
/// [`BoundingBox::unmirror`]: crate::shared::bounding_box::BoundingBox::unmirror
pub struct MirroredProfileDetector {
    inner: Box<dyn FaceDetector>,
}

impl MirroredProfileDetector {
    pub fn new(inner: Box<dyn FaceDetector>) -> Self {
        Self { inner }
    }
}

impl FaceDetector for MirroredProfileDetector {
    fn detect(&mut self, frame: &Frame) -> Result<RawDetections, Box<dyn std::error::Error>> {
        let mut detections = self.inner.detect(frame)?;
        let mirrored = self.inner.detect(&frame.mirrored())?;

        detections.profile_right.extend(
            mirrored
                .profile_left
                .iter()
                .map(|b| b.unmirror(frame.width())),
        );
        Ok(detections)
    }
}
