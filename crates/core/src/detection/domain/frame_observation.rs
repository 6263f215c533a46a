use crate::detection::domain::face_detector::RawDetections;
use crate::shared::bounding_box::BoundingBox;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DetectionKind {
    Frontal,
    ProfileLeft,
    ProfileRight,
}

impl DetectionKind {
    pub fn is_profile(&self) -> bool {
        !matches!(self, DetectionKind::Frontal)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Detection {
    pub bounding_box: BoundingBox,
    pub kind: DetectionKind,
}

/// Normalized detections for one tick.
///
/// Order is significant: frontal detections come first in detector order,
/// followed by left and then right profiles. Positional association relies
/// on the frontal order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameObservation {
    detections: Vec<Detection>,
}

impl FrameObservation {
    pub fn new(detections: Vec<Detection>) -> Self {
        Self { detections }
    }

    /// Pure format conversion: no filtering and no identity assignment.
    pub fn from_raw(raw: RawDetections) -> Self {
        let tagged = |boxes: Vec<BoundingBox>, kind: DetectionKind| {
            boxes
                .into_iter()
                .map(move |bounding_box| Detection { bounding_box, kind })
        };

        let detections = tagged(raw.frontal, DetectionKind::Frontal)
            .chain(tagged(raw.profile_left, DetectionKind::ProfileLeft))
            .chain(tagged(raw.profile_right, DetectionKind::ProfileRight))
            .collect();
        Self { detections }
    }

    pub fn detections(&self) -> &[Detection] {
        &self.detections
    }

    pub fn frontal(&self) -> impl Iterator<Item = &BoundingBox> {
        self.detections
            .iter()
            .filter(|d| d.kind == DetectionKind::Frontal)
            .map(|d| &d.bounding_box)
    }

    pub fn profiles(&self) -> impl Iterator<Item = &Detection> {
        self.detections.iter().filter(|d| d.kind.is_profile())
    }

    pub fn is_empty(&self) -> bool {
        self.detections.is_empty()
    }
}
