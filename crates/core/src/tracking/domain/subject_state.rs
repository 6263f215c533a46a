use std::time::Duration;

use crate::shared::bounding_box::BoundingBox;

/// Per-session subject handle. Reconstructed from detections, never a
/// biometric identity.
pub type SubjectId = u32;

/// Everything the engine remembers about one tracked subject.
///
/// Times are offsets from session start (the frame clock).
#[derive(Clone, Debug, PartialEq)]
pub struct SubjectState {
    /// Exponentially smoothed horizontal face center.
    pub smoothed_x: f64,
    /// Face center at first sighting; never updated afterwards.
    pub baseline_x: f64,
    /// Start of the current deviation episode, `None` while facing forward.
    pub violation_started_at: Option<Duration>,
    /// An incident already fired for the current episode.
    pub alert_active: bool,
    /// When the most recent incident for this subject fired. Survives
    /// episode resets so the alert banner can outlive the episode.
    pub alerted_at: Option<Duration>,
    pub last_seen_at: Duration,
    pub last_box: BoundingBox,
}

impl SubjectState {
    pub fn first_sighting(bounding_box: BoundingBox, now: Duration) -> Self {
        let center = bounding_box.center_x();
        Self {
            smoothed_x: center,
            baseline_x: center,
            violation_started_at: None,
            alert_active: false,
            alerted_at: None,
            last_seen_at: now,
            last_box: bounding_box,
        }
    }

    /// Baseline-relative deviation in units of the latest face width.
    ///
    /// Zero for degenerate boxes so they classify as forward.
    pub fn move_ratio(&self) -> f64 {
        if self.last_box.width <= 0.0 {
            return 0.0;
        }
        (self.smoothed_x - self.baseline_x) / self.last_box.width
    }
}
