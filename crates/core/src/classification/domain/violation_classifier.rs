use crate::classification::domain::direction::Direction;
use crate::shared::monitor_config::MonitorConfig;

/// Maps a subject's deviation ratio to a [`Direction`].
///
/// Three bands per side: the dead zone is always forward, the buffer band
/// between dead zone and sensitivity is also forward (motion without a
/// violation), and only beyond the sensitivity threshold does a direction
/// register. A profile detection overrides the ratio entirely.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViolationClassifier {
    dead_zone: f64,
    left_sensitivity: f64,
    right_sensitivity: f64,
}

impl ViolationClassifier {
    pub fn new(dead_zone: f64, left_sensitivity: f64, right_sensitivity: f64) -> Self {
        Self {
            dead_zone,
            left_sensitivity,
            right_sensitivity,
        }
    }

    pub fn from_config(config: &MonitorConfig) -> Self {
        Self::new(
            config.dead_zone,
            config.left_sensitivity,
            config.right_sensitivity,
        )
    }

    pub fn classify(&self, move_ratio: f64, profile: bool) -> Direction {
        if profile {
            Direction::Side
        } else if move_ratio.abs() <= self.dead_zone {
            Direction::Forward
        } else if move_ratio > self.right_sensitivity {
            Direction::Right
        } else if move_ratio < -self.left_sensitivity {
            Direction::Left
        } else {
            Direction::Forward
        }
    }
}
