use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::classification::domain::direction::Direction;
use crate::shared::constants::SNAPSHOT_TIMESTAMP_FORMAT;
use crate::tracking::domain::subject_state::SubjectId;

/// A debounced violation that has just crossed the duration threshold.
///
/// Produced by the engine; becomes an [`Incident`] once a snapshot exists.
#[derive(Clone, Debug, PartialEq)]
pub struct IncidentTrigger {
    pub timestamp: DateTime<Utc>,
    /// Frame-clock time of the triggering tick.
    pub session_time: Duration,
    pub subject_id: SubjectId,
    pub direction: Direction,
}

impl IncidentTrigger {
    /// Filename hint for the snapshot store: `{subject}_{YYYYmmdd_HHMMSS_mmm}`.
    pub fn snapshot_hint(&self) -> String {
        format!(
            "{}_{}",
            self.subject_id,
            self.timestamp.format(SNAPSHOT_TIMESTAMP_FORMAT)
        )
    }

    pub fn into_incident(self, snapshot_ref: String) -> Incident {
        Incident {
            timestamp: self.timestamp,
            subject_id: self.subject_id,
            direction: self.direction,
            snapshot_ref,
        }
    }
}

/// One violation episode that reached the sustained-duration threshold.
/// Immutable once created; the log only ever appends it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Incident {
    pub timestamp: DateTime<Utc>,
    pub subject_id: SubjectId,
    pub direction: Direction,
    pub snapshot_ref: String,
}
