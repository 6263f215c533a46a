use std::collections::BTreeMap;
use std::time::Duration;

use crate::detection::domain::frame_observation::FrameObservation;
use crate::shared::bounding_box::BoundingBox;
use crate::tracking::domain::position_smoother::PositionSmoother;
use crate::tracking::domain::subject_associator::{KnownSubject, SubjectAssociator};
use crate::tracking::domain::subject_state::{SubjectId, SubjectState};

/// A subject seen during the current tick.
#[derive(Clone, Debug, PartialEq)]
pub struct SubjectSighting {
    pub id: SubjectId,
    /// Baseline-relative deviation after smoothing.
    pub move_ratio: f64,
    /// A profile detection was attributed to this subject this tick.
    pub profile: bool,
    /// `None` when the subject was only seen through a profile detection.
    pub frontal_box: Option<BoundingBox>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TrackerUpdate {
    /// Ordered by subject id.
    pub sightings: Vec<SubjectSighting>,
    pub discarded: Vec<SubjectId>,
}

/// Maintains [`SubjectState`] continuity across ticks.
///
/// Frontal detections drive identity and smoothing. Profile detections are
/// attributed to the nearest remembered subject and count as a sighting
/// without moving the smoothed center. Subjects unseen for longer than the
/// grace window are discarded.
pub struct SubjectTracker {
    smoother: Box<dyn PositionSmoother>,
    associator: Box<dyn SubjectAssociator>,
    grace: Duration,
    max_profile_distance: f64,
    subjects: BTreeMap<SubjectId, SubjectState>,
}

impl SubjectTracker {
    pub fn new(
        smoother: Box<dyn PositionSmoother>,
        associator: Box<dyn SubjectAssociator>,
        grace: Duration,
        max_profile_distance: f64,
    ) -> Self {
        Self {
            smoother,
            associator,
            grace,
            max_profile_distance,
            subjects: BTreeMap::new(),
        }
    }

    pub fn update(&mut self, observation: &FrameObservation, now: Duration) -> TrackerUpdate {
        let mut sightings: BTreeMap<SubjectId, SubjectSighting> = BTreeMap::new();

        self.apply_frontal(observation, now, &mut sightings);
        self.apply_profiles(observation, now, &mut sightings);
        let discarded = self.discard_expired(now);

        TrackerUpdate {
            sightings: sightings.into_values().collect(),
            discarded,
        }
    }

    pub fn subject(&self, id: SubjectId) -> Option<&SubjectState> {
        self.subjects.get(&id)
    }

    pub fn subject_mut(&mut self, id: SubjectId) -> Option<&mut SubjectState> {
        self.subjects.get_mut(&id)
    }

    pub fn len(&self) -> usize {
        self.subjects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subjects.is_empty()
    }

    fn apply_frontal(
        &mut self,
        observation: &FrameObservation,
        now: Duration,
        sightings: &mut BTreeMap<SubjectId, SubjectSighting>,
    ) {
        let frontal: Vec<BoundingBox> = observation.frontal().copied().collect();
        let known: Vec<KnownSubject> = self
            .subjects
            .iter()
            .map(|(&id, s)| KnownSubject {
                id,
                last_box: s.last_box,
            })
            .collect();

        let ids = self.associator.associate(&known, &frontal);
        for (id, bbox) in ids.into_iter().zip(frontal) {
            let smoother = &self.smoother;
            let state = self
                .subjects
                .entry(id)
                .and_modify(|s| {
                    s.smoothed_x = smoother.smooth(s.smoothed_x, bbox.center_x());
                    s.last_box = bbox;
                    s.last_seen_at = now;
                })
                .or_insert_with(|| {
                    log::debug!("Subject {id} first seen at x={:.1}", bbox.center_x());
                    SubjectState::first_sighting(bbox, now)
                });

            sightings.insert(
                id,
                SubjectSighting {
                    id,
                    move_ratio: state.move_ratio(),
                    profile: false,
                    frontal_box: Some(bbox),
                },
            );
        }
    }

    fn apply_profiles(
        &mut self,
        observation: &FrameObservation,
        now: Duration,
        sightings: &mut BTreeMap<SubjectId, SubjectSighting>,
    ) {
        for profile in observation.profiles() {
            let Some(id) = self.nearest_subject(&profile.bounding_box) else {
                log::debug!("Ignoring profile detection with no nearby subject");
                continue;
            };
            let Some(state) = self.subjects.get_mut(&id) else {
                continue;
            };
            state.last_seen_at = now;
            let move_ratio = state.move_ratio();

            sightings
                .entry(id)
                .or_insert_with(|| SubjectSighting {
                    id,
                    move_ratio,
                    profile: false,
                    frontal_box: None,
                })
                .profile = true;
        }
    }

    fn nearest_subject(&self, target: &BoundingBox) -> Option<SubjectId> {
        self.subjects
            .iter()
            .map(|(&id, s)| (id, s.last_box.relative_center_distance(target)))
            .filter(|&(_, distance)| distance <= self.max_profile_distance)
            .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(id, _)| id)
    }

    fn discard_expired(&mut self, now: Duration) -> Vec<SubjectId> {
        let grace = self.grace;
        let expired: Vec<SubjectId> = self
            .subjects
            .iter()
            .filter(|(_, s)| s.last_seen_at < now && now - s.last_seen_at > grace)
            .map(|(&id, _)| id)
            .collect();

        for id in &expired {
            self.subjects.remove(id);
            self.associator.release(*id);
            log::debug!("Subject {id} discarded after leaving the frame");
        }
        expired
    }
}
