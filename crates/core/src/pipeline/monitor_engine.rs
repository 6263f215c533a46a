use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::classification::domain::direction::Direction;
use crate::classification::domain::violation_classifier::ViolationClassifier;
use crate::detection::domain::frame_observation::FrameObservation;
use crate::incident::domain::incident::IncidentTrigger;
use crate::incident::domain::incident_debouncer::IncidentDebouncer;
use crate::shared::bounding_box::BoundingBox;
use crate::shared::monitor_config::{AssociationMode, ConfigError, MonitorConfig};
use crate::tracking::domain::position_smoother::ExponentialSmoother;
use crate::tracking::domain::subject_associator::SubjectAssociator;
use crate::tracking::domain::subject_state::{SubjectId, SubjectState};
use crate::tracking::domain::subject_tracker::SubjectTracker;
use crate::tracking::infrastructure::nearest_neighbor_associator::NearestNeighborAssociator;
use crate::tracking::infrastructure::positional_associator::PositionalAssociator;

/// Per-subject overlay data for one tick.
#[derive(Clone, Debug, PartialEq)]
pub struct SubjectStatus {
    pub id: SubjectId,
    pub direction: Direction,
    /// Time in the current deviation episode.
    pub elapsed: Option<Duration>,
    pub alert_active: bool,
    /// The alert banner is still within its display window.
    pub banner_visible: bool,
    pub move_ratio: f64,
    /// `None` when only a profile detection placed the subject this tick.
    pub bounding_box: Option<BoundingBox>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TickReport {
    pub now: Duration,
    /// Subjects sighted this tick, ordered by id.
    pub subjects: Vec<SubjectStatus>,
    /// Incidents that crossed the threshold on this tick.
    pub triggers: Vec<IncidentTrigger>,
    pub discarded: Vec<SubjectId>,
    /// Set when the detector failed; no subject state was touched.
    pub detector_error: Option<String>,
}

/// Synchronous per-tick core: tracking, classification and debouncing.
///
/// Owns every [`SubjectState`] exclusively and performs no I/O. The caller
/// supplies the detector result for a frame together with that frame's
/// session time, and persists the returned triggers.
pub struct MonitorEngine {
    session_start: DateTime<Utc>,
    tracker: SubjectTracker,
    classifier: ViolationClassifier,
    debouncer: IncidentDebouncer,
}

impl MonitorEngine {
    /// Validates `config` and builds the engine. Invalid tuning is fatal.
    pub fn new(config: &MonitorConfig, session_start: DateTime<Utc>) -> Result<Self, ConfigError> {
        config.validate()?;

        let associator: Box<dyn SubjectAssociator> = match config.association {
            AssociationMode::Nearest => {
                Box::new(NearestNeighborAssociator::new(config.max_association_distance))
            }
            AssociationMode::Positional => Box::new(PositionalAssociator::new()),
        };
        let tracker = SubjectTracker::new(
            Box::new(ExponentialSmoother::new(config.smoothing_factor)),
            associator,
            config.subject_grace(),
            config.max_association_distance,
        );

        log::debug!(
            "Engine: dead zone {}, sensitivity L{}/R{}, turn {}s, {} association",
            config.dead_zone,
            config.left_sensitivity,
            config.right_sensitivity,
            config.turn_duration_secs,
            config.association
        );

        Ok(Self {
            session_start,
            tracker,
            classifier: ViolationClassifier::from_config(config),
            debouncer: IncidentDebouncer::new(config.turn_duration(), config.alert_display()),
        })
    }

    pub fn tick(
        &mut self,
        detections: Result<FrameObservation, String>,
        now: Duration,
    ) -> TickReport {
        let observation = match detections {
            Ok(observation) => observation,
            Err(e) => {
                log::warn!("Detector failed at {:.3}s: {e}", now.as_secs_f64());
                return TickReport {
                    now,
                    detector_error: Some(e),
                    ..Default::default()
                };
            }
        };

        let update = self.tracker.update(&observation, now);
        let timestamp = self.wall_clock(now);
        let mut subjects = Vec::with_capacity(update.sightings.len());
        let mut triggers = Vec::new();

        for sighting in update.sightings {
            let Some(state) = self.tracker.subject_mut(sighting.id) else {
                continue;
            };
            let direction = self.classifier.classify(sighting.move_ratio, sighting.profile);
            let outcome = self.debouncer.evaluate(state, direction, now);

            if outcome.fired {
                log::info!(
                    "Subject {} looking {} for {:.1}s",
                    sighting.id,
                    direction,
                    outcome.elapsed.unwrap_or_default().as_secs_f64()
                );
                triggers.push(IncidentTrigger {
                    timestamp,
                    session_time: now,
                    subject_id: sighting.id,
                    direction,
                });
            }

            subjects.push(SubjectStatus {
                id: sighting.id,
                direction,
                elapsed: outcome.elapsed,
                alert_active: state.alert_active,
                banner_visible: self.debouncer.banner_visible(state, now),
                move_ratio: sighting.move_ratio,
                bounding_box: sighting.frontal_box,
            });
        }

        TickReport {
            now,
            subjects,
            triggers,
            discarded: update.discarded,
            detector_error: None,
        }
    }

    pub fn subject(&self, id: SubjectId) -> Option<&SubjectState> {
        self.tracker.subject(id)
    }

    pub fn subject_count(&self) -> usize {
        self.tracker.len()
    }

    pub fn session_start(&self) -> DateTime<Utc> {
        self.session_start
    }

    fn wall_clock(&self, now: Duration) -> DateTime<Utc> {
        chrono::Duration::from_std(now)
            .ok()
            .and_then(|offset| self.session_start.checked_add_signed(offset))
            .unwrap_or(self.session_start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::frame_observation::{Detection, DetectionKind};
    use approx::assert_relative_eq;
    use chrono::TimeZone;

    const TICK_MS: u64 = 100;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, 9, 0, 0).unwrap()
    }

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    /// Face of width 100 whose horizontal center is `center`.
    fn face(center: f64) -> BoundingBox {
        BoundingBox::new(center - 50.0, 100.0, 100.0, 100.0)
    }

    fn frontal(centers: &[f64]) -> FrameObservation {
        FrameObservation::new(
            centers
                .iter()
                .map(|&c| Detection {
                    bounding_box: face(c),
                    kind: DetectionKind::Frontal,
                })
                .collect(),
        )
    }

    fn scenario_config() -> MonitorConfig {
        MonitorConfig {
            smoothing_factor: 0.3,
            dead_zone: 0.15,
            right_sensitivity: 0.20,
            turn_duration_secs: 3.0,
            ..Default::default()
        }
    }

    /// No smoothing, so a detection maps straight to its ratio.
    fn raw_config() -> MonitorConfig {
        MonitorConfig {
            smoothing_factor: 1.0,
            ..scenario_config()
        }
    }

    fn engine(config: &MonitorConfig) -> MonitorEngine {
        MonitorEngine::new(config, start()).unwrap()
    }

    /// Ticks every 100ms from `from_ms`, one observation per tick, and
    /// collects all triggers.
    fn drive(
        engine: &mut MonitorEngine,
        from_ms: u64,
        observations: impl IntoIterator<Item = FrameObservation>,
    ) -> Vec<IncidentTrigger> {
        observations
            .into_iter()
            .enumerate()
            .flat_map(|(i, obs)| {
                engine
                    .tick(Ok(obs), ms(from_ms + i as u64 * TICK_MS))
                    .triggers
            })
            .collect()
    }

    fn repeat(centers: &[f64], ticks: usize) -> Vec<FrameObservation> {
        (0..ticks).map(|_| frontal(centers)).collect()
    }

    #[test]
    fn test_invalid_config_is_rejected_at_construction() {
        let config = MonitorConfig {
            smoothing_factor: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            MonitorEngine::new(&config, start()),
            Err(ConfigError::SmoothingFactor(_))
        ));
    }

    #[test]
    fn test_oversized_turn_duration_is_rejected_at_construction() {
        let config = MonitorConfig {
            turn_duration_secs: 1e20,
            ..Default::default()
        };
        assert!(matches!(
            MonitorEngine::new(&config, start()),
            Err(ConfigError::DurationOverflow { .. })
        ));
    }

    #[test]
    fn test_first_sighting_is_forward() {
        let mut e = engine(&raw_config());
        let report = e.tick(Ok(frontal(&[100.0])), ms(0));
        assert_eq!(report.subjects.len(), 1);
        assert_eq!(report.subjects[0].direction, Direction::Forward);
        assert_eq!(report.subjects[0].elapsed, None);
        assert!(report.triggers.is_empty());
    }

    #[test]
    fn test_sustained_deviation_fires_exactly_once() {
        let mut e = engine(&raw_config());
        e.tick(Ok(frontal(&[100.0])), ms(0));
        // 30 seconds looking right.
        let triggers = drive(&mut e, 100, repeat(&[130.0], 300));
        assert_eq!(triggers.len(), 1);
        assert_eq!(triggers[0].direction, Direction::Right);
        assert_eq!(triggers[0].session_time, ms(3100));
    }

    #[test]
    fn test_return_before_threshold_fires_nothing_and_restarts_timer() {
        let mut e = engine(&raw_config());
        e.tick(Ok(frontal(&[100.0])), ms(0));

        // 2.9s deviating, one forward tick, then 2.9s again.
        let mut observations = repeat(&[130.0], 30);
        observations.push(frontal(&[100.0]));
        observations.extend(repeat(&[130.0], 30));
        assert!(drive(&mut e, 100, observations).is_empty());

        let report = e.tick(Ok(frontal(&[130.0])), ms(6200));
        assert_eq!(report.subjects[0].elapsed, Some(ms(3000)));
        assert_eq!(report.triggers.len(), 1);
    }

    #[test]
    fn test_rearms_after_returning_forward() {
        let mut e = engine(&raw_config());
        e.tick(Ok(frontal(&[100.0])), ms(0));

        let mut observations = repeat(&[130.0], 40);
        observations.push(frontal(&[100.0]));
        observations.extend(repeat(&[20.0], 40));
        let triggers = drive(&mut e, 100, observations);

        assert_eq!(triggers.len(), 2);
        assert_eq!(triggers[0].direction, Direction::Right);
        assert_eq!(triggers[1].direction, Direction::Left);
    }

    #[test]
    fn test_dead_zone_is_forward_either_side() {
        let mut e = engine(&raw_config());
        e.tick(Ok(frontal(&[100.0])), ms(0));
        for (i, center) in [115.0, 85.0, 110.0, 90.0].into_iter().enumerate() {
            let report = e.tick(Ok(frontal(&[center])), ms(100 + i as u64 * 100));
            assert_eq!(report.subjects[0].direction, Direction::Forward);
        }
    }

    #[test]
    fn test_subjects_time_and_fire_independently() {
        let mut e = engine(&raw_config());
        e.tick(Ok(frontal(&[100.0, 600.0])), ms(0));

        // Subject 1 deviates throughout; subject 2 glances away and back
        // every second.
        let observations = (0..40).map(|i| {
            let second = if i % 10 < 5 { 630.0 } else { 600.0 };
            frontal(&[130.0, second])
        });
        let triggers = drive(&mut e, 100, observations);

        assert_eq!(triggers.len(), 1);
        assert_eq!(triggers[0].subject_id, 1);
        assert!(e.subject(2).is_some_and(|s| !s.alert_active));
        assert!(e.subject(1).is_some_and(|s| s.alert_active));
    }

    #[test]
    fn test_one_subject_resetting_leaves_other_timer_untouched() {
        let mut e = engine(&raw_config());
        e.tick(Ok(frontal(&[100.0, 600.0])), ms(0));
        e.tick(Ok(frontal(&[130.0, 630.0])), ms(100));
        e.tick(Ok(frontal(&[130.0, 600.0])), ms(200));

        assert_eq!(e.subject(1).unwrap().violation_started_at, Some(ms(100)));
        assert_eq!(e.subject(2).unwrap().violation_started_at, None);
    }

    #[test]
    fn test_scenario_settling_right_fires_once_at_threshold() {
        let mut e = engine(&scenario_config());
        e.tick(Ok(frontal(&[100.0])), ms(0));

        let mut first_right = None;
        let mut triggers = Vec::new();
        // Detected center 125 settles the smoothed ratio at 0.25.
        for k in 1..=37u64 {
            let report = e.tick(Ok(frontal(&[125.0])), ms(k * TICK_MS));
            let status = &report.subjects[0];
            if status.direction == Direction::Right && first_right.is_none() {
                assert!(status.move_ratio > 0.20);
                first_right = Some(report.now);
            }
            if status.direction != Direction::Right {
                assert!(status.move_ratio <= 0.20);
            }
            triggers.extend(report.triggers);
        }

        assert_eq!(first_right, Some(ms(500)));
        assert_eq!(triggers.len(), 1);
        assert_eq!(triggers[0].direction, Direction::Right);
        assert_eq!(triggers[0].session_time, ms(3500));
        assert_relative_eq!(
            e.subject(1).unwrap().move_ratio(),
            0.25,
            epsilon = 1e-3
        );
    }

    #[test]
    fn test_scenario_oscillating_inside_dead_zone_never_fires() {
        let mut e = engine(&scenario_config());
        e.tick(Ok(frontal(&[100.0])), ms(0));
        let observations = (0..100).map(|i| frontal(&[if i % 2 == 0 { 110.0 } else { 114.0 }]));
        assert!(drive(&mut e, 100, observations).is_empty());
        assert_eq!(e.subject(1).unwrap().violation_started_at, None);
    }

    #[test]
    fn test_profile_detection_reads_as_side() {
        let mut e = engine(&raw_config());
        e.tick(Ok(frontal(&[100.0])), ms(0));

        let profile_only = FrameObservation::new(vec![Detection {
            bounding_box: face(110.0),
            kind: DetectionKind::ProfileLeft,
        }]);
        let report = e.tick(Ok(profile_only), ms(100));

        assert_eq!(report.subjects[0].direction, Direction::Side);
        assert_eq!(report.subjects[0].bounding_box, None);
        assert_eq!(report.subjects[0].elapsed, Some(Duration::ZERO));
    }

    #[test]
    fn test_detector_failure_leaves_state_untouched() {
        let mut e = engine(&raw_config());
        e.tick(Ok(frontal(&[100.0])), ms(0));
        e.tick(Ok(frontal(&[130.0])), ms(100));
        let before = e.subject(1).cloned();

        let report = e.tick(Err("camera unplugged".to_string()), ms(5000));

        assert_eq!(report.detector_error.as_deref(), Some("camera unplugged"));
        assert!(report.subjects.is_empty());
        assert!(report.discarded.is_empty());
        assert_eq!(e.subject(1).cloned(), before);
    }

    #[test]
    fn test_subject_leaving_is_discarded_after_grace() {
        let mut e = engine(&raw_config());
        e.tick(Ok(frontal(&[100.0])), ms(0));
        assert!(e.tick(Ok(FrameObservation::default()), ms(500)).discarded.is_empty());
        let report = e.tick(Ok(FrameObservation::default()), ms(600));
        assert_eq!(report.discarded, vec![1]);
        assert_eq!(e.subject_count(), 0);
    }

    #[test]
    fn test_banner_outlives_episode() {
        let mut e = engine(&raw_config());
        e.tick(Ok(frontal(&[100.0])), ms(0));
        let triggers = drive(&mut e, 100, repeat(&[130.0], 31));
        assert_eq!(triggers.len(), 1);

        let report = e.tick(Ok(frontal(&[100.0])), ms(4000));
        let status = &report.subjects[0];
        assert_eq!(status.direction, Direction::Forward);
        assert!(!status.alert_active);
        assert!(status.banner_visible);

        let report = e.tick(Ok(frontal(&[100.0])), ms(8100));
        assert!(!report.subjects[0].banner_visible);
    }

    #[test]
    fn test_trigger_timestamp_is_session_start_plus_frame_time() {
        let mut e = engine(&raw_config());
        e.tick(Ok(frontal(&[100.0])), ms(0));
        let triggers = drive(&mut e, 1000, repeat(&[130.0], 31));
        assert_eq!(
            triggers[0].timestamp,
            Utc.with_ymd_and_hms(2026, 3, 14, 9, 0, 4).unwrap()
        );
        assert_eq!(triggers[0].snapshot_hint(), "1_20260314_090004_000");
    }

    #[test]
    fn test_refires_within_one_second_get_distinct_snapshot_hints() {
        let config = MonitorConfig {
            turn_duration_secs: 0.2,
            ..raw_config()
        };
        let mut e = engine(&config);
        e.tick(Ok(frontal(&[100.0])), ms(0));
        let mut observations = repeat(&[130.0], 3);
        observations.push(frontal(&[100.0]));
        observations.extend(repeat(&[130.0], 3));

        let triggers = drive(&mut e, 100, observations);
        assert_eq!(triggers.len(), 2);
        assert_eq!(triggers[0].snapshot_hint(), "1_20260314_090000_300");
        assert_eq!(triggers[1].snapshot_hint(), "1_20260314_090000_700");
    }

    #[test]
    fn test_positional_association_follows_detection_order() {
        let config = MonitorConfig {
            association: AssociationMode::Positional,
            ..raw_config()
        };
        let mut e = engine(&config);
        e.tick(Ok(frontal(&[100.0, 600.0])), ms(0));
        let report = e.tick(Ok(frontal(&[600.0, 100.0])), ms(100));
        // Swapped order reads as both subjects jumping 500px.
        assert_eq!(report.subjects[0].direction, Direction::Right);
        assert_eq!(report.subjects[1].direction, Direction::Left);
    }

    #[test]
    fn test_nearest_association_survives_reordering() {
        let mut e = engine(&raw_config());
        e.tick(Ok(frontal(&[100.0, 600.0])), ms(0));
        let report = e.tick(Ok(frontal(&[600.0, 100.0])), ms(100));
        assert!(report
            .subjects
            .iter()
            .all(|s| s.direction == Direction::Forward));
    }
}
