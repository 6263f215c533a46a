use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crossbeam_channel::Sender;

use crate::detection::domain::face_detector::FaceDetector;
use crate::incident::domain::incident_sink::IncidentSink;
use crate::pipeline::monitor_engine::MonitorEngine;
use crate::pipeline::monitor_logger::{MonitorLogger, NullMonitorLogger};
use crate::video::domain::frame_source::FrameSource;

use super::monitor_executor::{MonitorEvent, MonitorExecutor, RunConfig, RunSummary};

/// Orchestrates one monitoring session.
///
/// Opens the frame source, wires the engine and sink together and delegates
/// the loop to a `MonitorExecutor`. Single-use: `execute` consumes the owned
/// components, so calling it twice fails.
pub struct MonitorSessionUseCase {
    source: Option<Box<dyn FrameSource>>,
    detector: Option<Box<dyn FaceDetector>>,
    engine: Option<MonitorEngine>,
    sink: Option<IncidentSink>,
    executor: Box<dyn MonitorExecutor>,
    events: Option<Sender<MonitorEvent>>,
    logger: Option<Box<dyn MonitorLogger>>,
    cancelled: Arc<AtomicBool>,
}

impl MonitorSessionUseCase {
    pub fn new(
        source: Box<dyn FrameSource>,
        detector: Box<dyn FaceDetector>,
        engine: MonitorEngine,
        sink: IncidentSink,
        executor: Box<dyn MonitorExecutor>,
    ) -> Self {
        Self {
            source: Some(source),
            detector: Some(detector),
            engine: Some(engine),
            sink: Some(sink),
            executor,
            events: None,
            logger: None,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_events(mut self, events: Sender<MonitorEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn with_logger(mut self, logger: Box<dyn MonitorLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn with_cancel_flag(mut self, cancelled: Arc<AtomicBool>) -> Self {
        self.cancelled = cancelled;
        self
    }

    /// Flag that stops the loop when set; already-fired incidents are still
    /// persisted before `execute` returns.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        self.cancelled.clone()
    }

    pub fn execute(&mut self) -> Result<RunSummary, Box<dyn std::error::Error>> {
        let mut source = self.source.take().ok_or("Session already executed")?;
        let metadata = source.open()?;
        log::info!(
            "Monitoring {}x{} at {:.1} fps{}",
            metadata.width,
            metadata.height,
            metadata.fps,
            if metadata.live { " (live)" } else { "" }
        );

        let config = RunConfig {
            cancelled: self.cancelled.clone(),
            events: self.events.take(),
            logger: self
                .logger
                .take()
                .unwrap_or_else(|| Box::new(NullMonitorLogger)),
        };

        self.executor.execute(
            source,
            self.detector.take().ok_or("Session already executed")?,
            self.engine.take().ok_or("Session already executed")?,
            self.sink.take().ok_or("Session already executed")?,
            &metadata,
            config,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::infrastructure::replay_detector::{ReplayDetector, ReplayRecord};
    use crate::incident::infrastructure::image_snapshot_store::ImageSnapshotStore;
    use crate::incident::infrastructure::sqlite_incident_log::SqliteIncidentLog;
    use crate::pipeline::infrastructure::threaded_monitor_executor::ThreadedMonitorExecutor;
    use crate::shared::bounding_box::BoundingBox;
    use crate::shared::monitor_config::MonitorConfig;
    use crate::video::infrastructure::synthetic_frame_source::SyntheticFrameSource;
    use chrono::{TimeZone, Utc};
    use std::sync::atomic::Ordering;

    fn face(center: f64) -> BoundingBox {
        BoundingBox::new(center - 25.0, 40.0, 50.0, 50.0)
    }

    /// Two subjects: the left one turns right for 4s, then back; the right
    /// one turns left for 2s only.
    fn two_subject_session(frames: usize) -> ReplayDetector {
        ReplayDetector::new(
            (0..frames)
                .map(|i| {
                    let first = if (1..=40).contains(&i) { 70.0 } else { 50.0 };
                    let second = if (10..30).contains(&i) { 220.0 } else { 250.0 };
                    ReplayRecord {
                        frame: i,
                        frontal: vec![face(first), face(second)],
                        ..Default::default()
                    }
                })
                .collect(),
        )
    }

    fn engine() -> MonitorEngine {
        let config = MonitorConfig {
            smoothing_factor: 1.0,
            ..Default::default()
        };
        MonitorEngine::new(&config, Utc.with_ymd_and_hms(2026, 3, 14, 9, 0, 0).unwrap()).unwrap()
    }

    #[test]
    fn test_session_writes_snapshot_and_sqlite_row() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("incidents.db");
        let sink = IncidentSink::new(
            Box::new(ImageSnapshotStore::new(dir.path().join("snapshots"))),
            Box::new(SqliteIncidentLog::open(&db_path).unwrap()),
        );

        let mut use_case = MonitorSessionUseCase::new(
            Box::new(SyntheticFrameSource::new(320, 240, 10.0, 60)),
            Box::new(two_subject_session(60)),
            engine(),
            sink,
            Box::new(ThreadedMonitorExecutor::new()),
        );
        let summary = use_case.execute().unwrap();

        assert_eq!(summary.ticks, 60);
        assert_eq!(summary.incidents_fired, 1);
        assert_eq!(summary.incidents_persisted, 1);

        let incidents = SqliteIncidentLog::open(&db_path).unwrap().all().unwrap();
        assert_eq!(incidents.len(), 1);
        assert_eq!(incidents[0].subject_id, 1);
        assert!(std::path::Path::new(&incidents[0].snapshot_ref).exists());
    }

    #[test]
    fn test_execute_twice_fails() {
        let sink = IncidentSink::new(
            Box::new(ImageSnapshotStore::new(std::env::temp_dir())),
            Box::new(SqliteIncidentLog::open_in_memory().unwrap()),
        );
        let mut use_case = MonitorSessionUseCase::new(
            Box::new(SyntheticFrameSource::new(32, 32, 10.0, 2)),
            Box::new(ReplayDetector::new(Vec::new())),
            engine(),
            sink,
            Box::new(ThreadedMonitorExecutor::new()),
        );
        assert!(use_case.execute().is_ok());
        assert!(use_case.execute().is_err());
    }

    #[test]
    fn test_source_open_failure_is_returned() {
        let sink = IncidentSink::new(
            Box::new(ImageSnapshotStore::new(std::env::temp_dir())),
            Box::new(SqliteIncidentLog::open_in_memory().unwrap()),
        );
        let mut use_case = MonitorSessionUseCase::new(
            Box::new(SyntheticFrameSource::new(32, 32, 0.0, 2)),
            Box::new(ReplayDetector::new(Vec::new())),
            engine(),
            sink,
            Box::new(ThreadedMonitorExecutor::new()),
        );
        assert!(use_case.execute().is_err());
    }

    #[test]
    fn test_cancel_flag_is_shared_with_the_run() {
        let sink = IncidentSink::new(
            Box::new(ImageSnapshotStore::new(std::env::temp_dir())),
            Box::new(SqliteIncidentLog::open_in_memory().unwrap()),
        );
        let mut use_case = MonitorSessionUseCase::new(
            Box::new(SyntheticFrameSource::new(32, 32, 10.0, 50)),
            Box::new(ReplayDetector::new(Vec::new())),
            engine(),
            sink,
            Box::new(ThreadedMonitorExecutor::new()),
        );
        use_case.cancel_flag().store(true, Ordering::Relaxed);
        assert_eq!(use_case.execute().unwrap().ticks, 0);
    }
}
