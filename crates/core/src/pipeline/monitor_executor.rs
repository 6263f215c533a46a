use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crossbeam_channel::Sender;

use crate::detection::domain::face_detector::FaceDetector;
use crate::incident::domain::incident::{Incident, IncidentTrigger};
use crate::incident::domain::incident_sink::IncidentSink;
use crate::pipeline::monitor_engine::{MonitorEngine, TickReport};
use crate::pipeline::monitor_logger::MonitorLogger;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::frame_source::FrameSource;

/// Everything the loop reports to an observer (UI overlay, console).
#[derive(Clone, Debug)]
pub enum MonitorEvent {
    Tick(TickReport),
    IncidentRecorded(Incident),
    IncidentUnpersisted {
        trigger: IncidentTrigger,
        reason: String,
    },
    DetectorFailed {
        frame_index: usize,
        error: String,
    },
}

/// Counters for one finished run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub ticks: usize,
    pub incidents_fired: usize,
    pub incidents_persisted: usize,
    pub incidents_unpersisted: usize,
    pub detector_failures: usize,
    /// Stale frames a live source replaced before they were scored.
    pub frames_dropped: usize,
}

/// Configuration for one monitoring run.
pub struct RunConfig {
    pub cancelled: Arc<AtomicBool>,
    pub events: Option<Sender<MonitorEvent>>,
    pub logger: Box<dyn MonitorLogger>,
}

/// Abstracts how the read → detect → tick → persist loop is executed.
///
/// This is a port. Infrastructure provides concrete implementations.
pub trait MonitorExecutor: Send {
    fn execute(
        &self,
        source: Box<dyn FrameSource>,
        detector: Box<dyn FaceDetector>,
        engine: MonitorEngine,
        sink: IncidentSink,
        metadata: &VideoMetadata,
        config: RunConfig,
    ) -> Result<RunSummary, Box<dyn std::error::Error>>;
}
