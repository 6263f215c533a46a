use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Instant;

use crossbeam_channel::{Receiver, Sender, TrySendError};

use crate::detection::domain::face_detector::FaceDetector;
use crate::detection::domain::frame_observation::FrameObservation;
use crate::incident::domain::incident::IncidentTrigger;
use crate::incident::domain::incident_sink::{IncidentSink, SinkOutcome};
use crate::pipeline::monitor_engine::MonitorEngine;
use crate::pipeline::monitor_executor::{MonitorEvent, MonitorExecutor, RunConfig, RunSummary};
use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::frame_source::FrameSource;

/// Frames move between stages one at a time, by value.
const FRAME_SLOTS: usize = 1;

type SourceItem = Result<Frame, String>;

struct Detected {
    frame: Frame,
    observation: Result<FrameObservation, String>,
    detect_ms: f64,
}

#[derive(Default)]
struct SinkTally {
    persisted: usize,
    unpersisted: usize,
}

/// Runs the monitor with dedicated threads for capture, detection and
/// incident persistence.
///
/// Layout: `source → detect → main [engine tick] → sink`
///
/// Frames are handed over through single-slot channels. For live sources a
/// new frame evicts one still waiting in the slot, so detection always
/// works on the most recent complete frame. Recorded sources block instead
/// and every frame is scored. The sink thread owns snapshot and log I/O so
/// a slow write never delays the next tick; it is drained and joined before
/// the run returns, and unpersisted incidents get one retry at that point.
pub struct ThreadedMonitorExecutor;

impl ThreadedMonitorExecutor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ThreadedMonitorExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl MonitorExecutor for ThreadedMonitorExecutor {
    fn execute(
        &self,
        source: Box<dyn FrameSource>,
        detector: Box<dyn FaceDetector>,
        mut engine: MonitorEngine,
        sink: IncidentSink,
        metadata: &VideoMetadata,
        mut config: RunConfig,
    ) -> Result<RunSummary, Box<dyn std::error::Error>> {
        let dropped = Arc::new(AtomicUsize::new(0));

        let (frame_tx, frame_rx) = crossbeam_channel::bounded::<SourceItem>(FRAME_SLOTS);
        let (detected_tx, detected_rx) =
            crossbeam_channel::bounded::<Result<Detected, String>>(FRAME_SLOTS);
        let (incident_tx, incident_rx) = crossbeam_channel::unbounded::<(IncidentTrigger, Frame)>();

        let reader_handle = spawn_reader(
            source,
            frame_tx,
            metadata.live.then(|| frame_rx.clone()),
            dropped.clone(),
            config.cancelled.clone(),
        );
        let detect_handle = spawn_detector(detector, frame_rx, detected_tx, config.cancelled.clone());
        let sink_handle = spawn_sink(sink, incident_rx, config.events.clone());

        let mut summary = RunSummary::default();
        let main_error = run_main_loop(
            detected_rx,
            &mut engine,
            &incident_tx,
            metadata.total_frames,
            &mut config,
            &mut summary,
        );
        drop(incident_tx);
        if main_error.is_some() {
            // A live reader keeps its own receiver, so it only stops on this flag.
            config.cancelled.store(true, Ordering::Relaxed);
        }

        let tally = join_threads(reader_handle, detect_handle, sink_handle, main_error)?;
        summary.incidents_persisted = tally.persisted;
        summary.incidents_unpersisted = tally.unpersisted;
        summary.frames_dropped = dropped.load(Ordering::Relaxed);

        config.logger.summary();
        config.logger.info(&format!(
            "{} incidents fired, {} persisted, {} unpersisted, {} detector failures",
            summary.incidents_fired,
            summary.incidents_persisted,
            summary.incidents_unpersisted,
            summary.detector_failures
        ));
        Ok(summary)
    }
}

fn spawn_reader(
    mut source: Box<dyn FrameSource>,
    frame_tx: Sender<SourceItem>,
    stale_rx: Option<Receiver<SourceItem>>,
    dropped: Arc<AtomicUsize>,
    cancelled: Arc<AtomicBool>,
) -> JoinHandle<Box<dyn FrameSource>> {
    std::thread::spawn(move || {
        for frame_result in source.frames() {
            if cancelled.load(Ordering::Relaxed) {
                break;
            }
            let item = frame_result.map_err(|e| e.to_string());
            let sent = match &stale_rx {
                Some(stale_rx) => send_latest(&frame_tx, stale_rx, item, &dropped),
                None => frame_tx.send(item).is_ok(),
            };
            if !sent {
                break;
            }
        }
        source.close();
        source
    })
}

/// Puts `item` in the slot, evicting a frame nobody has picked up yet.
fn send_latest(
    frame_tx: &Sender<SourceItem>,
    stale_rx: &Receiver<SourceItem>,
    item: SourceItem,
    dropped: &AtomicUsize,
) -> bool {
    match frame_tx.try_send(item) {
        Ok(()) => true,
        Err(TrySendError::Full(item)) => {
            if stale_rx.try_recv().is_ok() {
                dropped.fetch_add(1, Ordering::Relaxed);
            }
            frame_tx.send(item).is_ok()
        }
        Err(TrySendError::Disconnected(_)) => false,
    }
}

fn spawn_detector(
    mut detector: Box<dyn FaceDetector>,
    frame_rx: Receiver<SourceItem>,
    detected_tx: Sender<Result<Detected, String>>,
    cancelled: Arc<AtomicBool>,
) -> JoinHandle<Box<dyn FaceDetector>> {
    std::thread::spawn(move || {
        for item in frame_rx {
            if cancelled.load(Ordering::Relaxed) {
                break;
            }
            let result = item.map(|frame| {
                let started = Instant::now();
                let observation = detector
                    .detect(&frame)
                    .map(FrameObservation::from_raw)
                    .map_err(|e| e.to_string());
                Detected {
                    frame,
                    observation,
                    detect_ms: started.elapsed().as_secs_f64() * 1000.0,
                }
            });
            if detected_tx.send(result).is_err() {
                break;
            }
        }
        detector
    })
}

fn spawn_sink(
    mut sink: IncidentSink,
    incident_rx: Receiver<(IncidentTrigger, Frame)>,
    events: Option<Sender<MonitorEvent>>,
) -> JoinHandle<SinkTally> {
    std::thread::spawn(move || {
        let emit = |event: MonitorEvent| {
            if let Some(tx) = &events {
                let _ = tx.send(event);
            }
        };
        let mut tally = SinkTally::default();

        for (trigger, frame) in incident_rx {
            match sink.record(trigger, frame) {
                SinkOutcome::Persisted(incident) => {
                    tally.persisted += 1;
                    log::info!(
                        "Incident logged: subject {} {} -> {}",
                        incident.subject_id,
                        incident.direction,
                        incident.snapshot_ref
                    );
                    emit(MonitorEvent::IncidentRecorded(incident));
                }
                SinkOutcome::Unpersisted { trigger, reason } => {
                    emit(MonitorEvent::IncidentUnpersisted { trigger, reason });
                }
            }
        }

        if !sink.unpersisted().is_empty() {
            log::info!("Retrying {} unpersisted incidents", sink.unpersisted().len());
            for incident in sink.retry_unpersisted() {
                tally.persisted += 1;
                emit(MonitorEvent::IncidentRecorded(incident));
            }
        }
        tally.unpersisted = sink.unpersisted().len();
        tally
    })
}

/// Receives detected frames and ticks the engine once per frame.
fn run_main_loop(
    detected_rx: Receiver<Result<Detected, String>>,
    engine: &mut MonitorEngine,
    incident_tx: &Sender<(IncidentTrigger, Frame)>,
    total_frames: Option<usize>,
    config: &mut RunConfig,
    summary: &mut RunSummary,
) -> Option<Box<dyn std::error::Error>> {
    for detected in detected_rx {
        if config.cancelled.load(Ordering::Relaxed) {
            config.logger.info("Monitoring cancelled");
            break;
        }

        let Detected {
            frame,
            observation,
            detect_ms,
        } = match detected {
            Ok(detected) => detected,
            Err(e) => return Some(format!("Frame source failed: {e}").into()),
        };

        let started = Instant::now();
        let report = engine.tick(observation, frame.captured_at());
        config.logger.timing("detect", detect_ms);
        config
            .logger
            .timing("tick", started.elapsed().as_secs_f64() * 1000.0);
        config
            .logger
            .metric("subjects", report.subjects.len() as f64);

        summary.ticks += 1;
        if let Some(error) = &report.detector_error {
            summary.detector_failures += 1;
            emit(
                config,
                MonitorEvent::DetectorFailed {
                    frame_index: frame.index(),
                    error: error.clone(),
                },
            );
        }

        for trigger in &report.triggers {
            summary.incidents_fired += 1;
            if incident_tx.send((trigger.clone(), frame.clone())).is_err() {
                return Some("Incident sink stopped unexpectedly".into());
            }
        }

        emit(config, MonitorEvent::Tick(report));
        config.logger.progress(summary.ticks, total_frames);
    }
    None
}

fn emit(config: &RunConfig, event: MonitorEvent) {
    if let Some(tx) = &config.events {
        let _ = tx.send(event);
    }
}

/// Joins all threads and coalesces the first error encountered.
fn join_threads(
    reader_handle: JoinHandle<Box<dyn FrameSource>>,
    detect_handle: JoinHandle<Box<dyn FaceDetector>>,
    sink_handle: JoinHandle<SinkTally>,
    mut first_error: Option<Box<dyn std::error::Error>>,
) -> Result<SinkTally, Box<dyn std::error::Error>> {
    fn set_if_none(slot: &mut Option<Box<dyn std::error::Error>>, err: Box<dyn std::error::Error>) {
        if slot.is_none() {
            *slot = Some(err);
        }
    }

    if reader_handle.join().is_err() {
        set_if_none(&mut first_error, "Reader thread panicked".into());
    }
    if detect_handle.join().is_err() {
        set_if_none(&mut first_error, "Detect thread panicked".into());
    }
    // Always joined so fired incidents are flushed even when the loop failed.
    let tally = match sink_handle.join() {
        Ok(tally) => tally,
        Err(_) => {
            set_if_none(&mut first_error, "Sink thread panicked".into());
            SinkTally::default()
        }
    };

    match first_error {
        Some(e) => Err(e),
        None => Ok(tally),
    }
}
