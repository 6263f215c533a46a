use std::path::PathBuf;
use std::process;
use std::thread::JoinHandle;

use chrono::Utc;
use clap::Parser;
use crossbeam_channel::Receiver;

use sems_core::detection::infrastructure::replay_detector::ReplayDetector;
use sems_core::incident::domain::incident_log::IncidentLog;
use sems_core::incident::domain::incident_sink::IncidentSink;
use sems_core::incident::infrastructure::image_snapshot_store::ImageSnapshotStore;
use sems_core::incident::infrastructure::memory_incident_log::MemoryIncidentLog;
use sems_core::incident::infrastructure::sqlite_incident_log::SqliteIncidentLog;
use sems_core::pipeline::infrastructure::threaded_monitor_executor::ThreadedMonitorExecutor;
use sems_core::pipeline::monitor_engine::MonitorEngine;
use sems_core::pipeline::monitor_executor::MonitorEvent;
use sems_core::pipeline::monitor_logger::LogMonitorLogger;
use sems_core::pipeline::monitor_session_use_case::MonitorSessionUseCase;
use sems_core::shared::constants::INCIDENT_TIMESTAMP_FORMAT;
use sems_core::shared::monitor_config::{AssociationMode, MonitorConfig};
use sems_core::video::domain::frame_source::FrameSource;
use sems_core::video::infrastructure::image_sequence_reader::ImageSequenceReader;
use sems_core::video::infrastructure::synthetic_frame_source::SyntheticFrameSource;

const DEFAULT_DB: &str = "incidents.db";

/// Scores a recorded exam session for sustained look-away incidents.
#[derive(Parser)]
#[command(name = "sems")]
struct Cli {
    /// Recorded detections, one JSON object per frame.
    detections: PathBuf,

    /// Directory of captured frames. Blank frames are used when omitted.
    #[arg(long)]
    frames: Option<PathBuf>,

    /// Frame width for blank frames.
    #[arg(long, default_value = "640")]
    width: u32,

    /// Frame height for blank frames.
    #[arg(long, default_value = "480")]
    height: u32,

    /// Capture rate of the session.
    #[arg(long, default_value = "10.0")]
    fps: f64,

    /// Release blank frames on the wall clock, dropping stale ones like a
    /// live camera would.
    #[arg(long)]
    realtime: bool,

    /// Config file (default: the user config directory).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the effective config to this path and continue.
    #[arg(long)]
    save_config: Option<PathBuf>,

    /// Position smoothing factor, (0, 1].
    #[arg(long)]
    smoothing: Option<f64>,

    /// Deviation ratio always treated as forward.
    #[arg(long)]
    dead_zone: Option<f64>,

    /// Deviation ratio beyond which a left turn registers.
    #[arg(long)]
    left_sensitivity: Option<f64>,

    /// Deviation ratio beyond which a right turn registers.
    #[arg(long)]
    right_sensitivity: Option<f64>,

    /// Seconds of continuous deviation before an incident fires.
    #[arg(long)]
    turn_duration: Option<f64>,

    /// Seconds an unseen subject is kept before being forgotten.
    #[arg(long)]
    grace: Option<f64>,

    /// Subject association: nearest or positional.
    #[arg(long)]
    association: Option<AssociationMode>,

    /// Incident database [default: incidents.db].
    #[arg(long, conflicts_with = "dry_run")]
    db: Option<PathBuf>,

    /// Keep incidents in memory only.
    #[arg(long)]
    dry_run: bool,

    /// Directory for incident snapshots.
    #[arg(long, default_value = "snapshots")]
    snapshots: PathBuf,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let config = build_config(&cli)?;
    config.validate()?;
    if let Some(path) = &cli.save_config {
        config.save(path)?;
        log::info!("Config written to {}", path.display());
    }

    let detector = ReplayDetector::from_path(&cli.detections)?;
    let source: Box<dyn FrameSource> = match &cli.frames {
        Some(dir) => Box::new(ImageSequenceReader::new(dir, cli.fps)),
        None => Box::new(
            SyntheticFrameSource::new(cli.width, cli.height, cli.fps, detector.frame_count())
                .paced(cli.realtime),
        ),
    };

    let log: Box<dyn IncidentLog> = if cli.dry_run {
        Box::new(MemoryIncidentLog::new())
    } else {
        let db = cli.db.clone().unwrap_or_else(|| PathBuf::from(DEFAULT_DB));
        Box::new(SqliteIncidentLog::open(&db)?)
    };
    let sink = IncidentSink::new(Box::new(ImageSnapshotStore::new(&cli.snapshots)), log);
    let engine = MonitorEngine::new(&config, Utc::now())?;

    let (events_tx, events_rx) = crossbeam_channel::unbounded();
    let printer = spawn_incident_printer(events_rx);

    let mut use_case = MonitorSessionUseCase::new(
        source,
        Box::new(detector),
        engine,
        sink,
        Box::new(ThreadedMonitorExecutor::new()),
    )
    .with_events(events_tx)
    .with_logger(Box::new(LogMonitorLogger::default()));

    let result = use_case.execute();
    // Releases the event sender if the run failed before taking it.
    drop(use_case);
    if printer.join().is_err() {
        log::warn!("Incident printer panicked");
    }
    let summary = result?;

    println!(
        "{} ticks, {} incidents ({} persisted, {} unpersisted), {} detector failures, {} frames dropped",
        summary.ticks,
        summary.incidents_fired,
        summary.incidents_persisted,
        summary.incidents_unpersisted,
        summary.detector_failures,
        summary.frames_dropped
    );
    if summary.incidents_unpersisted > 0 {
        return Err(format!("{} incidents could not be saved", summary.incidents_unpersisted).into());
    }
    Ok(())
}

fn build_config(cli: &Cli) -> Result<MonitorConfig, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => MonitorConfig::load(path)?,
        None => MonitorConfig::load_or_default(),
    };

    if let Some(v) = cli.smoothing {
        config.smoothing_factor = v;
    }
    if let Some(v) = cli.dead_zone {
        config.dead_zone = v;
    }
    if let Some(v) = cli.left_sensitivity {
        config.left_sensitivity = v;
    }
    if let Some(v) = cli.right_sensitivity {
        config.right_sensitivity = v;
    }
    if let Some(v) = cli.turn_duration {
        config.turn_duration_secs = v;
    }
    if let Some(v) = cli.grace {
        config.subject_grace_secs = v;
    }
    if let Some(v) = cli.association {
        config.association = v;
    }
    Ok(config)
}

fn spawn_incident_printer(events: Receiver<MonitorEvent>) -> JoinHandle<()> {
    std::thread::spawn(move || {
        for event in events {
            match event {
                MonitorEvent::IncidentRecorded(incident) => println!(
                    "[{}] subject {} {} -> {}",
                    incident.timestamp.format(INCIDENT_TIMESTAMP_FORMAT),
                    incident.subject_id,
                    incident.direction,
                    incident.snapshot_ref
                ),
                MonitorEvent::IncidentUnpersisted { trigger, reason } => eprintln!(
                    "[{}] subject {} {} NOT SAVED: {reason}",
                    trigger.timestamp.format(INCIDENT_TIMESTAMP_FORMAT),
                    trigger.subject_id,
                    trigger.direction
                ),
                MonitorEvent::Tick(_) | MonitorEvent::DetectorFailed { .. } => {}
            }
        }
    })
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if !cli.detections.exists() {
        return Err(format!("Detections file not found: {}", cli.detections.display()).into());
    }
    if let Some(dir) = &cli.frames {
        if !dir.is_dir() {
            return Err(format!("Frames directory not found: {}", dir.display()).into());
        }
        if cli.realtime {
            return Err("--realtime only applies to blank frames".into());
        }
    }
    if !(cli.fps.is_finite() && cli.fps > 0.0) {
        return Err(format!("FPS must be positive, got {}", cli.fps).into());
    }
    if cli.width == 0 || cli.height == 0 {
        return Err("Frame width and height must be non-zero".into());
    }
    Ok(())
}
