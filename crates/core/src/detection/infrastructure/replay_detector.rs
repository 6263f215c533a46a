use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::detection::domain::face_detector::{FaceDetector, RawDetections};
use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::Frame;

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("failed to read detections from {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid detection record on line {line}: {source}")]
    Parse {
        line: usize,
        source: serde_json::Error,
    },
}

/// One line of a recorded detection log.
///
/// `{"frame": 0, "frontal": [[x, y, w, h]], "profile_left": [], "profile_right": []}`
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ReplayRecord {
    pub frame: usize,
    #[serde(default)]
    pub frontal: Vec<BoundingBox>,
    #[serde(default)]
    pub profile_left: Vec<BoundingBox>,
    #[serde(default)]
    pub profile_right: Vec<BoundingBox>,
    /// Marks a tick where the recorded detector call failed.
    #[serde(default)]
    pub failed: bool,
}

/// Replays recorded detector output by frame index.
///
/// Lets a session be re-scored with different thresholds without re-running
/// the detector. Frames with no record yield no detections.
pub struct ReplayDetector {
    records: HashMap<usize, ReplayRecord>,
}

impl ReplayDetector {
    pub fn new(records: Vec<ReplayRecord>) -> Self {
        Self {
            records: records.into_iter().map(|r| (r.frame, r)).collect(),
        }
    }

    /// Loads a JSON-lines detection log. Blank lines are skipped.
    pub fn from_path(path: &Path) -> Result<Self, ReplayError> {
        let file = File::open(path).map_err(|source| ReplayError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut records = Vec::new();
        for (i, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|source| ReplayError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            if line.trim().is_empty() {
                continue;
            }
            let record = serde_json::from_str(&line)
                .map_err(|source| ReplayError::Parse { line: i + 1, source })?;
            records.push(record);
        }
        Ok(Self::new(records))
    }

    /// Highest recorded frame index plus one.
    pub fn frame_count(&self) -> usize {
        self.records.keys().max().map_or(0, |&max| max + 1)
    }
}

impl FaceDetector for ReplayDetector {
    fn detect(&mut self, frame: &Frame) -> Result<RawDetections, Box<dyn std::error::Error>> {
        match self.records.get(&frame.index()) {
            None => Ok(RawDetections::default()),
            Some(record) if record.failed => {
                Err(format!("recorded detector failure at frame {}", frame.index()).into())
            }
            Some(record) => Ok(RawDetections {
                frontal: record.frontal.clone(),
                profile_left: record.profile_left.clone(),
                profile_right: record.profile_right.clone(),
            }),
        }
    }
}
