use std::path::PathBuf;

use crate::incident::domain::snapshot_store::SnapshotStore;
use crate::shared::constants::{SNAPSHOT_EXTENSION, SNAPSHOT_PREFIX};
use crate::shared::frame::Frame;

/// Writes incident snapshots as JPEG files using the `image` crate.
///
/// Files are named `alert_<hint>.jpg` inside the configured directory, which
/// is created on first use. An existing file is never replaced; a numeric
/// suffix is appended to the name instead.
pub struct ImageSnapshotStore {
    dir: PathBuf,
}

impl ImageSnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, hint: &str) -> PathBuf {
        self.dir
            .join(format!("{SNAPSHOT_PREFIX}_{hint}.{SNAPSHOT_EXTENSION}"))
    }

    fn unused_path_for(&self, hint: &str) -> PathBuf {
        let path = self.path_for(hint);
        if !path.exists() {
            return path;
        }
        (1..)
            .map(|n| self.path_for(&format!("{hint}_{n}")))
            .find(|candidate| !candidate.exists())
            .unwrap_or(path)
    }
}

impl SnapshotStore for ImageSnapshotStore {
    fn store(&self, frame: &Frame, hint: &str) -> Result<String, Box<dyn std::error::Error>> {
        std::fs::create_dir_all(&self.dir)?;

        let color = match frame.channels() {
            1 => image::ExtendedColorType::L8,
            3 => image::ExtendedColorType::Rgb8,
            n => return Err(format!("unsupported channel count {n}").into()),
        };

        let path = self.unused_path_for(hint);
        image::save_buffer(&path, frame.data(), frame.width(), frame.height(), color)?;
        log::debug!("Snapshot written to {}", path.display());
        Ok(path.to_string_lossy().into_owned())
    }
}
