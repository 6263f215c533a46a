use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::shared::constants::IMAGE_EXTENSIONS;
use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::frame_source::FrameSource;

/// Reads a directory of still images as a recorded session.
///
/// Files are taken in lexicographic order and stamped at a fixed frame
/// rate, so frame `i` is captured at `i / fps` seconds. Every image must
/// have the dimensions of the first one.
pub struct ImageSequenceReader {
    dir: PathBuf,
    fps: f64,
    files: Vec<PathBuf>,
    size: Option<(u32, u32)>,
}

impl ImageSequenceReader {
    pub fn new(dir: impl Into<PathBuf>, fps: f64) -> Self {
        Self {
            dir: dir.into(),
            fps,
            files: Vec::new(),
            size: None,
        }
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
}

fn list_images(dir: &Path) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && is_image(p))
        .collect();
    files.sort();
    Ok(files)
}

fn load_rgb(
    path: &Path,
    index: usize,
    fps: f64,
    expected: (u32, u32),
) -> Result<Frame, Box<dyn std::error::Error>> {
    let img = image::open(path)?.to_rgb8();
    if img.dimensions() != expected {
        return Err(format!(
            "{}: expected {}x{}, got {}x{}",
            path.display(),
            expected.0,
            expected.1,
            img.width(),
            img.height()
        )
        .into());
    }
    let captured_at = Duration::from_secs_f64(index as f64 / fps);
    Ok(Frame::new(
        img.into_raw(),
        expected.0,
        expected.1,
        3,
        index,
        captured_at,
    ))
}

impl FrameSource for ImageSequenceReader {
    fn open(&mut self) -> Result<VideoMetadata, Box<dyn std::error::Error>> {
        if !(self.fps.is_finite() && self.fps > 0.0) {
            return Err(format!("fps must be > 0, got {}", self.fps).into());
        }
        let files = list_images(&self.dir)?;
        let first = files
            .first()
            .ok_or_else(|| format!("No images found in {}", self.dir.display()))?;
        let size = image::image_dimensions(first)?;

        log::info!(
            "Image sequence {}: {} frames at {}x{}",
            self.dir.display(),
            files.len(),
            size.0,
            size.1
        );

        let metadata = VideoMetadata {
            width: size.0,
            height: size.1,
            fps: self.fps,
            total_frames: Some(files.len()),
            live: false,
            source_path: Some(self.dir.clone()),
        };
        self.files = files;
        self.size = Some(size);
        Ok(metadata)
    }

    fn frames(
        &mut self,
    ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_> {
        let Some(size) = self.size else {
            return Box::new(std::iter::once(Err(
                "ImageSequenceReader: not opened".into()
            )));
        };
        let fps = self.fps;
        Box::new(
            self.files
                .iter()
                .enumerate()
                .map(move |(i, path)| load_rgb(path, i, fps, size)),
        )
    }

    fn close(&mut self) {
        self.files.clear();
        self.size = None;
    }
}
