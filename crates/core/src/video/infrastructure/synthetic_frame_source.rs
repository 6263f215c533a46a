use std::time::{Duration, Instant};

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::frame_source::FrameSource;

/// Blank frames at a fixed rate, for replaying recorded detections without
/// the original footage.
///
/// When `paced`, frames are released on the wall clock like a camera would
/// deliver them and the source reports itself as live.
pub struct SyntheticFrameSource {
    width: u32,
    height: u32,
    fps: f64,
    count: usize,
    paced: bool,
    opened: bool,
}

impl SyntheticFrameSource {
    pub fn new(width: u32, height: u32, fps: f64, count: usize) -> Self {
        Self {
            width,
            height,
            fps,
            count,
            paced: false,
            opened: false,
        }
    }

    pub fn paced(mut self, paced: bool) -> Self {
        self.paced = paced;
        self
    }
}

impl FrameSource for SyntheticFrameSource {
    fn open(&mut self) -> Result<VideoMetadata, Box<dyn std::error::Error>> {
        if !(self.fps.is_finite() && self.fps > 0.0) {
            return Err(format!("fps must be > 0, got {}", self.fps).into());
        }
        if self.width == 0 || self.height == 0 {
            return Err("frame dimensions must be non-zero".into());
        }
        self.opened = true;
        Ok(VideoMetadata {
            width: self.width,
            height: self.height,
            fps: self.fps,
            total_frames: Some(self.count),
            live: self.paced,
            source_path: None,
        })
    }

    fn frames(
        &mut self,
    ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_> {
        if !self.opened {
            return Box::new(std::iter::once(Err(
                "SyntheticFrameSource: not opened".into()
            )));
        }
        let (width, height, fps, paced) = (self.width, self.height, self.fps, self.paced);
        let started = Instant::now();
        Box::new((0..self.count).map(move |i| {
            let captured_at = Duration::from_secs_f64(i as f64 / fps);
            if paced {
                if let Some(wait) = captured_at.checked_sub(started.elapsed()) {
                    std::thread::sleep(wait);
                }
            }
            Ok(Frame::blank(width, height, i, captured_at))
        }))
    }

    fn close(&mut self) {
        self.opened = false;
    }
}
