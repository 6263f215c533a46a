use std::time::Duration;

use ndarray::{s, ArrayView3};

/// A single camera frame: contiguous RGB bytes in row-major order.
///
/// `captured_at` is the offset from the start of the monitoring session.
/// The engine uses it as the tick clock, so a frame and its detections
/// always agree on "now".
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
    index: usize,
    captured_at: Duration,
}

impl Frame {
    pub fn new(
        data: Vec<u8>,
        width: u32,
        height: u32,
        channels: u8,
        index: usize,
        captured_at: Duration,
    ) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (channels as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            channels,
            index,
            captured_at,
        }
    }

    /// Solid black RGB frame, used when a session is replayed without footage.
    pub fn blank(width: u32, height: u32, index: usize, captured_at: Duration) -> Self {
        let len = (width as usize) * (height as usize) * 3;
        Self::new(vec![0u8; len], width, height, 3, index, captured_at)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn captured_at(&self) -> Duration {
        self.captured_at
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .expect("Frame data length must match dimensions")
    }

    /// Horizontally mirrored copy, for detectors that only recognise one
    /// profile orientation.
    pub fn mirrored(&self) -> Frame {
        let view = self.as_ndarray();
        let data: Vec<u8> = view.slice(s![.., ..;-1, ..]).iter().copied().collect();
        Frame::new(
            data,
            self.width,
            self.height,
            self.channels,
            self.index,
            self.captured_at,
        )
    }

    fn shape(&self) -> (usize, usize, usize) {
        (
            self.height as usize,
            self.width as usize,
            self.channels as usize,
        )
    }
}
