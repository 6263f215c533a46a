use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;

/// Produces the frames a monitoring session is scored on.
///
/// Implementations handle I/O details (directory layout, pacing, capture
/// devices) while the pipeline works with the abstract `Frame` and
/// `VideoMetadata` types. Every frame carries its session time in
/// [`Frame::captured_at`].
pub trait FrameSource: Send {
    /// Prepares the source and returns its metadata.
    fn open(&mut self) -> Result<VideoMetadata, Box<dyn std::error::Error>>;

    /// Returns an iterator over frames in capture order.
    fn frames(
        &mut self,
    ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_>;

    /// Releases any resources held by the source.
    fn close(&mut self);
}
