use std::path::PathBuf;

/// Describes a frame source for the monitor loop.
///
/// `live` sources (cameras, paced replays) produce frames on their own
/// clock, so the pipeline drops stale frames rather than queueing them.
#[derive(Clone, Debug, PartialEq)]
pub struct VideoMetadata {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub total_frames: Option<usize>,
    pub live: bool,
    pub source_path: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_construction() {
        let meta = VideoMetadata {
            width: 1280,
            height: 720,
            fps: 15.0,
            total_frames: Some(300),
            live: false,
            source_path: Some(PathBuf::from("/tmp/room-01")),
        };
        assert_eq!(meta.width, 1280);
        assert_eq!(meta.total_frames, Some(300));
        assert!(!meta.live);
        assert_eq!(meta.source_path, Some(PathBuf::from("/tmp/room-01")));
    }
}
