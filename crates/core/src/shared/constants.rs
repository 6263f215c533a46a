pub const DEFAULT_SMOOTHING_FACTOR: f64 = 0.3;
pub const DEFAULT_DEAD_ZONE: f64 = 0.15;
pub const DEFAULT_LEFT_SENSITIVITY: f64 = 0.40;
pub const DEFAULT_RIGHT_SENSITIVITY: f64 = 0.20;
pub const DEFAULT_TURN_DURATION_SECS: f64 = 3.0;

/// How long the "look-away detected" banner stays raised after an incident.
pub const DEFAULT_ALERT_DISPLAY_SECS: f64 = 5.0;

/// Unseen subjects are kept this long before their state is discarded.
pub const DEFAULT_SUBJECT_GRACE_SECS: f64 = 0.5;

/// In multiples of the previous face width.
pub const DEFAULT_MAX_ASSOCIATION_DISTANCE: f64 = 1.0;

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];

pub const SNAPSHOT_PREFIX: &str = "alert";
pub const SNAPSHOT_EXTENSION: &str = "jpg";

pub const INCIDENT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
/// Millisecond precision keeps back-to-back incidents of one subject apart.
pub const SNAPSHOT_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S_%3f";
