pub mod mirrored_profile_detector;
pub mod replay_detector;
