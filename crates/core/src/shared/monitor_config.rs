use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::shared::constants::{
    DEFAULT_ALERT_DISPLAY_SECS, DEFAULT_DEAD_ZONE, DEFAULT_LEFT_SENSITIVITY,
    DEFAULT_MAX_ASSOCIATION_DISTANCE, DEFAULT_RIGHT_SENSITIVITY, DEFAULT_SMOOTHING_FACTOR,
    DEFAULT_SUBJECT_GRACE_SECS, DEFAULT_TURN_DURATION_SECS,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("smoothing factor must be in (0, 1], got {0}")]
    SmoothingFactor(f64),
    #[error("dead zone must be a finite value >= 0, got {0}")]
    DeadZone(f64),
    #[error("{side} sensitivity must be >= dead zone ({dead_zone}), got {value}")]
    Sensitivity {
        side: &'static str,
        value: f64,
        dead_zone: f64,
    },
    #[error("turn duration must be a finite number of seconds > 0, got {0}")]
    TurnDuration(f64),
    #[error("{name} must be a finite number of seconds >= 0, got {value}")]
    NegativeWindow { name: &'static str, value: f64 },
    #[error("{name} of {value}s is too large")]
    DurationOverflow { name: &'static str, value: f64 },
    #[error("max association distance must be > 0, got {0}")]
    AssociationDistance(f64),
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("failed to write config {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// How detections are matched to subjects from one tick to the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssociationMode {
    /// Greedy nearest-center matching with recycled integer handles.
    Nearest,
    /// The n-th frontal detection of a tick is subject n.
    Positional,
}

impl std::fmt::Display for AssociationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssociationMode::Nearest => write!(f, "nearest"),
            AssociationMode::Positional => write!(f, "positional"),
        }
    }
}

impl std::str::FromStr for AssociationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "nearest" => Ok(AssociationMode::Nearest),
            "positional" => Ok(AssociationMode::Positional),
            other => Err(format!(
                "association must be 'nearest' or 'positional', got '{other}'"
            )),
        }
    }
}

/// Tuning for one monitored room. Validated once and then treated as
/// immutable by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub smoothing_factor: f64,
    pub dead_zone: f64,
    pub left_sensitivity: f64,
    pub right_sensitivity: f64,
    pub turn_duration_secs: f64,
    pub alert_display_secs: f64,
    pub subject_grace_secs: f64,
    pub association: AssociationMode,
    pub max_association_distance: f64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            smoothing_factor: DEFAULT_SMOOTHING_FACTOR,
            dead_zone: DEFAULT_DEAD_ZONE,
            left_sensitivity: DEFAULT_LEFT_SENSITIVITY,
            right_sensitivity: DEFAULT_RIGHT_SENSITIVITY,
            turn_duration_secs: DEFAULT_TURN_DURATION_SECS,
            alert_display_secs: DEFAULT_ALERT_DISPLAY_SECS,
            subject_grace_secs: DEFAULT_SUBJECT_GRACE_SECS,
            association: AssociationMode::Nearest,
            max_association_distance: DEFAULT_MAX_ASSOCIATION_DISTANCE,
        }
    }
}

impl MonitorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        // Comparisons are written so that NaN fails them.
        if !(self.smoothing_factor > 0.0 && self.smoothing_factor <= 1.0) {
            return Err(ConfigError::SmoothingFactor(self.smoothing_factor));
        }
        if !(self.dead_zone >= 0.0 && self.dead_zone.is_finite()) {
            return Err(ConfigError::DeadZone(self.dead_zone));
        }
        for (side, value) in [
            ("left", self.left_sensitivity),
            ("right", self.right_sensitivity),
        ] {
            if !(value >= self.dead_zone) {
                return Err(ConfigError::Sensitivity {
                    side,
                    value,
                    dead_zone: self.dead_zone,
                });
            }
        }
        if !(self.turn_duration_secs > 0.0 && self.turn_duration_secs.is_finite()) {
            return Err(ConfigError::TurnDuration(self.turn_duration_secs));
        }
        for (name, value) in [
            ("alert display", self.alert_display_secs),
            ("subject grace", self.subject_grace_secs),
        ] {
            if !(value >= 0.0 && value.is_finite()) {
                return Err(ConfigError::NegativeWindow { name, value });
            }
        }
        for (name, value) in [
            ("turn duration", self.turn_duration_secs),
            ("alert display", self.alert_display_secs),
            ("subject grace", self.subject_grace_secs),
        ] {
            if Duration::try_from_secs_f64(value).is_err() {
                return Err(ConfigError::DurationOverflow { name, value });
            }
        }
        if !(self.max_association_distance > 0.0) {
            return Err(ConfigError::AssociationDistance(
                self.max_association_distance,
            ));
        }
        Ok(())
    }

    /// Duration accessors assume [`MonitorConfig::validate`] has passed.
    pub fn turn_duration(&self) -> Duration {
        Duration::from_secs_f64(self.turn_duration_secs)
    }

    pub fn alert_display(&self) -> Duration {
        Duration::from_secs_f64(self.alert_display_secs)
    }

    pub fn subject_grace(&self) -> Duration {
        Duration::from_secs_f64(self.subject_grace_secs)
    }

    /// `<config_dir>/SEMS/monitor.json`, when the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("SEMS").join("monitor.json"))
    }

    /// Reads a config file. Missing fields take their defaults; the result
    /// is not validated.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&json).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Loads from [`MonitorConfig::default_path`], falling back to defaults
    /// when the file is absent or unreadable.
    pub fn load_or_default() -> Self {
        Self::default_path()
            .filter(|path| path.exists())
            .and_then(|path| match Self::load(&path) {
                Ok(config) => Some(config),
                Err(e) => {
                    log::warn!("Ignoring config file: {e}");
                    None
                }
            })
            .unwrap_or_default()
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let write_err = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, json).map_err(write_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[test]
    fn test_defaults_are_valid() {
        let config = MonitorConfig::default();
        assert!(config.validate().is_ok());
        assert_relative_eq!(config.smoothing_factor, 0.3);
        assert_relative_eq!(config.dead_zone, 0.15);
        assert_relative_eq!(config.turn_duration_secs, 3.0);
        assert_eq!(config.association, AssociationMode::Nearest);
    }

    #[rstest]
    #[case::zero_smoothing(MonitorConfig { smoothing_factor: 0.0, ..Default::default() })]
    #[case::negative_smoothing(MonitorConfig { smoothing_factor: -0.2, ..Default::default() })]
    #[case::smoothing_above_one(MonitorConfig { smoothing_factor: 1.5, ..Default::default() })]
    #[case::nan_smoothing(MonitorConfig { smoothing_factor: f64::NAN, ..Default::default() })]
    #[case::negative_dead_zone(MonitorConfig { dead_zone: -0.1, ..Default::default() })]
    #[case::left_inside_dead_zone(MonitorConfig { left_sensitivity: 0.1, ..Default::default() })]
    #[case::right_inside_dead_zone(MonitorConfig { right_sensitivity: 0.1, ..Default::default() })]
    #[case::zero_turn(MonitorConfig { turn_duration_secs: 0.0, ..Default::default() })]
    #[case::infinite_turn(MonitorConfig { turn_duration_secs: f64::INFINITY, ..Default::default() })]
    #[case::negative_grace(MonitorConfig { subject_grace_secs: -1.0, ..Default::default() })]
    #[case::negative_display(MonitorConfig { alert_display_secs: -1.0, ..Default::default() })]
    #[case::zero_distance(MonitorConfig { max_association_distance: 0.0, ..Default::default() })]
    #[case::huge_turn(MonitorConfig { turn_duration_secs: 1e20, ..Default::default() })]
    #[case::huge_display(MonitorConfig { alert_display_secs: 1e20, ..Default::default() })]
    #[case::huge_grace(MonitorConfig { subject_grace_secs: 1e20, ..Default::default() })]
    fn test_out_of_domain_values_are_rejected(#[case] config: MonitorConfig) {
        assert!(config.validate().is_err());
    }

    #[rstest]
    #[case::turn(MonitorConfig { turn_duration_secs: 1e20, ..Default::default() }, "turn duration")]
    #[case::display(MonitorConfig { alert_display_secs: 1e20, ..Default::default() }, "alert display")]
    #[case::grace(MonitorConfig { subject_grace_secs: 1e20, ..Default::default() }, "subject grace")]
    fn test_unrepresentable_duration_is_overflow(
        #[case] config: MonitorConfig,
        #[case] field: &str,
    ) {
        match config.validate().unwrap_err() {
            ConfigError::DurationOverflow { name, .. } => assert_eq!(name, field),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_smoothing_factor_of_one_is_allowed() {
        let config = MonitorConfig {
            smoothing_factor: 1.0,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_sensitivity_equal_to_dead_zone_is_allowed() {
        let config = MonitorConfig {
            dead_zone: 0.2,
            left_sensitivity: 0.2,
            right_sensitivity: 0.2,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_error_message_names_the_field() {
        let config = MonitorConfig {
            right_sensitivity: 0.05,
            ..Default::default()
        };
        let message = config.validate().unwrap_err().to_string();
        assert!(message.contains("right sensitivity"), "{message}");
    }

    #[test]
    fn test_duration_accessors() {
        let config = MonitorConfig::default();
        assert_eq!(config.turn_duration(), Duration::from_secs(3));
        assert_eq!(config.alert_display(), Duration::from_secs(5));
        assert_eq!(config.subject_grace(), Duration::from_millis(500));
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("monitor.json");
        fs::write(&path, r#"{ "turn_duration_secs": 2.0, "association": "positional" }"#).unwrap();

        let config = MonitorConfig::load(&path).unwrap();
        assert_relative_eq!(config.turn_duration_secs, 2.0);
        assert_eq!(config.association, AssociationMode::Positional);
        assert_relative_eq!(config.dead_zone, DEFAULT_DEAD_ZONE);
    }

    #[test]
    fn test_unknown_fields_in_older_files_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("monitor.json");
        fs::write(&path, r#"{ "dead_zone": 0.1, "poll_interval_ms": 10 }"#).unwrap();

        let config = MonitorConfig::load(&path).unwrap();
        assert_relative_eq!(config.dead_zone, 0.1);
        assert!(!serde_json::to_string(&config).unwrap().contains("poll_interval"));
    }

    #[test]
    fn test_save_then_load_preserves_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("monitor.json");
        let config = MonitorConfig {
            left_sensitivity: 0.35,
            subject_grace_secs: 0.0,
            ..Default::default()
        };
        config.save(&path).unwrap();
        assert_eq!(MonitorConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_load_missing_file_is_read_error() {
        let err = MonitorConfig::load(Path::new("/nonexistent/monitor.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_load_malformed_json_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("monitor.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            MonitorConfig::load(&path).unwrap_err(),
            ConfigError::Parse { .. }
        ));
    }

    #[rstest]
    #[case("nearest", AssociationMode::Nearest)]
    #[case("positional", AssociationMode::Positional)]
    fn test_association_mode_parses(#[case] text: &str, #[case] expected: AssociationMode) {
        assert_eq!(text.parse::<AssociationMode>().unwrap(), expected);
        assert_eq!(expected.to_string(), text);
    }

    #[test]
    fn test_unknown_association_mode_is_rejected() {
        assert!("hungarian".parse::<AssociationMode>().is_err());
    }
}
