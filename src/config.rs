//! Animation settings.
//!
//! Every field has a default, so a config file only needs the values it
//! changes:
//!
//! ```json
//! {
//!   "point_count": 300,
//!   "cluster_count": 4,
//!   "durations": { "clustering": 6000 },
//!   "background": "#05050a"
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::color::{ClusterPalette, Rgba};
use crate::error::ConfigError;
use crate::phase::{Phase, PhaseDurations};

/// Complete animation configuration.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Window title.
    pub title: String,
    /// Initial window size in logical pixels.
    pub width: u32,
    pub height: u32,
    /// Points spawned when the animation starts.
    pub point_count: usize,
    /// Hard cap on the population, including points added by clicking.
    pub max_points: usize,
    pub cluster_count: usize,
    /// Phase lengths in milliseconds.
    pub durations: PhaseDurations,
    /// Colors clusters cycle through.
    pub palette: Vec<Rgba>,
    /// Color of unassigned points.
    pub point_color: Rgba,
    pub background: Rgba,
    /// Per-frame probability of a faint background star.
    pub starburst_chance: f32,
    /// Let points oscillate while settling.
    pub settle_wobble: bool,
    /// Never start the animation.
    pub reduced_motion: bool,
    /// Fixed RNG seed for reproducible runs.
    pub seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            title: "clusterglow".into(),
            width: 1280,
            height: 720,
            point_count: 200,
            max_points: 500,
            cluster_count: 6,
            durations: PhaseDurations::default(),
            palette: ClusterPalette::default().colors().to_vec(),
            point_color: Rgba::new(255, 255, 255, 0.5),
            background: Rgba::new(8, 8, 16, 1.0),
            starburst_chance: 0.005,
            settle_wobble: false,
            reduced_motion: false,
            seed: None,
        }
    }
}

impl Config {
    /// Save configuration to a JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Load a configuration from a JSON file and validate it.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the animation cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));

        if self.cluster_count == 0 {
            return invalid("cluster_count must be at least 1".into());
        }
        if self.max_points == 0 {
            return invalid("max_points must be at least 1".into());
        }
        if self.point_count > self.max_points {
            return invalid(format!(
                "point_count ({}) exceeds max_points ({})",
                self.point_count, self.max_points
            ));
        }
        for phase in Phase::ALL {
            let ms = self.durations.of(phase);
            if !(ms > 0.0 && ms.is_finite()) {
                return invalid(format!("duration for {} must be positive, got {}", phase, ms));
            }
        }
        if ClusterPalette::new(self.palette.clone()).distinct() < 2 {
            return invalid("palette needs at least 2 distinct colors".into());
        }
        if !(0.0..=1.0).contains(&self.starburst_chance) {
            return invalid(format!(
                "starburst_chance must be within 0..=1, got {}",
                self.starburst_chance
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.durations.cycle(), 14200.0);
        assert_eq!(config.palette.len(), 7);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: Config = serde_json::from_str(
            r##"{ "point_count": 50, "durations": { "settling": 900 }, "background": "#000" }"##,
        )
        .unwrap();
        assert_eq!(config.point_count, 50);
        assert_eq!(config.max_points, 500);
        assert_eq!(config.durations.settling, 900.0);
        assert_eq!(config.durations.clustering, 8000.0);
        assert_eq!(config.background, Rgba::new(0, 0, 0, 1.0));
    }

    #[test]
    fn test_bad_color_is_a_parse_error() {
        let result: Result<Config, _> = serde_json::from_str(r#"{ "point_color": "teal" }"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_validation_failures() {
        let cases = [
            Config { cluster_count: 0, ..Config::default() },
            Config { max_points: 0, point_count: 0, ..Config::default() },
            Config { point_count: 600, ..Config::default() },
            Config {
                durations: PhaseDurations { scattering: 0.0, ..Default::default() },
                ..Config::default()
            },
            Config {
                palette: vec![Rgba::WHITE, Rgba::WHITE],
                ..Config::default()
            },
            Config { starburst_chance: 1.5, ..Config::default() },
        ];
        for config in cases {
            assert!(
                matches!(config.validate(), Err(ConfigError::Invalid(_))),
                "{config:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join(format!("clusterglow-config-{}.json", std::process::id()));
        let config = Config {
            seed: Some(7),
            cluster_count: 3,
            settle_wobble: true,
            ..Config::default()
        };
        config.save(&path).unwrap();
        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded, config);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load("/definitely/not/here.json");
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
