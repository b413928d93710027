use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;

use crate::protocol::SvenPosition;

pub const DEFAULT_PORT: u16 = 3001;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PresetHeights {
    pub bottom: u32,
    pub top: u32,
    pub arm_rest: u32,
    pub above_armrest: u32,
    pub standing: u32,
}

impl Default for PresetHeights {
    fn default() -> Self {
        Self {
            bottom: 622,
            top: 1274,
            arm_rest: 700,
            above_armrest: 760,
            standing: 1100,
        }
    }
}

impl PresetHeights {
    pub fn height_of(&self, position: SvenPosition) -> Option<u32> {
        match position {
            SvenPosition::Bottom => Some(self.bottom),
            SvenPosition::Top => Some(self.top),
            SvenPosition::ArmRest => Some(self.arm_rest),
            SvenPosition::AboveArmrest => Some(self.above_armrest),
            SvenPosition::Standing => Some(self.standing),
            SvenPosition::Custom => None,
        }
    }
}

/// Endpoint and simulated actuator settings. Every field has a default so a
/// config file only needs the values it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
    pub min_height_mm: u32,
    pub max_height_mm: u32,
    pub initial_height_mm: u32,
    pub speed_mm_per_s: u32,
    pub max_duration_ms: i64,
    pub max_distance_cm: i64,
    pub position_tolerance_mm: u32,
    /// Hold the actuator for the duration of each simulated move.
    pub realtime: bool,
    pub presets: PresetHeights,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            min_height_mm: 622,
            max_height_mm: 1274,
            initial_height_mm: 622,
            speed_mm_per_s: 38,
            max_duration_ms: 30_000,
            max_distance_cm: 65,
            position_tolerance_mm: 5,
            realtime: false,
            presets: PresetHeights::default(),
        }
    }
}

impl ServerConfig {
    pub fn from_file(path: &str) -> Result<Self> {
        let raw = fs::read_to_string(path).context("reading config file")?;
        let cfg: ServerConfig = serde_json::from_str(&raw).context("parsing JSON")?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.min_height_mm >= self.max_height_mm {
            bail!(
                "min_height_mm ({}) must be below max_height_mm ({})",
                self.min_height_mm,
                self.max_height_mm
            );
        }
        if !self.in_range(self.initial_height_mm) {
            bail!("initial_height_mm {} outside travel range", self.initial_height_mm);
        }
        if self.speed_mm_per_s == 0 {
            bail!("speed_mm_per_s must be positive");
        }
        for preset in SvenPosition::PRESETS {
            if let Some(h) = self.presets.height_of(preset) {
                if !self.in_range(h) {
                    bail!("preset {:?} height {} outside travel range", preset, h);
                }
            }
        }
        Ok(())
    }

    pub fn in_range(&self, height_mm: u32) -> bool {
        (self.min_height_mm..=self.max_height_mm).contains(&height_mm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_config_partial_override() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"{{
                "port": 4000,
                "speed_mm_per_s": 50,
                "presets": {{"standing": 1150}}
            }}"#
        )
        .unwrap();

        let config = ServerConfig::from_file(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.port, 4000);
        assert_eq!(config.speed_mm_per_s, 50);
        assert_eq!(config.presets.standing, 1150);
        assert_eq!(config.presets.bottom, 622);
        assert_eq!(config.max_height_mm, 1274);
    }

    #[test]
    fn test_config_missing_file() {
        let result = ServerConfig::from_file("/nonexistent/path/config.json");
        assert!(result.is_err());
    }

    #[test]
    fn test_config_invalid_json() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{{invalid json").unwrap();

        let result = ServerConfig::from_file(file.path().to_str().unwrap());
        assert!(result.is_err());
    }

    #[test]
    fn test_config_rejects_preset_outside_range() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"presets": {{"top": 2000}}}}"#).unwrap();

        let err = ServerConfig::from_file(file.path().to_str().unwrap()).unwrap_err();
        assert!(err.to_string().contains("outside travel range"));
    }

    #[test]
    fn test_config_rejects_inverted_range() {
        let cfg = ServerConfig {
            min_height_mm: 1000,
            max_height_mm: 900,
            ..ServerConfig::default()
        };
        assert!(cfg.validate().is_err());
        assert!(ServerConfig::default().validate().is_ok());
    }
}
