//! Simulation settings

use std::path::Path;

use atc_core::StationConfig;
use atc_stations::Environment;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors loading a settings file
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Simulation settings, loaded from JSON
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimSettings {
    /// Tick period in milliseconds
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
    /// Timing and rendering shared by every station
    #[serde(default)]
    pub station: StationConfig,
    /// Weather and the user aircraft
    #[serde(default)]
    pub environment: Environment,
}

fn default_tick_ms() -> u64 {
    100
}

impl Default for SimSettings {
    fn default() -> Self {
        Self {
            tick_ms: default_tick_ms(),
            station: StationConfig::default(),
            environment: Environment::default(),
        }
    }
}

impl SimSettings {
    /// Load settings from a JSON file
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Tick period in seconds, never zero
    pub fn tick_secs(&self) -> f64 {
        self.tick_ms.max(1) as f64 / 1000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atc_core::PlaneCategory;

    #[test]
    fn test_empty_json_is_default() {
        assert_eq!(SimSettings::from_json("{}").unwrap(), SimSettings::default());
    }

    #[test]
    fn test_partial_settings() {
        let settings = SimSettings::from_json(
            r#"{
                "tick_ms": 250,
                "station": { "response_delay_jitter": 0.0 },
                "environment": {
                    "user": { "category": "HEAVY", "callsign": "UAL123", "squawk": 4521 }
                }
            }"#,
        )
        .unwrap();
        assert_eq!(settings.tick_secs(), 0.25);
        assert_eq!(settings.station.response_delay_jitter, 0.0);
        assert_eq!(settings.station.release_delay_secs, 5.0);
        assert_eq!(settings.environment.user.category, PlaneCategory::Heavy);
        assert_eq!(settings.environment.weather.altimeter_inhg, 29.92);
    }

    #[test]
    fn test_bad_json_is_an_error() {
        assert!(matches!(
            SimSettings::from_json("{ tick_ms: }"),
            Err(SettingsError::Parse(_))
        ));
    }

    #[test]
    fn test_zero_tick_clamped() {
        let settings = SimSettings {
            tick_ms: 0,
            ..Default::default()
        };
        assert_eq!(settings.tick_secs(), 0.001);
    }
}
