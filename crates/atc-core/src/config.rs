//! Station timing and rendering configuration

use serde::{Deserialize, Serialize};

/// Configuration shared by every station built from the same settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StationConfig {
    /// Fixed part of the delay between a request and the reply (s)
    pub response_delay_base: f64,
    /// Upper bound of the random part added to the response delay (s)
    pub response_delay_jitter: f64,
    /// Time after a presentation ends before the release timer frees the channel (s)
    pub release_delay_secs: f64,
    /// Shortest time a presentation holds the channel (s)
    pub min_transmission_secs: f64,
    /// Speaking rate used to estimate how long a caption-only message lasts
    pub words_per_second: f64,
    /// How long conditional transmissions wait for a clear channel (s, 0 = forever)
    pub conditional_timeout_secs: f64,
    /// Interval between broadcast refreshes for ATIS/AWOS (s)
    pub refresh_interval_secs: f64,
    /// Output captions to the display
    pub display: bool,
    /// Use the voice engine when one is available
    pub voice: bool,
    /// Seed for response jitter; `None` seeds from entropy
    pub rng_seed: Option<u64>,
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            response_delay_base: 1.2,
            response_delay_jitter: 0.6,
            release_delay_secs: 5.0,
            min_transmission_secs: 2.0,
            words_per_second: 2.5,
            conditional_timeout_secs: 15.0,
            refresh_interval_secs: 3600.0,
            display: true,
            voice: true,
            rng_seed: None,
        }
    }
}

impl StationConfig {
    /// Config with jitter removed and a fixed seed, for repeatable runs
    pub fn deterministic() -> Self {
        Self {
            response_delay_jitter: 0.0,
            rng_seed: Some(0xA7C0),
            ..Default::default()
        }
    }

    /// Estimated on-air time for a message when no voice engine reports one
    pub fn estimate_duration(&self, message: &str) -> f64 {
        let words = message.split_whitespace().count() as f64;
        let spoken = if self.words_per_second > 0.0 {
            words / self.words_per_second
        } else {
            0.0
        };
        spoken.max(self.min_transmission_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimate_duration_floor() {
        let config = StationConfig::default();
        assert_eq!(config.estimate_duration("roger"), config.min_transmission_secs);
        assert_eq!(config.estimate_duration(""), config.min_transmission_secs);
    }

    #[test]
    fn test_estimate_duration_scales_with_words() {
        let config = StationConfig {
            words_per_second: 2.0,
            min_transmission_secs: 1.0,
            ..Default::default()
        };
        assert_eq!(config.estimate_duration("one two three four five six"), 3.0);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: StationConfig = serde_json::from_str(r#"{"release_delay_secs": 2.5}"#).unwrap();
        assert_eq!(config.release_delay_secs, 2.5);
        assert_eq!(config.response_delay_base, 1.2);
        assert!(config.display);
    }
}
