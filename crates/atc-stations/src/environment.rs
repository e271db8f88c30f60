//! Shared simulation inputs consumed by stations
//!
//! Weather feeds the ATIS/AWOS broadcasts and the runway and altimeter the
//! controllers quote. The user aircraft is who the controllers talk to.

use atc_core::PlaneRecord;
use serde::{Deserialize, Serialize};

/// Current surface weather at the simulated field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherReport {
    /// Direction the wind blows from (degrees true)
    pub wind_dir_deg: u16,
    /// Wind speed (knots); 0 is calm
    pub wind_speed_kt: u16,
    /// Visibility (statute miles)
    pub visibility_sm: u16,
    /// Temperature (°C)
    pub temperature_c: i16,
    /// Dewpoint (°C)
    pub dewpoint_c: i16,
    /// Altimeter setting (inches of mercury)
    pub altimeter_inhg: f64,
}

impl Default for WeatherReport {
    fn default() -> Self {
        Self {
            wind_dir_deg: 280,
            wind_speed_kt: 10,
            visibility_sm: 10,
            temperature_c: 15,
            dewpoint_c: 8,
            altimeter_inhg: 29.92,
        }
    }
}

impl WeatherReport {
    /// Wind as spoken, e.g. "280 at 10" or "calm"
    pub fn wind_phrase(&self) -> String {
        if self.wind_speed_kt == 0 {
            "calm".to_string()
        } else {
            format!("{:03} at {}", self.wind_dir_deg % 360, self.wind_speed_kt)
        }
    }

    pub fn altimeter_phrase(&self) -> String {
        format!("{:.2}", self.altimeter_inhg)
    }

    /// Runway number most nearly into the wind, 1 to 36
    ///
    /// With calm wind runway 36 is used.
    pub fn runway_number(&self) -> u16 {
        if self.wind_speed_kt == 0 {
            return 36;
        }
        match ((self.wind_dir_deg % 360) + 5) / 10 % 36 {
            0 => 36,
            n => n,
        }
    }

    /// Runway designator, e.g. "28" or "04"
    pub fn runway(&self) -> String {
        format!("{:02}", self.runway_number())
    }

    /// Heading of the active runway, e.g. "280"
    pub fn runway_heading(&self) -> String {
        format!("{:03}", self.runway_number() * 10)
    }

    /// The observation as read by a broadcast station
    pub fn summary(&self) -> String {
        format!(
            "Wind {}. Visibility {}. Temperature {}, dewpoint {}. Altimeter {}.",
            self.wind_phrase(),
            self.visibility_sm,
            self.temperature_c,
            self.dewpoint_c,
            self.altimeter_phrase()
        )
    }
}

/// Inputs every station built by the registry shares
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Environment {
    pub weather: WeatherReport,
    /// The aircraft flown by the user
    pub user: PlaneRecord,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runway_into_wind() {
        let mut wx = WeatherReport::default();
        assert_eq!(wx.runway(), "28");
        assert_eq!(wx.runway_heading(), "280");

        wx.wind_dir_deg = 44;
        assert_eq!(wx.runway(), "04");
        wx.wind_dir_deg = 356;
        assert_eq!(wx.runway(), "36");
        wx.wind_dir_deg = 3;
        assert_eq!(wx.runway(), "36");
    }

    #[test]
    fn test_calm_wind() {
        let wx = WeatherReport {
            wind_speed_kt: 0,
            wind_dir_deg: 120,
            ..Default::default()
        };
        assert_eq!(wx.wind_phrase(), "calm");
        assert_eq!(wx.runway(), "36");
    }

    #[test]
    fn test_summary() {
        assert_eq!(
            WeatherReport::default().summary(),
            "Wind 280 at 10. Visibility 10. Temperature 15, dewpoint 8. Altimeter 29.92."
        );
    }

    #[test]
    fn test_partial_environment_uses_defaults() {
        let env: Environment =
            serde_json::from_str(r#"{"weather": {"wind_dir_deg": 190}}"#).unwrap();
        assert_eq!(env.weather.wind_dir_deg, 190);
        assert_eq!(env.weather.altimeter_inhg, 29.92);
        assert_eq!(env.user, PlaneRecord::default());
    }
}
