//! ATIS and AWOS broadcast stations
//!
//! A broadcast station loops a recorded observation on its frequency. It
//! starts on `init`, and every refresh interval the old recording is stopped
//! and a new one presented. ATIS recordings carry an information letter that
//! advances with each refresh.
//!
//! # UI codes
//!
//! | Code | Action                          |
//! |------|---------------------------------|
//! | 1    | Re-broadcast current information |
//! | 2    | Stop the broadcast              |
//! | 3    | Resume the broadcast            |

use std::fmt;

use atc_core::{Countdown, Station, StationCore, StationError, StationKind, Transmission};
use tracing::{debug, info, warn};

use crate::environment::WeatherReport;

pub const UI_REBROADCAST: i32 = 1;
pub const UI_STOP: i32 = 2;
pub const UI_RESUME: i32 = 3;

const PHONETIC: [&str; 26] = [
    "Alpha", "Bravo", "Charlie", "Delta", "Echo", "Foxtrot", "Golf", "Hotel", "India", "Juliet",
    "Kilo", "Lima", "Mike", "November", "Oscar", "Papa", "Quebec", "Romeo", "Sierra", "Tango",
    "Uniform", "Victor", "Whiskey", "X-ray", "Yankee", "Zulu",
];

/// ATIS information letter, Alpha through Zulu
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InformationLetter(u8);

impl InformationLetter {
    /// Letter at `index`, wrapping past Zulu
    pub fn new(index: u8) -> Self {
        Self(index % 26)
    }

    /// The following letter; Zulu wraps to Alpha
    pub fn next(self) -> Self {
        Self::new(self.0 + 1)
    }

    /// Phonetic name
    pub fn name(&self) -> &'static str {
        PHONETIC[usize::from(self.0 % 26)]
    }

    pub fn letter(&self) -> char {
        char::from(b'A' + self.0 % 26)
    }
}

impl fmt::Display for InformationLetter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// An ATIS or AWOS station
#[derive(Debug)]
pub struct BroadcastStation {
    core: StationCore,
    weather: WeatherReport,
    letter: InformationLetter,
    refresh: Countdown,
    broadcasting: bool,
    audio_ref: String,
}

impl BroadcastStation {
    pub fn new(core: StationCore, weather: WeatherReport) -> Self {
        let audio_ref = core.default_audio_ref();
        Self {
            core,
            weather,
            letter: InformationLetter::default(),
            refresh: Countdown::new(),
            broadcasting: false,
            audio_ref,
        }
    }

    /// Current ATIS letter (unused by AWOS)
    pub fn information(&self) -> InformationLetter {
        self.letter
    }

    pub fn is_broadcasting(&self) -> bool {
        self.broadcasting
    }

    pub fn weather(&self) -> &WeatherReport {
        &self.weather
    }

    /// Replace the observation; it is read from the next broadcast on
    pub fn set_weather(&mut self, weather: WeatherReport) {
        self.weather = weather;
    }

    /// Text of the current recording
    pub fn broadcast_text(&self) -> String {
        match self.core.kind() {
            StationKind::Atis => format!(
                "This is {} information {}. {} Advise on initial contact you have information {}.",
                self.core.name(),
                self.letter,
                self.weather.summary(),
                self.letter
            ),
            _ => format!(
                "{} automated weather observation. {}",
                self.core.name(),
                self.weather.summary()
            ),
        }
    }

    fn start_broadcast(&mut self) {
        let tx = Transmission::new(self.broadcast_text())
            .with_audio_ref(self.audio_ref.clone())
            .repeating(true);
        if let Err(e) = self.core.immediate_transmit(tx) {
            warn!("{} {}: broadcast not started: {}", self.core.ident(), self.core.kind(), e);
            return;
        }
        self.broadcasting = true;
        self.refresh
            .arm(self.core.now(), self.core.config().refresh_interval_secs);
    }

    fn stop_broadcast(&mut self) {
        self.core.cancel_transmission();
        // The recording loops on after its first pass has finished
        let ident = self.core.ident().to_string();
        self.core
            .render_mut()
            .cancel_broadcast(&ident, &self.audio_ref);
        self.refresh.disarm();
        self.broadcasting = false;
        info!("{} {}: broadcast stopped", self.core.ident(), self.core.kind());
    }

    fn refresh_broadcast(&mut self) {
        if self.core.kind() == StationKind::Atis {
            self.letter = self.letter.next();
        }
        debug!(
            "{} {}: refreshing broadcast ({})",
            self.core.ident(),
            self.core.kind(),
            self.letter
        );
        self.core.cancel_render(&self.audio_ref);
        self.start_broadcast();
    }
}

impl Station for BroadcastStation {
    fn core(&self) -> &StationCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut StationCore {
        &mut self.core
    }

    fn init(&mut self) -> Result<(), StationError> {
        if !self.core.kind().is_broadcast() {
            return Err(StationError::InvalidKind(format!(
                "{} is not a broadcast station",
                self.core.kind()
            )));
        }
        self.start_broadcast();
        Ok(())
    }

    fn process_callback(&mut self, code: i32) {
        match code {
            UI_REBROADCAST => {
                self.core.cancel_render(&self.audio_ref);
                self.start_broadcast();
            }
            UI_STOP => {
                if self.broadcasting {
                    self.stop_broadcast();
                }
            }
            UI_RESUME => {
                if !self.broadcasting {
                    self.start_broadcast();
                }
            }
            _ => warn!(
                "{} {}: ignoring unknown code {}",
                self.core.ident(),
                self.core.kind(),
                code
            ),
        }
    }

    fn update(&mut self, dt: f64) {
        self.advance_core(dt);
        if self.refresh.fire_if_due(self.core.now()) && self.broadcasting {
            self.refresh_broadcast();
        }
    }

    fn gen_text(&self, _code: i32, _callsign: &str) -> String {
        self.broadcast_text()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atc_core::{CaptionLog, GeodeticPosition, StationConfig, StationRecord};

    fn station(kind: StationKind) -> (BroadcastStation, CaptionLog) {
        let record = StationRecord::new(
            kind,
            GeodeticPosition::from_deg_ft(37.6188, -122.3754, 13.0),
            118.85,
            30,
            "KSFO",
            "San Francisco",
        );
        let config = StationConfig {
            refresh_interval_secs: 60.0,
            ..StationConfig::deterministic()
        };
        let mut core = StationCore::new(record, config);
        let log = CaptionLog::new();
        core.render_mut().set_caption_sink(Box::new(log.clone()));
        (BroadcastStation::new(core, WeatherReport::default()), log)
    }

    #[test]
    fn test_letter_wraps() {
        assert_eq!(InformationLetter::default().name(), "Alpha");
        assert_eq!(InformationLetter::new(25).name(), "Zulu");
        assert_eq!(InformationLetter::new(25).next(), InformationLetter::new(0));
        assert_eq!(InformationLetter::new(2).letter(), 'C');
    }

    #[test]
    fn test_atis_broadcasts_on_init() {
        let (mut atis, log) = station(StationKind::Atis);
        atis.init().unwrap();

        assert!(atis.is_broadcasting());
        assert!(atis.core().is_transmitting());
        let captions = log.captions();
        assert_eq!(captions.len(), 1);
        assert!(captions[0].repeating);
        assert!(captions[0].text.starts_with("This is San Francisco information Alpha."));
    }

    #[test]
    fn test_awos_text_has_no_letter() {
        let (mut awos, log) = station(StationKind::Awos);
        awos.init().unwrap();
        assert_eq!(
            log.texts(),
            ["San Francisco automated weather observation. Wind 280 at 10. Visibility 10. Temperature 15, dewpoint 8. Altimeter 29.92."]
        );
    }

    #[test]
    fn test_refresh_advances_letter() {
        let (mut atis, log) = station(StationKind::Atis);
        atis.init().unwrap();
        for _ in 0..60 {
            atis.update(1.0);
        }
        assert_eq!(atis.information().name(), "Bravo");
        assert_eq!(log.captions().len(), 2);
    }

    #[test]
    fn test_stop_and_resume() {
        let (mut atis, log) = station(StationKind::Atis);
        atis.init().unwrap();

        atis.handle_ui_selection(UI_STOP);
        assert!(!atis.is_broadcasting());
        assert!(atis.core().is_channel_clear());
        for _ in 0..120 {
            atis.update(1.0);
        }
        assert_eq!(log.captions().len(), 1);

        atis.handle_ui_selection(UI_RESUME);
        assert!(atis.is_broadcasting());
        assert_eq!(log.captions().len(), 2);
    }

    #[test]
    fn test_unknown_code_ignored() {
        let (mut atis, log) = station(StationKind::Atis);
        atis.init().unwrap();
        atis.handle_ui_selection(99);
        assert!(atis.is_broadcasting());
        assert_eq!(log.captions().len(), 1);
    }

    #[test]
    fn test_init_rejects_controlled_kind() {
        let (mut tower, _) = station(StationKind::Tower);
        assert!(matches!(tower.init(), Err(StationError::InvalidKind(_))));
    }
}
