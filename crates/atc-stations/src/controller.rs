//! Controlled stations
//!
//! Ground, tower, approach, departure and en-route stations all run the same
//! exchange with the user:
//!
//! 1. A UI selection picks an [`Exchange`]. The pilot's call is transmitted
//!    conditionally, waiting for the frequency to clear.
//! 2. When the call finishes the station hears it as an inbound
//!    transmission and arms its response timer.
//! 3. When the reply is due it is transmitted at once on the channel the
//!    station has been holding, and the exchange's [`PlaneEffect`] is applied
//!    to the plane stack.
//!
//! Each kind supplies its exchanges through [`ControlRules`].

use std::marker::PhantomData;

use atc_core::{
    MessageCatalog, PlaneRecord, Station, StationCore, StationError, StationKind, TextContext,
    Transmission,
};
use tracing::{debug, info, warn};

use crate::environment::{Environment, WeatherReport};

/// Callback offset for a finished pilot call
pub const PILOT_CALL_FINISHED: i32 = 100;
/// Callback offset for a finished controller reply
pub const REPLY_FINISHED: i32 = 200;

/// What a completed exchange does to the plane stack
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaneEffect {
    None,
    /// Start handling the user aircraft
    Push,
    /// Hand the aircraft off
    Pop,
}

/// One pilot call and the controller's answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Exchange {
    /// UI selection code
    pub code: i32,
    /// Pilot call template
    pub request: &'static str,
    /// Controller reply template
    pub reply: &'static str,
    pub effect: PlaneEffect,
}

/// Kind-specific behaviour of a controlled station
pub trait ControlRules: Send + 'static {
    /// Station kind these rules apply to
    const KIND: StationKind;

    /// Exchanges offered to the user, keyed by UI code
    const EXCHANGES: &'static [Exchange];

    /// Look up the exchange for a UI code
    fn exchange(code: i32) -> Option<&'static Exchange> {
        Self::EXCHANGES.iter().find(|e| e.code == code)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Pilot call waiting for or on the frequency
    Calling(i32),
    /// Call heard; reply pending
    AwaitingReply(i32),
    /// Reply on the frequency
    Replying(i32),
}

/// A station that answers the user's calls
#[derive(Debug)]
pub struct ControllerStation<R> {
    core: StationCore,
    user: PlaneRecord,
    weather: WeatherReport,
    requests: MessageCatalog,
    replies: MessageCatalog,
    phase: Option<Phase>,
    rules: PhantomData<R>,
}

impl<R: ControlRules> ControllerStation<R> {
    pub fn new(core: StationCore, environment: &Environment) -> Self {
        let requests = R::EXCHANGES.iter().map(|e| (e.code, e.request)).collect();
        let replies = R::EXCHANGES.iter().map(|e| (e.code, e.reply)).collect();
        Self {
            core,
            user: environment.user.clone(),
            weather: environment.weather.clone(),
            requests,
            replies,
            phase: None,
            rules: PhantomData,
        }
    }

    /// The aircraft this station talks to
    pub fn user(&self) -> &PlaneRecord {
        &self.user
    }

    /// Whether an exchange is under way
    pub fn in_exchange(&self) -> bool {
        self.phase.is_some()
    }

    pub fn set_weather(&mut self, weather: WeatherReport) {
        self.weather = weather;
    }

    /// Template context for a message to or from `callsign`
    fn context(&self, callsign: &str) -> TextContext {
        self.core
            .text_context(callsign)
            .with("runway", self.weather.runway())
            .with("heading", self.weather.runway_heading())
            .with("wind", self.weather.wind_phrase())
            .with("altimeter", self.weather.altimeter_phrase())
            .with("squawk", format!("{:04}", self.user.squawk))
    }

    fn start_exchange(&mut self, exchange: &'static Exchange) {
        if let Some(phase) = self.phase {
            warn!(
                "{} {}: busy with {:?}, ignoring selection {}",
                self.core.ident(),
                self.core.kind(),
                phase,
                exchange.code
            );
            return;
        }

        let text = self
            .requests
            .gen_text(exchange.code, &self.context(&self.user.spoken_callsign()));
        let timeout = self.core.config().conditional_timeout_secs;
        let call = Transmission::new(text).with_callback(PILOT_CALL_FINISHED + exchange.code);

        match self.core.conditional_transmit(call, timeout) {
            Ok(()) => self.phase = Some(Phase::Calling(exchange.code)),
            Err(e) => warn!("{} {}: call not queued: {}", self.core.ident(), self.core.kind(), e),
        }
    }

    fn reply(&mut self, code: i32) {
        let Some(exchange) = R::exchange(code) else {
            self.phase = None;
            return;
        };
        let text = self.gen_text(code, &self.user.spoken_callsign());
        let tx = Transmission::new(text)
            .with_audio_ref(self.core.default_audio_ref())
            .with_callback(REPLY_FINISHED + code);

        if let Err(e) = self.core.immediate_transmit(tx) {
            warn!("{} {}: reply failed: {}", self.core.ident(), self.core.kind(), e);
            self.phase = None;
            return;
        }
        self.phase = Some(Phase::Replying(code));
        self.apply_effect(exchange.effect);
    }

    fn apply_effect(&mut self, effect: PlaneEffect) {
        match effect {
            PlaneEffect::None => {}
            PlaneEffect::Push => {
                if self.core.planes().contains(&self.user.callsign) {
                    debug!("{} already handled by {}", self.user.callsign, self.core.ident());
                } else {
                    self.core.planes_mut().push(self.user.clone());
                }
            }
            PlaneEffect::Pop => match self.core.planes_mut().pop() {
                Some(plane) => info!("{} handed off by {}", plane.callsign, self.core.ident()),
                None => warn!("{} {}: no aircraft to hand off", self.core.ident(), self.core.kind()),
            },
        }
    }
}

impl<R: ControlRules> Station for ControllerStation<R> {
    fn core(&self) -> &StationCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut StationCore {
        &mut self.core
    }

    fn init(&mut self) -> Result<(), StationError> {
        if self.core.kind() != R::KIND {
            return Err(StationError::InvalidKind(format!(
                "{} record given to a {} controller",
                self.core.kind(),
                R::KIND
            )));
        }
        debug!(
            "{} {}: {} exchanges available",
            self.core.ident(),
            self.core.kind(),
            R::EXCHANGES.len()
        );
        Ok(())
    }

    fn process_callback(&mut self, code: i32) {
        if code > REPLY_FINISHED {
            if self.phase == Some(Phase::Replying(code - REPLY_FINISHED)) {
                self.phase = None;
            }
        } else if code > PILOT_CALL_FINISHED {
            let exchange = code - PILOT_CALL_FINISHED;
            if self.phase == Some(Phase::Calling(exchange)) {
                self.phase = Some(Phase::AwaitingReply(exchange));
                let callsign = self.user.callsign.clone();
                self.notify_transmission_finished(&callsign);
            }
        } else {
            debug!(
                "{} {}: ignoring callback {}",
                self.core.ident(),
                self.core.kind(),
                code
            );
        }
    }

    /// Only codes naming one of this kind's exchanges are accepted
    fn handle_ui_selection(&mut self, code: i32) {
        match R::exchange(code) {
            Some(exchange) => self.start_exchange(exchange),
            None => warn!(
                "{} {}: ignoring unknown code {}",
                self.core.ident(),
                self.core.kind(),
                code
            ),
        }
    }

    fn update(&mut self, dt: f64) {
        self.advance_core(dt);

        if let Some(Phase::AwaitingReply(code)) = self.phase {
            if self.core.take_response().is_some() {
                self.reply(code);
            }
        }

        // A call that timed out waiting for the frequency leaves nothing behind
        if let Some(Phase::Calling(code)) = self.phase {
            if self.core.pending_transmission().is_none() && !self.core.is_transmitting() {
                info!(
                    "{} {}: call {} abandoned, frequency busy",
                    self.core.ident(),
                    self.core.kind(),
                    code
                );
                self.phase = None;
            }
        }
    }

    fn wants_response(&self, requester: &str) -> bool {
        matches!(self.phase, Some(Phase::AwaitingReply(_))) && requester == self.user.callsign
    }

    fn gen_text(&self, code: i32, callsign: &str) -> String {
        self.replies.gen_text(code, &self.context(callsign))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atc_core::{CaptionLog, GeodeticPosition, StationConfig, StationRecord, FALLBACK_TEXT};

    struct TestRules;

    impl ControlRules for TestRules {
        const KIND: StationKind = StationKind::Tower;
        const EXCHANGES: &'static [Exchange] = &[
            Exchange {
                code: 1,
                request: "{station}, {callsign}, hello",
                reply: "{callsign}, {station}, runway {runway}",
                effect: PlaneEffect::Push,
            },
            Exchange {
                code: 2,
                request: "{station}, {callsign}, goodbye",
                reply: "{callsign}, good day",
                effect: PlaneEffect::Pop,
            },
        ];
    }

    fn station() -> (ControllerStation<TestRules>, CaptionLog) {
        let record = StationRecord::new(
            StationKind::Tower,
            GeodeticPosition::from_deg_ft(37.6188, -122.3754, 13.0),
            120.5,
            15,
            "KSFO",
            "San Francisco Tower",
        );
        let mut core = StationCore::new(record, StationConfig::deterministic());
        let log = CaptionLog::new();
        core.render_mut().set_caption_sink(Box::new(log.clone()));
        let mut station = ControllerStation::new(core, &Environment::default());
        station.init().unwrap();
        (station, log)
    }

    fn run(station: &mut ControllerStation<TestRules>, ticks: usize) {
        for _ in 0..ticks {
            station.update(0.5);
        }
    }

    #[test]
    fn test_full_exchange() {
        let (mut tower, log) = station();
        tower.handle_ui_selection(1);
        assert!(tower.in_exchange());

        // Call starts on the next tick and lasts the minimum 2 s
        run(&mut tower, 5);
        assert_eq!(log.texts(), ["San Francisco Tower, N123AB, hello"]);
        assert!(tower.core().response_armed());

        // Reply 1.2 s later
        run(&mut tower, 3);
        assert_eq!(log.texts()[1], "N123AB, San Francisco Tower, runway 28");
        assert_eq!(tower.core().planes().len(), 1);

        // Six words hold the channel for 2.4 s
        run(&mut tower, 5);
        assert!(!tower.in_exchange());
        assert!(tower.core().is_channel_clear());
    }

    #[test]
    fn test_selection_ignored_while_busy() {
        let (mut tower, log) = station();
        tower.handle_ui_selection(1);
        tower.handle_ui_selection(2);
        run(&mut tower, 1);
        assert_eq!(log.texts(), ["San Francisco Tower, N123AB, hello"]);
    }

    #[test]
    fn test_ui_code_cannot_finish_a_call() {
        let (mut tower, log) = station();
        tower.handle_ui_selection(1);
        tower.update(0.1);
        assert!(tower.core().is_transmitting());

        tower.handle_ui_selection(PILOT_CALL_FINISHED + 1);
        tower.handle_ui_selection(REPLY_FINISHED + 1);
        assert!(!tower.core().response_armed());
        assert!(tower.core().is_transmitting());

        tower.update(1.3);
        assert_eq!(log.texts(), ["San Francisco Tower, N123AB, hello"]);
        assert!(tower.core().planes().is_empty());
    }

    #[test]
    fn test_abandoned_call_resets() {
        let (mut tower, log) = station();
        tower.core_mut().mark_channel_in_use();
        tower.handle_ui_selection(1);
        run(&mut tower, 31);
        assert!(!tower.in_exchange());
        assert!(log.captions().is_empty());
    }

    #[test]
    fn test_other_traffic_gets_no_reply() {
        let (mut tower, _) = station();
        tower.core_mut().mark_channel_in_use();
        tower.notify_transmission_finished("N999ZZ");
        assert!(tower.core().is_channel_clear());
        assert!(!tower.core().response_required());
    }

    #[test]
    fn test_gen_text() {
        let (tower, _) = station();
        assert_eq!(tower.gen_text(2, "N1"), "N1, good day");
        assert_eq!(tower.gen_text(7, "N1"), FALLBACK_TEXT);
    }

    #[test]
    fn test_init_rejects_wrong_kind() {
        let record = StationRecord::new(
            StationKind::Ground,
            GeodeticPosition::default(),
            121.8,
            5,
            "KSFO",
            "San Francisco Ground",
        );
        let core = StationCore::new(record, StationConfig::deterministic());
        let mut station = ControllerStation::<TestRules>::new(core, &Environment::default());
        assert!(matches!(station.init(), Err(StationError::InvalidKind(_))));
    }
}
