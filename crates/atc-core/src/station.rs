//! Station controller
//!
//! [`StationCore`] is the state every station kind shares: channel flags,
//! response and release timers, the transmission scheduler, rendering and the
//! plane stack. [`Station`] is the contract concrete kinds implement on top
//! of it.
//!
//! # Tick sequence
//!
//! Each call to [`StationCore::update`]:
//!
//! 1. advances the station clock by `dt`
//! 2. fires the response timer (marking the reply due) and the release timer
//!    (freeing the channel unless a presentation is under way)
//! 3. advances the active presentation; when it completes the release timer
//!    is armed and the callback code is reported in the [`TickOutcome`]
//! 4. polls the pending transmission, starting it if the channel is clear
//!
//! The default [`Station::update`] then delivers the callback to
//! [`Station::process_callback`] and concludes the presentation, releasing
//! the channel unless a reply is now owed.

use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use crate::channel::{ChannelState, ChannelStatus};
use crate::config::StationConfig;
use crate::error::StationError;
use crate::frequency::format_channel_key;
use crate::plane_stack::PlaneStack;
use crate::record::{StationKind, StationRecord};
use crate::render::{RenderDispatch, TextContext, FALLBACK_TEXT};
use crate::scheduler::{DropReason, SchedulerPoll, TransmissionScheduler, Transmission, TransmitMode};
use crate::timer::{Countdown, SimClock};

/// Events held before the oldest are discarded
pub const MAX_BUFFERED_EVENTS: usize = 256;

/// Observable station activity, buffered until drained
#[derive(Debug, Clone, PartialEq)]
pub enum StationEvent {
    /// Presentation of a message began
    TransmissionStarted {
        message: String,
        mode: TransmitMode,
        at: f64,
    },
    /// Presentation ran its full duration
    TransmissionFinished {
        message: String,
        callback: Option<i32>,
        at: f64,
    },
    /// A message was given up without being (fully) presented
    TransmissionDropped {
        message: String,
        reason: DropReason,
        at: f64,
    },
    /// The response timer fired
    ResponseDue { target: String, at: f64 },
    /// The channel became clear
    ChannelReleased { by_timer: bool, at: f64 },
}

/// What happened during one [`StationCore::update`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickOutcome {
    /// A presentation completed this tick
    pub presentation_finished: bool,
    /// Callback code carried by the completed presentation
    pub callback: Option<i32>,
    /// The response timer fired this tick
    pub response_due: bool,
}

#[derive(Debug, Clone, Default)]
struct ResponseState {
    required: bool,
    due: bool,
    target: String,
    timer: Countdown,
}

/// State and timing shared by every station kind
#[derive(Debug)]
pub struct StationCore {
    record: StationRecord,
    config: StationConfig,
    clock: SimClock,
    channel: ChannelState,
    scheduler: TransmissionScheduler,
    render: RenderDispatch,
    planes: PlaneStack,
    response: ResponseState,
    release_timer: Countdown,
    events: VecDeque<StationEvent>,
    rng: StdRng,
}

impl StationCore {
    /// Create the shared state for a station built from `record`
    pub fn new(record: StationRecord, config: StationConfig) -> Self {
        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let render = RenderDispatch::new(config.display, config.voice);

        Self {
            record,
            config,
            clock: SimClock::new(),
            channel: ChannelState::new(),
            scheduler: TransmissionScheduler::new(),
            render,
            planes: PlaneStack::new(),
            response: ResponseState::default(),
            release_timer: Countdown::new(),
            events: VecDeque::new(),
            rng,
        }
    }

    // ------------------------------------------------------------------
    // Identity
    // ------------------------------------------------------------------

    pub fn record(&self) -> &StationRecord {
        &self.record
    }

    pub fn kind(&self) -> StationKind {
        self.record.kind
    }

    pub fn ident(&self) -> &str {
        &self.record.ident
    }

    pub fn name(&self) -> &str {
        &self.record.name
    }

    pub fn channel_key(&self) -> u32 {
        self.record.channel_key
    }

    pub fn config(&self) -> &StationConfig {
        &self.config
    }

    /// Default voice reference for this station, e.g. `"ksfo-tower"`
    pub fn default_audio_ref(&self) -> String {
        format!("{}-{}", self.record.ident, self.record.kind.name()).to_ascii_lowercase()
    }

    /// Template context addressing `callsign` from this station
    pub fn text_context(&self, callsign: &str) -> TextContext {
        TextContext {
            callsign: callsign.to_string(),
            station: self.record.name.clone(),
            ident: self.record.ident.clone(),
            frequency: format_channel_key(self.record.channel_key),
            extra: Vec::new(),
        }
    }

    /// Current simulated time on this station's clock
    pub fn now(&self) -> f64 {
        self.clock.now()
    }

    // ------------------------------------------------------------------
    // Channel arbitration
    // ------------------------------------------------------------------

    /// Whether it is OK to transmit on this frequency
    pub fn is_channel_clear(&self) -> bool {
        self.channel.is_clear()
    }

    /// Whether a remote party is transmitting to this station
    pub fn is_receiving(&self) -> bool {
        self.channel.is_receiving()
    }

    /// Whether this station is presenting a message
    pub fn is_transmitting(&self) -> bool {
        self.scheduler.is_transmitting()
    }

    pub fn channel_status(&self) -> ChannelStatus {
        self.channel
            .status(self.scheduler.is_transmitting(), self.response.required)
    }

    /// An aircraft or the user has started transmitting on the frequency
    pub fn mark_channel_in_use(&mut self) {
        self.channel.mark_in_use();
    }

    /// Free the channel; a no-op if already clear
    pub fn release_channel(&mut self) {
        self.release(false);
    }

    fn release(&mut self, by_timer: bool) {
        if self.channel.is_clear() {
            return;
        }
        self.channel.release();
        debug!("{} {}: channel released", self.record.ident, self.record.kind);
        self.push_event(StationEvent::ChannelReleased {
            by_timer,
            at: self.clock.now(),
        });
    }

    /// An inbound transmission from `requester` has finished and a reply is
    /// expected
    ///
    /// Arms the response timer for the configured base delay plus jitter and
    /// returns that delay. Channel occupancy is left alone.
    pub fn request_response(&mut self, requester: &str) -> f64 {
        let jitter = if self.config.response_delay_jitter > 0.0 {
            self.rng.gen_range(0.0..=self.config.response_delay_jitter)
        } else {
            0.0
        };
        let delay = self.config.response_delay_base.max(0.0) + jitter;

        self.response.required = true;
        self.response.due = false;
        self.response.target = requester.to_string();
        self.response.timer.arm(self.clock.now(), delay);
        debug!(
            "{} {}: reply to {} due in {:.2}s",
            self.record.ident, self.record.kind, requester, delay
        );
        delay
    }

    /// End an inbound transmission from `requester`
    ///
    /// Takes exactly one of the two paths: arm a response, or release the
    /// channel.
    pub fn finish_reception(&mut self, requester: &str, respond: bool) {
        self.channel.end_reception();
        if respond {
            self.request_response(requester);
        } else {
            self.release_channel();
        }
    }

    /// Whether a reply is owed (armed or already due)
    pub fn response_required(&self) -> bool {
        self.response.required
    }

    /// Whether the response timer has fired and the reply not yet taken
    pub fn response_due(&self) -> bool {
        self.response.due
    }

    /// Whether the response timer is counting down
    pub fn response_armed(&self) -> bool {
        self.response.timer.is_armed()
    }

    /// Identifier of the party the most recent reply request is for
    pub fn response_target(&self) -> &str {
        &self.response.target
    }

    /// Consume a due reply, returning who it is addressed to
    pub fn take_response(&mut self) -> Option<String> {
        if !self.response.due {
            return None;
        }
        self.response.due = false;
        self.response.required = false;
        Some(self.response.target.clone())
    }

    /// Forget any owed reply
    pub fn cancel_response(&mut self) {
        self.response.required = false;
        self.response.due = false;
        self.response.timer.disarm();
    }

    /// Whether the release safety-net timer is running
    pub fn release_armed(&self) -> bool {
        self.release_timer.is_armed()
    }

    // ------------------------------------------------------------------
    // Transmission requests
    // ------------------------------------------------------------------

    fn check_request(&self, transmission: &Transmission) -> Result<(), StationError> {
        if transmission.message.trim().is_empty() {
            return Err(StationError::EmptyMessage(self.record.ident.clone()));
        }
        if self.scheduler.is_busy() {
            return Err(StationError::TransmissionInFlight(self.record.ident.clone()));
        }
        Ok(())
    }

    fn enqueue(
        &mut self,
        transmission: Transmission,
        mode: TransmitMode,
    ) -> Result<(), StationError> {
        self.check_request(&transmission)?;
        self.scheduler
            .enqueue(transmission, mode)
            .map_err(|_| StationError::TransmissionInFlight(self.record.ident.clone()))
    }

    /// Transmit on the next tick if the channel is clear then
    ///
    /// If the channel is busy at that tick the message is silently dropped.
    pub fn transmit(&mut self, transmission: Transmission) -> Result<(), StationError> {
        self.enqueue(transmission, TransmitMode::Queued)
    }

    /// Transmit once the channel clears, giving up after `timeout` seconds
    ///
    /// A timeout of zero waits indefinitely.
    pub fn conditional_transmit(
        &mut self,
        transmission: Transmission,
        timeout: f64,
    ) -> Result<(), StationError> {
        self.enqueue(
            transmission,
            TransmitMode::Conditional {
                timeout: timeout.max(0.0),
            },
        )
    }

    /// Transmit now, regardless of other traffic on the channel
    ///
    /// Replaces anything this station is already presenting and discards any
    /// pending request.
    pub fn immediate_transmit(&mut self, transmission: Transmission) -> Result<(), StationError> {
        if transmission.message.trim().is_empty() {
            return Err(StationError::EmptyMessage(self.record.ident.clone()));
        }
        let now = self.clock.now();
        if let Some(discarded) = self.scheduler.discard_pending() {
            self.push_event(StationEvent::TransmissionDropped {
                message: discarded.message,
                reason: DropReason::Replaced,
                at: now,
            });
        }
        self.begin_presentation(transmission, TransmitMode::Immediate);
        Ok(())
    }

    fn begin_presentation(&mut self, transmission: Transmission, mode: TransmitMode) {
        let now = self.clock.now();
        if let Some(previous) = self.scheduler.abort_active() {
            if previous.audio_ref != transmission.audio_ref {
                self.render.cancel(&previous.audio_ref);
            }
            self.push_event(StationEvent::TransmissionDropped {
                message: previous.message,
                reason: DropReason::Replaced,
                at: now,
            });
        }

        let presentation = self.render.present(
            &self.record.ident,
            &transmission.message,
            transmission.volume,
            &transmission.audio_ref,
            transmission.repeating,
        );
        let duration = presentation
            .voiced
            .unwrap_or_else(|| self.config.estimate_duration(&transmission.message))
            .max(self.config.min_transmission_secs);

        self.channel.occupy_local();
        info!(
            "{} {} [{}]: {}",
            self.record.ident,
            self.record.kind,
            mode.name(),
            transmission.message
        );
        self.push_event(StationEvent::TransmissionStarted {
            message: transmission.message.clone(),
            mode,
            at: now,
        });
        self.scheduler.begin(transmission, now, duration);
    }

    /// Stop presenting and forget any pending request
    ///
    /// Audio is cancelled and the channel released.
    pub fn cancel_transmission(&mut self) {
        let now = self.clock.now();
        let dropped = [self.scheduler.discard_pending(), self.scheduler.abort_active()];
        for transmission in dropped.into_iter().flatten() {
            self.render
                .cancel_broadcast(&self.record.ident, &transmission.audio_ref);
            self.push_event(StationEvent::TransmissionDropped {
                message: transmission.message,
                reason: DropReason::Cancelled,
                at: now,
            });
        }
        self.release_channel();
    }

    /// Stop a specific audio rendering; a no-op if it is not playing
    pub fn cancel_render(&mut self, audio_ref: &str) -> bool {
        self.render.cancel(audio_ref)
    }

    /// The message being presented
    pub fn active_transmission(&self) -> Option<&Transmission> {
        self.scheduler.active()
    }

    /// The message waiting for the channel
    pub fn pending_transmission(&self) -> Option<&Transmission> {
        self.scheduler.pending()
    }

    // ------------------------------------------------------------------
    // Tick
    // ------------------------------------------------------------------

    /// Advance timers and the scheduler by `dt` seconds
    pub fn update(&mut self, dt: f64) -> TickOutcome {
        let dt = self.clock.advance(dt);
        let now = self.clock.now();
        let mut outcome = TickOutcome::default();

        if self.response.timer.fire_if_due(now) && self.response.required {
            self.response.due = true;
            outcome.response_due = true;
            self.push_event(StationEvent::ResponseDue {
                target: self.response.target.clone(),
                at: now,
            });
        }

        // A later presentation re-arms the timer when it finishes
        if self.release_timer.fire_if_due(now) && !self.scheduler.is_transmitting() {
            self.release(true);
        }

        if let Some(done) = self.scheduler.advance(dt) {
            self.release_timer.arm(now, self.config.release_delay_secs);
            outcome.presentation_finished = true;
            outcome.callback = done.callback;
            self.push_event(StationEvent::TransmissionFinished {
                message: done.message,
                callback: done.callback,
                at: now,
            });
        }

        match self.scheduler.poll(dt, self.channel.is_clear()) {
            SchedulerPoll::Start(transmission, mode) => self.begin_presentation(transmission, mode),
            SchedulerPoll::Dropped(transmission, reason) => {
                debug!(
                    "{} {}: dropped {:?} ({:?})",
                    self.record.ident, self.record.kind, transmission.message, reason
                );
                self.push_event(StationEvent::TransmissionDropped {
                    message: transmission.message,
                    reason,
                    at: now,
                });
            }
            SchedulerPoll::Idle | SchedulerPoll::Waiting => {}
        }

        outcome
    }

    /// Release the channel after a finished presentation unless a reply is owed
    pub fn conclude_presentation(&mut self) {
        if !self.response.required && !self.scheduler.is_transmitting() {
            self.release_channel();
        }
    }

    // ------------------------------------------------------------------
    // Collaborators
    // ------------------------------------------------------------------

    pub fn planes(&self) -> &PlaneStack {
        &self.planes
    }

    pub fn planes_mut(&mut self) -> &mut PlaneStack {
        &mut self.planes
    }

    pub fn render(&self) -> &RenderDispatch {
        &self.render
    }

    pub fn render_mut(&mut self) -> &mut RenderDispatch {
        &mut self.render
    }

    fn push_event(&mut self, event: StationEvent) {
        if self.events.len() >= MAX_BUFFERED_EVENTS {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }

    /// Take all buffered events
    ///
    /// Owners should drain once per tick. At most [`MAX_BUFFERED_EVENTS`] are
    /// kept; older ones are dropped first.
    pub fn drain_events(&mut self) -> Vec<StationEvent> {
        self.events.drain(..).collect()
    }
}

/// Behaviour contract for a concrete station kind
///
/// Implementors own a [`StationCore`] and expose it through `core`/`core_mut`.
/// Only `init` and `process_callback` must be written; the rest have
/// defaults built on the core.
pub trait Station: Send {
    fn core(&self) -> &StationCore;

    fn core_mut(&mut self) -> &mut StationCore;

    /// One-time setup after construction
    fn init(&mut self) -> Result<(), StationError>;

    /// React to a callback code from a finished presentation or a UI selection
    fn process_callback(&mut self, code: i32);

    /// Run the core tick, deliver the finished callback, then conclude the
    /// presentation
    fn advance_core(&mut self, dt: f64) -> TickOutcome {
        let outcome = self.core_mut().update(dt);
        if let Some(code) = outcome.callback {
            self.process_callback(code);
        }
        if outcome.presentation_finished {
            self.core_mut().conclude_presentation();
        }
        outcome
    }

    /// Per-tick update
    ///
    /// Kinds that override this should start with [`Station::advance_core`]
    /// so the shared timers and scheduler keep running.
    fn update(&mut self, dt: f64) {
        self.advance_core(dt);
    }

    /// A selection from the ATC menu; codes are documented per kind
    fn handle_ui_selection(&mut self, code: i32) {
        self.process_callback(code);
    }

    /// Whether an inbound transmission from `requester` warrants a reply
    fn wants_response(&self, _requester: &str) -> bool {
        false
    }

    /// An inbound transmission from `requester` has ended
    fn notify_transmission_finished(&mut self, requester: &str) {
        let respond = self.wants_response(requester);
        self.core_mut().finish_reception(requester, respond);
    }

    /// Text of message `code` addressed to `callsign`
    fn gen_text(&self, _code: i32, _callsign: &str) -> String {
        FALLBACK_TEXT.to_string()
    }

    fn kind(&self) -> StationKind {
        self.core().kind()
    }

    fn ident(&self) -> &str {
        self.core().ident()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::GeodeticPosition;
    use crate::render::CaptionLog;

    fn core() -> StationCore {
        let record = StationRecord::new(
            StationKind::Tower,
            GeodeticPosition::from_deg_ft(37.6188, -122.3754, 13.0),
            120.5,
            15,
            "KSFO",
            "San Francisco Tower",
        );
        StationCore::new(record, StationConfig::deterministic())
    }

    #[test]
    fn test_new_core_is_idle() {
        let core = core();
        assert!(core.is_channel_clear());
        assert!(!core.is_transmitting());
        assert!(!core.response_required());
        assert_eq!(core.channel_status(), ChannelStatus::Clear);
        assert_eq!(core.default_audio_ref(), "ksfo-tower");
    }

    #[test]
    fn test_text_context() {
        let ctx = core().text_context("N123AB");
        assert_eq!(ctx.callsign, "N123AB");
        assert_eq!(ctx.station, "San Francisco Tower");
        assert_eq!(ctx.frequency, "120.500");
    }

    #[test]
    fn test_request_response_fires_once() {
        let mut core = core();
        let delay = core.request_response("N1");
        assert_eq!(delay, 1.2);

        assert!(!core.update(1.0).response_due);
        assert!(!core.response_due());
        assert!(core.update(0.25).response_due);
        assert!(core.response_due());
        assert!(!core.update(5.0).response_due);

        assert_eq!(core.take_response().as_deref(), Some("N1"));
        assert!(core.take_response().is_none());
        assert!(!core.response_required());
    }

    #[test]
    fn test_finish_reception_without_reply_releases() {
        let mut core = core();
        core.mark_channel_in_use();
        core.finish_reception("N1", false);
        assert!(core.is_channel_clear());
        assert!(!core.response_required());
    }

    #[test]
    fn test_finish_reception_with_reply_holds_channel() {
        let mut core = core();
        core.mark_channel_in_use();
        core.finish_reception("N1", true);
        assert!(!core.is_channel_clear());
        assert!(!core.is_receiving());
        assert!(core.response_armed());
        assert_eq!(core.channel_status(), ChannelStatus::PendingResponse);
    }

    #[test]
    fn test_owed_reply_keeps_target_when_other_traffic_ends() {
        let mut core = core();
        core.mark_channel_in_use();
        core.finish_reception("N1", true);

        core.mark_channel_in_use();
        core.finish_reception("N2", false);
        assert_eq!(core.response_target(), "N1");

        core.update(2.0);
        assert_eq!(core.take_response().as_deref(), Some("N1"));
    }

    #[test]
    fn test_event_buffer_is_bounded() {
        let mut core = core();
        for _ in 0..(MAX_BUFFERED_EVENTS + 10) {
            core.mark_channel_in_use();
            core.release_channel();
        }
        let events = core.drain_events();
        assert_eq!(events.len(), MAX_BUFFERED_EVENTS);
        assert!(core.drain_events().is_empty());
    }

    #[test]
    fn test_queued_transmit_presents_next_tick() {
        let mut core = core();
        let log = CaptionLog::new();
        core.render_mut().set_caption_sink(Box::new(log.clone()));

        core.transmit(Transmission::new("N1, roger")).unwrap();
        assert!(!core.is_transmitting());
        core.update(0.1);
        assert!(core.is_transmitting());
        assert!(!core.is_channel_clear());
        assert_eq!(log.texts(), ["N1, roger"]);
    }

    #[test]
    fn test_empty_message_rejected() {
        let mut core = core();
        assert_eq!(
            core.transmit(Transmission::new("  ")),
            Err(StationError::EmptyMessage("KSFO".into()))
        );
        assert!(core.immediate_transmit(Transmission::new("")).is_err());
    }

    #[test]
    fn test_second_queued_request_rejected() {
        let mut core = core();
        core.transmit(Transmission::new("first")).unwrap();
        assert_eq!(
            core.conditional_transmit(Transmission::new("second"), 5.0),
            Err(StationError::TransmissionInFlight("KSFO".into()))
        );
    }

    #[test]
    fn test_presentation_finishes_and_arms_release_timer() {
        let mut core = core();
        core.transmit(Transmission::new("N1, roger").with_callback(3)).unwrap();
        core.update(0.0);
        assert!(core.is_transmitting());

        let outcome = core.update(core.config().min_transmission_secs);
        assert!(outcome.presentation_finished);
        assert_eq!(outcome.callback, Some(3));
        assert!(core.release_armed());
        assert!(!core.is_channel_clear());

        core.conclude_presentation();
        assert!(core.is_channel_clear());
    }

    #[test]
    fn test_cancel_transmission_releases() {
        let mut core = core();
        core.immediate_transmit(Transmission::new("hello")).unwrap();
        core.cancel_transmission();
        assert!(!core.is_transmitting());
        assert!(core.is_channel_clear());
        let events = core.drain_events();
        assert!(events.iter().any(|e| matches!(
            e,
            StationEvent::TransmissionDropped { reason: DropReason::Cancelled, .. }
        )));
    }
}
