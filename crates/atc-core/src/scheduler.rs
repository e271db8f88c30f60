//! Transmission scheduler
//!
//! Holds at most one outgoing message per station, either waiting for the
//! channel (pending) or being presented (active), and decides each tick
//! whether a pending message starts, waits, or is given up.

use serde::{Deserialize, Serialize};

/// Slack used when comparing elapsed time against limits
const TIME_EPSILON: f64 = 1e-9;

/// How a transmission request waits for the channel
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TransmitMode {
    /// Start on the next tick if the channel is clear, otherwise drop
    Queued,
    /// Wait up to `timeout` seconds for a clear channel (0 waits forever)
    Conditional { timeout: f64 },
    /// Start at once regardless of other traffic
    Immediate,
}

impl TransmitMode {
    /// Get human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Conditional { .. } => "conditional",
            Self::Immediate => "immediate",
        }
    }
}

/// An outgoing message and how to render it
#[derive(Debug, Clone, PartialEq)]
pub struct Transmission {
    /// Text to present
    pub message: String,
    /// Playback volume, 0.0 to 1.0
    pub volume: f64,
    /// Reference name for the voice engine; empty means caption only
    pub audio_ref: String,
    /// Loop until cancelled (broadcasts)
    pub repeating: bool,
    /// Code delivered to the station when presentation ends
    pub callback: Option<i32>,
}

impl Transmission {
    /// A caption-only message at full volume with no callback
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            volume: 1.0,
            audio_ref: String::new(),
            repeating: false,
            callback: None,
        }
    }

    /// Deliver `code` when the presentation ends; zero means no callback
    pub fn with_callback(mut self, code: i32) -> Self {
        self.callback = (code != 0).then_some(code);
        self
    }

    /// Voice the message under `audio_ref`
    pub fn with_audio_ref(mut self, audio_ref: impl Into<String>) -> Self {
        self.audio_ref = audio_ref.into();
        self
    }

    pub fn with_volume(mut self, volume: f64) -> Self {
        self.volume = volume;
        self
    }

    pub fn repeating(mut self, repeating: bool) -> Self {
        self.repeating = repeating;
        self
    }
}

/// Why a pending transmission never started
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DropReason {
    /// Queued request found the channel busy
    ChannelBusy,
    /// Conditional request waited out its timeout
    TimedOut,
    /// Superseded by an immediate transmission
    Replaced,
    /// Cancelled by the station
    Cancelled,
}

/// Result of polling the pending slot
#[derive(Debug, Clone, PartialEq)]
pub enum SchedulerPoll {
    /// Nothing pending
    Idle,
    /// Still waiting for the channel
    Waiting,
    /// Channel is clear; present this now
    Start(Transmission, TransmitMode),
    /// Given up without presenting
    Dropped(Transmission, DropReason),
}

#[derive(Debug, Clone)]
struct PendingTransmission {
    transmission: Transmission,
    mode: TransmitMode,
    waited: f64,
}

#[derive(Debug, Clone)]
struct ActiveTransmission {
    transmission: Transmission,
    started_at: f64,
    elapsed: f64,
    max_duration: f64,
}

/// Pending and active transmission slots for one station
#[derive(Debug, Clone, Default)]
pub struct TransmissionScheduler {
    pending: Option<PendingTransmission>,
    active: Option<ActiveTransmission>,
}

impl TransmissionScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether anything is pending or being presented
    pub fn is_busy(&self) -> bool {
        self.pending.is_some() || self.active.is_some()
    }

    pub fn is_transmitting(&self) -> bool {
        self.active.is_some()
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Hold a transmission until the channel is clear
    ///
    /// Rejects the request, handing it back, if another transmission is
    /// already pending or active.
    pub fn enqueue(
        &mut self,
        transmission: Transmission,
        mode: TransmitMode,
    ) -> Result<(), Transmission> {
        if self.is_busy() {
            return Err(transmission);
        }
        self.pending = Some(PendingTransmission {
            transmission,
            mode,
            waited: 0.0,
        });
        Ok(())
    }

    /// Decide what to do with the pending transmission after `dt` seconds
    pub fn poll(&mut self, dt: f64, channel_clear: bool) -> SchedulerPoll {
        let Some(pending) = self.pending.as_mut() else {
            return SchedulerPoll::Idle;
        };

        if channel_clear {
            let pending = self.pending.take().map(|p| (p.transmission, p.mode));
            return match pending {
                Some((tx, mode)) => SchedulerPoll::Start(tx, mode),
                None => SchedulerPoll::Idle,
            };
        }

        let expired = match pending.mode {
            TransmitMode::Queued => Some(DropReason::ChannelBusy),
            TransmitMode::Conditional { timeout } => {
                pending.waited += dt;
                (timeout > 0.0 && pending.waited + TIME_EPSILON >= timeout)
                    .then_some(DropReason::TimedOut)
            }
            // Immediate requests never wait in the pending slot
            TransmitMode::Immediate => None,
        };

        match expired {
            Some(reason) => match self.pending.take() {
                Some(p) => SchedulerPoll::Dropped(p.transmission, reason),
                None => SchedulerPoll::Idle,
            },
            None => SchedulerPoll::Waiting,
        }
    }

    /// Start presenting, replacing anything already active
    ///
    /// Returns the transmission that was displaced, if any.
    pub fn begin(
        &mut self,
        transmission: Transmission,
        now: f64,
        max_duration: f64,
    ) -> Option<Transmission> {
        let previous = self.active.take().map(|a| a.transmission);
        self.active = Some(ActiveTransmission {
            transmission,
            started_at: now,
            elapsed: 0.0,
            max_duration: max_duration.max(0.0),
        });
        previous
    }

    /// Advance the active presentation, returning it once it has run its course
    pub fn advance(&mut self, dt: f64) -> Option<Transmission> {
        let active = self.active.as_mut()?;
        active.elapsed += dt;
        if active.elapsed + TIME_EPSILON >= active.max_duration {
            self.active.take().map(|a| a.transmission)
        } else {
            None
        }
    }

    /// Remove the pending transmission without presenting it
    pub fn discard_pending(&mut self) -> Option<Transmission> {
        self.pending.take().map(|p| p.transmission)
    }

    /// Remove the active transmission without finishing it
    pub fn abort_active(&mut self) -> Option<Transmission> {
        self.active.take().map(|a| a.transmission)
    }

    /// The transmission being presented
    pub fn active(&self) -> Option<&Transmission> {
        self.active.as_ref().map(|a| &a.transmission)
    }

    /// The transmission waiting for the channel
    pub fn pending(&self) -> Option<&Transmission> {
        self.pending.as_ref().map(|p| &p.transmission)
    }

    /// Simulated time the active presentation started
    pub fn active_started_at(&self) -> Option<f64> {
        self.active.as_ref().map(|a| a.started_at)
    }

    /// Elapsed and total duration of the active presentation
    pub fn active_progress(&self) -> Option<(f64, f64)> {
        self.active.as_ref().map(|a| (a.elapsed, a.max_duration))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queued_starts_when_clear() {
        let mut s = TransmissionScheduler::new();
        s.enqueue(Transmission::new("hello"), TransmitMode::Queued).unwrap();
        assert!(matches!(s.poll(0.1, true), SchedulerPoll::Start(_, TransmitMode::Queued)));
        assert!(!s.has_pending());
    }

    #[test]
    fn test_queued_dropped_when_busy() {
        let mut s = TransmissionScheduler::new();
        s.enqueue(Transmission::new("hello"), TransmitMode::Queued).unwrap();
        assert!(matches!(
            s.poll(0.1, false),
            SchedulerPoll::Dropped(_, DropReason::ChannelBusy)
        ));
        assert_eq!(s.poll(0.1, true), SchedulerPoll::Idle);
    }

    #[test]
    fn test_conditional_waits_then_times_out() {
        let mut s = TransmissionScheduler::new();
        s.enqueue(
            Transmission::new("hello"),
            TransmitMode::Conditional { timeout: 1.0 },
        )
        .unwrap();
        assert_eq!(s.poll(0.5, false), SchedulerPoll::Waiting);
        assert!(matches!(
            s.poll(0.5, false),
            SchedulerPoll::Dropped(_, DropReason::TimedOut)
        ));
    }

    #[test]
    fn test_conditional_zero_timeout_waits_forever() {
        let mut s = TransmissionScheduler::new();
        s.enqueue(
            Transmission::new("hello"),
            TransmitMode::Conditional { timeout: 0.0 },
        )
        .unwrap();
        for _ in 0..1000 {
            assert_eq!(s.poll(1.0, false), SchedulerPoll::Waiting);
        }
        assert!(matches!(s.poll(1.0, true), SchedulerPoll::Start(..)));
    }

    #[test]
    fn test_enqueue_rejected_while_busy() {
        let mut s = TransmissionScheduler::new();
        s.enqueue(Transmission::new("first"), TransmitMode::Queued).unwrap();
        let rejected = s.enqueue(Transmission::new("second"), TransmitMode::Queued);
        assert_eq!(rejected.unwrap_err().message, "second");
        assert_eq!(s.pending().unwrap().message, "first");

        s.discard_pending();
        s.begin(Transmission::new("active"), 0.0, 2.0);
        assert!(s
            .enqueue(Transmission::new("third"), TransmitMode::Queued)
            .is_err());
    }

    #[test]
    fn test_active_runs_to_duration() {
        let mut s = TransmissionScheduler::new();
        s.begin(Transmission::new("hello").with_callback(7), 0.0, 1.0);
        assert!(s.is_transmitting());
        assert!(s.advance(0.5).is_none());
        assert_eq!(s.active_progress(), Some((0.5, 1.0)));
        let done = s.advance(0.5).unwrap();
        assert_eq!(done.callback, Some(7));
        assert!(!s.is_transmitting());
    }

    #[test]
    fn test_begin_replaces_and_restarts() {
        let mut s = TransmissionScheduler::new();
        s.begin(Transmission::new("first"), 0.0, 2.0);
        s.advance(1.5);
        let displaced = s.begin(Transmission::new("second"), 1.5, 2.0);
        assert_eq!(displaced.unwrap().message, "first");
        assert_eq!(s.active_progress(), Some((0.0, 2.0)));
        assert_eq!(s.active_started_at(), Some(1.5));
    }

    #[test]
    fn test_zero_callback_means_none() {
        assert_eq!(Transmission::new("x").with_callback(0).callback, None);
        assert_eq!(Transmission::new("x").with_callback(-3).callback, Some(-3));
    }
}
