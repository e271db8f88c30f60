//! Simulated clock and one-shot countdown timers
//!
//! Stations never read wall-clock time. Each one owns a [`SimClock`] advanced
//! by the tick's elapsed time, and its timers are deadlines on that clock.
//! Arming a [`Countdown`] for `d` seconds and advancing the clock by `dt` per
//! tick behaves exactly like decrementing a counter by `dt` and firing at
//! zero, but tests can reason about absolute simulated times.

use tracing::warn;

/// Slack applied when comparing a deadline against the clock, so that
/// accumulated floating-point error cannot hold a timer one tick too long
const DEADLINE_EPSILON: f64 = 1e-9;

/// Monotonic simulated clock in seconds
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SimClock {
    now: f64,
}

impl SimClock {
    /// A clock at time zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Current simulated time in seconds
    pub fn now(&self) -> f64 {
        self.now
    }

    /// Advance by `dt` seconds, returning the step actually applied
    ///
    /// Negative or non-finite steps are ignored so the clock never runs
    /// backwards.
    pub fn advance(&mut self, dt: f64) -> f64 {
        if !dt.is_finite() || dt < 0.0 {
            warn!("Ignoring invalid tick step {}", dt);
            return 0.0;
        }
        self.now += dt;
        dt
    }
}

/// One-shot timer armed against a [`SimClock`]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Countdown {
    deadline: Option<f64>,
    duration: f64,
}

impl Countdown {
    /// A disarmed timer
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm to fire `duration` seconds after `now`, replacing any earlier arming
    pub fn arm(&mut self, now: f64, duration: f64) {
        let duration = duration.max(0.0);
        self.duration = duration;
        self.deadline = Some(now + duration);
    }

    /// Disarm without firing
    pub fn disarm(&mut self) {
        self.deadline = None;
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Duration of the most recent arming
    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Seconds left before firing, if armed
    pub fn remaining(&self, now: f64) -> Option<f64> {
        self.deadline.map(|d| (d - now).max(0.0))
    }

    /// Fire if the deadline has been reached
    ///
    /// Returns true at most once per arming; the timer is disarmed in the
    /// same step.
    pub fn fire_if_due(&mut self, now: f64) -> bool {
        match self.deadline {
            Some(deadline) if now + DEADLINE_EPSILON >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_ignores_negative_steps() {
        let mut clock = SimClock::new();
        assert_eq!(clock.advance(0.5), 0.5);
        assert_eq!(clock.advance(-1.0), 0.0);
        assert_eq!(clock.advance(f64::NAN), 0.0);
        assert_eq!(clock.now(), 0.5);
    }

    #[test]
    fn test_countdown_fires_once() {
        let mut clock = SimClock::new();
        let mut timer = Countdown::new();
        timer.arm(clock.now(), 1.0);

        clock.advance(0.5);
        assert!(!timer.fire_if_due(clock.now()));
        clock.advance(0.5);
        assert!(timer.fire_if_due(clock.now()));
        assert!(!timer.is_armed());

        clock.advance(5.0);
        assert!(!timer.fire_if_due(clock.now()));
    }

    #[test]
    fn test_countdown_tolerates_float_accumulation() {
        let mut clock = SimClock::new();
        let mut timer = Countdown::new();
        timer.arm(clock.now(), 0.3);
        for _ in 0..3 {
            clock.advance(0.1);
        }
        assert!(timer.fire_if_due(clock.now()));
    }

    #[test]
    fn test_rearm_replaces_deadline() {
        let mut timer = Countdown::new();
        timer.arm(0.0, 1.0);
        timer.arm(0.5, 2.0);
        assert!(!timer.fire_if_due(1.0));
        assert_eq!(timer.remaining(1.0), Some(1.5));
        assert!(timer.fire_if_due(2.5));
    }

    #[test]
    fn test_disarm() {
        let mut timer = Countdown::new();
        timer.arm(0.0, 1.0);
        timer.disarm();
        assert!(!timer.fire_if_due(10.0));
        assert_eq!(timer.remaining(10.0), None);
    }

    #[test]
    fn test_zero_duration_fires_immediately() {
        let mut timer = Countdown::new();
        timer.arm(3.0, 0.0);
        assert!(timer.fire_if_due(3.0));
    }
}
