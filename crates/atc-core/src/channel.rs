//! Channel arbitration state
//!
//! Tracks whether the half-duplex frequency is clear and whether a remote
//! party (an aircraft or the user) is currently transmitting on it. The flags
//! are private so `receiving_remote` can never be set while the channel is
//! reported clear.

use serde::{Deserialize, Serialize};

/// Derived occupancy of a station's channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelStatus {
    /// Nothing on the frequency
    Clear,
    /// This station is transmitting, or holding the frequency after doing so
    OccupiedLocal,
    /// An external party is transmitting
    OccupiedRemote,
    /// A reply is owed but not yet due
    PendingResponse,
}

impl ChannelStatus {
    /// Get human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Clear => "Clear",
            Self::OccupiedLocal => "Occupied (local)",
            Self::OccupiedRemote => "Occupied (remote)",
            Self::PendingResponse => "Pending response",
        }
    }
}

/// Channel occupancy flags for one station
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelState {
    clear: bool,
    receiving_remote: bool,
}

impl Default for ChannelState {
    fn default() -> Self {
        Self {
            clear: true,
            receiving_remote: false,
        }
    }
}

impl ChannelState {
    /// A clear channel
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether it is OK to start transmitting
    pub fn is_clear(&self) -> bool {
        self.clear
    }

    /// Whether a remote party is transmitting
    pub fn is_receiving(&self) -> bool {
        self.receiving_remote
    }

    /// A remote party has keyed up
    pub fn mark_in_use(&mut self) {
        self.clear = false;
        self.receiving_remote = true;
    }

    /// This station has started presenting a message
    ///
    /// Remote reception is left as it was.
    pub fn occupy_local(&mut self) {
        self.clear = false;
    }

    /// Inbound reception ended without freeing the channel
    pub fn end_reception(&mut self) {
        self.receiving_remote = false;
    }

    /// Free the channel
    pub fn release(&mut self) {
        self.clear = true;
        self.receiving_remote = false;
    }

    /// Occupancy as seen by the UI, given the station's local activity
    pub fn status(&self, transmitting: bool, response_pending: bool) -> ChannelStatus {
        if transmitting {
            ChannelStatus::OccupiedLocal
        } else if self.receiving_remote {
            ChannelStatus::OccupiedRemote
        } else if response_pending {
            ChannelStatus::PendingResponse
        } else if self.clear {
            ChannelStatus::Clear
        } else {
            ChannelStatus::OccupiedLocal
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_clear() {
        let ch = ChannelState::new();
        assert!(ch.is_clear());
        assert!(!ch.is_receiving());
        assert_eq!(ch.status(false, false), ChannelStatus::Clear);
    }

    #[test]
    fn test_mark_in_use_and_release() {
        let mut ch = ChannelState::new();
        ch.mark_in_use();
        assert!(!ch.is_clear());
        assert!(ch.is_receiving());
        assert_eq!(ch.status(false, false), ChannelStatus::OccupiedRemote);

        ch.release();
        assert!(ch.is_clear());
        assert!(!ch.is_receiving());

        let snapshot = ch;
        ch.release();
        assert_eq!(ch, snapshot);
    }

    #[test]
    fn test_mark_in_use_idempotent() {
        let mut ch = ChannelState::new();
        ch.mark_in_use();
        let snapshot = ch;
        ch.mark_in_use();
        assert_eq!(ch, snapshot);
    }

    #[test]
    fn test_local_occupancy_keeps_receiving_flag() {
        let mut ch = ChannelState::new();
        ch.occupy_local();
        assert!(!ch.is_clear());
        assert!(!ch.is_receiving());

        ch.mark_in_use();
        ch.occupy_local();
        assert!(ch.is_receiving());
    }

    #[test]
    fn test_end_reception_leaves_channel_occupied() {
        let mut ch = ChannelState::new();
        ch.mark_in_use();
        ch.end_reception();
        assert!(!ch.is_clear());
        assert!(!ch.is_receiving());
        assert_eq!(ch.status(false, true), ChannelStatus::PendingResponse);
        assert_eq!(ch.status(false, false), ChannelStatus::OccupiedLocal);
    }

    #[test]
    fn test_transmitting_takes_precedence() {
        let mut ch = ChannelState::new();
        ch.mark_in_use();
        assert_eq!(ch.status(true, true), ChannelStatus::OccupiedLocal);
    }
}
