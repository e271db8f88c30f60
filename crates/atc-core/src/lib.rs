//! ATC Station Core
//!
//! This crate provides the channel-arbitration and transmission-timing engine
//! shared by every simulated ATC radio station.
//!
//! # Architecture
//!
//! Each station owns a [`StationCore`] which tracks:
//!
//! - **Channel state**: whether the half-duplex frequency is clear and whether
//!   a remote party is transmitting
//! - **Response timer**: the delay before a requested reply becomes due
//! - **Release timer**: frees the channel after a presentation has ended, even
//!   if the station kind never releases it itself
//! - **Scheduler**: at most one outgoing message, queued, conditional or
//!   immediate
//!
//! Concrete station kinds implement the [`Station`] trait on top of the core
//! and supply what to say and how to react to callback codes.
//!
//! # Example
//!
//! ```rust,no_run
//! use atc_core::{StationConfig, StationCore, StationRecord, Transmission};
//!
//! let record: StationRecord = r#"T 37.6188 -122.3754 13 120.5 15 KSFO "San Francisco Tower""#
//!     .parse()
//!     .unwrap();
//! let mut core = StationCore::new(record, StationConfig::default());
//!
//! core.mark_channel_in_use();
//! core.conditional_transmit(Transmission::new("San Francisco Tower, go ahead"), 5.0)
//!     .unwrap();
//! core.release_channel();
//! core.update(0.1);
//! assert!(core.is_transmitting());
//! ```

pub mod channel;
pub mod config;
pub mod error;
pub mod frequency;
pub mod geo;
pub mod plane_stack;
pub mod record;
pub mod render;
pub mod scheduler;
pub mod station;
pub mod timer;

pub use channel::{ChannelState, ChannelStatus};
pub use config::StationConfig;
pub use error::{RecordError, StationError, VoiceError};
pub use frequency::{channel_key_to_mhz, format_channel_key, to_channel_key};
pub use geo::GeodeticPosition;
pub use plane_stack::PlaneStack;
pub use record::{
    parse_station_record, PlaneCategory, PlaneRecord, RecordReader, StationKind, StationRecord,
};
pub use render::{
    render_template, Caption, CaptionLog, CaptionSink, MessageCatalog, Presentation,
    RenderDispatch, TextContext, VoiceEngine, FALLBACK_TEXT, MIN_AUDIBLE_VOLUME,
};
pub use scheduler::{DropReason, Transmission, TransmissionScheduler, TransmitMode};
pub use station::{Station, StationCore, StationEvent, TickOutcome, MAX_BUFFERED_EVENTS};
pub use timer::{Countdown, SimClock};
