//! Error types for station records, stations and rendering

use thiserror::Error;

/// Errors that can occur while parsing a station data record
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RecordError {
    /// Line contained nothing to parse
    #[error("empty record")]
    Empty,

    /// Unknown station kind marker
    #[error("unknown station kind: {0:?}")]
    UnknownKind(char),

    /// A mandatory field is absent
    #[error("missing field: {0}")]
    MissingField(&'static str),

    /// A numeric field could not be parsed
    #[error("invalid {field}: {value:?}")]
    InvalidNumber {
        /// Name of the offending field
        field: &'static str,
        /// Raw text that failed to parse
        value: String,
    },

    /// A value parsed but lies outside its permitted range
    #[error("{field} out of range: {value}")]
    OutOfRange {
        /// Name of the offending field
        field: &'static str,
        /// Parsed value
        value: String,
    },

    /// Quoted station name was opened but never closed
    #[error("unterminated station name")]
    UnterminatedName,
}

/// Errors raised by station construction and transmission requests
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StationError {
    /// A record of kind INVALID cannot produce a station
    #[error("cannot construct a station for an untuned record ({0})")]
    InvalidKind(String),

    /// Another transmission is already pending or being presented
    #[error("transmission already in flight on {0}")]
    TransmissionInFlight(String),

    /// Transmit requested with nothing to say
    #[error("no message set for transmission on {0}")]
    EmptyMessage(String),
}

/// Errors reported by a voice engine
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VoiceError {
    /// No voice asset could be loaded
    #[error("voice unavailable: {0}")]
    Unavailable(String),

    /// Synthesis of a particular message failed
    #[error("synthesis failed for {audio_ref}: {reason}")]
    Synthesis {
        /// Reference name the message was to be played under
        audio_ref: String,
        /// Engine-specific reason
        reason: String,
    },
}
