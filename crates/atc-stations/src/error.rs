//! Error types for the station registry

use atc_core::{RecordError, StationError, StationKind};
use thiserror::Error;

use crate::registry::StationHandle;

/// Errors that can occur in the station registry
#[derive(Debug, Error)]
pub enum RegistryError {
    /// No station with this handle
    #[error("station not found: handle {}", .0.as_u32())]
    StationNotFound(StationHandle),

    /// No station with this identifier and kind
    #[error("no {kind} station for {ident}")]
    NoSuchStation {
        /// Identifier looked up
        ident: String,
        /// Kind looked up
        kind: StationKind,
    },

    /// Station data line could not be parsed
    #[error("bad station record: {0}")]
    Record(#[from] RecordError),

    /// Station construction failed
    #[error("station error: {0}")]
    Station(#[from] StationError),

    /// I/O error while reading station data
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
