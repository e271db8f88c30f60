//! ATC Station Kinds
//!
//! This crate provides the seven concrete station kinds built on
//! [`atc_core::StationCore`] and the registry that owns and drives them.
//!
//! # Station kinds
//!
//! - **Broadcast** ([`BroadcastStation`]): ATIS and AWOS loop a weather
//!   recording and refresh it periodically
//! - **Controlled** ([`ControllerStation`]): ground, tower, approach,
//!   departure and en-route answer the user's calls and track the aircraft
//!   they are handling
//!
//! UI codes are documented in each kind's module.
//!
//! # Example
//!
//! ```rust,no_run
//! use atc_core::{StationConfig, StationKind};
//! use atc_stations::{Environment, StationRegistry};
//!
//! let mut registry = StationRegistry::new(StationConfig::default(), Environment::default());
//! registry.load_records(std::io::Cursor::new(
//!     "T 37.6188 -122.3754 13 120.5 15 KSFO \"San Francisco Tower\"\n",
//! ));
//!
//! // Ready for departure
//! registry.select_by_ident("KSFO", StationKind::Tower, 1).unwrap();
//! for _ in 0..100 {
//!     registry.tick(0.1);
//! }
//! ```

pub mod approach;
pub mod broadcast;
pub mod controller;
pub mod departure;
pub mod enroute;
pub mod environment;
pub mod error;
pub mod ground;
pub mod registry;
pub mod tower;

use atc_core::{Station, StationConfig, StationCore, StationError, StationKind, StationRecord};

pub use approach::{ApproachRules, ApproachStation};
pub use broadcast::{BroadcastStation, InformationLetter};
pub use controller::{ControlRules, ControllerStation, Exchange, PlaneEffect};
pub use departure::{DepartureRules, DepartureStation};
pub use enroute::{EnrouteRules, EnrouteStation};
pub use environment::{Environment, WeatherReport};
pub use error::RegistryError;
pub use ground::{GroundRules, GroundStation};
pub use registry::{LoadSummary, RegistryEvent, StationHandle, StationRegistry};
pub use tower::{TowerRules, TowerStation};

/// Construct the station kind named by `record`
///
/// The station is not yet initialised; call [`Station::init`] before the
/// first tick. Records of kind `Invalid` are rejected.
pub fn build_station(
    record: StationRecord,
    config: &StationConfig,
    environment: &Environment,
) -> Result<Box<dyn Station>, StationError> {
    let kind = record.kind;
    if kind == StationKind::Invalid {
        return Err(StationError::InvalidKind(record.ident));
    }

    let core = StationCore::new(record, config.clone());
    let station: Box<dyn Station> = match kind {
        StationKind::Atis | StationKind::Awos => {
            Box::new(BroadcastStation::new(core, environment.weather.clone()))
        }
        StationKind::Ground => Box::new(GroundStation::new(core, environment)),
        StationKind::Tower => Box::new(TowerStation::new(core, environment)),
        StationKind::Approach => Box::new(ApproachStation::new(core, environment)),
        StationKind::Departure => Box::new(DepartureStation::new(core, environment)),
        StationKind::Enroute => Box::new(EnrouteStation::new(core, environment)),
        StationKind::Invalid => return Err(StationError::InvalidKind(core.ident().to_string())),
    };
    Ok(station)
}
