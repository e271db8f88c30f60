//! Departure control
//!
//! | Code | Pilot call                 | Plane stack |
//! |------|----------------------------|-------------|
//! | 1    | Check in climbing          | push        |
//! | 2    | Request frequency change   | pop         |

use atc_core::StationKind;

use crate::controller::{ControlRules, ControllerStation, Exchange, PlaneEffect};

#[derive(Debug, Clone, Copy, Default)]
pub struct DepartureRules;

pub type DepartureStation = ControllerStation<DepartureRules>;

impl ControlRules for DepartureRules {
    const KIND: StationKind = StationKind::Departure;

    const EXCHANGES: &'static [Exchange] = &[
        Exchange {
            code: 1,
            request: "{station}, {callsign}, climbing through two thousand.",
            reply: "{callsign}, {station}, radar contact, climb and maintain five thousand.",
            effect: PlaneEffect::Push,
        },
        Exchange {
            code: 2,
            request: "{station}, {callsign}, request frequency change.",
            reply: "{callsign}, frequency change approved. Good day.",
            effect: PlaneEffect::Pop,
        },
    ];
}
