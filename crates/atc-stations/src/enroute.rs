//! En-route (center) control
//!
//! | Code | Pilot call                 | Plane stack |
//! |------|----------------------------|-------------|
//! | 1    | Check in at altitude       | push        |
//! | 2    | Request flight following   |             |
//! | 3    | Leaving frequency          | pop         |

use atc_core::StationKind;

use crate::controller::{ControlRules, ControllerStation, Exchange, PlaneEffect};

#[derive(Debug, Clone, Copy, Default)]
pub struct EnrouteRules;

pub type EnrouteStation = ControllerStation<EnrouteRules>;

impl ControlRules for EnrouteRules {
    const KIND: StationKind = StationKind::Enroute;

    const EXCHANGES: &'static [Exchange] = &[
        Exchange {
            code: 1,
            request: "{station}, {callsign}, level six thousand five hundred.",
            reply: "{callsign}, {station}, altimeter {altimeter}.",
            effect: PlaneEffect::Push,
        },
        Exchange {
            code: 2,
            request: "{station}, {callsign}, request flight following.",
            reply: "{callsign}, squawk {squawk}, radar contact.",
            effect: PlaneEffect::None,
        },
        Exchange {
            code: 3,
            request: "{station}, {callsign}, leaving your frequency.",
            reply: "{callsign}, frequency change approved. Good day.",
            effect: PlaneEffect::Pop,
        },
    ];
}
