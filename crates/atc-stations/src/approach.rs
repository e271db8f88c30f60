//! Approach control
//!
//! | Code | Pilot call                    | Plane stack |
//! |------|-------------------------------|-------------|
//! | 1    | Inbound for landing           | push        |
//! | 2    | Request vectors               |             |
//! | 3    | Field in sight                | pop         |

use atc_core::StationKind;

use crate::controller::{ControlRules, ControllerStation, Exchange, PlaneEffect};

#[derive(Debug, Clone, Copy, Default)]
pub struct ApproachRules;

pub type ApproachStation = ControllerStation<ApproachRules>;

impl ControlRules for ApproachRules {
    const KIND: StationKind = StationKind::Approach;

    const EXCHANGES: &'static [Exchange] = &[
        Exchange {
            code: 1,
            request: "{station}, {callsign}, inbound for landing with information.",
            reply: "{callsign}, {station}, radar contact, expect runway {runway}, altimeter {altimeter}.",
            effect: PlaneEffect::Push,
        },
        Exchange {
            code: 2,
            request: "{station}, {callsign}, request vectors to the field.",
            reply: "{callsign}, fly heading {heading}, descend and maintain three thousand.",
            effect: PlaneEffect::None,
        },
        Exchange {
            code: 3,
            request: "{station}, {callsign}, field in sight.",
            reply: "{callsign}, cleared visual approach runway {runway}, contact tower.",
            effect: PlaneEffect::Pop,
        },
    ];
}
