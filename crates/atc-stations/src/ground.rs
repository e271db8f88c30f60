//! Ground control
//!
//! | Code | Pilot call                         | Plane stack |
//! |------|------------------------------------|-------------|
//! | 1    | Request taxi for departure         | push        |
//! | 2    | Request taxi to parking            |             |
//! | 3    | Ready, request change to tower     | pop         |

use atc_core::StationKind;

use crate::controller::{ControlRules, ControllerStation, Exchange, PlaneEffect};

#[derive(Debug, Clone, Copy, Default)]
pub struct GroundRules;

pub type GroundStation = ControllerStation<GroundRules>;

impl ControlRules for GroundRules {
    const KIND: StationKind = StationKind::Ground;

    const EXCHANGES: &'static [Exchange] = &[
        Exchange {
            code: 1,
            request: "{station}, {callsign}, at the ramp, request taxi for departure.",
            reply: "{callsign}, {station}, taxi to runway {runway} via Alpha, altimeter {altimeter}.",
            effect: PlaneEffect::Push,
        },
        Exchange {
            code: 2,
            request: "{station}, {callsign}, clear of the active, request taxi to parking.",
            reply: "{callsign}, taxi to parking via Alpha.",
            effect: PlaneEffect::None,
        },
        Exchange {
            code: 3,
            request: "{station}, {callsign}, holding short runway {runway}, ready, request frequency change.",
            reply: "{callsign}, contact tower. Good day.",
            effect: PlaneEffect::Pop,
        },
    ];
}
