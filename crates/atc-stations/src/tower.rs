//! Tower control
//!
//! | Code | Pilot call            | Plane stack |
//! |------|-----------------------|-------------|
//! | 1    | Ready for departure   | push        |
//! | 2    | Request landing       | push        |
//! | 3    | Report downwind       |             |
//! | 4    | Clear of the runway   | pop         |

use atc_core::StationKind;

use crate::controller::{ControlRules, ControllerStation, Exchange, PlaneEffect};

#[derive(Debug, Clone, Copy, Default)]
pub struct TowerRules;

pub type TowerStation = ControllerStation<TowerRules>;

impl ControlRules for TowerRules {
    const KIND: StationKind = StationKind::Tower;

    const EXCHANGES: &'static [Exchange] = &[
        Exchange {
            code: 1,
            request: "{station}, {callsign}, holding short runway {runway}, ready for departure.",
            reply: "{callsign}, {station}, wind {wind}, runway {runway}, cleared for takeoff.",
            effect: PlaneEffect::Push,
        },
        Exchange {
            code: 2,
            request: "{station}, {callsign}, inbound for landing.",
            reply: "{callsign}, {station}, enter left downwind runway {runway}, altimeter {altimeter}.",
            effect: PlaneEffect::Push,
        },
        Exchange {
            code: 3,
            request: "{station}, {callsign}, left downwind runway {runway}.",
            reply: "{callsign}, wind {wind}, runway {runway}, cleared to land.",
            effect: PlaneEffect::None,
        },
        Exchange {
            code: 4,
            request: "{station}, {callsign}, clear of runway {runway}.",
            reply: "{callsign}, contact ground. Good day.",
            effect: PlaneEffect::Pop,
        },
    ];
}

#[cfg(test)]
mod tests {
    use super::*;
    use atc_core::{render_template, TextContext};

    #[test]
    fn test_departure_phrasing() {
        let ctx = TextContext {
            callsign: "N123AB".into(),
            station: "San Francisco Tower".into(),
            ..Default::default()
        }
        .with("runway", "28")
        .with("wind", "280 at 10");

        let exchange = TowerRules::exchange(1).unwrap();
        assert_eq!(
            render_template(exchange.reply, &ctx),
            "N123AB, San Francisco Tower, wind 280 at 10, runway 28, cleared for takeoff."
        );
    }
}
