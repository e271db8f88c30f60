//! Command line arguments

use std::path::PathBuf;
use std::str::FromStr;

use atc_core::StationKind;
use clap::Parser;
use thiserror::Error;

#[derive(Parser, Debug)]
#[command(
    name = "atc-sim",
    about = "Drive simulated ATC radio stations from a station data file."
)]
pub struct Args {
    /// Station data file, one record per line
    #[arg(long = "stations", default_value = "atc-sim/data/stations.dat")]
    pub stations: PathBuf,
    /// Settings file (JSON); defaults are used when omitted
    #[arg(long = "settings")]
    pub settings: Option<PathBuf>,
    /// Simulated seconds to run; runs until Ctrl-C when omitted
    #[arg(long = "duration")]
    pub duration: Option<f64>,
    /// Override the tick period from the settings file (ms)
    #[arg(long = "tick-ms")]
    pub tick_ms: Option<u64>,
    /// UI selection to make at a simulated time, as `<secs>:<ident>:<kind>:<code>`
    #[arg(long = "select")]
    pub select: Vec<ScheduledSelection>,
}

/// Errors parsing a `--select` argument
#[derive(Debug, Error, PartialEq)]
pub enum SelectionParseError {
    #[error("expected <secs>:<ident>:<kind>:<code>, got {0:?}")]
    Format(String),

    #[error("invalid time {0:?}")]
    Time(String),

    #[error("invalid station kind {0:?}")]
    Kind(String),

    #[error("invalid code {0:?}")]
    Code(String),
}

/// A UI selection scheduled at a simulated time
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledSelection {
    pub at_secs: f64,
    pub ident: String,
    pub kind: StationKind,
    pub code: i32,
}

impl FromStr for ScheduledSelection {
    type Err = SelectionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').map(str::trim).collect();
        let [at, ident, kind, code] = parts.as_slice() else {
            return Err(SelectionParseError::Format(s.to_string()));
        };

        let at_secs: f64 = at
            .parse()
            .ok()
            .filter(|t: &f64| t.is_finite() && *t >= 0.0)
            .ok_or_else(|| SelectionParseError::Time(at.to_string()))?;
        if ident.is_empty() {
            return Err(SelectionParseError::Format(s.to_string()));
        }
        let kind: StationKind = kind
            .parse()
            .ok()
            .filter(|k| *k != StationKind::Invalid)
            .ok_or_else(|| SelectionParseError::Kind(kind.to_string()))?;
        let code = code
            .parse()
            .map_err(|_| SelectionParseError::Code(code.to_string()))?;

        Ok(Self {
            at_secs,
            ident: ident.to_string(),
            kind,
            code,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_selection() {
        let sel: ScheduledSelection = "2.5:KSFO:TOWER:1".parse().unwrap();
        assert_eq!(
            sel,
            ScheduledSelection {
                at_secs: 2.5,
                ident: "KSFO".into(),
                kind: StationKind::Tower,
                code: 1,
            }
        );
    }

    #[test]
    fn test_parse_selection_with_marker() {
        let sel: ScheduledSelection = "0:KSFO:I:2".parse().unwrap();
        assert_eq!(sel.kind, StationKind::Atis);
        assert_eq!(sel.code, 2);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            "KSFO:TOWER:1".parse::<ScheduledSelection>(),
            Err(SelectionParseError::Format(_))
        ));
        assert!(matches!(
            "-1:KSFO:TOWER:1".parse::<ScheduledSelection>(),
            Err(SelectionParseError::Time(_))
        ));
        assert!(matches!(
            "1:KSFO:RADAR:1".parse::<ScheduledSelection>(),
            Err(SelectionParseError::Kind(_))
        ));
        assert!(matches!(
            "1:KSFO:TOWER:one".parse::<ScheduledSelection>(),
            Err(SelectionParseError::Code(_))
        ));
    }

    #[test]
    fn test_args_parse() {
        let args = Args::try_parse_from([
            "atc-sim",
            "--duration",
            "30",
            "--select",
            "1:KSFO:TOWER:1",
            "--select",
            "10:KSFO:GROUND:2",
        ])
        .unwrap();
        assert_eq!(args.duration, Some(30.0));
        assert_eq!(args.select.len(), 2);
        assert_eq!(args.select[1].kind, StationKind::Ground);
    }
}
