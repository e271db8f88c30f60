//! Station and aircraft records
//!
//! Station data files hold one record per line:
//!
//! ```text
//! T 37.6188 -122.3754 13 120.5 20 KSFO "San Francisco Tower"
//! ```
//!
//! Fields are the kind marker, latitude and longitude in degrees, elevation in
//! feet, frequency (MHz or channel key), broadcast range in nautical miles,
//! identifier, and the quoted name spoken in transmissions.

use std::fmt;
use std::io::BufRead;
use std::str::FromStr;

use glam::DVec3;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::RecordError;
use crate::frequency::to_channel_key;
use crate::geo::{GeodeticPosition, NM_TO_METRES};

/// Kind of ATC station a radio may be tuned to
///
/// `Invalid` means the radio is not tuned to anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StationKind {
    /// Automated weather observation broadcast
    Awos,
    /// Automatic terminal information service
    Atis,
    /// Ground control
    Ground,
    /// Tower
    Tower,
    /// Approach control
    Approach,
    /// Departure control
    Departure,
    /// En-route centre
    Enroute,
    /// Not tuned
    Invalid,
}

impl StationKind {
    /// All tunable kinds, in data-file order
    pub const TUNABLE: [StationKind; 7] = [
        StationKind::Awos,
        StationKind::Atis,
        StationKind::Ground,
        StationKind::Tower,
        StationKind::Approach,
        StationKind::Departure,
        StationKind::Enroute,
    ];

    /// Returns the stable upper-case name used in logs and the UI
    pub fn name(&self) -> &'static str {
        match self {
            Self::Awos => "AWOS",
            Self::Atis => "ATIS",
            Self::Ground => "GROUND",
            Self::Tower => "TOWER",
            Self::Approach => "APPROACH",
            Self::Departure => "DEPARTURE",
            Self::Enroute => "ENROUTE",
            Self::Invalid => "INVALID",
        }
    }

    /// Kind for a data-file marker character
    pub fn from_marker(marker: char) -> Option<Self> {
        match marker.to_ascii_uppercase() {
            'W' => Some(Self::Awos),
            'I' => Some(Self::Atis),
            'G' => Some(Self::Ground),
            'T' => Some(Self::Tower),
            'A' => Some(Self::Approach),
            'D' => Some(Self::Departure),
            'E' => Some(Self::Enroute),
            _ => None,
        }
    }

    /// Data-file marker character for this kind
    pub fn marker(&self) -> Option<char> {
        match self {
            Self::Awos => Some('W'),
            Self::Atis => Some('I'),
            Self::Ground => Some('G'),
            Self::Tower => Some('T'),
            Self::Approach => Some('A'),
            Self::Departure => Some('D'),
            Self::Enroute => Some('E'),
            Self::Invalid => None,
        }
    }

    /// Whether this kind only broadcasts and never holds a dialogue
    pub fn is_broadcast(&self) -> bool {
        matches!(self, Self::Awos | Self::Atis)
    }

    /// Range used when a record does not specify one (nautical miles)
    pub fn default_range_nm(&self) -> u16 {
        match self {
            Self::Awos | Self::Atis => 30,
            Self::Ground => 5,
            Self::Tower => 15,
            Self::Approach | Self::Departure => 40,
            Self::Enroute => 150,
            Self::Invalid => 0,
        }
    }
}

impl fmt::Display for StationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StationKind {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.chars().count() == 1 {
            let marker = s.chars().next().ok_or(RecordError::Empty)?;
            return Self::from_marker(marker).ok_or(RecordError::UnknownKind(marker));
        }
        Self::TUNABLE
            .iter()
            .chain(std::iter::once(&Self::Invalid))
            .find(|k| k.name().eq_ignore_ascii_case(s))
            .copied()
            .ok_or_else(|| RecordError::UnknownKind(s.chars().next().unwrap_or(' ')))
    }
}

/// Aircraft category, from light single-engine to military jet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlaneCategory {
    #[default]
    Unknown,
    GaSingle,
    GaHpSingle,
    GaTwin,
    GaJet,
    Medium,
    Heavy,
    MilJet,
}

impl PlaneCategory {
    /// Returns the stable upper-case name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Unknown => "UNKNOWN",
            Self::GaSingle => "GA_SINGLE",
            Self::GaHpSingle => "GA_HP_SINGLE",
            Self::GaTwin => "GA_TWIN",
            Self::GaJet => "GA_JET",
            Self::Medium => "MEDIUM",
            Self::Heavy => "HEAVY",
            Self::MilJet => "MIL_JET",
        }
    }

    /// Parse a category name, falling back to `Unknown` with a warning
    pub fn parse_lenient(s: &str) -> Self {
        const ALL: [PlaneCategory; 8] = [
            PlaneCategory::Unknown,
            PlaneCategory::GaSingle,
            PlaneCategory::GaHpSingle,
            PlaneCategory::GaTwin,
            PlaneCategory::GaJet,
            PlaneCategory::Medium,
            PlaneCategory::Heavy,
            PlaneCategory::MilJet,
        ];
        match ALL.iter().find(|c| c.name().eq_ignore_ascii_case(s.trim())) {
            Some(category) => *category,
            None => {
                warn!("Unknown plane category {:?}, treating as UNKNOWN", s);
                Self::Unknown
            }
        }
    }

    /// Suffix used by controllers for heavy aircraft
    pub fn callsign_suffix(&self) -> &'static str {
        match self {
            Self::Heavy => " heavy",
            _ => "",
        }
    }
}

impl fmt::Display for PlaneCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// ATC-centric details of an aircraft under a station's handling
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaneRecord {
    /// Aircraft category
    pub category: PlaneCategory,
    /// Callsign
    pub callsign: String,
    /// Transponder code
    pub squawk: u16,
}

impl PlaneRecord {
    /// Create a plane record
    pub fn new(category: PlaneCategory, callsign: impl Into<String>, squawk: u16) -> Self {
        Self {
            category,
            callsign: callsign.into(),
            squawk,
        }
    }

    /// Callsign as a controller would address the aircraft
    pub fn spoken_callsign(&self) -> String {
        format!("{}{}", self.callsign, self.category.callsign_suffix())
    }
}

impl Default for PlaneRecord {
    fn default() -> Self {
        Self::new(PlaneCategory::GaSingle, "N123AB", 1200)
    }
}

/// Core data describing one ATC station
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationRecord {
    /// Station kind
    pub kind: StationKind,
    /// Geodetic position
    pub position: GeodeticPosition,
    /// Cartesian (ECEF) position derived from `position`
    pub cartesian: DVec3,
    /// Frequency as a channel key (tens of kHz)
    pub channel_key: u32,
    /// Broadcast range in nautical miles
    pub range_nm: u16,
    /// Identifier, typically the airport code
    pub ident: String,
    /// Name spoken in transmissions
    pub name: String,
}

impl StationRecord {
    /// Build a record, deriving the Cartesian position and channel key
    ///
    /// `freq` may be in MHz or already a channel key.
    pub fn new(
        kind: StationKind,
        position: GeodeticPosition,
        freq: f64,
        range_nm: u16,
        ident: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            cartesian: position.to_cartesian(),
            position,
            channel_key: to_channel_key(freq),
            range_nm,
            ident: ident.into(),
            name: name.into(),
        }
    }

    /// Whether an ECEF position lies inside this station's broadcast range
    pub fn in_range(&self, cartesian: DVec3) -> bool {
        self.cartesian.distance(cartesian) <= f64::from(self.range_nm) * NM_TO_METRES
    }
}

impl FromStr for StationRecord {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_station_record(s)
    }
}

/// Pop the next whitespace-delimited token off the front of `rest`
fn next_token<'a>(rest: &mut &'a str) -> Option<&'a str> {
    let trimmed = rest.trim_start();
    if trimmed.is_empty() {
        *rest = trimmed;
        return None;
    }
    let end = trimmed.find(char::is_whitespace).unwrap_or(trimmed.len());
    let (token, tail) = trimmed.split_at(end);
    *rest = tail;
    Some(token)
}

fn parse_number(rest: &mut &str, field: &'static str) -> Result<f64, RecordError> {
    let token = next_token(rest).ok_or(RecordError::MissingField(field))?;
    let value: f64 = token.parse().map_err(|_| RecordError::InvalidNumber {
        field,
        value: token.to_string(),
    })?;
    if !value.is_finite() {
        return Err(RecordError::InvalidNumber {
            field,
            value: token.to_string(),
        });
    }
    Ok(value)
}

fn parse_name(rest: &str) -> Result<Option<String>, RecordError> {
    let rest = rest.trim();
    if rest.is_empty() {
        return Ok(None);
    }
    let name = match rest.strip_prefix('"') {
        Some(quoted) => {
            let end = quoted.find('"').ok_or(RecordError::UnterminatedName)?;
            &quoted[..end]
        }
        None => rest,
    };
    let name = name.trim();
    Ok((!name.is_empty()).then(|| name.to_string()))
}

/// Parse a single station record line
///
/// Either a fully populated record or an error is returned; a record is never
/// built from a partial line.
pub fn parse_station_record(line: &str) -> Result<StationRecord, RecordError> {
    let mut rest = line.trim();

    let kind_token = next_token(&mut rest).ok_or(RecordError::Empty)?;
    let mut chars = kind_token.chars();
    let marker = chars.next().ok_or(RecordError::Empty)?;
    if chars.next().is_some() {
        return Err(RecordError::UnknownKind(marker));
    }
    let kind = StationKind::from_marker(marker).ok_or(RecordError::UnknownKind(marker))?;

    let lat = parse_number(&mut rest, "latitude")?;
    let lon = parse_number(&mut rest, "longitude")?;
    let elevation_ft = parse_number(&mut rest, "elevation")?;
    let position = GeodeticPosition::from_deg_ft(lat, lon, elevation_ft);
    if !position.is_valid() {
        return Err(RecordError::OutOfRange {
            field: "position",
            value: format!("{lat}, {lon}"),
        });
    }

    let freq = parse_number(&mut rest, "frequency")?;
    if freq <= 0.0 {
        return Err(RecordError::OutOfRange {
            field: "frequency",
            value: freq.to_string(),
        });
    }

    let range = parse_number(&mut rest, "range")?;
    if !(0.0..=f64::from(u16::MAX)).contains(&range) {
        return Err(RecordError::OutOfRange {
            field: "range",
            value: range.to_string(),
        });
    }
    let mut range_nm = range as u16;

    let ident = next_token(&mut rest)
        .ok_or(RecordError::MissingField("ident"))?
        .to_string();

    if range_nm == 0 {
        range_nm = kind.default_range_nm();
        warn!(
            "No range given for {} {}, defaulting to {} nm",
            ident, kind, range_nm
        );
    }

    let name = match parse_name(rest)? {
        Some(name) => name,
        None => {
            warn!("No name given for {} {}, using identifier", ident, kind);
            ident.clone()
        }
    };

    Ok(StationRecord::new(kind, position, freq, range_nm, ident, name))
}

/// Iterator over the station records in a data stream
///
/// Blank lines, `#` comments and `[` section markers are skipped. Each item
/// carries the 1-based line number alongside the parse result so callers can
/// report and discard bad lines.
pub struct RecordReader<R> {
    reader: R,
    line_no: usize,
    buf: String,
}

impl<R: BufRead> RecordReader<R> {
    /// Wrap a buffered reader
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line_no: 0,
            buf: String::new(),
        }
    }
}

impl<R: BufRead> Iterator for RecordReader<R> {
    type Item = (usize, Result<StationRecord, RecordError>);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buf.clear();
            match self.reader.read_line(&mut self.buf) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(e) => {
                    warn!("Station data read failed after line {}: {}", self.line_no, e);
                    return None;
                }
            }
            self.line_no += 1;

            let line = self.buf.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with('[') {
                debug!("Skipping line {}", self.line_no);
                continue;
            }
            return Some((self.line_no, parse_station_record(line)));
        }
    }
}
