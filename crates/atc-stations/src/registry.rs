//! Station registry
//!
//! Owns every station built from the data file, drives their per-tick update
//! and relays UI selections and radio traffic to the right instance.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use atc_core::{
    CaptionSink, GeodeticPosition, RecordReader, Station, StationConfig, StationEvent,
    StationKind, StationRecord,
};
use tracing::{debug, info, warn};

use crate::environment::Environment;
use crate::error::RegistryError;
use crate::build_station;

/// Unique identifier for a station in the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StationHandle(pub u32);

impl StationHandle {
    /// Get the raw handle value
    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

/// Events emitted by the registry
#[derive(Debug, Clone, PartialEq)]
pub enum RegistryEvent {
    /// A station was added
    StationAdded(StationHandle),
    /// A station was removed
    StationRemoved(StationHandle),
    /// Activity reported by a station during a tick
    Station {
        handle: StationHandle,
        event: StationEvent,
    },
}

/// Outcome of loading a station data stream
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    /// Stations built and added
    pub loaded: usize,
    /// Lines that failed to parse or build
    pub skipped: usize,
}

type CaptionFactory = Box<dyn Fn() -> Box<dyn CaptionSink> + Send>;

/// The collection of live stations
pub struct StationRegistry {
    config: StationConfig,
    environment: Environment,
    stations: BTreeMap<StationHandle, Box<dyn Station>>,
    next_handle: u32,
    captions: Option<CaptionFactory>,
    event_buffer: Vec<RegistryEvent>,
}

impl std::fmt::Debug for StationRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StationRegistry")
            .field("stations", &self.stations.len())
            .field("next_handle", &self.next_handle)
            .field("has_captions", &self.captions.is_some())
            .finish()
    }
}

impl Default for StationRegistry {
    fn default() -> Self {
        Self::new(StationConfig::default(), Environment::default())
    }
}

impl StationRegistry {
    /// Create an empty registry; stations added later share `config` and
    /// `environment`
    pub fn new(config: StationConfig, environment: Environment) -> Self {
        Self {
            config,
            environment,
            stations: BTreeMap::new(),
            next_handle: 1,
            captions: None,
            event_buffer: Vec::new(),
        }
    }

    pub fn config(&self) -> &StationConfig {
        &self.config
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    /// Give each station added from now on its own caption sink
    pub fn set_caption_factory<F>(&mut self, factory: F)
    where
        F: Fn() -> Box<dyn CaptionSink> + Send + 'static,
    {
        self.captions = Some(Box::new(factory));
    }

    /// Build, initialise and add a station
    pub fn add_record(&mut self, record: StationRecord) -> Result<StationHandle, RegistryError> {
        let description = format!("{} {} ({})", record.ident, record.kind, record.name);
        let mut station = build_station(record, &self.config, &self.environment)?;
        if let Some(factory) = &self.captions {
            station.core_mut().render_mut().set_caption_sink(factory());
        }
        station.init()?;

        let handle = StationHandle(self.next_handle);
        self.next_handle += 1;
        self.stations.insert(handle, station);

        self.event_buffer.push(RegistryEvent::StationAdded(handle));
        info!("Added station: {} (handle {})", description, handle.0);
        Ok(handle)
    }

    /// Add every record in a station data stream
    ///
    /// Lines that fail to parse, or stations that fail to build, are logged
    /// and skipped.
    pub fn load_records<R: BufRead>(&mut self, reader: R) -> LoadSummary {
        let mut summary = LoadSummary::default();
        for (line, result) in RecordReader::new(reader) {
            let added = result
                .map_err(RegistryError::from)
                .and_then(|record| self.add_record(record));
            match added {
                Ok(_) => summary.loaded += 1,
                Err(e) => {
                    warn!("Skipping station data line {}: {}", line, e);
                    summary.skipped += 1;
                }
            }
        }
        info!(
            "Loaded {} stations ({} lines skipped)",
            summary.loaded, summary.skipped
        );
        summary
    }

    /// Add every record in a station data file
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<LoadSummary, RegistryError> {
        let file = File::open(path.as_ref())?;
        debug!("Reading station data from {}", path.as_ref().display());
        Ok(self.load_records(BufReader::new(file)))
    }

    /// Remove a station, stopping anything it is presenting
    pub fn remove(&mut self, handle: StationHandle) -> Option<Box<dyn Station>> {
        let mut station = self.stations.remove(&handle)?;
        station.core_mut().cancel_transmission();
        self.event_buffer.push(RegistryEvent::StationRemoved(handle));
        Some(station)
    }

    pub fn get(&self, handle: StationHandle) -> Option<&dyn Station> {
        self.stations.get(&handle).map(|s| s.as_ref())
    }

    pub fn get_mut(&mut self, handle: StationHandle) -> Option<&mut (dyn Station + 'static)> {
        self.stations.get_mut(&handle).map(|s| s.as_mut())
    }

    /// Iterate over all stations in handle order
    pub fn stations(&self) -> impl Iterator<Item = (StationHandle, &dyn Station)> {
        self.stations.iter().map(|(h, s)| (*h, s.as_ref()))
    }

    pub fn handles(&self) -> Vec<StationHandle> {
        self.stations.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    /// Find a station by identifier (case-insensitive) and kind
    pub fn find(&self, ident: &str, kind: StationKind) -> Option<StationHandle> {
        self.stations
            .iter()
            .find(|(_, s)| s.kind() == kind && s.ident().eq_ignore_ascii_case(ident))
            .map(|(h, _)| *h)
    }

    /// Stations tuned to `channel_key`
    ///
    /// Stations sharing a frequency still keep their own occupancy state.
    pub fn stations_on(&self, channel_key: u32) -> Vec<StationHandle> {
        self.stations
            .iter()
            .filter(|(_, s)| s.core().channel_key() == channel_key)
            .map(|(h, _)| *h)
            .collect()
    }

    /// Stations whose broadcast range covers `position`
    pub fn stations_in_range(&self, position: &GeodeticPosition) -> Vec<StationHandle> {
        let cartesian = position.to_cartesian();
        self.stations
            .iter()
            .filter(|(_, s)| s.core().record().in_range(cartesian))
            .map(|(h, _)| *h)
            .collect()
    }

    /// Advance every station by `dt` seconds
    pub fn tick(&mut self, dt: f64) {
        for (handle, station) in self.stations.iter_mut() {
            station.update(dt);
            self.event_buffer.extend(
                station
                    .core_mut()
                    .drain_events()
                    .into_iter()
                    .map(|event| RegistryEvent::Station {
                        handle: *handle,
                        event,
                    }),
            );
        }
    }

    /// Relay a UI selection to a station
    pub fn select(&mut self, handle: StationHandle, code: i32) -> Result<(), RegistryError> {
        let station = self
            .stations
            .get_mut(&handle)
            .ok_or(RegistryError::StationNotFound(handle))?;
        debug!("UI selection {} for {} {}", code, station.ident(), station.kind());
        station.handle_ui_selection(code);
        Ok(())
    }

    /// Relay a UI selection to the station with this identifier and kind
    pub fn select_by_ident(
        &mut self,
        ident: &str,
        kind: StationKind,
        code: i32,
    ) -> Result<StationHandle, RegistryError> {
        let handle = self
            .find(ident, kind)
            .ok_or_else(|| RegistryError::NoSuchStation {
                ident: ident.to_string(),
                kind,
            })?;
        self.select(handle, code)?;
        Ok(handle)
    }

    /// Another aircraft has keyed up on `channel_key`
    ///
    /// Every station on that frequency hears it. Returns how many did.
    pub fn transmission_started(&mut self, channel_key: u32) -> usize {
        self.on_channel(channel_key, |station| station.core_mut().mark_channel_in_use())
    }

    /// The transmission from `requester` on `channel_key` has ended
    pub fn transmission_finished(&mut self, channel_key: u32, requester: &str) -> usize {
        self.on_channel(channel_key, |station| {
            station.notify_transmission_finished(requester)
        })
    }

    fn on_channel<F>(&mut self, channel_key: u32, mut f: F) -> usize
    where
        F: FnMut(&mut dyn Station),
    {
        let mut count = 0;
        for station in self.stations.values_mut() {
            if station.core().channel_key() == channel_key {
                f(station.as_mut());
                count += 1;
            }
        }
        count
    }

    /// Take all buffered events
    pub fn drain_events(&mut self) -> Vec<RegistryEvent> {
        std::mem::take(&mut self.event_buffer)
    }
}
