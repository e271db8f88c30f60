//! ATC Station Simulator
//!
//! Loads a station data file and drives every station at a fixed tick,
//! printing captions as the stations talk. UI selections can be scheduled
//! from the command line to play out a dialogue with a controller.

mod captions;
mod cli;
mod settings;

use std::future::Future;
use std::time::Duration;

use anyhow::Context;
use atc_core::{format_channel_key, Station, StationEvent};
use atc_stations::{RegistryEvent, StationRegistry};
use clap::Parser;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use captions::TerminalCaptions;
use cli::{Args, ScheduledSelection};
use settings::SimSettings;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "atc_sim=info,atc_core=info,atc_stations=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("Starting ATC station simulator");

    let args = Args::parse();

    let mut settings = match &args.settings {
        Some(path) => SimSettings::load(path)
            .with_context(|| format!("loading settings from {}", path.display()))?,
        None => SimSettings::default(),
    };
    if let Some(tick_ms) = args.tick_ms {
        settings.tick_ms = tick_ms;
    }

    let mut registry = StationRegistry::new(settings.station.clone(), settings.environment.clone());
    let captions = TerminalCaptions::stdout();
    registry.set_caption_factory(move || Box::new(captions.clone()));

    let summary = registry
        .load_file(&args.stations)
        .with_context(|| format!("loading stations from {}", args.stations.display()))?;
    if summary.loaded == 0 {
        warn!("No stations loaded from {}", args.stations.display());
    }

    let mut selections = args.select.clone();
    selections.sort_by(|a, b| a.at_secs.total_cmp(&b.at_secs));

    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Ctrl-C handler unavailable: {}", e);
            std::future::pending::<()>().await;
        }
    };
    let elapsed = run(
        &mut registry,
        settings.tick_secs(),
        args.duration,
        selections,
        ctrl_c,
    )
    .await;
    info!("Stopped after {:.1}s", elapsed);

    report(&registry);
    Ok(())
}

/// Tick the registry until the duration elapses or `shutdown` completes
///
/// Returns the simulated time reached.
async fn run(
    registry: &mut StationRegistry,
    dt: f64,
    duration: Option<f64>,
    selections: Vec<ScheduledSelection>,
    shutdown: impl Future<Output = ()>,
) -> f64 {
    let mut interval = tokio::time::interval(Duration::from_secs_f64(dt));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    let mut pending = selections.into_iter().peekable();
    let mut elapsed = 0.0;
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = interval.tick() => {}
            _ = &mut shutdown => {
                info!("Interrupted at {:.1}s", elapsed);
                break;
            }
        }

        while let Some(sel) = pending.next_if(|s| s.at_secs <= elapsed) {
            match registry.select_by_ident(&sel.ident, sel.kind, sel.code) {
                Ok(handle) => debug!("Selection {} sent to station {}", sel.code, handle.as_u32()),
                Err(e) => warn!("Selection at {:.1}s failed: {}", sel.at_secs, e),
            }
        }

        registry.tick(dt);
        elapsed += dt;

        for event in registry.drain_events() {
            log_event(&event);
        }

        if duration.is_some_and(|d| elapsed >= d) {
            break;
        }
    }
    elapsed
}

fn log_event(event: &RegistryEvent) {
    match event {
        RegistryEvent::Station {
            handle,
            event: StationEvent::TransmissionDropped { message, reason, at },
        } => {
            debug!(
                "Station {} dropped {:?} at {:.1}s: {:?}",
                handle.as_u32(),
                message,
                at,
                reason
            );
        }
        other => debug!("{:?}", other),
    }
}

/// Log the final state of every station
fn report(registry: &StationRegistry) {
    for (handle, station) in registry.stations() {
        let core = station.core();
        let handled: Vec<&str> = core.planes().iter().map(|p| p.callsign.as_str()).collect();
        info!(
            "{:>3} {:<10} {:<4} {:>7} MHz  channel {:<9} planes [{}]",
            handle.as_u32(),
            station.kind().name(),
            station.ident(),
            format_channel_key(core.channel_key()),
            core.channel_status().name(),
            handled.join(", ")
        );
    }
}
