mod catalog;
mod config;
mod predict;
mod radio;
mod rotator;
mod tracker;
mod web;
mod wire;

use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chrono::Utc;
use clap::{Parser, Subcommand};
use thiserror::Error;

use crate::catalog::SatelliteCatalog;
use crate::config::{Config, ConfigError};
use crate::predict::tle_fetch::CUBESAT_FEED_URL;
use crate::predict::{download_tles, ElementsSource, OrbitalPredictor, PredictError, Sgp4Predictor, TleLoader};
use crate::rotator::{ActuatorClient, Axis, RotatorError};
use crate::tracker::{
    Directive, OperatorConsole, RotorPair, Shutdown, TrackerError,
    TrackingController,
};

#[derive(Parser)]
#[command(name = "groundtrack")]
#[command(about = "Satellite tracking for a split az/el rotor and an SDR tuner")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the tracking loop
    Track {
        #[arg(short, long)]
        config: PathBuf,
        /// Satellite to track in addition to the configured ones
        #[arg(short, long = "satellite")]
        satellites: Vec<String>,
        /// Rotor directive to start with: p, P, Q or q
        #[arg(short, long)]
        directive: Option<String>,
    },
    /// Print the next pass of a satellite over the station
    Pass {
        #[arg(short, long)]
        config: PathBuf,
        name: String,
    },
    /// Download the orbital element feed to the configured file
    UpdateTles {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Validate the configuration and probe the radio
    Check {
        #[arg(short, long)]
        config: PathBuf,
    },
}

#[derive(Debug, Error)]
enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),
    #[error("{0}")]
    Predict(#[from] PredictError),
    #[error("{0}")]
    Rotator(#[from] RotatorError),
    #[error("{0}")]
    Tracker(#[from] TrackerError),
    #[error("{0}")]
    Usage(String),
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match until_interrupted(run(cli.command), tokio::signal::ctrl_c()).await {
        Ok(Finished::Completed) => ExitCode::SUCCESS,
        Ok(Finished::Interrupted) => {
            println!("\nInterrupted. Shutting down.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Commands) -> Result<(), CliError> {
    match command {
        Commands::Track {
            config,
            satellites,
            directive,
        } => track(&config, &satellites, directive.as_deref()).await,
        Commands::Pass { config, name } => pass(&config, &name),
        Commands::UpdateTles { config } => update_tles(&config).await,
        Commands::Check { config } => check(&config).await,
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Finished {
    Completed,
    Interrupted,
}

/// Runs `work` until it finishes or `interrupt` fires, whichever is first.
/// Covers startup too: connection retries and the first operator prompts.
async fn until_interrupted<W, I>(work: W, interrupt: I) -> Result<Finished, CliError>
where
    W: Future<Output = Result<(), CliError>>,
    I: Future<Output = io::Result<()>>,
{
    let interrupt = async {
        if let Err(e) = interrupt.await {
            log::warn!("Cannot listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        result = work => result.map(|()| Finished::Completed),
        () = interrupt => Ok(Finished::Interrupted),
    }
}

async fn track(
    path: &Path,
    satellites: &[String],
    directive: Option<&str>,
) -> Result<(), CliError> {
    let config = Config::from_file(path)?;
    let station = config.ground_station()?;
    let directive = directive
        .map(|key| {
            Directive::from_key(key)
                .ok_or_else(|| CliError::Usage(format!("unknown directive {:?}", key)))
        })
        .transpose()?;

    if config.tle.refresh_on_start {
        refresh_tles(&config).await;
    }
    let catalog = SatelliteCatalog::new(Box::new(TleLoader::from_file(&config.tle.file)?));

    let policy = config.retry_policy();
    let io_timeout = config.rotator.io_timeout;
    let rotor = RotorPair {
        azimuth: ActuatorClient::connect(
            Axis::Azimuth,
            &config.rotator.azimuth.host,
            config.rotator.azimuth.port,
            policy,
            io_timeout,
        )
        .await?,
        elevation: ActuatorClient::connect(
            Axis::Elevation,
            &config.rotator.elevation.host,
            config.rotator.elevation.port,
            policy,
            io_timeout,
        )
        .await?,
    };

    let radio = config.radio_client();
    if let Some(mode) = &config.radio.mode {
        if let Err(e) = radio.set_mode(mode).await {
            log::warn!("Could not set radio mode {}: {}", mode, e);
        }
    }

    let window = chrono::Duration::from_std(config.tracking.pass_search_window)
        .map_err(|e| CliError::Usage(format!("pass search window: {}", e)))?;
    let mut controller = TrackingController::new(
        station,
        catalog,
        Sgp4Predictor::with_search_window(window),
        rotor,
        radio,
        OperatorConsole::stdin(),
        config.tracking_settings(),
    );

    for entry in &config.satellites {
        if let Err(e) =
            controller.add_satellite(&entry.name, Some(entry.metadata.clone()), entry.frequency_hz)
        {
            log::warn!("Skipping configured satellite {}: {}", entry.name, e);
        }
    }
    for name in satellites {
        if let Err(e) = controller.add_satellite(name, None, None) {
            log::warn!("Skipping {}: {}", name, e);
        }
    }
    if controller.catalog().is_empty() {
        controller.choose_initial_satellite().await?;
    }
    match directive {
        Some(directive) => controller.set_directive(directive),
        None => {
            controller.choose_initial_directive().await?;
        }
    }

    if let Some(web) = &config.web {
        let bind = web.bind.clone();
        let status = controller.status_handle();
        tokio::spawn(async move {
            if let Err(e) = web::run_server(&bind, status).await {
                log::error!("Status server on {} stopped: {}", bind, e);
            }
        });
    }

    match controller.run().await {
        Shutdown::Quit => println!("Exiting."),
        Shutdown::Parked => println!("Rotor parked. Exiting."),
    }
    Ok(())
}

fn pass(path: &Path, name: &str) -> Result<(), CliError> {
    let config = Config::from_file(path)?;
    let station = config.ground_station()?;
    let mut catalog = SatelliteCatalog::new(Box::new(TleLoader::from_file(&config.tle.file)?));
    if !catalog.add(name, None) {
        return Err(PredictError::UnknownSatellite(name.to_string()).into());
    }
    let record = catalog
        .get(name)
        .ok_or_else(|| PredictError::UnknownSatellite(name.to_string()))?;

    let window = chrono::Duration::from_std(config.tracking.pass_search_window)
        .map_err(|e| CliError::Usage(format!("pass search window: {}", e)))?;
    let predictor = Sgp4Predictor::with_search_window(window);
    let now = Utc::now();
    let pass = predictor.next_pass(&station, record, now)?;

    println!("{} over {}", record.name, station.name);
    println!(
        "  AOS: {}  AZ {:.1}",
        pass.rise_time.format("%Y-%m-%d %H:%M:%S UTC"),
        pass.rise_azimuth_deg
    );
    println!(
        "  TCA: {}  EL {:.1}",
        pass.peak_time.format("%Y-%m-%d %H:%M:%S UTC"),
        pass.peak_elevation_deg
    );
    println!(
        "  LOS: {}  AZ {:.1}",
        pass.set_time.format("%Y-%m-%d %H:%M:%S UTC"),
        pass.set_azimuth_deg
    );
    if let Ok(duration) = pass.duration().to_std() {
        println!("  Duration: {}", humantime::format_duration(duration));
    }
    Ok(())
}

async fn update_tles(path: &Path) -> Result<(), CliError> {
    let config = Config::from_file(path)?;
    let url = config.tle.url.as_deref().unwrap_or(CUBESAT_FEED_URL);
    let count = download_tles(url, &config.tle.file, config.tle.download_timeout).await?;
    println!("Saved {} element sets to {}", count, config.tle.file.display());
    Ok(())
}

async fn check(path: &Path) -> Result<(), CliError> {
    let config = Config::from_file(path)?;
    let station = config.ground_station()?;
    println!(
        "Station {} at {:.5}, {:.5} ({} m)",
        station.name, station.latitude_deg, station.longitude_deg, station.altitude_m
    );

    let loader = TleLoader::from_file(&config.tle.file)?;
    println!("{} element sets in {}", loader.len(), config.tle.file.display());
    let mut unresolved = 0;
    for entry in &config.satellites {
        let name = catalog::defaults::canonical_name(&entry.name);
        match loader.resolve(&name) {
            Some(elements) => println!("  {}: NORAD {}", name, elements.norad_id()),
            None => {
                println!("  {}: not found", name);
                unresolved += 1;
            }
        }
    }

    let radio = config.radio_client();
    match radio.get_frequency().await {
        Ok(hz) => {
            let mode = radio.get_mode().await.unwrap_or_else(|_| "?".to_string());
            let level = radio
                .get_signal_level()
                .await
                .map(|l| format!("{:.1}", l))
                .unwrap_or_else(|_| "?".to_string());
            println!("Radio at {}: {} Hz, mode {}, level {}", radio.endpoint(), hz, mode, level);
        }
        Err(e) => println!("Radio at {} unreachable: {}", radio.endpoint(), e),
    }

    if unresolved > 0 {
        return Err(CliError::Usage(format!(
            "{} configured satellites have no orbital elements",
            unresolved
        )));
    }
    Ok(())
}

/// Startup refresh; a failed download falls back to the file on disk.
async fn refresh_tles(config: &Config) {
    let Some(url) = config.tle.url.as_deref() else {
        return;
    };
    if let Err(e) = download_tles(url, &config.tle.file, config.tle.download_timeout).await {
        log::warn!("Using existing {}: {}", config.tle.file.display(), e);
    }
}
