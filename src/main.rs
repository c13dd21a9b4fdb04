use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use autocita::applicant::Applicant;
use autocita::browser::BrowserTransport;
use autocita::config::{Backend, Config};
use autocita::distance::{DistanceCache, DistanceLookup, DistanceMatrixClient, DistanceResolver};
use autocita::errors::ValidationError;
use autocita::machine::BookingEngine;
use autocita::tables::Tables;
use autocita::transport::{HttpTransport, Transport};
use autocita::verify::{StdinVerification, VerificationGate};

#[derive(Parser)]
#[command(name = "autocita")]
#[command(about = "Automated appointment booking for the cita previa wizard", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path of the configuration file
    #[arg(short, long, global = true, default_value = "config.toml")]
    config: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the booking loop until an appointment is recorded
    Run,
    /// Precompute travel distances to every known office and cache them
    Distances,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;
    let tables = Tables::builtin();

    match cli.command {
        Commands::Run => run(config, tables).await,
        Commands::Distances => precompute_distances(config, tables).await,
    }
}

async fn run(config: Config, tables: Tables) -> Result<()> {
    let applicant = match Applicant::from_raw(&config.applicant, &tables) {
        Ok(applicant) => applicant,
        Err(ValidationError::CountryNotFound(code)) => {
            eprintln!("Country code {code} not found. Valid country codes:");
            for (code, name) in tables.countries.iter() {
                eprintln!("  {code}: {name}");
            }
            bail!("invalid country code");
        }
        Err(ValidationError::ProcedureNotFound(code)) => {
            eprintln!("Procedure code {code} not found. Valid procedure codes:");
            for (code, name) in tables.procedures.iter() {
                eprintln!("  {code}: {name}");
            }
            bail!("invalid procedure code");
        }
        Err(e) => return Err(e).context("invalid applicant data"),
    };

    let (shutdown_tx, mut shutdown) = tokio::sync::watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, stopping after the current step");
            let _ = shutdown_tx.send(true);
        }
    });

    let cache = Arc::new(DistanceCache::load(config.app.distance_cache.clone()));
    let resolver = DistanceResolver::new(DistanceMatrixClient::new(&config.app.maps_api_key)?, cache);
    let gate = VerificationGate::new(StdinVerification);
    let cooldown = Duration::from_secs(config.app.cooldown_minutes * 60);

    let code = match config.app.backend {
        Backend::Http => {
            let transport = HttpTransport::new(&config.app.base_url)?;
            book(transport, resolver, gate, applicant, tables, cooldown, &mut shutdown).await?
        }
        Backend::Browser => {
            let transport =
                BrowserTransport::new(config.app.webdriver_url.clone(), &config.app.base_url, true)?;
            book(transport, resolver, gate, applicant, tables, cooldown, &mut shutdown).await?
        }
    };

    println!("Appointment recorded. Confirmation code: {code}");
    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn book<T: Transport, L: DistanceLookup>(
    transport: T,
    resolver: DistanceResolver<L>,
    gate: VerificationGate<StdinVerification>,
    applicant: Applicant,
    tables: Tables,
    cooldown: Duration,
    shutdown: &mut tokio::sync::watch::Receiver<bool>,
) -> Result<String> {
    let mut engine = BookingEngine::new(transport, resolver, gate, applicant, tables, cooldown);
    engine
        .run(shutdown)
        .await
        .context("booking flow terminated")
}

/// Walk the known-office table in API-sized chunks and persist every
/// routable distance to the cache file.
async fn precompute_distances(config: Config, tables: Tables) -> Result<()> {
    let origin = config.applicant.address.trim().to_string();
    if origin.is_empty() {
        bail!("applicant address is empty; nothing to measure from");
    }

    let client = DistanceMatrixClient::new(&config.app.maps_api_key)?;
    let names: Vec<String> = tables.offices.iter().map(|(_, n)| n.to_string()).collect();

    let mut distances = std::collections::HashMap::new();
    for chunk in names.chunks(client.batch_limit()) {
        distances.extend(client.lookup(&origin, chunk).await?);
    }

    let cache = DistanceCache::load(config.app.distance_cache.clone());
    cache.extend(&distances).await;
    info!(
        resolved = distances.len(),
        offices = names.len(),
        cache = %config.app.distance_cache.display(),
        "distance cache updated"
    );
    Ok(())
}
