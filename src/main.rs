//! Certified Bingo Draw CLI
//!
//! Runs one game, audits it and prints the fairness report (or the
//! verification export) as JSON.

use bingo_fairness::{
    audit::FairnessAuditor,
    engine::EntropyEngine,
    source::{FileConfig, OutputConfig},
};
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(name = "bingo-fairness", version, about = "Draw and audit a bingo game")]
struct Cli {
    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Smallest number that can be drawn
    #[arg(long)]
    min: Option<u32>,

    /// Largest number that can be drawn
    #[arg(long)]
    max: Option<u32>,

    /// Number of draws to perform
    #[arg(long)]
    draws: Option<u32>,

    /// Draw distinct numbers only
    #[arg(long)]
    unique: Option<bool>,

    /// Append the game log to this JSON-lines file
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Print the verification export instead of the fairness report
    #[arg(long)]
    export: bool,

    /// Include the complete seed in the export
    #[arg(long, requires = "export")]
    include_seed: bool,

    /// Serve metrics and verification records on this port after drawing
    #[arg(long, value_name = "PORT")]
    serve: Option<u16>,
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    info!("Certified bingo generator v{}", bingo_fairness::VERSION);

    let mut file_config = match &cli.config {
        Some(path) => match FileConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load config {}: {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => FileConfig::default(),
    };
    apply_overrides(&cli, &mut file_config);

    let mut engine = match EntropyEngine::new(file_config.engine.clone()) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("Failed to start game: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run_draws(&mut engine, &file_config.output) {
        eprintln!("Draw failed: {}", e);
        engine.flush_log();
        std::process::exit(1);
    }

    let auditor = FairnessAuditor::new(&engine, file_config.audit.clone());
    let output = if cli.export {
        serde_json::to_string_pretty(&auditor.export_verification_data(cli.include_seed))
    } else {
        serde_json::to_string_pretty(&auditor.generate_fairness_report())
    };

    match output {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Failed to serialize output: {}", e);
            engine.flush_log();
            std::process::exit(1);
        }
    }

    #[cfg(feature = "remote")]
    cross_verify(&auditor);

    let port = cli.serve.unwrap_or(file_config.output.server_port);
    if port != 0 {
        serve(&engine, &auditor, port);
    }

    engine.flush_log();
}

fn apply_overrides(cli: &Cli, config: &mut FileConfig) {
    if let Some(min) = cli.min {
        config.engine.min_value = min;
    }
    if let Some(max) = cli.max {
        config.engine.max_value = max;
    }
    if let Some(draws) = cli.draws {
        config.output.draws = draws;
    }
    if let Some(unique) = cli.unique {
        config.output.unique = unique;
    }
    if let Some(path) = &cli.log_file {
        config.engine.log_file = Some(path.clone());
    }
}

fn run_draws(
    engine: &mut EntropyEngine,
    output: &OutputConfig,
) -> Result<(), bingo_fairness::EngineError> {
    info!(
        game_id = engine.game_id(),
        draws = output.draws,
        unique = output.unique,
        source = engine.entropy_source(),
        "Drawing numbers"
    );

    if output.unique {
        engine.generate_unique_set(output.draws as usize)?;
    } else {
        for _ in 0..output.draws {
            engine.generate_number();
        }
    }

    info!(
        game_id = engine.game_id(),
        total = engine.draw_count(),
        elapsed_ms = engine.running_time_ms(),
        "Draws complete"
    );
    Ok(())
}

#[cfg(feature = "remote")]
fn cross_verify(auditor: &FairnessAuditor<'_>) {
    use bingo_fairness::remote::{CrossVerifier, HttpRemoteVerifier};
    use std::time::Duration;

    let remote = match HttpRemoteVerifier::from_config(auditor.config()) {
        Ok(Some(remote)) => remote,
        Ok(None) => return,
        Err(e) => {
            warn!("Remote verifier unavailable: {}", e);
            return;
        }
    };

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            warn!("Failed to start async runtime: {}", e);
            return;
        }
    };

    let verifier = CrossVerifier::new(
        remote,
        Duration::from_millis(auditor.config().remote_timeout_ms),
    );
    let results = runtime.block_on(verifier.verify_all(auditor));
    let confirmed = results.iter().filter(|r| r.remote == Some(true)).count();
    let failed = results.iter().filter(|r| !r.verified).count();
    info!(
        total = results.len(),
        confirmed, failed, "Remote cross-verification complete"
    );
}

#[cfg(feature = "server")]
fn serve(engine: &EntropyEngine, auditor: &FairnessAuditor<'_>, port: u16) {
    use bingo_fairness::metrics::{MetricsRegistry, MetricsServer, MetricsServerConfig};

    let registry = match MetricsRegistry::new() {
        Ok(registry) => registry,
        Err(e) => {
            warn!("Failed to create metrics registry: {}", e);
            return;
        }
    };

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            warn!("Failed to start async runtime: {}", e);
            return;
        }
    };

    let server = MetricsServer::new(MetricsServerConfig::with_port(port), registry);
    let report = auditor.generate_fairness_report();
    runtime.block_on(async {
        server.state().write().await.publish(engine, report);
        if let Err(e) = server.run().await {
            warn!("Verification server error: {}", e);
        }
    });
}

#[cfg(not(feature = "server"))]
fn serve(_engine: &EntropyEngine, _auditor: &FairnessAuditor<'_>, port: u16) {
    warn!(
        port,
        "Built without the `server` feature, not serving verification records"
    );
}
