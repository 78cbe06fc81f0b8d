//! Coindetect Gateway main application

use std::f64::consts::PI;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use rand::Rng;
use tokio::signal;
use tracing::{error, info};

use coindetect_gateway::{
    config::CoinDetectConfig,
    core::{ChannelCoinSession, Direction},
    services::{CoinEvent, CoinMonitorService},
    utils::setup_logging,
    Result,
};

#[derive(Parser)]
#[command(name = "coindetect-gateway")]
#[command(about = "Payphone coin deposit detection service")]
#[command(version = coindetect_gateway::VERSION)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the coin monitor service
    Start,
    /// Validate configuration
    ValidateConfig,
    /// Generate default configuration
    GenerateConfig {
        /// Output file path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Run a synthetic deposit signal through a detection session
    Simulate {
        /// Number of coin deposits to synthesize
        #[arg(long, default_value_t = 5)]
        coins: u32,

        /// Sample rate of the synthetic audio path
        #[arg(long, default_value_t = 8000)]
        sample_rate: u32,

        /// Peak amplitude of additive noise, in i16 units
        #[arg(long, default_value_t = 500)]
        noise: i16,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_configuration(&cli)?;

    setup_logging(&config.logging)?;

    info!("Starting {} v{}", coindetect_gateway::NAME, coindetect_gateway::VERSION);

    match &cli.command {
        Some(Commands::Start) | None => run_monitor(config).await,
        Some(Commands::ValidateConfig) => validate_configuration(&config),
        Some(Commands::GenerateConfig { output }) => generate_default_config(output.clone()),
        Some(Commands::Simulate { coins, sample_rate, noise }) => {
            simulate_deposits(&config, *coins, *sample_rate, *noise)
        }
    }
}

fn load_configuration(cli: &Cli) -> Result<CoinDetectConfig> {
    let config = if let Some(config_path) = &cli.config {
        CoinDetectConfig::load_from_file(config_path)?
    } else {
        match CoinDetectConfig::load_from_env() {
            Ok(config) => config,
            Err(_) => CoinDetectConfig::default_config(),
        }
    };

    config.validate()?;
    Ok(config)
}

async fn run_monitor(config: CoinDetectConfig) -> Result<()> {
    let mut service = CoinMonitorService::new(config.detector.clone(), config.general.max_sessions);

    let mut event_rx = service
        .take_event_receiver()
        .ok_or_else(|| coindetect_gateway::Error::internal("Failed to get event receiver"))?;

    service.start().await?;
    info!("Coin monitor ready, node {}", config.general.node_id);

    let service = Arc::new(tokio::sync::Mutex::new(service));
    let service_shutdown = Arc::clone(&service);

    let event_task = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            handle_coin_event(event);
        }
    });

    let shutdown_task = tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => {
                info!("Received Ctrl+C, shutting down gracefully");
                let mut service = service_shutdown.lock().await;
                if let Err(e) = service.stop().await {
                    error!("Error during shutdown: {}", e);
                }
            }
            Err(err) => {
                error!("Unable to listen for shutdown signal: {}", err);
            }
        }
    });

    tokio::select! {
        _ = event_task => {
            info!("Event handling completed");
        }
        _ = shutdown_task => {
            info!("Shutdown signal received");
        }
    }

    let mut service = service.lock().await;
    if service.is_running() {
        service.stop().await?;
    }

    info!("Coindetect Gateway shutdown complete");
    Ok(())
}

fn handle_coin_event(event: CoinEvent) {
    match event {
        CoinEvent::Started => {
            info!("Coin monitor started");
        }
        CoinEvent::SessionCreated { call_id } => {
            info!("Monitoring call {}", call_id);
        }
        CoinEvent::CoinDetected { call_id, direction, total } => {
            info!("Coin deposit on call {} ({}): total {}", call_id, direction, total);
        }
        CoinEvent::SessionEnded { call_id, rx_coins, tx_coins } => {
            info!("Call {} ended: rx={} tx={}", call_id, rx_coins, tx_coins);
        }
    }
}

fn validate_configuration(config: &CoinDetectConfig) -> Result<()> {
    config.validate()?;

    println!("✓ Configuration is valid");
    println!("  Node ID: {}", config.general.node_id);
    println!(
        "  Tone pair: {} Hz / {} Hz",
        config.detector.tone_a_freq, config.detector.tone_b_freq
    );
    println!("  Block rate: {} blocks/s", config.detector.block_rate);
    println!("  Threshold: {}", config.detector.threshold);
    println!("  Max sessions: {}", config.general.max_sessions);

    Ok(())
}

fn generate_default_config(output_path: Option<PathBuf>) -> Result<()> {
    let config = CoinDetectConfig::default_config();
    let toml_content = toml::to_string_pretty(&config)
        .map_err(|e| coindetect_gateway::Error::internal(format!("Failed to serialize config: {}", e)))?;

    match output_path {
        Some(path) => {
            std::fs::write(&path, toml_content)?;
            println!("✓ Default configuration written to: {}", path.display());
        }
        None => {
            println!("{}", toml_content);
        }
    }

    Ok(())
}

/// Synthesize a payphone deposit sequence and run it through one session.
fn simulate_deposits(
    config: &CoinDetectConfig,
    coins: u32,
    sample_rate: u32,
    noise: i16,
) -> Result<()> {
    let rate = sample_rate as f64;
    let burst_len = (rate * 0.1) as usize; // 100 ms tone per deposit
    let gap_len = (rate * 0.2) as usize; // 200 ms between deposits

    let mut rng = rand::thread_rng();
    let mut signal: Vec<i16> = Vec::with_capacity((burst_len + gap_len) * coins as usize);

    for _ in 0..coins {
        let offset = signal.len();
        for i in 0..burst_len {
            let t = (offset + i) as f64 / rate;
            let a = 8000.0 * (2.0 * PI * config.detector.tone_a_freq * t).sin();
            let b = 8000.0 * (2.0 * PI * config.detector.tone_b_freq * t).sin();
            let n = rng.gen_range(-(noise as f64)..=noise as f64);
            signal.push((a + b + n) as i16);
        }
        for _ in 0..gap_len {
            signal.push(rng.gen_range(-noise..=noise));
        }
    }

    let mut session = ChannelCoinSession::new(&config.detector, sample_rate);
    for frame in signal.chunks(160) {
        session.process_frame(Direction::Rx, frame, sample_rate)?;
    }

    let detected = session.coins(Direction::Rx);
    println!("Synthesized {} deposits at {} Hz, detected {}", coins, sample_rate, detected);

    if detected != coins as u64 {
        error!("Detection mismatch: expected {}, got {}", coins, detected);
    }

    Ok(())
}
