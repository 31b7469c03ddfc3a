//! Content Detector service
//!
//! Listens on a Unix socket for edit events from editors and streams
//! paragraph context extractions back.
//!
//! # Usage
//!
//! ```bash
//! # Start with defaults
//! content-detector
//!
//! # Start with custom config or socket
//! content-detector --config /path/to/config.toml
//! content-detector --socket /tmp/editor.sock --debounce-ms 300
//! ```

use content_detector::{Config, DetectorServer};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command line overrides
#[derive(Debug, Default)]
struct Args {
    config_path: Option<PathBuf>,
    socket_path: Option<PathBuf>,
    debounce_ms: Option<u64>,
    context_radius: Option<usize>,
}

/// Parse command line arguments
fn parse_args() -> Args {
    let args: Vec<String> = std::env::args().collect();
    let mut parsed = Args::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            "--version" | "-v" => {
                println!("Content Detector v{}", env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            "--config" | "-c" => {
                i += 1;
                if i < args.len() {
                    parsed.config_path = Some(PathBuf::from(&args[i]));
                }
            }
            "--socket" => {
                i += 1;
                if i < args.len() {
                    parsed.socket_path = Some(PathBuf::from(&args[i]));
                }
            }
            "--debounce-ms" => {
                i += 1;
                if i < args.len() {
                    if let Ok(ms) = args[i].parse() {
                        parsed.debounce_ms = Some(ms);
                    }
                }
            }
            "--radius" => {
                i += 1;
                if i < args.len() {
                    if let Ok(radius) = args[i].parse() {
                        parsed.context_radius = Some(radius);
                    }
                }
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                eprintln!("Use --help for usage information.");
                std::process::exit(1);
            }
        }
        i += 1;
    }

    parsed
}

fn print_help() {
    println!(
        r#"Content Detector - debounced paragraph context extraction

USAGE:
    content-detector [OPTIONS]

OPTIONS:
    -h, --help              Show this help message
    -v, --version           Show version
    -c, --config <PATH>     Path to config file
        --socket <PATH>     Unix socket to listen on
        --debounce-ms <MS>  Quiet period before extracting
        --radius <N>        Paragraphs of context on each side of the cursor

ENVIRONMENT:
    RUST_LOG                Overrides the configured log level
"#
    );
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = parse_args();

    let config_path = args
        .config_path
        .clone()
        .unwrap_or_else(Config::default_config_path);
    let mut config = Config::load_from_path(&config_path);

    if let Some(socket_path) = args.socket_path {
        config.server.socket_path = socket_path;
    }
    if let Some(ms) = args.debounce_ms {
        config.detection.debounce_delay_ms = ms;
    }
    if let Some(radius) = args.context_radius {
        config.detection.context_radius = radius;
    }

    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| config.general.log_level.clone()),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    info!("Starting Content Detector");
    info!("Configuration: {:?}", config_path);

    if !config.general.enabled {
        info!("Detector is disabled in configuration, exiting");
        return Ok(());
    }

    config.validate()?;
    info!(
        "Debounce {}ms, context radius {}, history {}",
        config.detection.debounce_delay_ms,
        config.detection.context_radius,
        config.detection.history_capacity
    );

    let server = DetectorServer::new(&config);

    // Handle shutdown gracefully
    tokio::select! {
        result = server.run() => {
            if let Err(e) = result {
                error!("Server error: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutting down...");
        }
    }

    // Clean up socket file
    if server.socket_path().exists() {
        std::fs::remove_file(server.socket_path())?;
    }

    Ok(())
}
