//! # CIGI Image Generator - Main Entry Point
//!
//! Image generator host speaking CIGI with a Host over UDP. This entry point
//! handles CLI parsing, configuration loading and application lifecycle
//! management.
//!
//! ## Quick Start
//!
//! ```bash
//! # Run with default configuration
//! ig
//!
//! # Specify custom configuration
//! ig --config site.toml
//!
//! # Override specific settings
//! ig --bind 0.0.0.0:8004 --host 10.0.0.5:8005 --cigi-version 3.3 --log-level debug
//!
//! # JSON logging, stop after ten seconds at 60 Hz
//! ig --json-logs --frames 600
//! ```
//!
//! ## Configuration
//!
//! Configuration is read from a TOML file (default: `ig.toml`). If the file
//! doesn't exist, a default configuration is written and used.
//!
//! ## Signal Handling
//!
//! The image generator shuts down gracefully on:
//! - SIGINT (Ctrl+C)
//! - SIGTERM (Unix systems)

use tracing::error;

mod app;
mod cli;
mod config;
mod logging;
mod signals;
mod transport;

use app::Application;
use cli::CliArgs;

pub use config::{
    AppConfig, ByteOrderSetting, DefinitionsSettings, FrameSettings, HostSettings,
    LoggingSettings,
};
pub use transport::UdpHostTransport;

/// Runs the image generator.
///
/// 1. Command-line argument parsing
/// 2. Configuration loading and CLI overrides
/// 3. Logging system initialization
/// 4. Application creation and execution
///
/// # Exit Codes
///
/// * **0**: Successful execution and shutdown
/// * **1**: Error during startup, configuration, or runtime
pub async fn init() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    let mut config = match AppConfig::load_from_file(&args.config_path).await {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load {}: {e}", args.config_path.display());
            std::process::exit(1);
        }
    };
    if let Err(e) = args.apply_to(&mut config) {
        eprintln!("❌ {e}");
        std::process::exit(1);
    }

    if let Err(e) = logging::setup_logging(&config.logging) {
        eprintln!("❌ Failed to setup logging: {e}");
        std::process::exit(1);
    }

    match Application::new(config).await {
        Ok(app) => {
            if let Err(e) = app.run().await {
                error!("❌ Application error: {}", e);
                std::process::exit(1);
            }
        }
        Err(e) => {
            error!("❌ Failed to start application: {}", e);
            std::process::exit(1);
        }
    }

    Ok(())
}
