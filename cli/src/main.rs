//! Utility billing service: CLI server
//!
//! Headless REST service for tariff management, bill issuance and payments,
//! suitable for a systemd unit, a container or a standalone process.
//!
//! ```sh
//! # Default config (~/.config/utility-billing/config.toml)
//! billing-service
//!
//! # Custom config path
//! billing-service --config /etc/utility-billing/config.toml
//!
//! # Throwaway instance without a database
//! billing-service --in-memory --api-port 8088
//!
//! # Validate config without starting
//! billing-service --check
//! ```

use std::path::PathBuf;

use clap::Parser;
use tracing::{error, info};

use utility_billing::config::{AppConfig, ConfigError};
use utility_billing::server::{init_tracing, ServerHandle, ServerOptions};

/// Tiered-tariff rating and bill composition service for electricity utilities.
#[derive(Parser, Debug)]
#[command(
    name = "billing-service",
    version,
    about = "Electricity billing service: slab tariffs, bills and payments",
    long_about = "REST API server that rates metered consumption against \
                  progressive slab tariffs, issues itemised bills and records payments.\n\n\
                  Default config: ~/.config/utility-billing/config.toml"
)]
struct Cli {
    /// Path to the configuration file (TOML).
    #[arg(short, long, env = "BILLING_CONFIG")]
    config: Option<PathBuf>,

    /// Override the REST API listen port.
    #[arg(long)]
    api_port: Option<u16>,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(short, long)]
    log_level: Option<String>,

    /// Keep all data in memory instead of the configured database.
    #[arg(long)]
    in_memory: bool,

    /// Validate the configuration file and exit without starting the server.
    #[arg(long)]
    check: bool,

    /// Skip database migrations on startup.
    #[arg(long)]
    no_migrate: bool,
}

impl Cli {
    fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(port) = self.api_port {
            config.server.api_port = port;
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
    }
}

fn print_summary(path: &std::path::Path, config: &AppConfig, in_memory: bool) {
    println!("Configuration is valid");
    println!("   Config file : {}", path.display());
    println!("   API address : {}", config.api_address());
    if in_memory {
        println!("   Storage     : in-memory");
    } else {
        println!("   Database    : {}", config.database.url);
    }
    println!("   Log level   : {}", config.logging.level);
    println!(
        "   Billing     : {} bills, due in {} days, late fee {} {}",
        config.billing.bill_number_prefix,
        config.billing.due_days,
        config.billing.late_fee,
        config.billing.currency
    );
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // ── Load configuration ─────────────────────────────────────
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(utility_billing::default_config_path);

    let loaded: Result<AppConfig, ConfigError> = AppConfig::load(&config_path);

    if cli.check {
        let mut config = loaded?;
        cli.apply_overrides(&mut config);
        config.validate()?;
        print_summary(&config_path, &config, cli.in_memory);
        return Ok(());
    }

    let (mut config, load_error) = match loaded {
        Ok(cfg) => (cfg, None),
        Err(e) => (AppConfig::default(), Some(e)),
    };
    cli.apply_overrides(&mut config);
    init_tracing(&config);

    match load_error {
        None => info!("Configuration loaded from {}", config_path.display()),
        Some(e) => {
            error!("Failed to load config from {}: {}", config_path.display(), e);
            error!("Using default configuration.");
        }
    }

    // ── Start server ───────────────────────────────────────────
    let handle = ServerHandle::start(ServerOptions {
        config,
        auto_migrate: !cli.no_migrate,
        in_memory: cli.in_memory,
    })
    .await?;

    handle.install_signal_handler();
    info!("Press Ctrl+C to shut down gracefully.");

    handle.shutdown_signal().wait().await;
    handle.wait().await;

    Ok(())
}
