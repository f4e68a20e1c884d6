use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::utils::sanitize::mask_secret;
use crate::validation::SUPPORTED_CURRENCY;
use crate::wompi::signature;

#[derive(Parser)]
#[command(name = "wompi-checkout")]
#[command(about = "Wompi checkout - transaction submission and event webhook service", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server (default)
    Serve,

    /// Configuration validation
    Config,

    /// Compute the integrity signature for a transaction
    Sign {
        /// Order reference
        #[arg(value_name = "REFERENCE")]
        reference: String,

        /// Amount in minor currency units
        #[arg(value_name = "AMOUNT_IN_CENTS")]
        amount_in_cents: i64,

        #[arg(short, long, default_value = SUPPORTED_CURRENCY)]
        currency: String,
    },

    /// Compute the x-event-checksum header for a webhook body file
    SignWebhook {
        /// File holding the exact body bytes
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}

pub fn handle_config_validate(config: &Config) -> anyhow::Result<()> {
    tracing::info!("Validating configuration...");
    config.validate()?;

    println!("Configuration:");
    println!("  Server Port: {}", config.server_port);
    println!("  Wompi API URL: {}", config.wompi_api_url);
    println!("  Merchant: {}", config.wompi_public_key);
    println!("  Private Key: {}", mask_secret(&config.wompi_private_key));
    println!(
        "  Integrity Secret: {}",
        describe_secret(config.wompi_integrity_secret.as_deref())
    );
    println!("  Webhook Secret: {}", describe_secret(config.webhook_secret()));
    println!("  Frontend URL: {}", config.frontend_url);
    println!(
        "  Order Store: {}",
        if config.database_url.is_some() {
            "postgres"
        } else {
            "in-memory"
        }
    );

    if config.wompi_integrity_secret.is_none() {
        println!("⚠ WOMPI_INTEGRITY_SECRET is missing: checkouts will be refused");
    }

    tracing::info!("Configuration is valid");
    println!("✓ Configuration is valid");

    Ok(())
}

pub fn handle_sign(
    config: &Config,
    reference: &str,
    amount_in_cents: i64,
    currency: &str,
) -> anyhow::Result<String> {
    let secret = config
        .wompi_integrity_secret
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("WOMPI_INTEGRITY_SECRET must be set"))?;

    let signature = signature::sign_transaction(reference, amount_in_cents, currency, secret)?;
    println!("{}", signature);
    Ok(signature)
}

pub fn handle_sign_webhook(config: &Config, file: &Path) -> anyhow::Result<String> {
    let secret = config
        .webhook_secret()
        .ok_or_else(|| anyhow::anyhow!("WOMPI_EVENTS_SECRET or WOMPI_INTEGRITY_SECRET must be set"))?;

    let body = std::fs::read(file)
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", file.display(), e))?;
    let checksum = signature::sign_webhook(&body, secret)?;
    println!("{}", checksum);
    Ok(checksum)
}

fn describe_secret(secret: Option<&str>) -> String {
    match secret {
        Some(s) => mask_secret(s),
        None => "(not set)".to_string(),
    }
}
