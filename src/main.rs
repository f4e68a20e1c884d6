use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wompi_checkout::adapters::{InMemoryOrderStore, PostgresOrderStore};
use wompi_checkout::cli::{self, Cli, Commands};
use wompi_checkout::config::{Config, LogFormat};
use wompi_checkout::ports::OrderStore;
use wompi_checkout::{create_app, db, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env()?;

    init_tracing(&config);

    match cli.command {
        Some(Commands::Serve) | None => serve(config).await,
        Some(Commands::Config) => cli::handle_config_validate(&config),
        Some(Commands::Sign {
            reference,
            amount_in_cents,
            currency,
        }) => cli::handle_sign(&config, &reference, amount_in_cents, &currency).map(|_| ()),
        Some(Commands::SignWebhook { file }) => {
            cli::handle_sign_webhook(&config, &file).map(|_| ())
        }
    }
}

fn init_tracing(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=info".into());

    match config.log_format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        LogFormat::Text => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init(),
    }
}

async fn serve(config: Config) -> anyhow::Result<()> {
    config.validate()?;

    if config.wompi_integrity_secret.is_none() {
        tracing::warn!("WOMPI_INTEGRITY_SECRET is not set; checkout requests will fail");
    }
    if config.webhook_secret().is_none() {
        tracing::warn!("No webhook secret configured; every event will be rejected");
    }

    let orders: Arc<dyn OrderStore> = match &config.database_url {
        Some(url) => {
            let pool = db::create_pool(url).await?;
            db::run_migrations(&pool).await?;
            tracing::info!("Using Postgres order store");
            Arc::new(PostgresOrderStore::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL is not set; orders are kept in memory only");
            Arc::new(InMemoryOrderStore::new())
        }
    };

    tracing::info!("Wompi client initialized with URL: {}", config.wompi_api_url);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let app = create_app(AppState::new(config, orders));

    tracing::info!("listening on {}", addr);
    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .await?;

    Ok(())
}
