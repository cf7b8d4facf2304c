//! Adserve — in-house ad auction & billing engine for the restaurant
//! ordering platform.
//!
//! Main entry point: wires the stores into the scheduled passes and
//! exposes them over HTTP for the external cron scheduler.

use adserve_api::handlers::AppState;
use adserve_api::ApiServer;
use adserve_attribution::ConversionAttributor;
use adserve_auction::QualityRecalcPass;
use adserve_billing::ImpressionBiller;
use adserve_budget::BudgetLifecycle;
use adserve_core::config::AppConfig;
use adserve_store::{seed, CampaignStore, EventStore, WalletLedger};
use clap::Parser;
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "adserve")]
#[command(about = "Ad auction & billing engine for the restaurant platform")]
#[command(version)]
struct Cli {
    /// HTTP port (overrides config)
    #[arg(long, env = "ADSERVE__API__HTTP_PORT")]
    http_port: Option<u16>,

    /// Cron shared secret (overrides config)
    #[arg(long, env = "ADSERVE__CRON__SECRET")]
    cron_secret: Option<String>,

    /// Seed demo establishments, wallets, campaigns, and events
    #[arg(long, default_value_t = false)]
    seed_demo: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "adserve=info,tower_http=info".into()),
        )
        .json()
        .init();

    let cli = Cli::parse();

    info!("Adserve starting up");

    // Load configuration
    let mut config = AppConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load config, using defaults");
        AppConfig::default()
    });

    // Apply CLI overrides
    if let Some(port) = cli.http_port {
        config.api.http_port = port;
    }
    if let Some(secret) = cli.cron_secret {
        config.cron.secret = secret;
    }

    info!(
        http_port = config.api.http_port,
        billing_window_hours = config.billing.window_hours,
        quality_window_days = config.quality.window_days,
        "Configuration loaded"
    );

    // Stores
    let campaigns = Arc::new(CampaignStore::new());
    let events = Arc::new(EventStore::new());
    let wallet = Arc::new(WalletLedger::new());

    if cli.seed_demo {
        seed::seed_demo_data(&campaigns, &events, &wallet);
    }

    // Scheduled passes, each with its own store handles
    let quality = Arc::new(QualityRecalcPass::new(
        campaigns.clone(),
        events.clone(),
        config.quality.window_days,
    ));
    let budget = Arc::new(BudgetLifecycle::new(campaigns.clone()));
    let biller = Arc::new(ImpressionBiller::new(
        campaigns.clone(),
        events.clone(),
        wallet.clone(),
        config.billing.window_hours,
    ));
    let attributor = Arc::new(ConversionAttributor::new(
        campaigns.clone(),
        events.clone(),
        config.attribution.window_hours,
    ));

    let state = AppState {
        quality,
        budget,
        biller,
        attributor,
        cron_secret: config.cron.secret.clone(),
    };

    let server = ApiServer::new(config, state);
    server.start_metrics()?;
    server.start_http().await?;

    Ok(())
}
