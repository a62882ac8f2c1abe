//! HOH MIS Assistant server
//!
//! Entry point: loads configuration, sets up tracing and serves the app.

use std::sync::Arc;

use dotenvy::dotenv;
use hoh_mis_assistant::config::AppConfig;
use hoh_mis_assistant::server::start_server;
use mimalloc::MiMalloc;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Global allocator for improved performance (M-MIMALLOC-APPS).
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env (if present)
    let _ = dotenv();

    let config = AppConfig::load()?;

    // Initialize tracing (M-LOG-STRUCTURED)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = config.log.json.then(|| fmt::layer().json().with_target(true));
    let text = (!config.log.json).then(|| fmt::layer().with_target(true));
    tracing_subscriber::registry()
        .with(filter)
        .with(json)
        .with(text)
        .init();

    start_server(Arc::new(config)).await?;
    Ok(())
}
