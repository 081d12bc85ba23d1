//! Anwesende maintenance binary
//!
//! Connects to the database, applies migrations, creates the dummy seat and
//! reports recent imports and per-department usage.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use anwesende_core::{
    clock::SystemClock, config::AppConfig, error::ErrorCode, repository::PgStore, AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("anwesende_core={},anwesende={}", config.logging.level, config.logging.level).into());

    let registry = tracing_subscriber::registry().with(filter);
    if config.logging.format == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!("Starting Anwesende v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(config).await {
        let code = ErrorCode::of(&e);
        tracing::error!(code = code as u32, "{:#}", e);
        std::process::exit(code as i32);
    }
    Ok(())
}

async fn run(config: AppConfig) -> anyhow::Result<()> {
    let store = PgStore::connect(&config.database).await?;
    tracing::info!("Connected to database");

    store.migrate().await?;
    tracing::info!("Database migrations completed");

    let state = AppState::init(config, Arc::new(store), Arc::new(SystemClock)).await?;
    tracing::info!(
        hash = %state.dummy_seat.seat().hash,
        room = %state.dummy_seat.room().descriptor(),
        "Dummy seat ready"
    );

    let steps = state.services.stats.recent_importsteps().await?;
    for step in &steps {
        tracing::info!(
            importstep = step.step.id,
            when = %step.step.when,
            user = %step.step.user,
            num_qrcodes = step.num_qrcodes,
            num_qrcodes_moved = step.num_qrcodes_moved,
            "Recent import"
        );
    }

    let usage = state.services.stats.usage_statistics().await?;
    println!("{}", serde_json::to_string_pretty(&serde_json::json!({
        "importsteps": steps,
        "usage": usage,
    }))?);

    Ok(())
}
