use anyhow::{Context, Result};
use cartscribe::{AppState, Config, ListStore, RecipeGenerator, SpeechEngineFactory, SpeechSession};
use clap::Parser;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "cartscribe", about = "Voice-driven grocery list assistant")]
struct Cli {
    /// Config file (without extension), as the config crate reads it
    #[arg(long, default_value = "config/cartscribe")]
    config: String,

    /// Override the configured bind address, e.g. 0.0.0.0:8080
    #[arg(long)]
    listen: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let cfg = Config::load(&cli.config)?;

    info!("{} starting", cfg.service.name);

    let engine = SpeechEngineFactory::create(cfg.speech.engine_source()?)?;
    let (session, session_events) =
        SpeechSession::new(engine, cfg.speech.session_config()).await?;
    if !session.is_supported() {
        info!("voice input unavailable, typed input only");
    }

    let store = Arc::new(ListStore::open(&cfg.storage.data_dir).await?);
    let recipes = Arc::new(RecipeGenerator::new(cfg.recipe.clone())?);

    // Recognized text flows into the list through this task alone.
    tokio::spawn(cartscribe::assistant::run(session_events, Arc::clone(&store)));

    let state = AppState::new(session, store, recipes, cfg.service.api_token.clone());
    let router = cartscribe::create_router(state);

    let addr = cli
        .listen
        .unwrap_or_else(|| format!("{}:{}", cfg.service.http.bind, cfg.service.http.port));
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .await
        .context("HTTP server exited")?;

    Ok(())
}
