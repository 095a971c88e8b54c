// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use agentic_search_node::{
    api::{serve, AppState, TaskRegistry},
    config::{AppConfig, ModelsConfig},
    model::ModelRegistry,
    search::{ResultCache, SearchService, Summarizer},
};
use anyhow::{Context, Result};
use clap::Parser;
use std::{net::SocketAddr, path::PathBuf, sync::Arc};
use tracing::{info, warn};

/// Streaming search-augmented reasoning server
#[derive(Parser, Debug)]
#[command(name = "agentic-search-node", version)]
struct Cli {
    /// Address the HTTP API binds to
    #[arg(long, env = "API_LISTEN", default_value = "0.0.0.0:8000")]
    listen: SocketAddr,

    /// Model registry file (overrides MODELS_CONFIG)
    #[arg(long)]
    models_config: Option<PathBuf>,

    /// Drop failure-marked entries from the search cache and exit
    #[arg(long)]
    clean_cache: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let mut config = AppConfig::from_env().context("Failed to load configuration")?;
    if let Some(path) = cli.models_config {
        config.models_path = path;
    }
    config.validate().context("Invalid configuration")?;

    if cli.clean_cache {
        let cache = ResultCache::open(&config.search.cache_path)?;
        let removed = cache.clean_failures().await?;
        let stats = cache.stats().await;
        info!(
            "Cache {} cleaned (changed: {}): {} queries, {} results",
            config.search.cache_path.display(),
            removed,
            stats.queries,
            stats.results
        );
        return Ok(());
    }

    let models_config = ModelsConfig::from_file(&config.models_path).with_context(|| {
        format!(
            "Failed to load model registry {}",
            config.models_path.display()
        )
    })?;
    let models = ModelRegistry::from_config(&models_config);
    if models.is_empty() {
        warn!("Model registry is empty; every /infer request will be rejected");
    }
    info!("Loaded {} models from {}", models.len(), config.models_path.display());

    let search = SearchService::from_config(&config.search, config.content.clone())?;
    info!("Search provider: {}", search.provider_name());
    let summarizer = Summarizer::from_config(&config.summarizer)?;

    let state = Arc::new(AppState {
        models: Arc::new(models),
        search: Arc::new(search),
        summarizer: Arc::new(summarizer),
        workflow: config.workflow.clone(),
        tasks: TaskRegistry::new(),
    });

    serve(cli.listen, state)
        .await
        .with_context(|| format!("API server on {} failed", cli.listen))
}
