//! # Dwitter Page Runtime
//!
//! Loads `index.html` from the site mirror, wires the page subsystems,
//! opens the channels named on the command line and runs the script loop
//! until every response has been handled. The rendered page body is
//! written to stdout.
//!
//! ```text
//! page-runtime [CHANNEL...]
//! ```

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use dw_04_render::Document;
use page_runtime::{EventLoop, FileScriptLoader, Page, PageConfig, ServiceProvider};
use shared_crypto::DimLibrary;
use shared_types::LibrarySlot;

/// Load configuration from environment and files.
fn load_config() -> Result<PageConfig> {
    let mut config = PageConfig::from_env();

    if let Some(path) = config.gsp_config.clone() {
        let provider = ServiceProvider::load(&path)?;
        info!(
            provider = %provider.name,
            stations = provider.stations.len(),
            "Loaded service provider"
        );
        config.apply_provider(&provider);
    }

    config.validate().context("invalid page configuration")?;
    config.validate_site()?;
    Ok(config)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = load_config()?;

    let index = config.index_path();
    let markup = std::fs::read_to_string(&index)
        .with_context(|| format!("cannot read page {}", index.display()))?;
    let document = Document::parse(&markup).context("invalid page markup")?;

    let mut event_loop = EventLoop::new(
        config.base_url.clone(),
        Arc::new(FileScriptLoader::new(&config.site_dir)),
    );
    let library = LibrarySlot::ready(Arc::new(DimLibrary::new()));
    let page = Page::new(&config, library, document, Arc::new(event_loop.requester()))?;

    let report = page.on_load();
    info!(rendered = report.rendered, "Page loaded");
    for channel in std::env::args().skip(1) {
        page.open_channel(&channel);
    }

    let delivered = event_loop.run_until_idle(&page).await;
    info!(
        delivered,
        pending = page.pipeline().pending_len(),
        "Page idle"
    );

    println!("{}", page.html());
    page.shutdown();
    Ok(())
}
