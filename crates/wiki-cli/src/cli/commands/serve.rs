//! `wiki serve` – run the HTTP server until Ctrl-C.

use anyhow::{Context, Result};
use wiki_core::config::WikiConfig;
use wiki_core::{PageStore, Server, Templates, Wiki};

pub async fn run_serve(cfg: &WikiConfig) -> Result<()> {
    let templates_dir = cfg.templates_dir();
    let templates = Templates::load_from_dir(&templates_dir).with_context(|| {
        format!("failed to load templates from {}", templates_dir.display())
    })?;
    let store = PageStore::new(cfg.pages_dir());
    tracing::info!(pages = %store.dir().display(), "page store ready");

    let server = Server::bind(&cfg.listen_addr, Wiki::new(store, templates)).await?;
    println!("wiki listening on http://{}/", server.local_addr()?);

    server
        .serve_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!("ctrl-c handler: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await
}
