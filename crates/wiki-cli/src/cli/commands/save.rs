//! `wiki save` – write a page through the store, bypassing the HTTP title check.

use anyhow::Result;
use wiki_core::config::WikiConfig;
use wiki_core::{Page, PageStore};

pub fn run_save(cfg: &WikiConfig, title: &str, body: &str) -> Result<()> {
    let store = PageStore::new(cfg.pages_dir());
    let page = Page::new(title, body);
    store.save(&page)?;
    println!("saved {}", store.page_path(title).display());
    Ok(())
}
