//! `wiki show` – print a page's body.

use anyhow::Result;
use std::io::Write;
use wiki_core::config::WikiConfig;
use wiki_core::PageStore;

pub fn run_show(cfg: &WikiConfig, title: &str) -> Result<()> {
    let store = PageStore::new(cfg.pages_dir());
    let page = store.load(title)?;
    let mut out = std::io::stdout().lock();
    out.write_all(&page.body)?;
    if !page.body.ends_with(b"\n") {
        out.write_all(b"\n")?;
    }
    Ok(())
}
