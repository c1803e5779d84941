//! CLI for the flat-file wiki.

mod commands;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use wiki_core::config::{self, WikiConfig};

use commands::{run_save, run_serve, run_show};

/// Top-level CLI for the wiki server.
#[derive(Debug, Parser)]
#[command(name = "wiki")]
#[command(about = "Flat-file wiki: view, edit and save text pages over HTTP", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

/// Overrides for where pages live.
#[derive(Debug, Clone, Default, Args)]
pub struct StoreArgs {
    /// Directory holding `<title>.txt` page files (default: config, then current directory).
    #[arg(long, value_name = "DIR")]
    pub pages_dir: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Run the HTTP server (`/view/`, `/edit/`, `/save/`).
    Serve {
        /// Address to listen on (default: config, then 0.0.0.0:8080).
        #[arg(long, value_name = "ADDR")]
        addr: Option<String>,

        /// Directory holding edit.html and view.html.
        #[arg(long, value_name = "DIR")]
        templates_dir: Option<PathBuf>,

        #[command(flatten)]
        store: StoreArgs,
    },

    /// Write a page directly, without going through the HTTP title check.
    Save {
        /// Page title; becomes `<title>.txt`.
        title: String,
        /// Page body, stored verbatim.
        body: String,

        #[command(flatten)]
        store: StoreArgs,
    },

    /// Print a page's body to stdout.
    Show {
        /// Page title.
        title: String,

        #[command(flatten)]
        store: StoreArgs,
    },
}

/// Applies command-line overrides on top of the loaded config.
fn apply_store_args(cfg: &mut WikiConfig, store: &StoreArgs) {
    if let Some(dir) = &store.pages_dir {
        cfg.pages_dir = Some(dir.clone());
    }
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let mut cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Serve {
                addr,
                templates_dir,
                store,
            } => {
                apply_store_args(&mut cfg, &store);
                if let Some(addr) = addr {
                    cfg.listen_addr = addr;
                }
                if let Some(dir) = templates_dir {
                    cfg.templates_dir = Some(dir);
                }
                run_serve(&cfg).await?;
            }
            CliCommand::Save { title, body, store } => {
                apply_store_args(&mut cfg, &store);
                run_save(&cfg, &title, &body)?;
            }
            CliCommand::Show { title, store } => {
                apply_store_args(&mut cfg, &store);
                run_show(&cfg, &title)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
