//! CLI command handlers, one file per command.

mod save;
mod serve;
mod show;

pub use save::run_save;
pub use serve::run_serve;
pub use show::run_show;
