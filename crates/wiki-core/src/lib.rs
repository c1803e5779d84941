pub mod config;
pub mod error;
pub mod handlers;
pub mod http;
pub mod logging;
pub mod page;
pub mod server;
pub mod template;
pub mod title;

pub use error::WikiError;
pub use handlers::Wiki;
pub use page::{Page, PageStore};
pub use server::Server;
pub use template::Templates;
pub use title::{Action, TitleValidator};
