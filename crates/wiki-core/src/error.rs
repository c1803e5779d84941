//! Error taxonomy shared by the store, the templates and the request handlers.

use crate::template::TemplateError;

/// Error kinds a request can end in. Handlers match on the variant to pick a
/// response (404 / redirect / 500) instead of inspecting error text.
#[derive(Debug, thiserror::Error)]
pub enum WikiError {
    /// Request path did not match `/(edit|save|view)/<alphanumeric title>`.
    #[error("invalid page title in path {path:?}")]
    InvalidTitle { path: String },

    /// No backing file for the title.
    #[error("page {title:?} not found")]
    NotFound { title: String },

    /// Read or write failure other than absence.
    #[error("page {title:?}: {source}")]
    Io {
        title: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Template(#[from] TemplateError),
}

impl WikiError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, WikiError::NotFound { .. })
    }
}
