//! HTML templates for the `view` and `edit` pages.
//!
//! `edit.html` and `view.html` are minijinja templates rendered with a
//! [`Page`] as context (`{{ Title }}`, `{{ Body }}`). Both names end in
//! `.html`, so every substituted value is HTML-escaped: a body such as
//! `<script>alert(1)</script>` is shown as text, never run as markup.
//!
//! Templates are compiled once at startup and then shared read-only. Undefined
//! variables are errors, and each template is test-rendered on load so a
//! broken template stops startup instead of failing the first request.

use std::fs;
use std::path::{Path, PathBuf};

use minijinja::{Environment, UndefinedBehavior};

use crate::page::Page;

/// Template names that must be present at startup.
pub const TEMPLATE_NAMES: [&str; 2] = ["edit", "view"];

const TEMPLATE_EXTENSION: &str = "html";

#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("template {name}: cannot read {}: {source}", .path.display())]
    Read {
        name: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("template {name}: {source}")]
    Syntax {
        name: String,
        #[source]
        source: minijinja::Error,
    },

    #[error("template {name}: render failed: {source}")]
    Render {
        name: String,
        #[source]
        source: minijinja::Error,
    },

    #[error("no template named {0:?}")]
    NotDefined(String),
}

fn file_name(name: &str) -> String {
    format!("{}.{}", name, TEMPLATE_EXTENSION)
}

/// The compiled template set, addressed by short name (`edit`, `view`).
pub struct Templates {
    env: Environment<'static>,
}

impl std::fmt::Debug for Templates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Templates").finish_non_exhaustive()
    }
}

impl Templates {
    fn empty() -> Self {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.set_keep_trailing_newline(true);
        Self { env }
    }

    fn add(&mut self, name: &str, source: String) -> Result<(), TemplateError> {
        self.env
            .add_template_owned(file_name(name), source)
            .map_err(|e| TemplateError::Syntax {
                name: name.to_string(),
                source: e,
            })?;
        // Surface undefined variables now rather than on the first request.
        self.render(name, &Page::empty("Title")).map_err(|e| match e {
            TemplateError::Render { name, source } => TemplateError::Syntax { name, source },
            other => other,
        })?;
        Ok(())
    }

    /// Loads `edit.html` and `view.html` from `dir`. Any missing or malformed
    /// template fails the whole load.
    pub fn load_from_dir(dir: &Path) -> Result<Self, TemplateError> {
        let mut set = Self::empty();
        for name in TEMPLATE_NAMES {
            let path = dir.join(file_name(name));
            let source = fs::read_to_string(&path).map_err(|e| TemplateError::Read {
                name: name.to_string(),
                path: path.clone(),
                source: e,
            })?;
            set.add(name, source)?;
            tracing::debug!(template = name, path = %path.display(), "compiled template");
        }
        Ok(set)
    }

    /// Builds a set from in-memory sources (`(name, source)` pairs).
    pub fn from_sources<'a>(
        sources: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Result<Self, TemplateError> {
        let mut set = Self::empty();
        for (name, source) in sources {
            set.add(name, source.to_string())?;
        }
        Ok(set)
    }

    /// Renders template `name` with `page`. Output is only returned whole.
    pub fn render(&self, name: &str, page: &Page) -> Result<String, TemplateError> {
        let tmpl = self
            .env
            .get_template(&file_name(name))
            .map_err(|_| TemplateError::NotDefined(name.to_string()))?;
        tmpl.render(page).map_err(|e| TemplateError::Render {
            name: name.to_string(),
            source: e,
        })
    }
}
