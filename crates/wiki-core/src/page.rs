//! Page model and the flat-file page store.
//!
//! One page is one file: `<dir>/<title>.txt` holding the body verbatim. There
//! is no cache and no locking; concurrent saves to the same title race at the
//! filesystem and the last writer wins.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Serialize, Serializer};

use crate::error::WikiError;

/// File extension of page files.
pub const PAGE_EXTENSION: &str = "txt";

/// Permission bits for newly created page files (owner read/write only).
#[cfg(unix)]
pub const PAGE_FILE_MODE: u32 = 0o600;

/// A title/body pair. Built fresh on every load or save.
///
/// Serializes as `{ Title, Body }` for the templates, with the body as text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page {
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Body", serialize_with = "serialize_body_text")]
    pub body: Vec<u8>,
}

fn serialize_body_text<S: Serializer>(body: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&String::from_utf8_lossy(body))
}

impl Page {
    pub fn new(title: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }

    /// Page with only the title set, used by the edit form for absent pages.
    pub fn empty(title: impl Into<String>) -> Self {
        Self::new(title, Vec::new())
    }

    /// Body as text for rendering; invalid UTF-8 is replaced, not rejected.
    pub fn body_text(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

/// Directory-backed key/value store mapping titles to page files.
#[derive(Debug, Clone)]
pub struct PageStore {
    dir: PathBuf,
}

impl PageStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store rooted at the process working directory.
    pub fn in_current_dir() -> Self {
        Self::new(".")
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Backing file for `title`: `<dir>/<title>.txt`.
    pub fn page_path(&self, title: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", title, PAGE_EXTENSION))
    }

    /// Reads the whole backing file. A missing file is `NotFound`; any other
    /// failure is `Io`. Never retried.
    pub fn load(&self, title: &str) -> Result<Page, WikiError> {
        let path = self.page_path(title);
        match fs::read(&path) {
            Ok(body) => Ok(Page::new(title, body)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(WikiError::NotFound {
                title: title.to_string(),
            }),
            Err(e) => Err(WikiError::Io {
                title: title.to_string(),
                source: e,
            }),
        }
    }

    /// Replaces the backing file's full contents with `page.body`, creating it
    /// owner-only (0600) when absent. No fsync beyond the write call itself.
    pub fn save(&self, page: &Page) -> Result<(), WikiError> {
        let path = self.page_path(&page.title);
        write_page_file(&path, &page.body).map_err(|e| WikiError::Io {
            title: page.title.clone(),
            source: e,
        })?;
        tracing::info!(
            title = %page.title,
            bytes = page.body.len(),
            path = %path.display(),
            "saved page"
        );
        Ok(())
    }
}

fn write_page_file(path: &Path, body: &[u8]) -> io::Result<()> {
    let mut opts = fs::OpenOptions::new();
    opts.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        opts.mode(PAGE_FILE_MODE);
    }
    let mut file = opts.open(path)?;
    file.write_all(body)
}
