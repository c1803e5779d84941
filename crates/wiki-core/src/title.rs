//! Title validation for incoming request paths.
//!
//! The only accepted shape is `/<action>/<title>` where action is one of
//! `edit`, `save`, `view` and the title is `[a-zA-Z0-9]+`. Titles become file
//! names, so this check is what keeps `.`, `/` and friends out of the store.

use regex_lite::Regex;

use crate::error::WikiError;

/// Anchored path pattern; group 1 is the action, group 2 the title.
pub const PATH_PATTERN: &str = r"^/(edit|save|view)/([a-zA-Z0-9]+)$";

/// Which handler a validated path is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    View,
    Edit,
    Save,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Action::View => "view",
            Action::Edit => "edit",
            Action::Save => "save",
        }
    }

    fn from_segment(s: &str) -> Option<Self> {
        match s {
            "view" => Some(Action::View),
            "edit" => Some(Action::Edit),
            "save" => Some(Action::Save),
            _ => None,
        }
    }

    /// Path prefix routed to this action, e.g. `/view/`.
    pub fn prefix(self) -> &'static str {
        match self {
            Action::View => "/view/",
            Action::Edit => "/edit/",
            Action::Save => "/save/",
        }
    }
}

/// Compiled path matcher. Built once at startup and shared read-only.
#[derive(Debug, Clone)]
pub struct TitleValidator {
    pattern: Regex,
}

impl TitleValidator {
    pub fn new() -> Self {
        Self {
            pattern: Regex::new(PATH_PATTERN).expect("path pattern is a valid regex"),
        }
    }

    /// Matches `path` and returns the bound action and captured title.
    pub fn validate(&self, path: &str) -> Result<(Action, String), WikiError> {
        let invalid = || WikiError::InvalidTitle {
            path: path.to_string(),
        };
        let caps = self.pattern.captures(path).ok_or_else(invalid)?;
        let action = caps
            .get(1)
            .and_then(|m| Action::from_segment(m.as_str()))
            .ok_or_else(invalid)?;
        let title = caps.get(2).ok_or_else(invalid)?.as_str().to_string();
        Ok((action, title))
    }

    /// Like [`validate`](Self::validate) but also requires the path to be bound to `action`.
    pub fn title_for(&self, action: Action, path: &str) -> Result<String, WikiError> {
        match self.validate(path)? {
            (a, title) if a == action => Ok(title),
            _ => Err(WikiError::InvalidTitle {
                path: path.to_string(),
            }),
        }
    }
}

impl Default for TitleValidator {
    fn default() -> Self {
        Self::new()
    }
}
