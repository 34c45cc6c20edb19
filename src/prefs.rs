//! Local Preferences
//!
//! A small JSON file holding the dashboard theme and an in-progress project
//! intake draft. A missing or unreadable file yields defaults.

use crate::forms::ProjectDraft;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PrefsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unknown theme: {0}")]
    UnknownTheme(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = PrefsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(PrefsError::UnknownTheme(other.to_string())),
        }
    }
}

/// On-disk preference document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Prefs {
    #[serde(rename = "admin-theme")]
    pub theme: Theme,

    #[serde(rename = "project-draft", skip_serializing_if = "Option::is_none")]
    pub project_draft: Option<ProjectDraft>,
}

/// Preferences bound to a file path
#[derive(Debug)]
pub struct PrefsStore {
    path: PathBuf,
    prefs: Prefs,
}

impl PrefsStore {
    /// Load from `path`, falling back to defaults
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let prefs = match std::fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), error = %e, "Ignoring corrupt preferences");
                Prefs::default()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Prefs::default(),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Cannot read preferences");
                Prefs::default()
            }
        };
        Self { path, prefs }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn prefs(&self) -> &Prefs {
        &self.prefs
    }

    pub fn theme(&self) -> Theme {
        self.prefs.theme
    }

    pub fn set_theme(&mut self, theme: Theme) -> Result<(), PrefsError> {
        self.prefs.theme = theme;
        self.save()
    }

    pub fn toggle_theme(&mut self) -> Result<Theme, PrefsError> {
        let theme = self.prefs.theme.toggled();
        self.set_theme(theme)?;
        Ok(theme)
    }

    pub fn draft(&self) -> Option<&ProjectDraft> {
        self.prefs.project_draft.as_ref()
    }

    /// Store a draft; an all-empty draft clears it
    pub fn save_draft(&mut self, draft: ProjectDraft) -> Result<(), PrefsError> {
        self.prefs.project_draft = (!draft.is_empty()).then_some(draft);
        self.save()
    }

    pub fn clear_draft(&mut self) -> Result<(), PrefsError> {
        self.prefs.project_draft = None;
        self.save()
    }

    fn save(&self) -> Result<(), PrefsError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.prefs)?;
        std::fs::write(&self.path, json)?;
        tracing::debug!(path = %self.path.display(), "Saved preferences");
        Ok(())
    }
}
