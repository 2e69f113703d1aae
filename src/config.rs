//! Configuration handling for the terminal frontend

use anyhow::Result;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::state::{IdentityProvider, Viewer};

/// Environment variable overriding where section data is stored
pub const DATA_DIR_ENV: &str = "DOSSIER_DATA_DIR";

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DossierConfig {
    /// Directory holding saved section data
    pub data_dir: Option<PathBuf>,
    /// Stable id of the local user
    pub user_id: Option<String>,
    /// Account email shown in (and locked for) the email question
    pub account_email: Option<String>,
    /// How the account signs in
    pub identity_provider: Option<IdentityProvider>,
}

impl DossierConfig {
    fn project_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from("io", "dossier", "dossier-tui")
    }

    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.config_dir().join("config.json"))
    }

    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load configuration from `path`, falling back to defaults when missing
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        let config: DossierConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Where section data lives: env override, then config, then the
    /// platform data directory
    pub fn data_dir(&self) -> Option<PathBuf> {
        Self::resolve_data_dir(std::env::var_os(DATA_DIR_ENV).map(PathBuf::from), self)
    }

    fn resolve_data_dir(env: Option<PathBuf>, config: &DossierConfig) -> Option<PathBuf> {
        env.filter(|p| !p.as_os_str().is_empty())
            .or_else(|| config.data_dir.clone())
            .or_else(|| Self::project_dirs().map(|dirs| dirs.data_dir().join("sections")))
    }

    /// The signed-in user forms are rendered for
    pub fn viewer(&self) -> Viewer {
        Viewer::new(
            self.user_id.as_deref().unwrap_or("local"),
            self.account_email.as_deref(),
            self.identity_provider.unwrap_or_default(),
        )
    }
}
