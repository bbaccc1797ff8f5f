//! Harvest settings.

use std::path::{Path, PathBuf};
use std::time::Duration;

use lernsax_auth::Site;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{HarvestError, Result};
use crate::store::Store;

/// Settings for one harvest run, stored as JSON.
///
/// Every field has a default, so a partial file is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarvestConfig {
    /// Host base URL.
    pub base_url: String,
    /// Directory receiving one JSON file per folder.
    pub output_dir: PathBuf,
    /// Directory receiving downloaded attachments.
    pub attachments_dir: PathBuf,
    /// Profile file mapping profile names to credentials.
    pub credentials_file: PathBuf,
    /// Pause between two sends in a batch, in milliseconds.
    pub send_pause_ms: u64,
    /// Whether attachments are downloaded during a harvest.
    pub download_attachments: bool,
    /// Maximum depth when walking group file trees.
    pub group_depth: usize,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            base_url: lernsax_auth::site::LERNSAX_BASE.to_string(),
            output_dir: PathBuf::from("harvest"),
            attachments_dir: PathBuf::from("harvest").join("attachments"),
            credentials_file: PathBuf::from("creds.json"),
            send_pause_ms: 500,
            download_attachments: true,
            group_depth: 3,
        }
    }
}

impl HarvestConfig {
    /// Default settings location: `<config_dir>/lernsax/settings.json`.
    #[must_use]
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("lernsax")
            .join("settings.json")
    }

    /// Loads settings from the default location, writing the defaults there on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or created.
    pub async fn load() -> Result<Self> {
        Self::load_or_create(&Self::default_path()).await
    }

    /// Loads settings from `path`; a missing file is created with the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or created.
    pub async fn load_or_create(path: &Path) -> Result<Self> {
        let config = Self::load_from(path).await?;
        if !path.exists() {
            config.save_to(path).await?;
        }
        Ok(config)
    }

    /// Loads settings from `path`; a missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub async fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!(path = %path.display(), "No settings file, using defaults");
            return Ok(Self::default());
        }
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| HarvestError::io(path, e))?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Writes settings to `path`, creating its directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or file cannot be written.
    pub async fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| HarvestError::io(dir, e))?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, contents)
            .await
            .map_err(|e| HarvestError::io(path, e))?;
        info!(path = %path.display(), "Settings saved");
        Ok(())
    }

    /// The configured host.
    ///
    /// # Errors
    ///
    /// Returns an error if `base_url` is not a valid URL.
    pub fn site(&self) -> Result<Site> {
        Ok(Site::new(&self.base_url)?)
    }

    /// Output locations.
    #[must_use]
    pub fn store(&self) -> Store {
        Store::new(&self.output_dir, &self.attachments_dir)
    }

    /// Pause between sends.
    #[must_use]
    pub const fn send_pause(&self) -> Duration {
        Duration::from_millis(self.send_pause_ms)
    }
}
