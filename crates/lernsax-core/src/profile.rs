//! Credential profiles.
//!
//! The profile file is a JSON object keyed by profile name:
//!
//! ```json
//! { "school": { "username": "jane@school.lernsax.de", "password": "..." } }
//! ```

use std::collections::HashMap;
use std::path::Path;

use lernsax_auth::Credentials;
use serde::Deserialize;
use tracing::debug;

use crate::error::{HarvestError, Result};

#[derive(Clone, Deserialize)]
struct ProfileEntry {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

/// Profiles loaded once at startup.
#[derive(Clone, Default)]
pub struct ProfileStore {
    profiles: HashMap<String, ProfileEntry>,
}

impl ProfileStore {
    /// Parses a profile file's contents.
    ///
    /// # Errors
    ///
    /// Returns an error if the contents are not a profile object.
    pub fn from_json(contents: &str) -> Result<Self> {
        Ok(Self {
            profiles: serde_json::from_str(contents)?,
        })
    }

    /// Reads and parses a profile file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub async fn load(path: &Path) -> Result<Self> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| HarvestError::io(path, e))?;
        let store = Self::from_json(&contents)?;
        debug!(path = %path.display(), profiles = store.profiles.len(), "Profiles loaded");
        Ok(store)
    }

    /// Profile names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.profiles.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Credentials of `profile`.
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError::MissingCredentials`] if the profile is unknown
    /// or its username or password is empty.
    pub fn credentials(&self, profile: &str) -> Result<Credentials> {
        let entry = self
            .profiles
            .get(profile)
            .ok_or_else(|| HarvestError::MissingCredentials(format!("no profile `{profile}`")))?;
        Credentials::new(&entry.username, &entry.password)
            .map_err(|e| HarvestError::MissingCredentials(format!("profile `{profile}`: {e}")))
    }
}

impl std::fmt::Debug for ProfileStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfileStore")
            .field("profiles", &self.names())
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const FILE: &str = r#"{
        "school": {"username": "jane@school.lernsax.de", "password": "pw"},
        "empty": {"username": "", "password": "pw"},
        "nopass": {"username": "joe@school.lernsax.de"}
    }"#;

    #[test]
    fn test_credentials_for_profile() {
        let store = ProfileStore::from_json(FILE).unwrap();
        let creds = store.credentials("school").unwrap();
        assert_eq!(creds.identifier(), "jane@school.lernsax.de");
        assert_eq!(store.names(), vec!["empty", "nopass", "school"]);
    }

    #[test]
    fn test_missing_profile_or_fields() {
        let store = ProfileStore::from_json(FILE).unwrap();
        for profile in ["absent", "empty", "nopass"] {
            assert!(matches!(
                store.credentials(profile),
                Err(HarvestError::MissingCredentials(_))
            ));
        }
    }

    #[test]
    fn test_debug_lists_names_only() {
        let store = ProfileStore::from_json(FILE).unwrap();
        let printed = format!("{store:?}");
        assert!(printed.contains("school"));
        assert!(!printed.contains("pw"));
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            ProfileStore::load(&dir.path().join("creds.json")).await,
            Err(HarvestError::Io { .. })
        ));
    }
}
