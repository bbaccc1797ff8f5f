//! Error types for harvesting and sending.

use std::path::PathBuf;

use lernsax_contract::ContractError;
use reqwest::StatusCode;
use thiserror::Error;

/// Errors that can occur in core operations.
///
/// Nothing is retried. Every error ends the operation that raised it and is
/// handed to the caller as is.
#[derive(Debug, Error)]
pub enum HarvestError {
    /// Login or an authenticated request failed.
    #[error("Session error: {0}")]
    Auth(#[from] lernsax_auth::Error),

    /// A page no longer matches the page contract.
    #[error("Protocol drift: {0}")]
    ProtocolDrift(ContractError),

    /// A detail page lacks a required cell or points outside the download endpoint.
    #[error("Malformed detail page {reference}: {what}")]
    MalformedDetailPage {
        /// Detail reference that was fetched.
        reference: String,
        /// What was wrong with it.
        what: String,
    },

    /// The landing page has no anchor to the named module.
    #[error("Entry point not found: no `{label}` link")]
    EntryPointNotFound {
        /// Anchor label or module that was looked for.
        label: String,
    },

    /// The folder id is not in the folder registry.
    #[error("Unknown folder: {0}")]
    UnknownFolder(String),

    /// An operation needs a selected folder and none is selected.
    #[error("No folder selected")]
    NoFolderSelected,

    /// A scraped record failed validation.
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    /// Writing a downloaded attachment failed.
    #[error("Failed to write attachment {path}: {source}")]
    AttachmentWrite {
        /// Server path of the attachment.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The host answered a send with a non-success status.
    #[error("Send rejected with status {0}")]
    SendRejected(StatusCode),

    /// Credentials for a profile are unknown or empty.
    #[error("Missing credentials: {0}")]
    MissingCredentials(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error outside attachment writes.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// File that was accessed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// URL parsing error.
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),
}

impl From<ContractError> for HarvestError {
    fn from(err: ContractError) -> Self {
        match err {
            ContractError::MalformedDetail { what, .. } => Self::MalformedDetailPage {
                reference: String::new(),
                what,
            },
            other => Self::ProtocolDrift(other),
        }
    }
}

impl HarvestError {
    /// Creates an I/O error for `path`.
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns `true` if the host's markup no longer matches the page contract.
    #[must_use]
    pub const fn is_drift(&self) -> bool {
        matches!(
            self,
            Self::ProtocolDrift(_) | Self::Auth(lernsax_auth::Error::ProtocolDrift(_))
        )
    }
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, HarvestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contract_errors_split_by_kind() {
        let drift: HarvestError = ContractError::drift(1, "gone").into();
        assert!(drift.is_drift());

        let malformed: HarvestError = ContractError::malformed_detail(1, "no subject").into();
        assert!(matches!(
            malformed,
            HarvestError::MalformedDetailPage { ref what, .. } if what == "no subject"
        ));
        assert!(!malformed.is_drift());
    }

    #[test]
    fn test_auth_drift_is_drift() {
        let err: HarvestError = lernsax_auth::Error::drift(1, "redirect").into();
        assert!(err.is_drift());
    }
}
