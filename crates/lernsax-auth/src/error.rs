//! Error types for the login handshake and authenticated requests.

use lernsax_contract::ContractError;

/// Result type alias for authentication operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Authentication error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Identifier or secret is empty. Raised before any network call.
    #[error("Missing credentials: {0} is empty")]
    MissingCredentials(&'static str),

    /// A handshake page no longer matches the page contract.
    #[error("Protocol drift: {0}")]
    ProtocolDrift(#[from] ContractError),

    /// The login page has no anchor to the login frame.
    #[error("No login target found on {url}")]
    NoLoginTargetFound {
        /// Page that was searched.
        url: String,
    },

    /// The host rejected identifier and secret.
    #[error("Invalid credentials for {identifier}")]
    InvalidCredentials {
        /// Identifier that was rejected.
        identifier: String,
    },

    /// HTTP request error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("URL error: {0}")]
    UrlError(#[from] url::ParseError),

    /// A handshake step was called out of order or after a failure.
    #[error("Cannot {step} while {state}")]
    InvalidTransition {
        /// Step that was attempted.
        step: &'static str,
        /// State the session was in.
        state: &'static str,
    },
}

/// Terminal failure categories of the login handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The host's pages no longer match the contract.
    ProtocolDrift,
    /// The login frame could not be located.
    NoLoginTarget,
    /// The host rejected the credentials.
    InvalidCredentials,
    /// A request failed at the transport level.
    Transport,
}

impl Error {
    /// Returns the failure category this error ends a handshake with.
    ///
    /// `None` for errors that are raised without touching the handshake state.
    #[must_use]
    pub const fn kind(&self) -> Option<FailureKind> {
        match self {
            Self::ProtocolDrift(_) | Self::UrlError(_) => Some(FailureKind::ProtocolDrift),
            Self::NoLoginTargetFound { .. } => Some(FailureKind::NoLoginTarget),
            Self::InvalidCredentials { .. } => Some(FailureKind::InvalidCredentials),
            Self::Http(_) => Some(FailureKind::Transport),
            Self::MissingCredentials(_) | Self::InvalidTransition { .. } => None,
        }
    }

    /// Creates a drift error for a handshake expectation outside page content.
    #[must_use]
    pub fn drift(version: u32, what: impl Into<String>) -> Self {
        Self::ProtocolDrift(ContractError::drift(version, what))
    }
}
