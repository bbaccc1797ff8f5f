//! Error types for page contract lookups.

/// Result type alias for contract lookups.
pub type Result<T> = std::result::Result<T, ContractError>;

/// A host page did not match what the contract expects.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContractError {
    /// A structural pattern the contract relies on is gone.
    ///
    /// Recovering requires a contract update, not a retry.
    #[error("page contract v{version} no longer matches the host: {what}")]
    Drift {
        /// Contract version that was applied.
        version: u32,
        /// Which expectation failed.
        what: String,
    },

    /// A message detail page is missing cells the fixed layout requires.
    #[error("detail page violates contract v{version}: {what}")]
    MalformedDetail {
        /// Contract version that was applied.
        version: u32,
        /// Which cell or row was missing.
        what: String,
    },

    /// A selector or pattern compiled into the contract is invalid.
    #[error("invalid contract pattern `{pattern}`: {reason}")]
    InvalidPattern {
        /// The offending selector or regex source.
        pattern: String,
        /// Parser message.
        reason: String,
    },
}

impl ContractError {
    /// Creates a drift error for the given contract version.
    #[must_use]
    pub fn drift(version: u32, what: impl Into<String>) -> Self {
        Self::Drift {
            version,
            what: what.into(),
        }
    }

    /// Creates a malformed-detail error for the given contract version.
    #[must_use]
    pub fn malformed_detail(version: u32, what: impl Into<String>) -> Self {
        Self::MalformedDetail {
            version,
            what: what.into(),
        }
    }

    /// Returns `true` if this error means the host layout changed.
    #[must_use]
    pub const fn is_drift(&self) -> bool {
        matches!(self, Self::Drift { .. })
    }
}
