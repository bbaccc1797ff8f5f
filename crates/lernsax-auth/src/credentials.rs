//! Login credentials.

use crate::error::{Error, Result};

/// Identifier and secret for one account. Both are required.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    identifier: String,
    secret: String,
}

impl Credentials {
    /// Creates credentials.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingCredentials`] if either value is blank.
    pub fn new(identifier: impl Into<String>, secret: impl Into<String>) -> Result<Self> {
        let identifier = identifier.into();
        let secret = secret.into();
        if identifier.trim().is_empty() {
            return Err(Error::MissingCredentials("identifier"));
        }
        if secret.is_empty() {
            return Err(Error::MissingCredentials("secret"));
        }
        Ok(Self { identifier, secret })
    }

    /// Login identifier, usually the account's mail address.
    #[must_use]
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub(crate) fn secret(&self) -> &str {
        &self.secret
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("identifier", &self.identifier)
            .field("secret", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials() {
        let creds = Credentials::new("a@school.lernsax.de", "pw").unwrap();
        assert_eq!(creds.identifier(), "a@school.lernsax.de");
        assert_eq!(creds.secret(), "pw");
    }

    #[test]
    fn test_missing_values() {
        assert!(matches!(
            Credentials::new("", "pw"),
            Err(Error::MissingCredentials("identifier"))
        ));
        assert!(matches!(
            Credentials::new("  ", "pw"),
            Err(Error::MissingCredentials("identifier"))
        ));
        assert!(matches!(
            Credentials::new("a", ""),
            Err(Error::MissingCredentials("secret"))
        ));
    }

    #[test]
    fn test_debug_hides_secret() {
        let creds = Credentials::new("a", "hunter2").unwrap();
        let printed = format!("{creds:?}");
        assert!(printed.contains("<redacted>"));
        assert!(!printed.contains("hunter2"));
    }
}
