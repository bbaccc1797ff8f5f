//! The login handshake.
//!
//! The host has no login endpoint of its own. A browser reaches the login
//! form in four hops, and the handshake replays them in order:
//!
//! 1. the site root embeds a script redirect (`top.location.replace(..)`),
//! 2. that target answers with an HTTP redirect whose `Location` fragment
//!    names the real login page,
//! 3. the login page links to the frame that hosts the form,
//! 4. the form is posted; the response is either the landing page or a
//!    page carrying the rejection marker.
//!
//! ```text
//! Unauthenticated --initiate/resolve_redirect--> RedirectResolved
//!   --locate_iframe--> IframeLocated --submit_credentials--> Authenticated
//! (any step) --error--> Failed(kind)
//! ```
//!
//! No step is retried and no state is revisited. [`AuthSession::login`]
//! picks up from the last step reached, so steps may be driven by hand first.

use lernsax_contract::PageContract;
use reqwest::header::LOCATION;
use tracing::{info, warn};
use url::Url;

use crate::credentials::Credentials;
use crate::error::{Error, FailureKind, Result};
use crate::session::{Session, Transport};
use crate::site::Site;

/// Handshake state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoginState {
    /// Nothing has been resolved yet.
    #[default]
    Unauthenticated,
    /// The login page URL is known.
    RedirectResolved,
    /// The login frame URL is known.
    IframeLocated,
    /// Credentials were accepted; a [`Session`] is available.
    Authenticated,
    /// A step failed; the handshake cannot continue.
    Failed(FailureKind),
}

impl LoginState {
    const fn name(self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::RedirectResolved => "redirect resolved",
            Self::IframeLocated => "iframe located",
            Self::Authenticated => "authenticated",
            Self::Failed(_) => "failed",
        }
    }
}

/// Drives the login handshake and owns the resulting [`Session`].
#[derive(Debug)]
pub struct AuthSession {
    credentials: Credentials,
    site: Site,
    contract: PageContract,
    transport: Option<Transport>,
    state: LoginState,
    pending: Option<Url>,
    session: Option<Session>,
}

impl AuthSession {
    /// Creates an unauthenticated handshake for `credentials` against `site`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP clients cannot be built.
    pub fn new(credentials: Credentials, site: Site, contract: PageContract) -> Result<Self> {
        Ok(Self {
            credentials,
            site,
            contract,
            transport: Some(Transport::new()?),
            state: LoginState::Unauthenticated,
            pending: None,
            session: None,
        })
    }

    /// Current handshake state.
    #[must_use]
    pub const fn state(&self) -> LoginState {
        self.state
    }

    /// Page contract the handshake applies.
    #[must_use]
    pub const fn contract(&self) -> &PageContract {
        &self.contract
    }

    /// The authenticated session, once the handshake has succeeded.
    #[must_use]
    pub const fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Runs the remaining handshake steps.
    ///
    /// Starts from the current state, so a handshake advanced step by step
    /// is finished rather than restarted. Any failure aborts the flow and is
    /// returned as is; a failed `AuthSession` cannot be resumed. Calling
    /// `login` again after success returns the existing session.
    ///
    /// # Errors
    ///
    /// Returns the error of the first step that failed, or
    /// [`Error::InvalidTransition`] if the handshake has already failed.
    pub async fn login(&mut self) -> Result<&Session> {
        match self.state {
            LoginState::Authenticated => {
                return self.session.as_ref().ok_or(Error::InvalidTransition {
                    step: "login",
                    state: "authenticated without session",
                });
            }
            LoginState::Failed(_) => {
                return Err(Error::InvalidTransition {
                    step: "login",
                    state: self.state.name(),
                });
            }
            _ => {}
        }

        info!(identifier = %self.credentials.identifier(), state = self.state.name(), "Initializing session");
        if self.state == LoginState::Unauthenticated {
            let redirect = self.initiate().await?;
            self.resolve_redirect(&redirect).await?;
        }
        if self.state == LoginState::RedirectResolved {
            let login_page = self.pending("locate iframe")?;
            self.locate_iframe(&login_page).await?;
        }
        let frame = self.pending("submit credentials")?;
        self.submit_credentials(&frame).await
    }

    /// Fetches the site root and extracts its script redirect target.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ProtocolDrift`] if the redirect pattern is absent.
    pub async fn initiate(&mut self) -> Result<Url> {
        self.require("initiate", LoginState::Unauthenticated)?;
        let result = self.fetch_redirect_target().await;
        self.record(result)
    }

    /// Requests `url` without following redirects and reads the login page from `Location`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ProtocolDrift`] if the response has no `Location` header.
    pub async fn resolve_redirect(&mut self, url: &Url) -> Result<Url> {
        self.require("resolve redirect", LoginState::Unauthenticated)?;
        let result = self.fetch_login_page(url).await;
        let login_page = self.record(result)?;
        self.state = LoginState::RedirectResolved;
        self.pending = Some(login_page.clone());
        Ok(login_page)
    }

    /// Fetches the login page and finds the login frame anchor.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoLoginTargetFound`] if no anchor matches.
    pub async fn locate_iframe(&mut self, url: &Url) -> Result<Url> {
        self.require("locate iframe", LoginState::RedirectResolved)?;
        let result = self.fetch_login_frame(url).await;
        let frame = self.record(result)?;
        self.state = LoginState::IframeLocated;
        self.pending = Some(frame.clone());
        Ok(frame)
    }

    /// Posts the credentials to the login frame.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCredentials`] if the response carries the
    /// rejection marker; no landing page is kept in that case.
    pub async fn submit_credentials(&mut self, url: &Url) -> Result<&Session> {
        self.require("submit credentials", LoginState::IframeLocated)?;
        let result = self.post_credentials(url).await;
        let landing_page = self.record(result)?;

        let transport = self.transport.take().ok_or(Error::InvalidTransition {
            step: "submit credentials",
            state: "transport already handed over",
        })?;
        info!(identifier = %self.credentials.identifier(), "Successfully logged in");
        self.state = LoginState::Authenticated;
        self.pending = None;
        let session: &Session = self.session.insert(Session::new(
            self.site.clone(),
            self.credentials.identifier().to_string(),
            transport,
            landing_page,
        ));
        Ok(session)
    }

    async fn fetch_redirect_target(&self) -> Result<Url> {
        let root = self.site.root();
        info!(url = %root, "Visiting site root for redirect");
        let html = self.transport()?.get_text(root).await?;
        let target = self.contract.redirect_target(&html)?;
        self.site.resolve_root(&target)
    }

    async fn fetch_login_page(&self, url: &Url) -> Result<Url> {
        info!(%url, "Resolving redirect");
        let response = self.transport()?.get_unfollowed(url).await?;
        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                Error::drift(
                    self.contract.version(),
                    format!("{url} answered {} without a Location header", response.status()),
                )
            })?;
        self.site.resolve(self.contract.location_target(location))
    }

    async fn fetch_login_frame(&self, url: &Url) -> Result<Url> {
        info!(%url, "Locating login frame");
        let html = self.transport()?.get_text(url).await?;
        let href = self
            .contract
            .login_target(&html)
            .ok_or_else(|| Error::NoLoginTargetFound {
                url: url.to_string(),
            })?;
        self.site.resolve(&href)
    }

    async fn post_credentials(&self, url: &Url) -> Result<String> {
        info!(%url, "Performing login");
        let form = self
            .contract
            .login_form(self.credentials.identifier(), self.credentials.secret());
        let response = self.transport()?.post_form(url, &form).await?;
        let html = response.error_for_status()?.text().await?;
        if self.contract.is_login_rejected(&html) {
            return Err(Error::InvalidCredentials {
                identifier: self.credentials.identifier().to_string(),
            });
        }
        Ok(html)
    }

    fn transport(&self) -> Result<&Transport> {
        self.transport.as_ref().ok_or(Error::InvalidTransition {
            step: "send request",
            state: self.state.name(),
        })
    }

    fn pending(&self, step: &'static str) -> Result<Url> {
        self.pending.clone().ok_or(Error::InvalidTransition {
            step,
            state: self.state.name(),
        })
    }

    fn require(&self, step: &'static str, expected: LoginState) -> Result<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(Error::InvalidTransition {
                step,
                state: self.state.name(),
            })
        }
    }

    fn record<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(err) = &result
            && let Some(kind) = err.kind()
        {
            warn!(?kind, error = %err, "Login handshake failed");
            self.state = LoginState::Failed(kind);
        }
        result
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn auth() -> AuthSession {
        AuthSession::new(
            Credentials::new("user@school.lernsax.de", "pw").unwrap(),
            Site::new("http://127.0.0.1:9").unwrap(),
            PageContract::v1().unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_starts_unauthenticated() {
        let auth = auth();
        assert_eq!(auth.state(), LoginState::Unauthenticated);
        assert!(auth.session().is_none());
    }

    #[tokio::test]
    async fn test_steps_out_of_order_are_rejected() {
        let mut auth = auth();
        let url = Url::parse("http://127.0.0.1:9/wws/100001.php").unwrap();
        let err = auth.submit_credentials(&url).await.unwrap_err();
        assert!(matches!(err, Error::InvalidTransition { step: "submit credentials", .. }));
        assert!(err.kind().is_none());
        assert_eq!(auth.state(), LoginState::Unauthenticated);
    }

    #[test]
    fn test_record_moves_to_failed() {
        let mut auth = auth();
        let result: Result<()> = Err(Error::NoLoginTargetFound { url: "x".into() });
        assert!(auth.record(result).is_err());
        assert_eq!(auth.state(), LoginState::Failed(FailureKind::NoLoginTarget));
        assert!(matches!(
            auth.require("initiate", LoginState::Unauthenticated),
            Err(Error::InvalidTransition { state: "failed", .. })
        ));
    }
}
