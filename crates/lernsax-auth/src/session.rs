//! Authenticated HTTP session.

use std::sync::Arc;

use reqwest::cookie::Jar;
use reqwest::redirect::Policy;
use reqwest::{Client, Response, StatusCode};
use tracing::debug;
use url::Url;

use crate::error::Result;
use crate::site::Site;

/// User agent sent with every request. The host serves reduced pages to unknown agents.
pub const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:109.0) Gecko/20100101 Firefox/115.0";

/// Two HTTP clients over one cookie jar.
///
/// `client` follows redirects; `direct` does not, so the handshake can read
/// `Location` headers itself.
#[derive(Debug, Clone)]
pub(crate) struct Transport {
    client: Client,
    direct: Client,
}

impl Transport {
    pub(crate) fn new() -> Result<Self> {
        let jar = Arc::new(Jar::default());
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .cookie_provider(Arc::clone(&jar))
            .build()?;
        let direct = Client::builder()
            .user_agent(USER_AGENT)
            .cookie_provider(jar)
            .redirect(Policy::none())
            .build()?;
        Ok(Self { client, direct })
    }

    pub(crate) async fn get_text(&self, url: &Url) -> Result<String> {
        debug!(%url, "GET");
        let response = self.client.get(url.clone()).send().await?;
        Ok(response.error_for_status()?.text().await?)
    }

    pub(crate) async fn get_bytes(&self, url: &Url) -> Result<Vec<u8>> {
        debug!(%url, "GET (binary)");
        let response = self.client.get(url.clone()).send().await?;
        Ok(response.error_for_status()?.bytes().await?.to_vec())
    }

    pub(crate) async fn get_unfollowed(&self, url: &Url) -> Result<Response> {
        debug!(%url, "GET (no redirect)");
        Ok(self.direct.get(url.clone()).send().await?)
    }

    pub(crate) async fn post_form(&self, url: &Url, fields: &[(&str, String)]) -> Result<Response> {
        debug!(%url, fields = fields.len(), "POST");
        Ok(self.client.post(url.clone()).form(fields).send().await?)
    }
}

/// An authenticated session: cookie state plus the post-login landing page.
///
/// Created only by [`AuthSession`](crate::AuthSession) after a successful
/// login and lent out by reference. There is no logout or expiry handling;
/// the session lives until it is dropped.
#[derive(Debug)]
pub struct Session {
    site: Site,
    identifier: String,
    transport: Transport,
    landing_page: String,
}

impl Session {
    pub(crate) const fn new(
        site: Site,
        identifier: String,
        transport: Transport,
        landing_page: String,
    ) -> Self {
        Self {
            site,
            identifier,
            transport,
            landing_page,
        }
    }

    /// Host the session is bound to.
    #[must_use]
    pub const fn site(&self) -> &Site {
        &self.site
    }

    /// Identifier the session logged in with.
    #[must_use]
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// HTML of the first page returned after login.
    #[must_use]
    pub fn landing_page(&self) -> &str {
        &self.landing_page
    }

    /// Fetches a page as text.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a non-success status.
    pub async fn fetch_page(&self, url: &Url) -> Result<String> {
        self.transport.get_text(url).await
    }

    /// Fetches a resource as raw bytes.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a non-success status.
    pub async fn fetch_bytes(&self, url: &Url) -> Result<Vec<u8>> {
        self.transport.get_bytes(url).await
    }

    /// Submits a form and returns the response status. The body is not inspected.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure.
    pub async fn submit_form(&self, url: &Url, fields: &[(&str, String)]) -> Result<StatusCode> {
        let response = self.transport.post_form(url, fields).await?;
        Ok(response.status())
    }
}
