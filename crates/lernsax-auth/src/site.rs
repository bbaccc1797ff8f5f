//! Host endpoints.

use crate::error::Result;
use url::Url;

/// Production base URL.
pub const LERNSAX_BASE: &str = "https://www.lernsax.de";

/// Base URL and the fixed relative endpoints of one LernSax host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Site {
    base: Url,
    wws: Url,
    download: Url,
    webdav: Url,
}

impl Site {
    /// Creates a site rooted at `base`.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn new(base: impl AsRef<str>) -> Result<Self> {
        let mut base = Url::parse(base.as_ref())?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self {
            wws: base.join("wws/")?,
            download: base.join("wws/download.php/")?,
            webdav: base.join("webdav.php")?,
            base,
        })
    }

    /// The production site.
    ///
    /// # Errors
    ///
    /// Returns an error if URL parsing fails.
    pub fn lernsax() -> Result<Self> {
        Self::new(LERNSAX_BASE)
    }

    /// Site root, where the handshake starts.
    #[must_use]
    pub const fn root(&self) -> &Url {
        &self.base
    }

    /// The `wws` module that serves every authenticated page.
    #[must_use]
    pub const fn wws(&self) -> &Url {
        &self.wws
    }

    /// WebDAV endpoint. Not used by this workspace beyond exposing it.
    #[must_use]
    pub const fn webdav(&self) -> &Url {
        &self.webdav
    }

    /// Resolves an href printed on a `wws` page.
    ///
    /// Relative hrefs are relative to `wws/`; absolute paths and full URLs
    /// resolve as usual.
    ///
    /// # Errors
    ///
    /// Returns an error if the href cannot be joined.
    pub fn resolve(&self, href: &str) -> Result<Url> {
        Ok(self.wws.join(href)?)
    }

    /// Resolves a path against the site root.
    ///
    /// # Errors
    ///
    /// Returns an error if the path cannot be joined.
    pub fn resolve_root(&self, path: &str) -> Result<Url> {
        Ok(self.base.join(path)?)
    }

    /// Returns the opaque attachment path of a URL under the download endpoint.
    #[must_use]
    pub fn download_path(&self, url: &Url) -> Option<String> {
        if url.origin() != self.base.origin() {
            return None;
        }
        url.path()
            .strip_prefix(self.download.path())
            .filter(|rest| !rest.is_empty())
            .map(str::to_string)
    }

    /// URL serving the content of an opaque attachment path.
    ///
    /// # Errors
    ///
    /// Returns an error if the path cannot be joined.
    pub fn download_url(&self, path: &str) -> Result<Url> {
        Ok(self.download.join(path.trim_start_matches('/'))?)
    }
}
