//! Paginated listing shared by every resource kind.
//!
//! Fetching and parsing are kept apart: [`Listing::fetch`] collects the raw
//! pages, [`Listing::items`] parses them. Parsing the same fetched pages
//! twice yields the same sequence.

use std::collections::HashSet;
use std::marker::PhantomData;

use lernsax_auth::Session;
use lernsax_contract::{PageContract, PageLink};
use tracing::{debug, warn};
use url::Url;

use crate::error::Result;

/// A kind of paginated resource: how to parse one page and find the others.
pub trait ResourceKind {
    /// Parsed entry type.
    type Item;

    /// Name used in log output.
    const NAME: &'static str;

    /// Parses every entry on one page, in page order.
    ///
    /// # Errors
    ///
    /// Returns an error if the page does not match the contract.
    fn parse(contract: &PageContract, html: &str) -> Result<Vec<Self::Item>>;

    /// Links to further pages, read from the first page. None by default.
    fn page_links(_contract: &PageContract, _html: &str) -> Vec<PageLink> {
        Vec::new()
    }

    /// Identity of an entry; later duplicates are dropped. No deduplication by default.
    fn key(_item: &Self::Item) -> Option<&str> {
        None
    }
}

/// A page as fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    /// Where the page came from.
    pub url: Url,
    /// Raw HTML.
    pub html: String,
}

/// All fetched pages of one listing, first page first.
#[derive(Debug, Clone)]
pub struct Listing<K: ResourceKind> {
    pages: Vec<FetchedPage>,
    kind: PhantomData<K>,
}

impl<K: ResourceKind> Listing<K> {
    /// A listing consisting of one already fetched page.
    #[must_use]
    pub fn single(page: FetchedPage) -> Self {
        Self {
            pages: vec![page],
            kind: PhantomData,
        }
    }

    /// Reads pagination links from `first` and fetches each further page, in order.
    ///
    /// Links that resolve to an already fetched URL are skipped.
    ///
    /// # Errors
    ///
    /// Returns the first fetch error; pages fetched so far are dropped.
    pub async fn fetch(session: &Session, contract: &PageContract, first: FetchedPage) -> Result<Self> {
        let links = K::page_links(contract, &first.html);
        let mut listing = Self::single(first);
        for link in links {
            let url = session.site().resolve(&link.href)?;
            if listing.pages.iter().any(|p| p.url == url) {
                continue;
            }
            debug!(kind = K::NAME, label = %link.label, %url, "Fetching page");
            let html = session.fetch_page(&url).await?;
            listing.pages.push(FetchedPage { url, html });
        }
        Ok(listing)
    }

    /// Fetched pages.
    #[must_use]
    pub fn pages(&self) -> &[FetchedPage] {
        &self.pages
    }

    /// Parses every page and concatenates the entries.
    ///
    /// # Errors
    ///
    /// Returns the first parse error.
    pub fn items(&self, contract: &PageContract) -> Result<Vec<K::Item>> {
        let mut seen = HashSet::new();
        let mut items = Vec::new();
        for page in &self.pages {
            for item in K::parse(contract, &page.html)? {
                if let Some(key) = K::key(&item)
                    && !seen.insert(key.to_string())
                {
                    warn!(kind = K::NAME, key, url = %page.url, "Dropping duplicate entry");
                    continue;
                }
                items.push(item);
            }
        }
        Ok(items)
    }
}
