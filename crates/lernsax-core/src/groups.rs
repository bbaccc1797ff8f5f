//! Read-only browsing of group and class file areas.

use std::future::Future;
use std::pin::Pin;

use lernsax_auth::Session;
use lernsax_contract::{GroupKind, PageContract, ScrapedFileEntry};
use tracing::{debug, info};
use url::Url;

use crate::error::{HarvestError, Result};
use crate::listing::{FetchedPage, Listing, ResourceKind};

/// A group or class the account belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    /// Whether this is a working group or a class.
    pub kind: GroupKind,
    /// Display name.
    pub name: String,
    /// Group start page.
    pub url: Url,
}

/// One entry of a file listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileEntry {
    /// A sub-folder.
    Folder {
        /// Display name.
        name: String,
        /// Listing page of the folder.
        url: Url,
    },
    /// A file.
    File {
        /// File name.
        name: String,
        /// Detail page.
        url: Url,
        /// Direct download URL.
        download_url: Url,
    },
}

impl FileEntry {
    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Folder { name, .. } | Self::File { name, .. } => name,
        }
    }
}

/// A node of a walked file tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileNode {
    /// The entry itself.
    pub entry: FileEntry,
    /// Children of a folder, empty for files and for folders at the depth limit.
    pub children: Vec<FileNode>,
}

/// Raw file listing pages.
#[derive(Debug, Clone, Copy)]
pub struct FilePages;

impl ResourceKind for FilePages {
    type Item = ScrapedFileEntry;
    const NAME: &'static str = "files";

    fn parse(contract: &PageContract, html: &str) -> Result<Vec<ScrapedFileEntry>> {
        Ok(contract.file_entries(html)?)
    }
}

/// Lists groups and classes and walks their file areas.
#[derive(Debug)]
pub struct GroupBrowser<'s> {
    session: &'s Session,
    contract: &'s PageContract,
}

impl<'s> GroupBrowser<'s> {
    /// Creates a browser over an authenticated session.
    #[must_use]
    pub const fn new(session: &'s Session, contract: &'s PageContract) -> Self {
        Self { session, contract }
    }

    /// Working groups listed on the landing page.
    ///
    /// # Errors
    ///
    /// Returns a drift error if the group control is missing.
    pub fn list_groups(&self) -> Result<Vec<Group>> {
        self.list(GroupKind::Group)
    }

    /// Classes listed on the landing page.
    ///
    /// # Errors
    ///
    /// Returns a drift error if the class control is missing.
    pub fn list_classes(&self) -> Result<Vec<Group>> {
        self.list(GroupKind::Class)
    }

    fn list(&self, kind: GroupKind) -> Result<Vec<Group>> {
        self.contract
            .group_options(self.session.landing_page(), kind)?
            .into_iter()
            .map(|option| -> Result<Group> {
                Ok(Group {
                    kind,
                    url: self.session.site().resolve(&option.href)?,
                    name: option.name,
                })
            })
            .collect()
    }

    /// Fetches a group's start page and returns the URL of its file area.
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError::EntryPointNotFound`] if the group has no files menu.
    pub async fn open_group_files(&self, group: &Group) -> Result<Url> {
        let html = self.session.fetch_page(&group.url).await?;
        let href = self
            .contract
            .files_menu(&html)
            .ok_or_else(|| HarvestError::EntryPointNotFound {
                label: format!("files of {}", group.name),
            })?;
        Ok(self.session.site().resolve(&href)?)
    }

    /// Lists one folder of a file area.
    ///
    /// # Errors
    ///
    /// Returns an error if the fetch fails or the listing does not match the contract.
    pub async fn browse_folder(&self, url: &Url) -> Result<Vec<FileEntry>> {
        let html = self.session.fetch_page(url).await?;
        let first = FetchedPage {
            url: url.clone(),
            html,
        };
        let listing: Listing<FilePages> = Listing::fetch(self.session, self.contract, first).await?;
        let site = self.session.site();
        let entries = listing
            .items(self.contract)?
            .into_iter()
            .map(|entry| -> Result<FileEntry> {
                Ok(match entry {
                    ScrapedFileEntry::Folder { name, href } => FileEntry::Folder {
                        url: site.resolve(&href)?,
                        name,
                    },
                    ScrapedFileEntry::File {
                        name,
                        href,
                        download_url,
                    } => FileEntry::File {
                        url: site.resolve(&href)?,
                        download_url: site.resolve(&download_url)?,
                        name,
                    },
                })
            })
            .collect::<Result<Vec<_>>>()?;
        debug!(%url, entries = entries.len(), "Folder browsed");
        Ok(entries)
    }

    /// Walks a group's file area down to `depth` folder levels.
    ///
    /// Depth 0 lists only the top folder.
    ///
    /// # Errors
    ///
    /// Returns the first fetch or parse error.
    pub async fn walk(&self, group: &Group, depth: usize) -> Result<Vec<FileNode>> {
        let root = self.open_group_files(group).await?;
        info!(group = %group.name, depth, "Walking file area");
        self.walk_folder(root, depth).await
    }

    fn walk_folder(
        &self,
        url: Url,
        depth: usize,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<FileNode>>> + '_>> {
        Box::pin(async move {
            let mut nodes = Vec::new();
            for entry in self.browse_folder(&url).await? {
                let children = match &entry {
                    FileEntry::Folder { url, .. } if depth > 0 => {
                        self.walk_folder(url.clone(), depth - 1).await?
                    }
                    _ => Vec::new(),
                };
                nodes.push(FileNode { entry, children });
            }
            Ok(nodes)
        })
    }
}
