//! Mail harvesting pipeline.
//!
//! ```text
//! landing page -> locate_entry_point -> load_folder_directory
//!   -> per folder: select_folder -> list_all_pages
//!        -> fetch_detail per message -> download_attachment per attachment
//!        -> persist
//! ```
//!
//! Every step awaits one request at a time. The harvester borrows the
//! session and never clones it.

use std::collections::HashMap;
use std::io;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use lernsax_auth::Session;
use lernsax_contract::{ContractError, PageContract, PageLink};
use tracing::{info, warn};
use url::Url;

use crate::error::{HarvestError, Result};
use crate::listing::{FetchedPage, Listing, ResourceKind};
use crate::model::{AttachmentRef, Folder, MessageDetail, MessageRecord, MessageSummary};
use crate::store::Store;

/// Message list pages of one folder.
#[derive(Debug, Clone, Copy)]
pub struct MailPages;

impl ResourceKind for MailPages {
    type Item = MessageSummary;
    const NAME: &'static str = "mail";

    fn parse(contract: &PageContract, html: &str) -> Result<Vec<MessageSummary>> {
        contract
            .message_rows(html)?
            .into_iter()
            .map(MessageSummary::try_from)
            .collect()
    }

    fn page_links(contract: &PageContract, html: &str) -> Vec<PageLink> {
        contract.page_links(html)
    }

    fn key(item: &MessageSummary) -> Option<&str> {
        Some(item.number.as_str())
    }
}

/// Outcome of one folder harvest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderHarvest {
    /// Folder id.
    pub folder_id: String,
    /// Messages persisted.
    pub messages: usize,
    /// Attachments downloaded.
    pub attachments: usize,
    /// Record file written.
    pub file: PathBuf,
}

/// Result of harvesting every folder.
#[derive(Debug)]
pub struct HarvestReport {
    /// When the harvest started.
    pub started_at: DateTime<Utc>,
    /// When the last folder finished.
    pub finished_at: DateTime<Utc>,
    /// One entry per folder, in registry order.
    pub folders: Vec<(String, Result<FolderHarvest>)>,
}

impl HarvestReport {
    /// Number of folders that failed.
    #[must_use]
    pub fn failures(&self) -> usize {
        self.folders.iter().filter(|(_, r)| r.is_err()).count()
    }

    /// Total messages persisted across folders.
    #[must_use]
    pub fn messages(&self) -> usize {
        self.folders
            .iter()
            .filter_map(|(_, r)| r.as_ref().ok())
            .map(|h| h.messages)
            .sum()
    }
}

#[derive(Debug)]
struct CurrentPage {
    folder_id: String,
    page: FetchedPage,
}

/// Walks the mail module of an authenticated session.
#[derive(Debug)]
pub struct MailHarvester<'s> {
    session: &'s Session,
    contract: &'s PageContract,
    store: Store,
    download_attachments: bool,
    entry: Option<Url>,
    folders: Vec<Folder>,
    current: Option<CurrentPage>,
    claimed: HashMap<PathBuf, String>,
}

impl<'s> MailHarvester<'s> {
    /// Creates a harvester writing to `store`. Attachments are downloaded by default.
    #[must_use]
    pub fn new(session: &'s Session, contract: &'s PageContract, store: Store) -> Self {
        Self {
            session,
            contract,
            store,
            download_attachments: true,
            entry: None,
            folders: Vec::new(),
            current: None,
            claimed: HashMap::new(),
        }
    }

    /// Enables or disables attachment downloads in [`harvest_folder`](Self::harvest_folder).
    #[must_use]
    pub const fn download_attachments(mut self, enabled: bool) -> Self {
        self.download_attachments = enabled;
        self
    }

    /// Folder registry, in control order. Empty until the directory is loaded.
    #[must_use]
    pub fn folders(&self) -> &[Folder] {
        &self.folders
    }

    /// Finds the mail module link on the landing page.
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError::EntryPointNotFound`] if the landing page has no such link.
    pub fn locate_entry_point(&mut self) -> Result<Url> {
        let label = self.contract.mail_entry_label();
        let href = self
            .contract
            .mail_entry(self.session.landing_page())
            .ok_or_else(|| HarvestError::EntryPointNotFound {
                label: label.to_string(),
            })?;
        let url = self.session.site().resolve(&href)?;
        info!(%url, "Mail entry point located");
        self.entry = Some(url.clone());
        Ok(url)
    }

    /// Fetches the mail page and builds the folder registry from its folder control.
    ///
    /// Ids that collide after sanitizing keep their first folder.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry point is missing, the fetch fails, or
    /// the folder control does not match the contract.
    pub async fn load_folder_directory(&mut self) -> Result<&[Folder]> {
        let entry = match &self.entry {
            Some(url) => url.clone(),
            None => self.locate_entry_point()?,
        };
        let html = self.session.fetch_page(&entry).await?;

        let mut folders: Vec<Folder> = Vec::new();
        for option in self.contract.folder_options(&html)? {
            let url = self.session.site().resolve(&option.href)?;
            let folder = Folder::new(&option.id, option.name, url);
            if folders.iter().any(|f| f.id() == folder.id()) {
                warn!(raw_id = %option.id, id = folder.id(), "Duplicate folder id, keeping first");
                continue;
            }
            folders.push(folder);
        }

        info!(count = folders.len(), "Folder directory loaded");
        self.folders = folders;
        Ok(&self.folders)
    }

    /// Fetches the folder's page and makes it the current page.
    ///
    /// The previous page is dropped first, so a failed fetch leaves no folder selected.
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError::UnknownFolder`] if `id` is not registered.
    pub async fn select_folder(&mut self, id: &str) -> Result<&Folder> {
        let index = self
            .folders
            .iter()
            .position(|f| f.id() == id)
            .ok_or_else(|| HarvestError::UnknownFolder(id.to_string()))?;
        let url = self.folders[index].url().clone();
        info!(folder = id, %url, "Selecting folder");
        self.current = None;
        let html = self.session.fetch_page(&url).await?;
        self.current = Some(CurrentPage {
            folder_id: id.to_string(),
            page: FetchedPage { url, html },
        });
        Ok(&self.folders[index])
    }

    fn current(&self) -> Result<&CurrentPage> {
        self.current.as_ref().ok_or(HarvestError::NoFolderSelected)
    }

    /// Parses the current page's message table.
    ///
    /// # Errors
    ///
    /// Returns an error if no folder is selected or the table does not match the contract.
    pub fn list_page(&self) -> Result<Vec<MessageSummary>> {
        MailPages::parse(self.contract, &self.current()?.page.html)
    }

    /// Fetches every page of the current folder without parsing it.
    ///
    /// # Errors
    ///
    /// Returns an error if no folder is selected or a page fetch fails.
    pub async fn fetch_all_pages(&self) -> Result<Listing<MailPages>> {
        let first = self.current()?.page.clone();
        Listing::fetch(self.session, self.contract, first).await
    }

    /// Lists every message of the current folder across all pages, first page first.
    ///
    /// # Errors
    ///
    /// Returns an error if a fetch fails or a page does not match the contract.
    pub async fn list_all_pages(&self) -> Result<Vec<MessageSummary>> {
        let listing = self.fetch_all_pages().await?;
        let messages = listing.items(self.contract)?;
        info!(
            folder = %self.current()?.folder_id,
            pages = listing.pages().len(),
            messages = messages.len(),
            "Folder listed"
        );
        Ok(messages)
    }

    /// Fetches and parses a message's detail page.
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError::MalformedDetailPage`] if the page lacks required
    /// cells or an attachment link points outside the download endpoint.
    pub async fn fetch_detail(&self, summary: &MessageSummary) -> Result<MessageDetail> {
        let malformed = |what: String| HarvestError::MalformedDetailPage {
            reference: summary.detail_ref.clone(),
            what,
        };

        let url = self.session.site().resolve(&summary.detail_ref)?;
        let html = self.session.fetch_page(&url).await?;
        let detail = self.contract.detail(&html).map_err(|e| match e {
            ContractError::MalformedDetail { what, .. } => malformed(what),
            other => HarvestError::ProtocolDrift(other),
        })?;

        let mut attachments = Vec::with_capacity(detail.attachments.len());
        for scraped in detail.attachments {
            let link = self.session.site().resolve(&scraped.href)?;
            let path = self
                .session
                .site()
                .download_path(&link)
                .ok_or_else(|| malformed(format!("attachment `{}` is not a download link", scraped.href)))?;
            attachments.push(AttachmentRef {
                path,
                name: scraped.name,
            });
        }

        let detail = MessageDetail {
            summary: summary.clone(),
            date: detail.date,
            sender: detail.sender,
            recipients: detail.recipients,
            subject: detail.subject,
            body: detail.body,
            eml_link: detail.eml_link,
            attachments,
        };
        if detail.subject_mismatch() {
            warn!(number = %summary.number, "Listing and detail subjects differ");
        }
        Ok(detail)
    }

    /// Downloads one attachment into the folder's attachment directory.
    ///
    /// Not retried. The local path depends only on `folder_id` and the server
    /// path. A server path whose name is already taken by a different
    /// attachment keeps its first segment instead; a second clash fails.
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError::AttachmentWrite`] if no distinct local path
    /// exists or the file cannot be written.
    pub async fn download_attachment(&mut self, folder_id: &str, attachment: &AttachmentRef) -> Result<PathBuf> {
        let local = self.claim(folder_id, &attachment.path)?;
        let url = self.session.site().download_url(&attachment.path)?;
        info!(name = %attachment.name, path = %local.display(), "Downloading attachment");
        let content = self.session.fetch_bytes(&url).await?;
        self.store.write_attachment(&local, &attachment.path, &content).await?;
        Ok(local)
    }

    fn claim(&mut self, folder_id: &str, server_path: &str) -> Result<PathBuf> {
        let taken = |claimed: &HashMap<PathBuf, String>, local: &PathBuf| {
            claimed.get(local).is_some_and(|owner| owner != server_path)
        };

        let mut local = self.store.attachment_path(folder_id, server_path)?;
        if taken(&self.claimed, &local) {
            let prefixed = self.store.prefixed_attachment_path(folder_id, server_path)?;
            warn!(
                server_path,
                taken = %local.display(),
                path = %prefixed.display(),
                "Attachment name already used, keeping server prefix"
            );
            if taken(&self.claimed, &prefixed) {
                return Err(HarvestError::AttachmentWrite {
                    path: server_path.to_string(),
                    source: io::Error::new(
                        io::ErrorKind::AlreadyExists,
                        format!("{} belongs to another attachment", prefixed.display()),
                    ),
                });
            }
            local = prefixed;
        }
        self.claimed.insert(local.clone(), server_path.to_string());
        Ok(local)
    }

    /// Selects, lists, details and persists one folder.
    ///
    /// The first failing step aborts the folder; nothing is persisted for it.
    ///
    /// # Errors
    ///
    /// Returns the error of the first failing step.
    pub async fn harvest_folder(&mut self, id: &str) -> Result<FolderHarvest> {
        self.select_folder(id).await?;
        let summaries = self.list_all_pages().await?;

        let mut records = Vec::with_capacity(summaries.len());
        let mut downloaded = 0;
        for summary in &summaries {
            let detail = self.fetch_detail(summary).await?;
            let mut local_paths = Vec::with_capacity(detail.attachments.len());
            for attachment in &detail.attachments {
                if self.download_attachments {
                    local_paths.push(Some(self.download_attachment(id, attachment).await?));
                    downloaded += 1;
                } else {
                    local_paths.push(None);
                }
            }
            records.push(MessageRecord::new(&detail, &local_paths));
        }

        let file = self.store.persist_folder(id, &records).await?;
        Ok(FolderHarvest {
            folder_id: id.to_string(),
            messages: records.len(),
            attachments: downloaded,
            file,
        })
    }

    /// Harvests every registered folder in registry order.
    ///
    /// Folders are independent: a failing folder is logged and recorded in
    /// the report, and the next folder is still attempted. Loads the folder
    /// directory first if it is empty.
    ///
    /// # Errors
    ///
    /// Returns an error only if the folder directory cannot be loaded.
    pub async fn harvest_all(&mut self) -> Result<HarvestReport> {
        let started_at = Utc::now();
        if self.folders.is_empty() {
            self.load_folder_directory().await?;
        }

        let ids: Vec<String> = self.folders.iter().map(|f| f.id().to_string()).collect();
        let mut folders = Vec::with_capacity(ids.len());
        for id in ids {
            let result = self.harvest_folder(&id).await;
            match &result {
                Ok(harvest) => info!(
                    folder = %id,
                    messages = harvest.messages,
                    attachments = harvest.attachments,
                    "Folder harvested"
                ),
                Err(e) => warn!(folder = %id, error = %e, "Folder harvest failed, continuing"),
            }
            folders.push((id, result));
        }

        Ok(HarvestReport {
            started_at,
            finished_at: Utc::now(),
            folders,
        })
    }
}
