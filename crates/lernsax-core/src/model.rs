//! Domain model for harvested mail.

use std::path::PathBuf;

use lernsax_contract::{FlagState, MessageFlags, ScrapedRow};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{HarvestError, Result};

/// A mail folder from the folder selection control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Folder {
    id: String,
    name: String,
    url: Url,
}

impl Folder {
    /// Creates a folder, sanitizing the raw option id into a registry key.
    #[must_use]
    pub fn new(raw_id: &str, name: impl Into<String>, url: Url) -> Self {
        Self {
            id: sanitize_id(raw_id),
            name: name.into(),
            url,
        }
    }

    /// Registry key: ASCII letters, digits, `_` and `-` only.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Page listing the folder's messages.
    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }
}

/// Maps every character outside `[A-Za-z0-9_-]` to `_`. Empty input becomes `_`.
#[must_use]
pub fn sanitize_id(raw: &str) -> String {
    let id: String = raw
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if id.is_empty() { "_".to_string() } else { id }
}

/// One message as listed in a folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageSummary {
    /// Sequence number, unique within one folder snapshot.
    pub number: String,
    /// Subject line.
    pub subject: String,
    /// Sender display name.
    pub sender_name: String,
    /// Sender address.
    pub sender_address: String,
    /// Recipient display name, for folders that show one.
    pub recipient_name: Option<String>,
    /// Recipient address, for folders that show one.
    pub recipient_address: Option<String>,
    /// Size as printed by the host.
    pub size: String,
    /// Date as printed by the host.
    pub date: String,
    /// Flagged / answered / read state.
    pub flags: MessageFlags,
    /// Opaque reference that opens the detail page.
    pub detail_ref: String,
}

impl TryFrom<ScrapedRow> for MessageSummary {
    type Error = HarvestError;

    fn try_from(row: ScrapedRow) -> Result<Self> {
        if row.number.trim().is_empty() {
            return Err(HarvestError::InvalidRecord(
                "message row without sequence number".into(),
            ));
        }
        if row.detail_ref.trim().is_empty() {
            return Err(HarvestError::InvalidRecord(format!(
                "message {} has an empty detail reference",
                row.number
            )));
        }
        Ok(Self {
            number: row.number,
            subject: row.subject,
            sender_name: row.sender_name,
            sender_address: row.sender_address,
            recipient_name: row.recipient_name.filter(|n| !n.is_empty()),
            recipient_address: row.recipient_address.filter(|a| !a.is_empty()),
            size: row.size,
            date: row.date,
            flags: row.flags,
            detail_ref: row.detail_ref,
        })
    }
}

/// Opaque server path of one attachment, relative to the download endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttachmentRef {
    /// Server path; the first segment is a server-assigned disambiguator.
    pub path: String,
    /// File name as printed.
    pub name: String,
}

/// A listed message with its detail page parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageDetail {
    /// The listing entry this detail belongs to.
    pub summary: MessageSummary,
    /// Date from the detail page.
    pub date: String,
    /// Sender address from the detail page.
    pub sender: String,
    /// Recipient addresses.
    pub recipients: Vec<String>,
    /// Subject from the detail page, kept for cross-checking the listing.
    pub subject: String,
    /// Plain-text body.
    pub body: String,
    /// Link to the raw `.eml` download.
    pub eml_link: String,
    /// Attachments, in page order.
    pub attachments: Vec<AttachmentRef>,
}

impl MessageDetail {
    /// Returns `true` if listing and detail page disagree on the subject.
    #[must_use]
    pub fn subject_mismatch(&self) -> bool {
        self.summary.subject.trim() != self.subject.trim()
    }
}

/// Persisted attachment entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentRecord {
    /// File name as printed.
    pub name: String,
    /// Server path.
    pub path: String,
    /// Where the file was written, if it was downloaded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_path: Option<PathBuf>,
}

/// Flat, persisted form of one harvested message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRecord {
    /// Sequence number.
    pub number: String,
    /// Sender display name.
    pub author: String,
    /// Sender address.
    pub author_address: String,
    /// Subject line.
    pub subject: String,
    /// Date as printed.
    pub date: String,
    /// Body text.
    pub content: String,
    /// Attachments.
    #[serde(default)]
    pub attachments: Vec<AttachmentRecord>,
    /// Flagged state.
    pub flagged: FlagState,
    /// Answered state.
    pub answered: FlagState,
    /// Read state.
    pub read: FlagState,
    /// Size as printed.
    pub size: String,
}

impl MessageRecord {
    /// Flattens a detail; `local_paths` pairs up with `detail.attachments` by index.
    #[must_use]
    pub fn new(detail: &MessageDetail, local_paths: &[Option<PathBuf>]) -> Self {
        let summary = &detail.summary;
        let attachments = detail
            .attachments
            .iter()
            .enumerate()
            .map(|(i, a)| AttachmentRecord {
                name: a.name.clone(),
                path: a.path.clone(),
                local_path: local_paths.get(i).cloned().flatten(),
            })
            .collect();

        Self {
            number: summary.number.clone(),
            author: summary.sender_name.clone(),
            author_address: if summary.sender_address.is_empty() {
                detail.sender.clone()
            } else {
                summary.sender_address.clone()
            },
            subject: summary.subject.clone(),
            date: detail.date.clone(),
            content: detail.body.clone(),
            attachments,
            flagged: summary.flags.flagged,
            answered: summary.flags.answered,
            read: summary.flags.read,
            size: summary.size.clone(),
        }
    }
}
