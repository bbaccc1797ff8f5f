//! # lernsax-core
//!
//! Everything done with an authenticated LernSax session.
//!
//! This crate provides:
//! - **Mail harvesting** - folder discovery, paginated listing, message
//!   detail, attachment download and per-folder persistence
//! - **Sending** - composing mail through the host's compose popup
//! - **Group browsing** - group and class file areas, read-only
//! - Harvest settings and credential profiles
//!
//! All operations borrow a [`lernsax_auth::Session`] and issue one request
//! at a time.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod config;
mod error;
pub mod groups;
pub mod listing;
pub mod mail;
pub mod model;
pub mod profile;
pub mod send;
pub mod store;

pub use config::HarvestConfig;
pub use error::{HarvestError, Result};
pub use groups::{FileEntry, FileNode, Group, GroupBrowser};
pub use listing::{FetchedPage, Listing, ResourceKind};
pub use mail::{FolderHarvest, HarvestReport, MailHarvester, MailPages};
pub use model::{AttachmentRecord, AttachmentRef, Folder, MessageDetail, MessageRecord, MessageSummary};
pub use profile::ProfileStore;
pub use send::{OutboundSender, OutgoingMail};
pub use store::Store;
