//! On-disk output: one JSON file per folder plus downloaded attachments.

use std::io;
use std::path::{Path, PathBuf};

use percent_encoding::percent_decode_str;
use tracing::{debug, info};

use crate::error::{HarvestError, Result};
use crate::model::MessageRecord;

/// Output locations for one harvest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Store {
    output_dir: PathBuf,
    attachments_dir: PathBuf,
}

impl Store {
    /// Creates a store writing records to `output_dir` and attachments to `attachments_dir`.
    pub fn new(output_dir: impl Into<PathBuf>, attachments_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            attachments_dir: attachments_dir.into(),
        }
    }

    /// Directory receiving `<folder_id>.json` files.
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Path of a folder's record file.
    #[must_use]
    pub fn folder_file(&self, folder_id: &str) -> PathBuf {
        self.output_dir.join(format!("{folder_id}.json"))
    }

    /// Local path for an attachment's server path.
    ///
    /// The first segment is a server-assigned disambiguator and is dropped.
    /// The remaining segments are percent-decoded; `.`, `..` and empty
    /// segments are skipped and separators inside a segment become `_`, so
    /// the result always stays below `<attachments_dir>/<folder_id>`. Depends
    /// on nothing but its arguments.
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError::AttachmentWrite`] if no usable segment remains.
    pub fn attachment_path(&self, folder_id: &str, server_path: &str) -> Result<PathBuf> {
        self.local_path(folder_id, server_path, 1)
    }

    /// Like [`attachment_path`](Self::attachment_path) but keeps the
    /// disambiguating first segment.
    ///
    /// Used when two server paths map to the same name.
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError::AttachmentWrite`] if no usable segment remains.
    pub fn prefixed_attachment_path(&self, folder_id: &str, server_path: &str) -> Result<PathBuf> {
        self.local_path(folder_id, server_path, 0)
    }

    fn local_path(&self, folder_id: &str, server_path: &str, skip: usize) -> Result<PathBuf> {
        let mut local = self.attachments_dir.join(folder_id);
        let mut named = false;
        for segment in server_path.split('/').filter(|s| !s.is_empty()).skip(skip) {
            let decoded = percent_decode_str(segment).decode_utf8_lossy();
            let name = decoded.replace(['/', '\\'], "_");
            if name.is_empty() || name == "." || name == ".." {
                continue;
            }
            local.push(name);
            named = true;
        }
        if named {
            Ok(local)
        } else {
            Err(HarvestError::AttachmentWrite {
                path: server_path.to_string(),
                source: io::Error::new(io::ErrorKind::InvalidInput, "no file name in server path"),
            })
        }
    }

    /// Writes attachment content to `local`, creating parent directories.
    ///
    /// `server_path` only labels errors.
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError::AttachmentWrite`] if the write fails.
    pub async fn write_attachment(&self, local: &Path, server_path: &str, content: &[u8]) -> Result<()> {
        let write_error = |source| HarvestError::AttachmentWrite {
            path: server_path.to_string(),
            source,
        };
        if let Some(parent) = local.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(write_error)?;
        }
        tokio::fs::write(local, content).await.map_err(write_error)?;
        debug!(path = %local.display(), bytes = content.len(), "Attachment written");
        Ok(())
    }

    /// Writes a folder's records as one pretty-printed JSON array, replacing any previous file.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub async fn persist_folder(&self, folder_id: &str, records: &[MessageRecord]) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|e| HarvestError::io(&self.output_dir, e))?;
        let file = self.folder_file(folder_id);
        let contents = serde_json::to_string_pretty(records)?;
        tokio::fs::write(&file, contents)
            .await
            .map_err(|e| HarvestError::io(&file, e))?;
        info!(folder = folder_id, records = records.len(), path = %file.display(), "Folder persisted");
        Ok(file)
    }

    /// Reads back a folder's records.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing or not a record array.
    pub async fn load_folder(&self, folder_id: &str) -> Result<Vec<MessageRecord>> {
        let file = self.folder_file(folder_id);
        let contents = tokio::fs::read_to_string(&file)
            .await
            .map_err(|e| HarvestError::io(&file, e))?;
        Ok(serde_json::from_str(&contents)?)
    }
}
