//! Group and class navigation, and the file listing table.

use scraper::Html;

use crate::PageContract;
use crate::dom::{attr, text};
use crate::error::Result;

/// Which membership control to read from the landing page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKind {
    /// Working groups.
    Group,
    /// School classes.
    Class,
}

impl GroupKind {
    const fn label(self) -> &'static str {
        match self {
            Self::Group => "group",
            Self::Class => "class",
        }
    }
}

/// A group or class the user belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupOption {
    /// Display name.
    pub name: String,
    /// Navigation href.
    pub href: String,
}

/// One entry of a file listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScrapedFileEntry {
    /// A sub-folder.
    Folder {
        /// Display name.
        name: String,
        /// Navigation href.
        href: String,
    },
    /// A file.
    File {
        /// File name.
        name: String,
        /// Detail page href.
        href: String,
        /// Direct download URL from the drag-and-drop attribute.
        download_url: String,
    },
}

impl PageContract {
    /// Reads the group or class selection control on the landing page.
    ///
    /// # Errors
    ///
    /// Returns a drift error unless exactly one control of that kind is present.
    pub fn group_options(&self, html: &str, kind: GroupKind) -> Result<Vec<GroupOption>> {
        let doc = Html::parse_document(html);
        let sel = match kind {
            GroupKind::Group => &self.sel.group_select,
            GroupKind::Class => &self.sel.class_select,
        };
        let selects: Vec<_> = doc.select(sel).collect();
        let [select] = selects.as_slice() else {
            return Err(self.drift(format!(
                "expected one {} control, found {}",
                kind.label(),
                selects.len()
            )));
        };

        Ok(select
            .select(&self.sel.top_option)
            .filter_map(|option| {
                let href = attr(option, "value").filter(|v| !v.is_empty())?;
                Some(GroupOption {
                    name: text(option),
                    href: href.to_string(),
                })
            })
            .collect())
    }

    /// Finds the files menu entry on a group page.
    #[must_use]
    pub fn files_menu(&self, html: &str) -> Option<String> {
        let doc = Html::parse_document(html);
        doc.select(&self.sel.files_menu)
            .find_map(|a| attr(a, "href"))
            .map(str::to_string)
    }

    /// Parses a file listing. The first folder row is the listed folder itself and is dropped.
    ///
    /// # Errors
    ///
    /// Returns a drift error if the listing table is missing.
    pub fn file_entries(&self, html: &str) -> Result<Vec<ScrapedFileEntry>> {
        let doc = Html::parse_document(html);
        let table = doc
            .select(&self.sel.file_table)
            .next()
            .ok_or_else(|| self.drift("file table (table.table_list) missing"))?;

        let folders = table.select(&self.sel.folder_row).skip(1).filter_map(|row| {
            let anchor = row.select(&self.sel.anchor).next()?;
            Some(ScrapedFileEntry::Folder {
                name: text(anchor),
                href: attr(anchor, "href")?.to_string(),
            })
        });

        let files = table.select(&self.sel.file_row).filter_map(|row| {
            let drag = attr(row, "data-drag_downloadurl")?;
            let (name, download_url) = split_drag_url(drag)?;
            let href = row
                .select(&self.sel.anchor)
                .next()
                .and_then(|a| attr(a, "href"))
                .unwrap_or_default();
            Some(ScrapedFileEntry::File {
                name,
                href: href.to_string(),
                download_url,
            })
        });

        Ok(folders.chain(files).collect())
    }
}

/// Splits a `mime:name:url` drag-and-drop value into name and URL.
fn split_drag_url(value: &str) -> Option<(String, String)> {
    let (_, rest) = value.split_once(':')?;
    let at = rest.rfind(":http")?;
    let name = &rest[..at];
    let url = &rest[at + 1..];
    (!name.is_empty()).then(|| (name.to_string(), url.to_string()))
}
