//! Message detail layout.
//!
//! The detail popup prints metadata in a fixed-row table:
//!
//! | row      | content                         |
//! |----------|---------------------------------|
//! | 0        | sender (`span[title]`)          |
//! | 1        | date (`td.data`)                |
//! | 2        | recipients (`span[title]`)      |
//! | 3        | subject (`td.data`)             |
//! | last - 1 | attachments, when present       |
//! | last     | size and `.eml` download link   |
//!
//! A message without attachments has exactly [`PLAIN_DETAIL_ROWS`] rows.
//! Any other count means the second-to-last row lists attachments, one
//! `div` per file, followed by a fixed virus-scan notice that is not a file.
//! This has only been observed on one locale; it is kept as a contract
//! rule rather than inferred from cell content.

use scraper::{ElementRef, Html};

use crate::dom::{attr, text, text_with_breaks};
use crate::error::Result;
use crate::{PLAIN_DETAIL_ROWS, PageContract};

/// Attachment anchor found on a detail page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapedAttachment {
    /// Link target as printed.
    pub href: String,
    /// File name as printed.
    pub name: String,
}

/// Metadata and body of a message detail page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapedDetail {
    /// Sender address.
    pub sender: String,
    /// Date as printed.
    pub date: String,
    /// Recipient addresses.
    pub recipients: Vec<String>,
    /// Subject as printed.
    pub subject: String,
    /// Link to the raw `.eml` download.
    pub eml_link: String,
    /// Plain-text body.
    pub body: String,
    /// Number of metadata rows seen.
    pub row_count: usize,
    /// Attachment anchors, in page order.
    pub attachments: Vec<ScrapedAttachment>,
}

impl PageContract {
    /// Parses a message detail page.
    ///
    /// # Errors
    ///
    /// Returns a malformed-detail error if the metadata table is missing,
    /// has fewer than [`PLAIN_DETAIL_ROWS`] rows, or lacks a required cell.
    pub fn detail(&self, html: &str) -> Result<ScrapedDetail> {
        let doc = Html::parse_document(html);
        let table = doc
            .select(&self.sel.detail_table)
            .next()
            .ok_or_else(|| self.malformed("metadata table (table.table_lr) missing"))?;

        let rows: Vec<ElementRef<'_>> = table.select(&self.sel.row).collect();
        if rows.len() < PLAIN_DETAIL_ROWS {
            return Err(self.malformed(format!(
                "expected at least {PLAIN_DETAIL_ROWS} metadata rows, found {}",
                rows.len()
            )));
        }
        let last = rows[rows.len() - 1];

        let sender = rows[0]
            .select(&self.sel.span)
            .next()
            .and_then(|s| attr(s, "title"))
            .ok_or_else(|| self.malformed("sender cell missing"))?;
        let date = self.data_cell(rows[1], "date")?;
        let recipients = rows[2]
            .select(&self.sel.span)
            .filter_map(|s| attr(s, "title"))
            .map(str::to_string)
            .collect();
        let subject = self.data_cell(rows[3], "subject")?;
        let eml_link = last
            .select(&self.sel.anchor)
            .next()
            .and_then(|a| attr(a, "href"))
            .ok_or_else(|| self.malformed("eml link missing from last row"))?;

        let attachments = if rows.len() == PLAIN_DETAIL_ROWS {
            Vec::new()
        } else {
            self.attachments(rows[rows.len() - 2])?
        };

        let body = doc
            .select(&self.sel.panel)
            .next()
            .map(text_with_breaks)
            .unwrap_or_default();

        Ok(ScrapedDetail {
            sender: sender.to_string(),
            date,
            recipients,
            subject,
            eml_link: eml_link.to_string(),
            body,
            row_count: rows.len(),
            attachments,
        })
    }

    fn data_cell(&self, row: ElementRef<'_>, what: &str) -> Result<String> {
        row.select(&self.sel.data_cell)
            .next()
            .map(text)
            .ok_or_else(|| self.malformed(format!("{what} cell missing")))
    }

    /// Reads the attachment row. The final entry is the virus-scan notice.
    fn attachments(&self, tail: ElementRef<'_>) -> Result<Vec<ScrapedAttachment>> {
        let divs: Vec<_> = tail.select(&self.sel.div).collect();
        if divs.is_empty() {
            let anchors: Vec<_> = tail.select(&self.sel.anchor).collect();
            let files = anchors.split_last().map_or(&[][..], |(_, files)| files);
            return files
                .iter()
                .map(|a| {
                    let href = attr(*a, "href")
                        .ok_or_else(|| self.malformed("attachment anchor without href"))?;
                    Ok(ScrapedAttachment {
                        href: href.to_string(),
                        name: text(*a),
                    })
                })
                .collect();
        }

        divs[..divs.len() - 1]
            .iter()
            .map(|div| {
                let anchors: Vec<_> = div.select(&self.sel.anchor).collect();
                let (Some(first), Some(last)) = (anchors.first(), anchors.last()) else {
                    return Err(self.malformed("attachment entry without link"));
                };
                let href =
                    attr(*first, "href").ok_or_else(|| self.malformed("attachment link without href"))?;
                Ok(ScrapedAttachment {
                    href: href.to_string(),
                    name: text(*last),
                })
            })
            .collect()
    }
}
