//! Mail module patterns: entry anchor, folder control, message table, pagination.

use scraper::{ElementRef, Html, Selector};

use crate::PageContract;
use crate::dom::{attr, text};
use crate::error::Result;
use crate::flags::{MessageFlags, decode_icon};

/// One option of the folder selection control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderOption {
    /// Raw `id` attribute.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Navigation href (`value` attribute).
    pub href: String,
}

/// One pagination anchor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLink {
    /// Target href.
    pub href: String,
    /// Visible label, e.g. `11-20`.
    pub label: String,
}

/// One row of the message table, as printed by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapedRow {
    /// Sequence number from the row checkbox name.
    pub number: String,
    /// Popup reference that opens the message detail.
    pub detail_ref: String,
    /// Decoded envelope icon.
    pub flags: MessageFlags,
    /// Subject line.
    pub subject: String,
    /// Sender display name.
    pub sender_name: String,
    /// Sender address (span title).
    pub sender_address: String,
    /// Recipient display name, where the folder shows a recipient column.
    pub recipient_name: Option<String>,
    /// Recipient address, where the folder shows a recipient column.
    pub recipient_address: Option<String>,
    /// Size as printed.
    pub size: String,
    /// Date as printed.
    pub date: String,
}

impl PageContract {
    /// Finds the href of the mail module anchor on the landing page.
    #[must_use]
    pub fn mail_entry(&self, html: &str) -> Option<String> {
        let doc = Html::parse_document(html);
        doc.select(&self.sel.anchor)
            .find(|a| text(*a) == self.mail_entry_label)
            .and_then(|a| attr(a, "href"))
            .map(str::to_string)
    }

    /// Reads the folder selection control. Options without an `id` are skipped.
    ///
    /// # Errors
    ///
    /// Returns a drift error unless exactly one folder control is present.
    pub fn folder_options(&self, html: &str) -> Result<Vec<FolderOption>> {
        let doc = Html::parse_document(html);
        let selects: Vec<_> = doc.select(&self.sel.folder_select).collect();
        let [select] = selects.as_slice() else {
            return Err(self.drift(format!(
                "expected one folder control, found {}",
                selects.len()
            )));
        };

        Ok(select
            .select(&self.sel.option)
            .filter_map(|option| {
                let id = attr(option, "id")?;
                Some(FolderOption {
                    id: id.to_string(),
                    name: text(option),
                    href: attr(option, "value").unwrap_or_default().to_string(),
                })
            })
            .collect())
    }

    /// Parses every row of the message table, in page order.
    ///
    /// # Errors
    ///
    /// Returns a drift error if the table is missing or a row lacks a required cell.
    pub fn message_rows(&self, html: &str) -> Result<Vec<ScrapedRow>> {
        let doc = Html::parse_document(html);
        if doc.select(&self.sel.message_table).next().is_none() {
            return Err(self.drift("message table (div.jail_table) missing"));
        }

        doc.select(&self.sel.message_rows)
            .enumerate()
            .map(|(index, row)| self.message_row(index, row))
            .collect()
    }

    fn message_row(&self, index: usize, row: ElementRef<'_>) -> Result<ScrapedRow> {
        let cell = |sel: &Selector, name: &str| {
            row.select(sel)
                .next()
                .ok_or_else(|| self.drift(format!("message row {index} has no {name} cell")))
        };
        let required = |el: ElementRef<'_>, name: &str, what: &str| {
            attr(el, name)
                .map(str::to_string)
                .ok_or_else(|| self.drift(format!("message row {index} has no {what}")))
        };

        let icon = cell(&self.sel.envelope_icon, "envelope icon")?;
        let subject = cell(&self.sel.subject_link, "subject")?;
        let sender = cell(&self.sel.sender, "sender")?;
        let checkbox = cell(&self.sel.checkbox, "checkbox")?;
        let recipient = row.select(&self.sel.recipient).next();

        let checkbox_name = required(checkbox, "name", "checkbox name")?;
        let number = sequence_number(&checkbox_name)
            .ok_or_else(|| self.drift(format!("message row {index} checkbox `{checkbox_name}` has no number")))?;

        Ok(ScrapedRow {
            number,
            detail_ref: required(subject, "data-popup", "detail reference")?,
            flags: decode_icon(attr(icon, "src").unwrap_or_default()),
            subject: text(subject),
            sender_name: text(sender),
            sender_address: attr(sender, "title").unwrap_or_default().to_string(),
            recipient_name: recipient.map(text),
            recipient_address: recipient.and_then(|r| attr(r, "title")).map(str::to_string),
            size: cell(&self.sel.size, "size").map(text)?,
            date: cell(&self.sel.date, "date").map(text)?,
        })
    }

    /// Collects pagination anchors. An absent block means a single page.
    ///
    /// Anchors with an empty label are ignored; repeated hrefs keep their first position.
    #[must_use]
    pub fn page_links(&self, html: &str) -> Vec<PageLink> {
        let doc = Html::parse_document(html);
        let mut links: Vec<PageLink> = Vec::new();
        for anchor in doc.select(&self.sel.page_links) {
            let label = text(anchor);
            let Some(href) = attr(anchor, "href") else {
                continue;
            };
            if label.is_empty() || links.iter().any(|l| l.href == href) {
                continue;
            }
            links.push(PageLink {
                href: href.to_string(),
                label,
            });
        }
        links
    }
}

/// Extracts `N` from a checkbox name such as `mail[N]`.
fn sequence_number(name: &str) -> Option<String> {
    let (_, rest) = name.split_once('[')?;
    let (number, _) = rest.split_once(']')?;
    let number = number.trim();
    (!number.is_empty()).then(|| number.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::FlagState;

    fn row(number: u32, icon: &str, subject: &str) -> String {
        format!(
            r#"<tr>
                <td class="c_cb"><input type="checkbox" name="mail_ids[{number}]"></td>
                <td class="c_env"><img src="{icon}"></td>
                <td class="c_subj"><a href="" data-popup="mail_read.php?id={number}"> {subject} </a></td>
                <td class="c_from"><span title="sender{number}@school.lernsax.de">Sender {number}</span></td>
                <td class="c_date">01.02.2022 10:0{number}</td>
                <td class="c_size">2 KB</td>
            </tr>"#
        )
    }

    fn page(rows: &str) -> String {
        format!(r#"<div class="jail_table"><table><tbody>{rows}</tbody></table></div>"#)
    }

    #[test]
    fn test_mail_entry() {
        let contract = PageContract::v1().unwrap();
        let html = r#"<a href="files.php">Files</a><a href="mail.php?sid=3"> Mail service </a>"#;
        assert_eq!(contract.mail_entry(html).as_deref(), Some("mail.php?sid=3"));
        assert_eq!(contract.mail_entry("<a href=\"x\">Mail</a>"), None);
    }

    #[test]
    fn test_folder_options() {
        let contract = PageContract::v1().unwrap();
        let html = r#"<select name="select_folder">
            <option value="">-- choose --</option>
            <option id="folder_INBOX" value="mail.php?folder=INBOX">Inbox</option>
            <option id="folder_Sent" value="mail.php?folder=Sent"> Sent </option>
        </select>"#;
        let options = contract.folder_options(html).unwrap();
        assert_eq!(options.len(), 2);
        assert_eq!(options[0].id, "folder_INBOX");
        assert_eq!(options[1].name, "Sent");
        assert_eq!(options[1].href, "mail.php?folder=Sent");
    }

    #[test]
    fn test_folder_control_missing_or_duplicated() {
        let contract = PageContract::v1().unwrap();
        assert!(contract.folder_options("<p>nothing</p>").unwrap_err().is_drift());
        let twice = r#"<select name="select_folder"></select><select name="select_folder"></select>"#;
        assert!(contract.folder_options(twice).unwrap_err().is_drift());
    }

    #[test]
    fn test_message_rows() {
        let contract = PageContract::v1().unwrap();
        let html = page(&(row(4, "../pics/mail_1.svg", "Hello") + &row(3, "../pics/odd.svg", "Re: Hi")));
        let rows = contract.message_rows(&html).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].number, "4");
        assert_eq!(rows[0].subject, "Hello");
        assert_eq!(rows[0].detail_ref, "mail_read.php?id=4");
        assert_eq!(rows[0].sender_address, "sender4@school.lernsax.de");
        assert_eq!(rows[0].flags.read, FlagState::Set);
        assert_eq!(rows[0].recipient_name, None);
        assert_eq!(rows[1].flags, MessageFlags::UNIDENTIFIED);
        assert_eq!(rows[1].size, "2 KB");
    }

    #[test]
    fn test_message_rows_with_recipient_column() {
        let contract = PageContract::v1().unwrap();
        let html = page(
            r#"<tr>
                <td class="c_cb"><input name="mail_ids[9]"></td>
                <td class="c_env"><img src="../pics/mail_3.svg"></td>
                <td class="c_subj"><a data-popup="read.php?id=9">Out</a></td>
                <td class="c_from"><span title="me@x">Me</span></td>
                <td class="c_to"><span title="you@x">You</span></td>
                <td class="c_date">today</td><td class="c_size">1 KB</td>
            </tr>"#,
        );
        let rows = contract.message_rows(&html).unwrap();
        assert_eq!(rows[0].recipient_name.as_deref(), Some("You"));
        assert_eq!(rows[0].recipient_address.as_deref(), Some("you@x"));
    }

    #[test]
    fn test_empty_table_and_missing_table() {
        let contract = PageContract::v1().unwrap();
        assert!(contract.message_rows(&page("")).unwrap().is_empty());
        assert!(contract.message_rows("<table></table>").unwrap_err().is_drift());
    }

    #[test]
    fn test_row_missing_cell_is_drift() {
        let contract = PageContract::v1().unwrap();
        let html = page(r#"<tr><td class="c_cb"><input name="m[1]"></td></tr>"#);
        assert!(contract.message_rows(&html).unwrap_err().is_drift());
    }

    #[test]
    fn test_page_links() {
        let contract = PageContract::v1().unwrap();
        let html = r#"<p class="pages">
            <a href="/wws/mail.php?page=1"> 1-10 </a>
            <a href="/wws/mail.php?page=2">11-20</a>
            <a href="/wws/mail.php?page=2">11-20</a>
            <a href="/wws/mail.php?page=3"><img src="next.svg"></a>
        </p>"#;
        let links = contract.page_links(html);
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].label, "1-10");
        assert_eq!(links[1].href, "/wws/mail.php?page=2");
        assert!(contract.page_links("<p>no pages</p>").is_empty());
    }

    #[test]
    fn test_sequence_number() {
        assert_eq!(sequence_number("mail_ids[42]").as_deref(), Some("42"));
        assert_eq!(sequence_number("mail_ids[]"), None);
        assert_eq!(sequence_number("plain"), None);
    }
}
