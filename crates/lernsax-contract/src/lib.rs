//! # lernsax-contract
//!
//! The LernSax web interface has no API. Everything this workspace knows
//! about it is a set of observed page patterns: a script redirect on the
//! site root, an anchor prefix for the login frame, a failure marker in
//! the login response, fixed table layouts for message lists and message
//! detail, an icon-per-state envelope column.
//!
//! This crate is the only place those patterns live. A [`PageContract`]
//! bundles one consistent revision of them, compiled once, and exposes
//! pure lookups that turn page HTML into scraped records. When the host
//! changes its markup, lookups fail with [`ContractError::Drift`] naming
//! the contract version and the expectation that broke.
//!
//! ```ignore
//! use lernsax_contract::PageContract;
//!
//! let contract = PageContract::v1()?;
//! let target = contract.redirect_target(&root_html)?;
//! let rows = contract.message_rows(&mail_page_html)?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod compose;
mod detail;
mod dom;
mod error;
pub mod flags;
mod groups;
mod login;
mod mail;

use regex::Regex;
use scraper::Selector;

pub use compose::ComposeForm;
pub use detail::{ScrapedAttachment, ScrapedDetail};
pub use error::{ContractError, Result};
pub use flags::{FlagState, MessageFlags, decode_icon};
pub use groups::{GroupKind, GroupOption, ScrapedFileEntry};
pub use mail::{FolderOption, PageLink, ScrapedRow};

/// Version number of the first (and current) host contract.
pub const CONTRACT_V1: u32 = 1;

/// Number of metadata rows a detail page has when the message carries no attachments.
pub const PLAIN_DETAIL_ROWS: usize = 5;

/// One revision of the host page contract.
#[derive(Debug, Clone)]
pub struct PageContract {
    version: u32,
    redirect: Regex,
    login_anchor_prefix: &'static str,
    login_failure_marker: &'static str,
    mail_entry_label: &'static str,
    refresh_url_marker: &'static str,
    sel: Selectors,
}

/// Compiled CSS selectors used by the lookups.
#[derive(Debug, Clone)]
pub(crate) struct Selectors {
    pub anchor: Selector,
    pub option: Selector,
    pub span: Selector,
    pub div: Selector,
    pub row: Selector,
    pub folder_select: Selector,
    pub message_table: Selector,
    pub message_rows: Selector,
    pub envelope_icon: Selector,
    pub subject_link: Selector,
    pub sender: Selector,
    pub recipient: Selector,
    pub size: Selector,
    pub date: Selector,
    pub checkbox: Selector,
    pub page_links: Selector,
    pub detail_table: Selector,
    pub data_cell: Selector,
    pub panel: Selector,
    pub compose_link: Selector,
    pub group_select: Selector,
    pub class_select: Selector,
    pub top_option: Selector,
    pub files_menu: Selector,
    pub file_table: Selector,
    pub folder_row: Selector,
    pub file_row: Selector,
}

impl Selectors {
    fn v1() -> Result<Self> {
        Ok(Self {
            anchor: compile("a")?,
            option: compile("option")?,
            span: compile("span")?,
            div: compile("div")?,
            row: compile("tr")?,
            folder_select: compile("select[name=\"select_folder\"]")?,
            message_table: compile("div.jail_table")?,
            message_rows: compile("div.jail_table tbody tr")?,
            envelope_icon: compile("td.c_env img")?,
            subject_link: compile("td.c_subj a")?,
            sender: compile("td.c_from span")?,
            recipient: compile("td.c_to span")?,
            size: compile("td.c_size")?,
            date: compile("td.c_date")?,
            checkbox: compile("td.c_cb input")?,
            page_links: compile("p.pages a")?,
            detail_table: compile("table.table_lr")?,
            data_cell: compile("td.data")?,
            panel: compile("p.panel")?,
            compose_link: compile("a.q_105592_1026")?,
            group_select: compile("select#top_select_18")?,
            class_select: compile("select#top_select_19")?,
            top_option: compile("option.top_option")?,
            files_menu: compile("li#menu_125520 a")?,
            file_table: compile("table.table_list")?,
            folder_row: compile("tr.files_item_folder")?,
            file_row: compile("tr.files_item_file")?,
        })
    }
}

fn compile(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| ContractError::InvalidPattern {
        pattern: css.to_string(),
        reason: e.to_string(),
    })
}

impl PageContract {
    /// Builds contract v1, the layout observed on the production site.
    ///
    /// # Errors
    ///
    /// Returns an error if a built-in selector or pattern fails to compile.
    pub fn v1() -> Result<Self> {
        let redirect_src = r"top\.location\.replace\('(?P<redirect_url>.*)'\)";
        let redirect = Regex::new(redirect_src).map_err(|e| ContractError::InvalidPattern {
            pattern: redirect_src.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            version: CONTRACT_V1,
            redirect,
            login_anchor_prefix: "100001.php",
            login_failure_marker: "msgbox('The login data could not be found in the database.');",
            mail_entry_label: "Mail service",
            refresh_url_marker: "var refresh_url=",
            sel: Selectors::v1()?,
        })
    }

    /// Returns the contract version.
    #[must_use]
    pub const fn version(&self) -> u32 {
        self.version
    }

    /// Returns the marker string the host embeds when a login is rejected.
    #[must_use]
    pub const fn login_failure_marker(&self) -> &'static str {
        self.login_failure_marker
    }

    /// Returns the anchor label of the mail module on the landing page.
    #[must_use]
    pub const fn mail_entry_label(&self) -> &'static str {
        self.mail_entry_label
    }

    fn drift(&self, what: impl Into<String>) -> ContractError {
        ContractError::drift(self.version, what)
    }

    fn malformed(&self, what: impl Into<String>) -> ContractError {
        ContractError::malformed_detail(self.version, what)
    }
}
