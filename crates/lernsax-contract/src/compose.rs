//! Compose popup patterns.

use scraper::Html;

use crate::PageContract;
use crate::dom::attr;

/// Fields of the compose form as the popup submits them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposeForm<'a> {
    /// Recipient addresses.
    pub to: &'a [String],
    /// CC addresses.
    pub cc: &'a [String],
    /// BCC addresses.
    pub bcc: &'a [String],
    /// Subject line.
    pub subject: &'a str,
    /// Plain text body.
    pub body: &'a str,
}

impl PageContract {
    /// Finds the popup reference of the compose link on a mail page.
    #[must_use]
    pub fn compose_popup(&self, html: &str) -> Option<String> {
        let doc = Html::parse_document(html);
        doc.select(&self.sel.compose_link)
            .find_map(|a| attr(a, "data-popup"))
            .map(str::to_string)
    }

    /// Extracts the `refresh_url` script variable from the compose popup.
    #[must_use]
    pub fn refresh_url(&self, html: &str) -> Option<String> {
        let (_, rest) = html.split_once(self.refresh_url_marker)?;
        let (value, _) = rest.split_once(';')?;
        let value = value.trim();
        let value = value
            .strip_prefix('"')
            .and_then(|v| v.strip_suffix('"'))
            .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
            .unwrap_or(value);
        (!value.is_empty()).then(|| value.to_string())
    }

    /// Form fields for submitting a composed message.
    ///
    /// Address lists are joined by single spaces.
    #[must_use]
    pub fn compose_fields(&self, form: &ComposeForm<'_>) -> Vec<(&'static str, String)> {
        let blank = String::new;
        vec![
            ("call_no", "1".to_string()),
            ("reply", blank()),
            ("reply_all", blank()),
            ("forward", blank()),
            ("mail_id", blank()),
            ("mail_folder", blank()),
            ("file_ids", blank()),
            ("confirm_loose_form_changes", "1".to_string()),
            ("lock_to", blank()),
            ("lock_subject", blank()),
            ("in_reply_to", blank()),
            ("to", form.to.join(" ")),
            ("cc", form.cc.join(" ")),
            ("bcc", form.bcc.join(" ")),
            ("subject", form.subject.to_string()),
            ("body", form.body.to_string()),
            ("file[]", "(binary)".to_string()),
            ("send_mail", "Send e-mail".to_string()),
        ]
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_compose_popup() {
        let contract = PageContract::v1().unwrap();
        let html = r#"<a class="q_105592_1026 btn" data-popup="mail_new.php?sid=4">New</a>"#;
        assert_eq!(contract.compose_popup(html).as_deref(), Some("mail_new.php?sid=4"));
        assert_eq!(contract.compose_popup("<a class=\"other\">x</a>"), None);
    }

    #[test]
    fn test_refresh_url() {
        let contract = PageContract::v1().unwrap();
        let html = r#"<script>var x=1;var refresh_url="/wws/mail_new.php?sid=4&call=2";go();</script>"#;
        assert_eq!(
            contract.refresh_url(html).as_deref(),
            Some("/wws/mail_new.php?sid=4&call=2")
        );
        assert_eq!(
            contract.refresh_url("var refresh_url='/a';").as_deref(),
            Some("/a")
        );
        assert_eq!(contract.refresh_url("<script>nothing</script>"), None);
    }

    #[test]
    fn test_compose_fields_join_addresses() {
        let contract = PageContract::v1().unwrap();
        let to = vec!["a@x".to_string(), "b@x".to_string()];
        let form = ComposeForm {
            to: &to,
            cc: &[],
            bcc: &["c@x".to_string()],
            subject: "Hi",
            body: "Text",
        };
        let fields = contract.compose_fields(&form);
        let get = |k: &str| fields.iter().find(|(n, _)| *n == k).map(|(_, v)| v.as_str());
        assert_eq!(get("to"), Some("a@x b@x"));
        assert_eq!(get("cc"), Some(""));
        assert_eq!(get("bcc"), Some("c@x"));
        assert_eq!(get("send_mail"), Some("Send e-mail"));
    }
}
