//! Login handshake patterns.

use scraper::Html;

use crate::PageContract;
use crate::dom::attr;
use crate::error::Result;

impl PageContract {
    /// Extracts the client-side redirect target from the site root page.
    ///
    /// # Errors
    ///
    /// Returns a drift error if the page has no `top.location.replace(..)` call.
    pub fn redirect_target(&self, html: &str) -> Result<String> {
        self.redirect
            .captures(html)
            .and_then(|caps| caps.name("redirect_url"))
            .map(|m| m.as_str().to_string())
            .ok_or_else(|| self.drift("site root has no script redirect"))
    }

    /// Reduces a redirect `Location` header to the login page reference.
    ///
    /// The host hides the real target in the fragment, so only the text
    /// after the last `#` is kept. A header without `#` is returned whole.
    #[must_use]
    pub fn location_target<'a>(&self, location: &'a str) -> &'a str {
        location.rsplit('#').next().unwrap_or(location)
    }

    /// Finds the href of the anchor that opens the login frame.
    #[must_use]
    pub fn login_target(&self, html: &str) -> Option<String> {
        let doc = Html::parse_document(html);
        doc.select(&self.sel.anchor)
            .filter_map(|a| attr(a, "href"))
            .find(|href| href.starts_with(self.login_anchor_prefix))
            .map(str::to_string)
    }

    /// Form fields the login frame submits.
    #[must_use]
    pub fn login_form(&self, identifier: &str, secret: &str) -> Vec<(&'static str, String)> {
        vec![
            ("login_login", identifier.to_string()),
            ("login_password", secret.to_string()),
            ("login_submit", "Login".to_string()),
            ("language", "1".to_string()),
        ]
    }

    /// Returns `true` if the login response carries the rejection marker.
    #[must_use]
    pub fn is_login_rejected(&self, html: &str) -> bool {
        html.contains(self.login_failure_marker)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crate::PageContract;

    #[test]
    fn test_redirect_target() {
        let contract = PageContract::v1().unwrap();
        let html = "<html><script>top.location.replace('/wws/9.php?sid=1')</script></html>";
        assert_eq!(contract.redirect_target(html).unwrap(), "/wws/9.php?sid=1");
    }

    #[test]
    fn test_redirect_target_missing_is_drift() {
        let contract = PageContract::v1().unwrap();
        let err = contract
            .redirect_target("<html><script>window.location='/x'</script></html>")
            .unwrap_err();
        assert!(err.is_drift());
    }

    #[test]
    fn test_location_target() {
        let contract = PageContract::v1().unwrap();
        assert_eq!(
            contract.location_target("https://host/wws/9.php#/wws/100000.php?sid=2"),
            "/wws/100000.php?sid=2"
        );
        assert_eq!(contract.location_target("a#b#c"), "c");
        assert_eq!(contract.location_target("100000.php"), "100000.php");
    }

    #[test]
    fn test_login_target() {
        let contract = PageContract::v1().unwrap();
        let html = r#"<a href="help.php">Help</a><a href="100001.php?sid=77">Login</a><a href="100001.php?x">Other</a>"#;
        assert_eq!(
            contract.login_target(html).as_deref(),
            Some("100001.php?sid=77")
        );
        assert_eq!(contract.login_target("<a href=\"help.php\">Help</a>"), None);
    }

    #[test]
    fn test_login_form_and_marker() {
        let contract = PageContract::v1().unwrap();
        let form = contract.login_form("user@school.lernsax.de", "pw");
        assert_eq!(form[0], ("login_login", "user@school.lernsax.de".to_string()));
        assert_eq!(form[3], ("language", "1".to_string()));

        let rejected = format!("<script>{}</script>", contract.login_failure_marker());
        assert!(contract.is_login_rejected(&rejected));
        assert!(!contract.is_login_rejected("<html>Welcome</html>"));
    }
}
