//! Sending mail through the compose popup.
//!
//! The host has no send endpoint of its own. The compose popup embeds a
//! one-time form URL in a script variable; the message is posted there.
//! Only the response status is checked: the host prints no machine-readable
//! confirmation.

use std::time::Duration;

use lernsax_auth::Session;
use lernsax_contract::{ComposeForm, ContractError, PageContract};
use reqwest::StatusCode;
use tracing::{debug, info, warn};

use crate::error::{HarvestError, Result};

/// A message to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    /// Recipient addresses. Empty means the logged-in account.
    pub to: Vec<String>,
    /// CC addresses.
    pub cc: Vec<String>,
    /// BCC addresses.
    pub bcc: Vec<String>,
    /// Subject line.
    pub subject: String,
    /// Plain text body.
    pub body: String,
}

impl OutgoingMail {
    /// Creates a message with no recipients yet.
    #[must_use]
    pub fn new(subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            to: Vec::new(),
            cc: Vec::new(),
            bcc: Vec::new(),
            subject: subject.into(),
            body: body.into(),
        }
    }

    /// Adds a recipient.
    #[must_use]
    pub fn to(mut self, recipient: impl Into<String>) -> Self {
        self.to.push(recipient.into());
        self
    }

    /// Adds a CC recipient.
    #[must_use]
    pub fn cc(mut self, recipient: impl Into<String>) -> Self {
        self.cc.push(recipient.into());
        self
    }

    /// Adds a BCC recipient.
    #[must_use]
    pub fn bcc(mut self, recipient: impl Into<String>) -> Self {
        self.bcc.push(recipient.into());
        self
    }
}

/// Sends mail with an authenticated session.
#[derive(Debug)]
pub struct OutboundSender<'s> {
    session: &'s Session,
    contract: &'s PageContract,
    pause: Duration,
}

impl<'s> OutboundSender<'s> {
    /// Creates a sender with a 500 ms pause between batch sends.
    #[must_use]
    pub const fn new(session: &'s Session, contract: &'s PageContract) -> Self {
        Self {
            session,
            contract,
            pause: Duration::from_millis(500),
        }
    }

    /// Sets the pause between sends in [`send_all`](Self::send_all).
    #[must_use]
    pub const fn with_pause(mut self, pause: Duration) -> Self {
        self.pause = pause;
        self
    }

    /// Sends one message.
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError::EntryPointNotFound`] if the mail or compose
    /// link is missing, a drift error if the popup has no form URL, and
    /// [`HarvestError::SendRejected`] on a non-success status.
    pub async fn send(&self, mail: &OutgoingMail) -> Result<StatusCode> {
        let site = self.session.site();
        let mail_href = self
            .contract
            .mail_entry(self.session.landing_page())
            .ok_or_else(|| HarvestError::EntryPointNotFound {
                label: self.contract.mail_entry_label().to_string(),
            })?;
        let mail_page = self.session.fetch_page(&site.resolve(&mail_href)?).await?;

        let popup_href = self
            .contract
            .compose_popup(&mail_page)
            .ok_or_else(|| HarvestError::EntryPointNotFound {
                label: "compose".to_string(),
            })?;
        let popup = self.session.fetch_page(&site.resolve(&popup_href)?).await?;
        let form_path = self.contract.refresh_url(&popup).ok_or_else(|| {
            HarvestError::ProtocolDrift(ContractError::drift(
                self.contract.version(),
                "compose popup has no refresh_url",
            ))
        })?;
        let form_url = site.resolve_root(&form_path)?;

        let default_to = [self.session.identifier().to_string()];
        let to = if mail.to.is_empty() { &default_to[..] } else { &mail.to[..] };
        let fields = self.contract.compose_fields(&ComposeForm {
            to,
            cc: &mail.cc,
            bcc: &mail.bcc,
            subject: &mail.subject,
            body: &mail.body,
        });

        debug!(url = %form_url, recipients = to.len(), "Submitting compose form");
        let status = self.session.submit_form(&form_url, &fields).await?;
        if !status.is_success() {
            return Err(HarvestError::SendRejected(status));
        }
        info!(subject = %mail.subject, %status, "Mail sent");
        Ok(status)
    }

    /// Sends messages one after another, pausing between sends.
    ///
    /// A failed send does not stop the batch; results are returned in input order.
    pub async fn send_all(&self, mails: &[OutgoingMail]) -> Vec<Result<StatusCode>> {
        let mut results = Vec::with_capacity(mails.len());
        for (i, mail) in mails.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(self.pause).await;
            }
            let result = self.send(mail).await;
            if let Err(e) = &result {
                warn!(index = i, error = %e, "Send failed");
            }
            results.push(result);
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let mail = OutgoingMail::new("Hi", "Body")
            .to("a@school.lernsax.de")
            .to("b@school.lernsax.de")
            .cc("c@school.lernsax.de")
            .bcc("d@school.lernsax.de");
        assert_eq!(mail.to.len(), 2);
        assert_eq!(mail.cc, vec!["c@school.lernsax.de"]);
        assert_eq!(mail.bcc, vec!["d@school.lernsax.de"]);
        assert_eq!(mail.subject, "Hi");
    }
}
