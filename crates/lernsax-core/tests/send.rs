//! Sending through the compose popup against a mock host.

#![allow(clippy::unwrap_used)]

mod common;

use std::time::Duration;

use common::{any_page, login, mail_page, IDENTIFIER, LANDING};
use lernsax_core::{HarvestError, OutboundSender, OutgoingMail};
use reqwest::StatusCode;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_compose(server: &MockServer) {
    any_page(server, "/wws/mail.php", mail_page(&[("inbox", "Inbox")])).await;
    any_page(
        server,
        "/wws/mail_new.php",
        r#"<html><script>var x=1; var refresh_url="/wws/mail_send.php?call=2&sid=1"; go();</script></html>"#
            .to_string(),
    )
    .await;
}

#[tokio::test]
async fn send_defaults_to_own_address() {
    let server = MockServer::start().await;
    let (auth, contract) = login(&server, LANDING).await;
    mount_compose(&server).await;
    Mock::given(method("POST"))
        .and(path("/wws/mail_send.php"))
        .and(body_string_contains("to=jane%40school.lernsax.de"))
        .and(body_string_contains("subject=Reminder"))
        .and(body_string_contains("send_mail=Send+e-mail"))
        .and(body_string_contains("confirm_loose_form_changes=1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
        .expect(1)
        .mount(&server)
        .await;

    let sender = OutboundSender::new(auth.session().unwrap(), &contract);
    let status = sender
        .send(&OutgoingMail::new("Reminder", "Bring your books"))
        .await
        .unwrap();
    assert_eq!(status, StatusCode::OK);
    assert_eq!(auth.session().unwrap().identifier(), IDENTIFIER);
}

#[tokio::test]
async fn recipients_are_space_joined() {
    let server = MockServer::start().await;
    let (auth, contract) = login(&server, LANDING).await;
    mount_compose(&server).await;
    Mock::given(method("POST"))
        .and(path("/wws/mail_send.php"))
        .and(body_string_contains("to=a%40school.lernsax.de+b%40school.lernsax.de"))
        .and(body_string_contains("cc=c%40school.lernsax.de"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let mail = OutgoingMail::new("Trip", "Details follow")
        .to("a@school.lernsax.de")
        .to("b@school.lernsax.de")
        .cc("c@school.lernsax.de");
    OutboundSender::new(auth.session().unwrap(), &contract)
        .send(&mail)
        .await
        .unwrap();
}

#[tokio::test]
async fn error_status_is_send_rejected() {
    let server = MockServer::start().await;
    let (auth, contract) = login(&server, LANDING).await;
    mount_compose(&server).await;
    Mock::given(method("POST"))
        .and(path("/wws/mail_send.php"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = OutboundSender::new(auth.session().unwrap(), &contract)
        .send(&OutgoingMail::new("x", "y"))
        .await
        .unwrap_err();
    assert!(matches!(err, HarvestError::SendRejected(StatusCode::INTERNAL_SERVER_ERROR)));
}

#[tokio::test]
async fn popup_without_refresh_url_is_drift() {
    let server = MockServer::start().await;
    let (auth, contract) = login(&server, LANDING).await;
    any_page(&server, "/wws/mail.php", mail_page(&[("inbox", "Inbox")])).await;
    any_page(&server, "/wws/mail_new.php", "<html>new layout</html>".to_string()).await;

    let err = OutboundSender::new(auth.session().unwrap(), &contract)
        .send(&OutgoingMail::new("x", "y"))
        .await
        .unwrap_err();
    assert!(err.is_drift());
}

#[tokio::test]
async fn send_all_sends_in_order_and_keeps_going() {
    let server = MockServer::start().await;
    let (auth, contract) = login(&server, LANDING).await;
    mount_compose(&server).await;
    Mock::given(method("POST"))
        .and(path("/wws/mail_send.php"))
        .and(body_string_contains("subject=bad"))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/wws/mail_send.php"))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&server)
        .await;

    let sender = OutboundSender::new(auth.session().unwrap(), &contract)
        .with_pause(Duration::from_millis(5));
    let results = sender
        .send_all(&[
            OutgoingMail::new("first", "1"),
            OutgoingMail::new("bad", "2"),
            OutgoingMail::new("third", "3"),
        ])
        .await;

    assert_eq!(results.len(), 3);
    assert!(results[0].is_ok());
    assert!(matches!(results[1], Err(HarvestError::SendRejected(StatusCode::FORBIDDEN))));
    assert!(results[2].is_ok());
}
