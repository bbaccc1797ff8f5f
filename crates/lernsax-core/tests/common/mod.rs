//! Shared mock host for integration tests.

#![allow(dead_code, clippy::unwrap_used)]

use lernsax_auth::{AuthSession, Credentials, Site};
use lernsax_contract::PageContract;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const IDENTIFIER: &str = "jane@school.lernsax.de";

pub const LANDING: &str = r#"<html><body>
    <a href="start.php?sid=1">Start</a>
    <a href="mail.php?sid=1"> Mail service </a>
    <select id="top_select_18">
        <option class="top_option" value="">Groups</option>
        <option class="top_option" value="/wws/group.php?g=chess">Chess club</option>
    </select>
    <select id="top_select_19">
        <option class="top_option" value="">Classes</option>
        <option class="top_option" value="group.php?g=10b">10b</option>
    </select>
</body></html>"#;

/// Mounts the four login hops; the POST answers with `landing`.
pub async fn mount_login(server: &MockServer, landing: &str) {
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<script>top.location.replace('/wws/9.php?sid=1')</script>"),
        )
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/wws/9.php"))
        .respond_with(
            ResponseTemplate::new(302).insert_header("Location", "/wws/9.php#/wws/100000.php"),
        )
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/wws/100000.php"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(r#"<a href="100001.php?sid=1">Login</a>"#),
        )
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/wws/100001.php"))
        .respond_with(ResponseTemplate::new(200).set_body_string(landing))
        .mount(server)
        .await;
}

/// Logs in against the mock host.
pub async fn login(server: &MockServer, landing: &str) -> (AuthSession, PageContract) {
    mount_login(server, landing).await;
    let contract = PageContract::v1().unwrap();
    let mut auth = AuthSession::new(
        Credentials::new(IDENTIFIER, "secret").unwrap(),
        Site::new(server.uri()).unwrap(),
        contract.clone(),
    )
    .unwrap();
    auth.login().await.unwrap();
    (auth, contract)
}

/// Serves `body` for GET `route` when `key=value` is in the query.
pub async fn page(server: &MockServer, route: &str, key: &str, value: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .and(query_param(key, value))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

/// Serves `body` for any GET on `route`.
pub async fn any_page(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

/// The mail entry page with a folder control.
pub fn mail_page(folders: &[(&str, &str)]) -> String {
    let options: String = folders
        .iter()
        .map(|(id, name)| format!(r#"<option id="{id}" value="folder.php?f={id}">{name}</option>"#))
        .collect();
    format!(
        r#"<html>
            <a class="q_105592_1026" data-popup="mail_new.php?sid=1">New e-mail</a>
            <select name="select_folder"><option value="">Choose</option>{options}</select>
        </html>"#
    )
}

/// One message table row.
pub fn row(number: u32, subject: &str) -> String {
    format!(
        r#"<tr>
            <td class="c_cb"><input type="checkbox" name="mail_ids[{number}]"></td>
            <td class="c_env"><img src="../pics/mail_{icon}.svg"></td>
            <td class="c_subj"><a data-popup="mail_read.php?id={number}">{subject}</a></td>
            <td class="c_from"><span title="sender{number}@school.lernsax.de">Sender {number}</span></td>
            <td class="c_date">0{number}.02.2022 10:00</td>
            <td class="c_size">{number} KB</td>
        </tr>"#,
        icon = number % 8
    )
}

/// A message list page, optionally with pagination anchors.
pub fn list_page(rows: &[String], pages: &[(&str, &str)]) -> String {
    let pagination = if pages.is_empty() {
        String::new()
    } else {
        let anchors: String = pages
            .iter()
            .map(|(href, label)| format!(r#"<a href="{href}">{label}</a> "#))
            .collect();
        format!(r#"<p class="pages">{anchors}</p>"#)
    };
    format!(
        r#"<div class="jail_table"><table><thead><tr><th>Subject</th></tr></thead>
           <tbody>{}</tbody></table></div>{pagination}"#,
        rows.concat()
    )
}

/// A detail page. `attachments` are server paths; an empty slice gives the 5-row layout.
pub fn detail_page(subject: &str, attachments: &[&str]) -> String {
    let attachment_row = if attachments.is_empty() {
        String::new()
    } else {
        let divs: String = attachments
            .iter()
            .map(|p| {
                let name = p.rsplit('/').next().unwrap_or_default();
                format!(
                    r#"<div><a href="/wws/download.php/{p}"><img src="file.svg"></a> <a href="/wws/download.php/{p}">{name}</a></div>"#
                )
            })
            .collect();
        format!(
            r#"<tr><td>Size</td><td class="data">12 KB</td></tr>
               <tr><td>Attachments</td><td>{divs}<div>Scanned for viruses <a href="virus.php">info</a></div></td></tr>"#
        )
    };
    format!(
        r#"<html>
        <table class="table_lr">
            <tr><td>From</td><td><span title="teacher@school.lernsax.de">Teacher</span></td></tr>
            <tr><td>Date</td><td class="data">01.02.2022 10:00</td></tr>
            <tr><td>To</td><td><span title="jane@school.lernsax.de">Jane</span><span title="joe@school.lernsax.de">Joe</span></td></tr>
            <tr><td>Subject</td><td class="data">{subject}</td></tr>
            {attachment_row}
            <tr><td>Size</td><td><a href="mail_eml.php?id=1">Download .eml</a></td></tr>
        </table>
        <p class="panel">Hello class,<br>see attached.</p>
        </html>"#
    )
}
