//! Group and class browsing against a mock host.

#![allow(clippy::unwrap_used)]

mod common;

use common::{login, page, LANDING};
use lernsax_contract::GroupKind;
use lernsax_core::{FileEntry, GroupBrowser, HarvestError};
use wiremock::MockServer;

const ROOT: &str = r#"<table class="table_list">
    <tr class="files_item_folder"><td><a href="files.php?g=chess">Chess club</a></td></tr>
    <tr class="files_item_folder"><td><a href="files_sub.php?folder=hw">Homework</a></td></tr>
    <tr class="files_item_file" data-drag_downloadurl="application/pdf:rules.pdf:https://www.lernsax.de/wws/download.php/abc/rules.pdf">
        <td><a href="file.php?id=7">rules.pdf</a></td>
    </tr>
</table>"#;

const HOMEWORK: &str = r#"<table class="table_list">
    <tr class="files_item_folder"><td><a href="files_sub.php?folder=hw">Homework</a></td></tr>
    <tr class="files_item_file" data-drag_downloadurl="text/plain:sheet.txt:https://www.lernsax.de/wws/download.php/def/sheet.txt">
        <td><a href="file.php?id=8">sheet.txt</a></td>
    </tr>
</table>"#;

async fn mount_files(server: &MockServer) {
    page(
        server,
        "/wws/group.php",
        "g",
        "chess",
        r#"<ul><li id="menu_125520"><a href="files.php?g=chess">Files</a></li></ul>"#.to_string(),
    )
    .await;
    page(server, "/wws/files.php", "g", "chess", ROOT.to_string()).await;
    page(server, "/wws/files_sub.php", "folder", "hw", HOMEWORK.to_string()).await;
}

#[tokio::test]
async fn groups_and_classes_come_from_the_landing_page() {
    let server = MockServer::start().await;
    let (auth, contract) = login(&server, LANDING).await;
    let browser = GroupBrowser::new(auth.session().unwrap(), &contract);

    let groups = browser.list_groups().unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].name, "Chess club");
    assert_eq!(groups[0].kind, GroupKind::Group);
    assert_eq!(groups[0].url.as_str(), format!("{}/wws/group.php?g=chess", server.uri()));

    let classes = browser.list_classes().unwrap();
    assert_eq!(classes[0].name, "10b");
    assert_eq!(classes[0].url.as_str(), format!("{}/wws/group.php?g=10b", server.uri()));
}

#[tokio::test]
async fn browse_folder_drops_the_folder_itself() {
    let server = MockServer::start().await;
    let (auth, contract) = login(&server, LANDING).await;
    mount_files(&server).await;
    let browser = GroupBrowser::new(auth.session().unwrap(), &contract);

    let group = browser.list_groups().unwrap().remove(0);
    let root = browser.open_group_files(&group).await.unwrap();
    let entries = browser.browse_folder(&root).await.unwrap();

    let names: Vec<&str> = entries.iter().map(FileEntry::name).collect();
    assert_eq!(names, vec!["Homework", "rules.pdf"]);
    assert!(matches!(
        &entries[1],
        FileEntry::File { download_url, .. }
            if download_url.as_str() == "https://www.lernsax.de/wws/download.php/abc/rules.pdf"
    ));
}

#[tokio::test]
async fn walk_respects_depth() {
    let server = MockServer::start().await;
    let (auth, contract) = login(&server, LANDING).await;
    mount_files(&server).await;
    let browser = GroupBrowser::new(auth.session().unwrap(), &contract);
    let group = browser.list_groups().unwrap().remove(0);

    let tree = browser.walk(&group, 1).await.unwrap();
    assert_eq!(tree.len(), 2);
    assert_eq!(tree[0].entry.name(), "Homework");
    assert_eq!(tree[0].children.len(), 1);
    assert_eq!(tree[0].children[0].entry.name(), "sheet.txt");
    assert!(tree[1].children.is_empty());

    let shallow = browser.walk(&group, 0).await.unwrap();
    assert!(shallow[0].children.is_empty());
}

#[tokio::test]
async fn group_without_files_menu() {
    let server = MockServer::start().await;
    let (auth, contract) = login(&server, LANDING).await;
    page(&server, "/wws/group.php", "g", "10b", "<ul></ul>".to_string()).await;
    let browser = GroupBrowser::new(auth.session().unwrap(), &contract);

    let class = browser.list_classes().unwrap().remove(0);
    assert!(matches!(
        browser.open_group_files(&class).await,
        Err(HarvestError::EntryPointNotFound { .. })
    ));
}
