//! Sakai/Brightspace/WebDAV responses mounted on a wiremock server

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Bytes served for every attachment download
pub const ATTACHMENT_BYTES: &str = "%PDF-1.4 rubric";

/// Session id handed out by the mocked login
pub const SESSION: &str = "sess-e2e";

/// Accept the Sakai login
pub async fn mount_login(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/direct/session"))
        .respond_with(ResponseTemplate::new(201).set_body_string(SESSION))
        .mount(server)
        .await;
}

/// Serve a Sakai site whose assignments each carry the named attachments
pub async fn mount_site(server: &MockServer, guid: &str, assignments: &[(&str, &[&str])]) {
    let collection: Vec<_> = assignments
        .iter()
        .map(|(id, _)| json!({"id": id, "title": format!("Assignment {id}")}))
        .collect();
    Mock::given(method("GET"))
        .and(path(format!("/direct/assignment/site/{guid}.json")))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"assignment_collection": collection})),
        )
        .mount(server)
        .await;

    for (id, files) in assignments {
        let attachments: Vec<_> = files
            .iter()
            .map(|name| {
                json!({
                    "name": name,
                    "url": format!("{}/access/content/{id}/{name}", server.uri())
                })
            })
            .collect();
        Mock::given(method("GET"))
            .and(path(format!("/direct/assignment/item/{id}.json")))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"id": id, "title": id, "attachments": attachments})),
            )
            .mount(server)
            .await;

        for name in files.iter() {
            Mock::given(method("GET"))
                .and(path(format!("/access/content/{id}/{name}")))
                .respond_with(ResponseTemplate::new(200).set_body_string(ATTACHMENT_BYTES))
                .mount(server)
                .await;
        }
    }
}

/// Make the Sakai site listing fail with `status`
pub async fn mount_broken_site(server: &MockServer, guid: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path(format!("/direct/assignment/site/{guid}.json")))
        .respond_with(ResponseTemplate::new(status).set_body_string("site unavailable"))
        .mount(server)
        .await;
}

/// Brightspace course with code `code`; containers are created with id `container`
pub async fn mount_course(server: &MockServer, ouid: &str, code: &str, container: i64) {
    Mock::given(method("POST"))
        .and(path(format!("/d2l/api/le/1.74/{ouid}/dropbox/folders/")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Id": container})))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/d2l/api/lp/1.47/courses/{ouid}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Identifier": ouid,
            "Name": format!("Course {code}"),
            "Code": code
        })))
        .mount(server)
        .await;
}

/// Accept every MKCOL and PUT on WebDAV storage
pub async fn mount_storage(server: &MockServer) {
    Mock::given(method("MKCOL"))
        .respond_with(ResponseTemplate::new(201))
        .mount(server)
        .await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(201))
        .mount(server)
        .await;
}

/// Answer attachment links into `container` with `status`
pub async fn mount_link(server: &MockServer, ouid: &str, container: i64, status: u16) {
    Mock::given(method("POST"))
        .and(path(format!(
            "/d2l/api/le/1.74/{ouid}/dropbox/folders/{container}/attachments/"
        )))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}
