#![forbid(unsafe_code)]

mod support;

use serde_json::{Value, json};
use std::collections::BTreeSet;
use support::*;

#[test]
fn short_title_is_rejected_with_field_errors() {
    let mut server = Server::start("short_title_is_rejected_with_field_errors");

    let result = server.call_as_editor("publishNews", json!({ "title": "Hi", "author": "A" }));
    assert_eq!(error_code(&result), "INVALID_ARGUMENT");
    assert_eq!(result["error"]["retryable"], json!(false));

    let field_errors = result["error"]["details"]["fieldErrors"]
        .as_array()
        .expect("fieldErrors");
    assert_eq!(field_errors.len(), 1, "{result}");
    assert_eq!(field_errors[0]["field"], json!("title"));
    assert_eq!(field_errors[0]["code"], json!("too_short"));

    let listed = server.call("listNews", Value::Null, Value::Null);
    assert_eq!(listed, json!({ "success": true, "news": [] }));
}

#[test]
fn denied_domain_is_rejected_with_reason() {
    let mut server = Server::start("denied_domain_is_rejected_with_reason");

    let result = server.call_as_editor(
        "publishNews",
        json!({
            "title": "Valid Title Here",
            "author": "Jane",
            "link": "https://malware.com/x"
        }),
    );
    assert_eq!(error_code(&result), "INVALID_ARGUMENT");
    assert_eq!(result["error"]["details"]["reason"], json!("Domain blacklisted"));

    // Nothing was allocated for the rejected article.
    let ok = server.call_as_editor(
        "publishNews",
        json!({ "title": "Valid Title Here", "author": "Jane", "link": "https://example.org/a" }),
    );
    assert_eq!(news_id(&ok), 1);
}

#[test]
fn sequential_publishes_get_consecutive_ids() {
    let mut server = Server::start("sequential_publishes_get_consecutive_ids");

    let first = server.call_as_editor(
        "publishNews",
        json!({ "title": "First headline", "author": "Jane" }),
    );
    let second = server.call_as_editor(
        "publishNews",
        json!({ "title": "Second headline", "author": "Jane", "description": "Body" }),
    );
    assert_eq!(news_id(&first), 1);
    assert_eq!(news_id(&second), 2);

    let read = server.call("getNews", Value::Null, json!({ "newsId": 2 }));
    assert_eq!(read["news"]["id"], json!(2));
    assert_eq!(read["news"]["title"], json!("Second headline"));
    assert_eq!(read["news"]["description"], json!("Body"));
    assert_eq!(read["news"]["createdBy"], json!("editor-1"));
    assert!(read["news"]["createdAt"].as_str().is_some_and(|s| s.ends_with('Z')));

    let listed = server.call("listNews", Value::Null, json!({ "limit": 1 }));
    let ids = listed["news"]
        .as_array()
        .expect("news")
        .iter()
        .map(|item| item["id"].as_i64().expect("id"))
        .collect::<Vec<_>>();
    assert_eq!(ids, vec![2]);

    let missing = server.call("getNews", Value::Null, json!({ "newsId": 3 }));
    assert_eq!(error_code(&missing), "NOT_FOUND");
}

#[test]
fn two_processes_share_one_counter() {
    let storage_dir = temp_dir("two_processes_share_one_counter");
    let mut left = Server::start_with_storage_dir(storage_dir.clone(), &[], true);
    let mut right = Server::start_with_storage_dir(storage_dir, &[], false);

    let mut ids = BTreeSet::new();
    for round in 0..5 {
        for server in [&mut left, &mut right] {
            let result = server.call_as_editor(
                "publishNews",
                json!({ "title": format!("Headline {round}"), "author": "Jane" }),
            );
            assert!(ids.insert(news_id(&result)), "duplicate id: {result}");
        }
    }
    assert_eq!(ids, (1..=10).collect::<BTreeSet<_>>());
}

#[test]
fn callers_must_be_authenticated_publishers() {
    let mut server = Server::start("callers_must_be_authenticated_publishers");
    let draft = json!({ "title": "Valid Title Here", "author": "Jane" });

    let anonymous = server.call("publishNews", Value::Null, draft.clone());
    assert_eq!(error_code(&anonymous), "UNAUTHENTICATED");

    let reader = server.call(
        "publishNews",
        json!({ "uid": "reader-1", "role": "reader" }),
        draft.clone(),
    );
    assert_eq!(error_code(&reader), "PERMISSION_DENIED");

    let blank_uid = server.call("publishNews", json!({ "uid": "  ", "role": "editor" }), draft);
    assert_eq!(error_code(&blank_uid), "UNAUTHENTICATED");
}

#[test]
fn configured_publisher_roles_replace_defaults() {
    let mut server = Server::start_with_args(
        "configured_publisher_roles_replace_defaults",
        &["--publisher-role", "staff"],
    );
    let draft = json!({ "title": "Valid Title Here", "author": "Jane" });

    let editor = server.call_as_editor("publishNews", draft.clone());
    assert_eq!(error_code(&editor), "PERMISSION_DENIED");

    let staff = server.call("publishNews", json!({ "uid": "s1", "role": "Staff" }), draft);
    assert_eq!(news_id(&staff), 1);
}

#[test]
fn upload_credential_attaches_image_to_published_article() {
    let mut server = Server::start("upload_credential_attaches_image_to_published_article");

    let grant = server.call_as_editor("getNewsUploadUrl", json!({ "contentType": "image/jpeg" }));
    assert_eq!(grant["success"], json!(true), "{grant}");
    assert_eq!(grant["objectKey"], json!("news/1/image.jpg"));
    assert_eq!(grant["expectedNewsId"], json!(1));
    assert_eq!(grant["method"], json!("PUT"));
    assert!(grant["uploadUrl"]
        .as_str()
        .is_some_and(|url| url.starts_with("https://storage.local/upload/news/1/image.jpg?")));

    let published = server.call_as_editor(
        "publishNews",
        json!({ "title": "Pictured headline", "author": "Jane" }),
    );
    assert_eq!(news_id(&published), 1);

    let attached = server.call_as_editor(
        "attachNewsImage",
        json!({
            "newsId": 1,
            "objectKey": grant["objectKey"],
            "contentType": grant["contentType"],
            "expires": grant["expires"],
            "signature": grant["signature"]
        }),
    );
    assert_eq!(attached["success"], json!(true), "{attached}");
    assert_eq!(attached["news"]["imageRef"], json!("news/1/image.jpg"));

    let unsupported =
        server.call_as_editor("getNewsUploadUrl", json!({ "contentType": "text/html" }));
    assert_eq!(error_code(&unsupported), "INVALID_ARGUMENT");
}

#[test]
fn malformed_lines_get_an_error_and_the_loop_continues() {
    let mut server = Server::start("malformed_lines_get_an_error_and_the_loop_continues");

    server.send_line("{not json");
    let resp = server.recv();
    assert_eq!(resp["id"], Value::Null);
    assert_eq!(error_code(&resp["result"]), "INVALID_ARGUMENT");

    server.send_bytes(b"{\"id\":9,\"function\":\"getNews\",\"data\":\"\xff\xfe\"}\n");
    let resp = server.recv();
    assert_eq!(resp["id"], Value::Null);
    assert_eq!(error_code(&resp["result"]), "INVALID_ARGUMENT");
    assert!(
        resp["result"]["error"]["message"]
            .as_str()
            .is_some_and(|message| message.contains("UTF-8")),
        "{resp}"
    );

    let unknown = server.call_as_editor("deleteNews", json!({}));
    assert_eq!(error_code(&unknown), "NOT_FOUND");

    let ok = server.call_as_editor(
        "publishNews",
        json!({ "title": "Still serving", "author": "Jane" }),
    );
    assert_eq!(news_id(&ok), 1);
}

#[test]
fn oversized_request_lines_are_rejected_and_serving_continues() {
    let mut server = Server::start_with_args(
        "oversized_request_lines_are_rejected_and_serving_continues",
        &["--max-request-bytes", "512"],
    );

    let big = json!({
        "id": 1,
        "function": "publishNews",
        "auth": editor(),
        "data": { "title": "Valid Title Here", "author": "Jane", "description": "x".repeat(4096) }
    });
    server.send(big);
    let resp = server.recv();
    assert_eq!(resp["id"], Value::Null);
    assert_eq!(error_code(&resp["result"]), "INVALID_ARGUMENT");
    assert!(
        resp["result"]["error"]["message"]
            .as_str()
            .is_some_and(|message| message.contains("exceeds 512 bytes")),
        "{resp}"
    );

    let ok = server.call_as_editor(
        "publishNews",
        json!({ "title": "Small enough", "author": "Jane" }),
    );
    assert_eq!(news_id(&ok), 1);
}

#[test]
fn fail_closed_policy_rejects_unparseable_links() {
    let mut server = Server::start_with_args(
        "fail_closed_policy_rejects_unparseable_links",
        &["--url-parse-policy", "closed"],
    );

    let result = server.call_as_editor(
        "publishNews",
        json!({ "title": "Valid Title Here", "author": "Jane", "link": "https://exa mple.com" }),
    );
    assert_eq!(error_code(&result), "INVALID_ARGUMENT");
    assert_eq!(result["error"]["details"]["reason"], json!("Invalid URL"));
}
