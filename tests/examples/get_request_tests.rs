use crate::utils::{client, url};
use keyed_httpmock::prelude::*;

#[test]
fn registered_get_returns_configured_body() {
    let server = MockServer::start().unwrap();
    server.set_get_response_body("/users?id=42", r#"{"id":42,"name":"Ada"}"#);

    let response = client().get(url(&server, "/users?id=42")).send().unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(
        response.headers()["content-type"].to_str().unwrap(),
        "application/json"
    );
    assert_eq!(response.text().unwrap(), r#"{"id":42,"name":"Ada"}"#);
}

#[test]
fn unregistered_get_returns_404_naming_the_key() {
    let server = MockServer::start().unwrap();

    let response = client().get(url(&server, "/users?id=7")).send().unwrap();

    assert_eq!(response.status(), 404);
    assert_eq!(response.text().unwrap(), "No httpGETResponse for '/users?id=7'");
}

#[test]
fn get_without_query_uses_key_with_trailing_question_mark() {
    let server = MockServer::start().unwrap();
    server.set_get_response_body("/health?", r#"{"up":true}"#);

    let response = client().get(url(&server, "/health")).send().unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(server.get_requests(&get_request_key("/health", None)).len(), 1);
}

#[test]
fn query_must_match_exactly() {
    let server = MockServer::start().unwrap();
    server.set_get_response_body("/search?a=1&b=2", "{}");

    // Same parameters, different order: a different key.
    let response = client().get(url(&server, "/search?b=2&a=1")).send().unwrap();

    assert_eq!(response.status(), 404);
    assert_eq!(
        response.text().unwrap(),
        "No httpGETResponse for '/search?b=2&a=1'"
    );
    assert!(server.get_requests("/search?a=1&b=2").is_empty());
    assert_eq!(server.get_requests("/search?b=2&a=1").len(), 1);
}

#[test]
fn requests_with_same_key_accumulate_in_arrival_order() {
    // Arrange
    let server = MockServer::start().unwrap();
    server.set_get_response_body("/events?since=0", "[]");

    // Act
    for seq in ["first", "second"] {
        let response = client()
            .get(url(&server, "/events?since=0"))
            .header("X-Seq", seq)
            .send()
            .unwrap();
        assert_eq!(response.status(), 200);
    }

    // Assert
    let requests = server.get_requests("/events?since=0");
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].header("x-seq"), Some("first"));
    assert_eq!(requests[1].header("X-Seq"), Some("second"));
}

#[test]
fn re_registering_a_key_replaces_the_response() {
    let server = MockServer::start().unwrap();
    server.set_get_response_body("/config?", r#"{"v":1}"#);
    server.set_get_response_body("/config?", r#"{"v":2}"#);

    let response = client().get(url(&server, "/config")).send().unwrap();

    assert_eq!(response.text().unwrap(), r#"{"v":2}"#);
}

#[test]
fn never_seen_keys_have_no_requests() {
    let server = MockServer::start().unwrap();

    assert!(server.get_requests("/never?").is_empty());
    assert!(server.post_requests("/never? ").is_empty());
}

#[test]
fn get_and_post_keyspaces_are_independent() {
    let server = MockServer::start().unwrap();
    // Registered as a POST key only.
    server.set_post_response_body("/shared?", "{}");

    let response = client().get(url(&server, "/shared")).send().unwrap();

    assert_eq!(response.status(), 404);
    assert_eq!(server.get_requests("/shared?").len(), 1);
    assert!(server.post_requests("/shared?").is_empty());
}

#[test]
fn captured_request_serializes_to_json() {
    let server = MockServer::start().unwrap();

    client().get(url(&server, "/audit?x=1")).send().unwrap();

    let requests = server.get_requests("/audit?x=1");
    let json = serde_json::to_value(&requests[0]).unwrap();
    assert_eq!(json["method"], "GET");
    assert_eq!(json["path"], "/audit");
    assert_eq!(json["query"], "x=1");
    assert_eq!(json["file_content"], serde_json::Value::Null);
}

#[test]
fn escaped_path_is_decoded_in_key_while_query_stays_raw() {
    // Arrange
    let server = MockServer::start().unwrap();
    server.set_get_response_body("/a b?x=1", r#"{"decoded":true}"#);

    // Act
    let response = client().get(url(&server, "/a%20b?x=1")).send().unwrap();

    // Assert
    assert_eq!(response.status(), 200);
    assert_eq!(response.text().unwrap(), r#"{"decoded":true}"#);

    let requests = server.get_requests("/a b?x=1");
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].path(), "/a b");
    assert_eq!(requests[0].uri(), "/a%20b?x=1");
    assert!(server.get_requests("/a%20b?x=1").is_empty());
}

#[test]
fn captured_request_carries_client_address() {
    let server = MockServer::start().unwrap();

    client().get(url(&server, "/whoami")).send().unwrap();

    let requests = server.get_requests("/whoami?");
    assert_eq!(requests.len(), 1);
    let remote_addr = requests[0].remote_addr().unwrap();
    assert!(remote_addr.ip().is_loopback());
    assert_ne!(remote_addr, server.address().unwrap());
}
