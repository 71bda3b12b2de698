use crate::utils::{client, file_form, url};
use keyed_httpmock::prelude::*;

#[test]
fn reset_removes_registered_responses() {
    // Arrange
    let server = MockServer::start().unwrap();
    server.set_get_response_body("/translate?word=hello", r#"{"text":"hola"}"#);
    let response = client()
        .get(url(&server, "/translate?word=hello"))
        .send()
        .unwrap();
    assert_eq!(response.status(), 200);

    // Act
    server.reset();

    // Assert
    let response = client()
        .get(url(&server, "/translate?word=hello"))
        .send()
        .unwrap();
    assert_eq!(response.status(), 404);
}

#[test]
fn reset_removes_captured_requests() {
    let server = MockServer::start().unwrap();
    client().get(url(&server, "/a?x=1")).send().unwrap();
    client()
        .post(url(&server, "/b"))
        .multipart(file_form("data"))
        .send()
        .unwrap();
    assert_eq!(server.get_requests("/a?x=1").len(), 1);
    assert_eq!(server.post_requests("/b? data").len(), 1);

    server.reset();

    assert!(server.get_requests("/a?x=1").is_empty());
    assert!(server.post_requests("/b? data").is_empty());
}

#[test]
fn reset_keeps_the_listener_open() {
    let server = MockServer::start().unwrap();
    let before = server.url();

    server.reset();
    server.set_get_response_body("/after-reset?", "{}");

    assert_eq!(server.url(), before);
    let response = client().get(url(&server, "/after-reset")).send().unwrap();
    assert_eq!(response.status(), 200);
}
