use crate::utils::client;
use keyed_httpmock::{CapturedRequest, Error, Server};
use std::{cell::RefCell, collections::HashMap};
use url::Url;

/// Code under test that only depends on the `Server` operations.
fn fetch_status(server: &dyn Server) -> Option<u16> {
    server.set_get_response_body("/status?", r#"{"up":true}"#);
    let url = server.url()?.join("/status").ok()?;
    let response = client().get(url).send().ok()?;
    Some(response.status().as_u16())
}

/// An in-memory stand-in that never opens a socket.
#[derive(Default)]
struct FakeServer {
    open: bool,
    responses: RefCell<HashMap<String, String>>,
}

impl Server for FakeServer {
    fn open(&mut self) -> Result<(), Error> {
        self.open = true;
        Ok(())
    }

    fn close(&mut self) {
        self.open = false;
    }

    fn reset(&self) {
        self.responses.borrow_mut().clear();
    }

    fn set_get_response_body(&self, key: &str, body: &str) {
        self.responses
            .borrow_mut()
            .insert(key.to_string(), body.to_string());
    }

    fn set_post_response_body(&self, key: &str, body: &str) {
        self.set_get_response_body(key, body);
    }

    fn get_requests(&self, _key: &str) -> Vec<CapturedRequest> {
        Vec::new()
    }

    fn post_requests(&self, _key: &str) -> Vec<CapturedRequest> {
        Vec::new()
    }

    fn url(&self) -> Option<Url> {
        None
    }
}

#[test]
fn code_under_test_runs_against_real_server() {
    let mut server: Box<dyn Server> = Box::new(keyed_httpmock::MockServer::new());
    server.open().unwrap();

    assert_eq!(fetch_status(server.as_ref()), Some(200));
    assert_eq!(server.get_requests("/status?").len(), 1);

    server.close();
}

#[test]
fn code_under_test_runs_against_fake_server() {
    let mut server = FakeServer::default();
    server.open().unwrap();

    assert_eq!(fetch_status(&server), None);
    assert!(server.responses.borrow().contains_key("/status?"));

    server.reset();
    server.close();
    assert!(server.responses.borrow().is_empty());
    assert!(!server.open);
}
