//! `keyed-httpmock` is a small HTTP stub server for tests. It stands in for an external HTTP
//! dependency, records every GET and POST request it receives and answers them with
//! canned JSON responses that the test registered beforehand.
//!
//! Responses are looked up by **request key**:
//!
//! * GET requests use `<path>?<raw query>`, e.g. `/search?q=rust`. A request without a query
//!   string still carries the `?`, e.g. `/health?`. The path is percent-decoded (`/a%20b`
//!   becomes `/a b`), the query is kept as sent.
//! * POST requests must be `multipart/form-data` with a file field named `file`. Their key is
//!   `<path>?<raw query> <file content>`, e.g. `/upload? hello`.
//!
//! Keys must match exactly. GET and POST keys live in separate keyspaces.
//!
//! # Getting Started
//! ```rust
//! use keyed_httpmock::prelude::*;
//!
//! // Create and open a server on an ephemeral local port.
//! let mut server = MockServer::new();
//! server.open().unwrap();
//!
//! // Register a response for GET /translate?word=hello.
//! server.set_get_response_body("/translate?word=hello", r#"{"text":"hola"}"#);
//!
//! // Point the code under test at `server.url()`, then inspect what it sent.
//! let base_url = server.url().unwrap();
//! assert_eq!(Some("127.0.0.1"), base_url.host_str());
//! assert!(server.get_requests("/translate?word=hello").is_empty());
//!
//! // Clear responses and captured requests before the next test.
//! server.reset();
//! server.close();
//! ```
//!
//! # Responses
//! * A request whose key has a registered response receives that response with
//!   `Content-Type: application/json`.
//! * A GET or POST request without a registered response receives `404 Not Found` with a
//!   plain text body naming the key, e.g. `No httpGETResponse for '/translate?word=hello'`.
//! * A POST request without a readable multipart file field `file` receives
//!   `500 Internal Server Error` with the parse error as body and is not recorded.
//! * Any other HTTP method receives `405 Method Not Allowed`.
//!
//! # Debugging
//! `keyed-httpmock` logs through the `tracing` crate. Without a `tracing` subscriber, events
//! are forwarded to the `log` crate, so `env_logger` works as well:
//! ```rust
//! #[test]
//! fn your_test() {
//!     let _ = env_logger::try_init();
//!     // ...
//! }
//! ```
//! Use [MockServerBuilder::print_access_log] to log one line per served request.
mod api;
mod common;
mod server;

pub use api::{Error, MockServer, Server};
pub use common::data::{get_request_key, post_request_key, CannedResponse, CapturedRequest};
pub use server::{Error as ServerError, MockServerBuilder};

pub mod prelude {
    #[doc(no_inline)]
    pub use crate::{
        get_request_key, post_request_key, CapturedRequest, MockServer, MockServerBuilder, Server,
    };
}
