use crate::{
    api::MockServer,
    server::{
        handler::KeyedHandler,
        server::{HttpServer, HttpServerConfig},
        state::{KeyedStateManager, StateManager},
    },
};
use std::sync::Arc;

/// The `MockServerBuilder` is used to configure a [`MockServer`] before it is opened.
/// It provides methods to set the port, the network interface and access logging.
///
/// **Example**:
/// ```
/// use keyed_httpmock::{MockServerBuilder, Server};
///
/// let mut server = MockServerBuilder::new().print_access_log(true).build();
/// server.open().unwrap();
///
/// assert!(server.url().is_some());
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockServerBuilder {
    port: Option<u16>,
    expose: Option<bool>,
    print_access_log: Option<bool>,
}

impl MockServerBuilder {
    /// Creates a new instance of `MockServerBuilder` with default settings: an ephemeral
    /// port on the loopback interface and no access log.
    pub fn new() -> Self {
        MockServerBuilder {
            port: None,
            expose: None,
            print_access_log: None,
        }
    }

    /// Sets a static port for the mock server instead of an ephemeral one.
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Sets the port for the mock server as an optional value. `None` selects an
    /// ephemeral port.
    pub fn port_option(mut self, port: Option<u16>) -> Self {
        self.port = port;
        self
    }

    /// Sets whether the server listens on all network interfaces (`0.0.0.0`) instead of
    /// the loopback interface only.
    pub fn expose(mut self, expose: bool) -> Self {
        self.expose = Some(expose);
        self
    }

    /// Sets whether the server logs one line per served request (method, URI, status)
    /// at `info` level.
    pub fn print_access_log(mut self, enabled: bool) -> Self {
        self.print_access_log = Some(enabled);
        self
    }

    /// Builds a [`MockServer`] with the current settings. The server is not opened yet.
    pub fn build(self) -> MockServer {
        MockServer::from_builder(self, Arc::new(KeyedStateManager::new()))
    }

    /// Builds the HTTP listener that serves requests from the provided state.
    pub(crate) fn build_with_state<S>(&self, state: Arc<S>) -> HttpServer<KeyedHandler<S>>
    where
        S: StateManager + Send + Sync + 'static,
    {
        HttpServer::new(
            Box::new(KeyedHandler::new(state)),
            HttpServerConfig {
                static_port: self.port,
                expose: self.expose.unwrap_or(false),
                print_access_log: self.print_access_log.unwrap_or(false),
            },
        )
    }
}
