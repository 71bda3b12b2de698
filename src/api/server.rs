use crate::{
    common::{
        data::{CannedResponse, CapturedRequest},
        runtime,
    },
    server::{
        self,
        builder::MockServerBuilder,
        server::Error::{LocalSocketAddrError, RuntimeError, ThreadSpawnError},
        state::{KeyedStateManager, Keyspace, StateManager},
    },
};
use std::{
    net::{Ipv4Addr, SocketAddr},
    sync::Arc,
    thread::{self, JoinHandle},
};
use thiserror::Error;
use tokio::sync::oneshot;
use url::Url;

#[derive(Error, Debug)]
pub enum Error {
    #[error("mock server is already open at {0}")]
    AlreadyOpen(SocketAddr),
    #[error("cannot start mock server: {0}")]
    ServerError(#[from] server::Error),
    #[error("cannot build URL for address {0}: {1}")]
    UrlError(SocketAddr, url::ParseError),
}

/// The operations test code uses to drive a mock server. Tests that only need these
/// operations can accept a `&mut dyn Server` and run against a real [`MockServer`] or a fake.
pub trait Server {
    /// Binds the listener and starts serving requests in the background.
    fn open(&mut self) -> Result<(), Error>;

    /// Stops the listener. Calling this on a server that was never opened or is already
    /// closed does nothing.
    fn close(&mut self);

    /// Removes all registered responses and all captured requests. This should be called
    /// between tests to prevent tests from affecting each other.
    fn reset(&self);

    /// Registers a `200 OK` JSON response for GET requests with the key `<path>?<query>`.
    /// A previously registered response for the same key is replaced.
    fn set_get_response_body(&self, key: &str, body: &str);

    /// Registers a `200 OK` JSON response for POST requests with the key
    /// `<path>?<query> <file content>`, where the file content is the multipart file field
    /// named `file`. A previously registered response for the same key is replaced.
    fn set_post_response_body(&self, key: &str, body: &str);

    /// The GET requests captured under `key`, in arrival order.
    fn get_requests(&self, key: &str) -> Vec<CapturedRequest>;

    /// The POST requests captured under `key`, in arrival order.
    fn post_requests(&self, key: &str) -> Vec<CapturedRequest>;

    /// The base URL of the server, or `None` if it is not open.
    fn url(&self) -> Option<Url>;
}

struct RunningListener {
    address: SocketAddr,
    url: Url,
    shutdown: oneshot::Sender<()>,
    thread: JoinHandle<()>,
}

/// A mock server that records GET and POST requests and answers them with canned JSON
/// responses looked up by request key.
///
/// **Example**:
/// ```
/// use keyed_httpmock::{MockServer, Server};
///
/// let mut server = MockServer::new();
/// server.open().unwrap();
/// server.set_get_response_body("/status?verbose=1", r#"{"up":true}"#);
///
/// // ... let the code under test call `server.url()` ...
///
/// assert!(server.get_requests("/status?verbose=1").is_empty());
/// server.close();
/// ```
pub struct MockServer {
    builder: MockServerBuilder,
    state: Arc<KeyedStateManager>,
    listener: Option<RunningListener>,
}

impl MockServer {
    pub(crate) fn from_builder(builder: MockServerBuilder, state: Arc<KeyedStateManager>) -> Self {
        Self {
            builder,
            state,
            listener: None,
        }
    }

    /// Creates a mock server with default settings. The server is not opened yet.
    pub fn new() -> Self {
        MockServerBuilder::new().build()
    }

    /// Creates a mock server with default settings and opens it.
    pub fn start() -> Result<Self, Error> {
        let mut server = Self::new();
        server.open()?;
        Ok(server)
    }

    /// Returns a builder to configure a mock server.
    pub fn builder() -> MockServerBuilder {
        MockServerBuilder::new()
    }

    /// The socket address the listener is bound to, or `None` if it is not open.
    pub fn address(&self) -> Option<SocketAddr> {
        self.listener.as_ref().map(|l| l.address)
    }

    /// Whether the listener is currently open.
    pub fn is_open(&self) -> bool {
        self.listener.is_some()
    }
}

impl Default for MockServer {
    fn default() -> Self {
        Self::new()
    }
}

impl Server for MockServer {
    fn open(&mut self) -> Result<(), Error> {
        if let Some(listener) = &self.listener {
            return Err(Error::AlreadyOpen(listener.address));
        }

        let server = self.builder.build_with_state(self.state.clone());
        let listener = server.bind()?;
        let address = listener.local_addr().map_err(LocalSocketAddrError)?;
        let url = base_url(address)?;
        let runtime = runtime::new_current_thread().map_err(RuntimeError)?;

        let (shutdown, shutdown_receiver) = oneshot::channel::<()>();
        let thread = thread::Builder::new()
            .name(format!("keyed-httpmock-{}", address.port()))
            .spawn(move || {
                let shutdown = async move {
                    // A dropped sender means the owning MockServer is gone.
                    let _ = shutdown_receiver.await;
                };

                if let Err(err) = runtime.block_on(server.run_accept_loop(listener, shutdown)) {
                    tracing::error!("Mock server at {} stopped with error: {}", address, err);
                }
            })
            .map_err(ThreadSpawnError)?;

        tracing::debug!("Mock server opened at {}", url);

        self.listener = Some(RunningListener {
            address,
            url,
            shutdown,
            thread,
        });

        Ok(())
    }

    fn close(&mut self) {
        let Some(listener) = self.listener.take() else {
            return;
        };

        // The receiver is only gone if the serving thread already exited.
        let _ = listener.shutdown.send(());
        if listener.thread.join().is_err() {
            tracing::warn!("Mock server thread for {} panicked", listener.address);
        }

        tracing::debug!("Mock server at {} closed", listener.address);
    }

    fn reset(&self) {
        self.state.reset();
    }

    fn set_get_response_body(&self, key: &str, body: &str) {
        self.state
            .set_response(Keyspace::Get, key.to_string(), CannedResponse::ok(body));
    }

    fn set_post_response_body(&self, key: &str, body: &str) {
        self.state
            .set_response(Keyspace::Post, key.to_string(), CannedResponse::ok(body));
    }

    fn get_requests(&self, key: &str) -> Vec<CapturedRequest> {
        self.state.requests(Keyspace::Get, key)
    }

    fn post_requests(&self, key: &str) -> Vec<CapturedRequest> {
        self.state.requests(Keyspace::Post, key)
    }

    fn url(&self) -> Option<Url> {
        self.listener.as_ref().map(|l| l.url.clone())
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.close();
    }
}

// A listener bound to all interfaces is reported through the loopback address, which is
// where local test clients can reach it.
fn base_url(address: SocketAddr) -> Result<Url, Error> {
    let reachable = if address.ip().is_unspecified() {
        SocketAddr::new(Ipv4Addr::LOCALHOST.into(), address.port())
    } else {
        address
    };

    Url::parse(&format!("http://{}", reachable)).map_err(|err| Error::UrlError(address, err))
}
