use futures_util::FutureExt;
use http::{Request, StatusCode};
use http_body_util::{combinators::BoxBody, BodyExt, Full};
use hyper::{
    body::{Bytes, Incoming},
    service::service_fn,
    Response,
};
use hyper_util::{
    rt::{TokioExecutor, TokioIo},
    server::conn::auto::Builder as ServerBuilder,
};
use std::{
    future::Future,
    io,
    net::{SocketAddr, TcpListener as StdTcpListener},
    sync::Arc,
};
use thiserror::Error;
use tokio::{
    net::{TcpListener, TcpStream},
    task::spawn,
};

use crate::{
    common::data::RequestMetadata,
    server::{
        handler,
        handler::Handler,
        server::Error::{BufferError, IOError, RouterError, ServerConnectionError, SocketBindError},
    },
};

#[derive(Error, Debug)]
pub enum Error {
    #[error("cannot bind to socket addr {0}: {1}")]
    SocketBindError(SocketAddr, io::Error),
    #[error("cannot parse socket address: {0}")]
    SocketAddrParseError(#[from] std::net::AddrParseError),
    #[error("cannot obtain local address: {0}")]
    LocalSocketAddrError(io::Error),
    #[error("cannot create server runtime: {0}")]
    RuntimeError(io::Error),
    #[error("cannot spawn server thread: {0}")]
    ThreadSpawnError(io::Error),
    #[error("buffering error: {0}")]
    BufferError(hyper::Error),
    #[error("HTTP error: {0}")]
    HTTPError(#[from] http::Error),
    #[error("cannot process request: {0}")]
    RouterError(#[from] handler::Error),
    #[error("Server I/O error: {0}")]
    IOError(io::Error),
    #[error("Server error: {0}")]
    ServerConnectionError(Box<dyn std::error::Error + Send + Sync>),
}

#[derive(Debug, Clone)]
pub(crate) struct HttpServerConfig {
    pub(crate) static_port: Option<u16>,
    pub(crate) expose: bool,
    pub(crate) print_access_log: bool,
}

/// The HTTP listener of a mock server. It accepts connections and hands every buffered
/// request to its [`Handler`].
pub(crate) struct HttpServer<H>
where
    H: Handler + Send + Sync + 'static,
{
    handler: Box<H>,
    config: HttpServerConfig,
}

impl<H> HttpServer<H>
where
    H: Handler + Send + Sync + 'static,
{
    pub fn new(handler: Box<H>, config: HttpServerConfig) -> Self {
        HttpServer { handler, config }
    }

    /// Binds the listening socket.
    ///
    /// Binding happens on the calling thread so that the caller receives bind errors directly.
    /// The returned listener is non-blocking and ready to be handed to [`Self::run_accept_loop`]
    /// on any tokio runtime.
    pub fn bind(&self) -> Result<StdTcpListener, Error> {
        let host = if self.config.expose {
            "0.0.0.0"
        } else {
            "127.0.0.1"
        };
        let addr: SocketAddr =
            format!("{}:{}", host, self.config.static_port.unwrap_or(0)).parse()?;

        let listener = StdTcpListener::bind(addr).map_err(|e| SocketBindError(addr, e))?;
        listener.set_nonblocking(true).map_err(IOError)?;

        Ok(listener)
    }

    /// Serves connections from `listener` until `shutdown` resolves.
    pub async fn run_accept_loop<F>(self, listener: StdTcpListener, shutdown: F) -> Result<(), Error>
    where
        F: Future<Output = ()>,
    {
        let listener = TcpListener::from_std(listener).map_err(IOError)?;
        let shutdown = shutdown.shared();
        let server = Arc::new(self);

        if let Ok(addr) = listener.local_addr() {
            tracing::info!("Listening on {}", addr);
        }

        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    match accepted {
                        Ok((tcp_stream, remote_address)) => {
                            let server = server.clone();
                            spawn(async move {
                                if let Err(err) = server.handle_tcp_stream(tcp_stream, remote_address).await {
                                    tracing::warn!("{:?}", err);
                                }
                            });
                        },
                        Err(err) => {
                            tracing::error!("TCP error: {:?}", err);
                        },
                    };
                }
                _ = shutdown.clone() => {
                    break;
                }
            }
        }

        tracing::info!("Listener shut down");
        Ok(())
    }

    async fn service(
        self: Arc<Self>,
        req: Request<Incoming>,
    ) -> Result<Response<BoxBody<Bytes, hyper::Error>>, Error> {
        tracing::trace!("New HTTP request received: {}", req.uri());

        let req = match buffer_request(req).await {
            Ok(req) => req,
            Err(err) => {
                return error_response(StatusCode::INTERNAL_SERVER_ERROR, BufferError(err));
            }
        };

        let method = req.method().clone();
        let uri = req.uri().clone();

        let response = match self.handler.handle(req).await {
            Ok(response) => response,
            Err(err) => return error_response(StatusCode::INTERNAL_SERVER_ERROR, RouterError(err)),
        };

        if self.config.print_access_log {
            tracing::info!("{} {} -> {}", method, uri, response.status().as_u16());
        }

        to_service_response(response)
    }

    async fn handle_tcp_stream(
        self: Arc<Self>,
        tcp_stream: TcpStream,
        remote_address: SocketAddr,
    ) -> Result<(), Error> {
        tracing::trace!("new TCP connection incoming from {}", remote_address);

        let mut server_builder = ServerBuilder::new(TokioExecutor::new());
        server_builder.http1().preserve_header_case(true);

        server_builder
            .serve_connection(
                TokioIo::new(tcp_stream),
                service_fn(|mut req| {
                    req.extensions_mut()
                        .insert(RequestMetadata::new(remote_address));
                    self.clone().service(req)
                }),
            )
            .await
            .map_err(ServerConnectionError)
    }
}

async fn buffer_request(req: Request<Incoming>) -> Result<Request<Bytes>, hyper::Error> {
    let (parts, body) = req.into_parts();
    let body = body.collect().await?.to_bytes();
    Ok(Request::from_parts(parts, body))
}

fn full<T: Into<Bytes>>(chunk: T) -> BoxBody<Bytes, hyper::Error> {
    Full::new(chunk.into())
        .map_err(|never| match never {})
        .boxed()
}

fn error_response(
    code: StatusCode,
    err: Error,
) -> Result<Response<BoxBody<Bytes, hyper::Error>>, Error> {
    tracing::error!("failed to process request: {}", err);
    Ok(Response::builder()
        .status(code)
        .body(full(err.to_string()))?)
}

fn to_service_response(
    response: Response<Bytes>,
) -> Result<Response<BoxBody<Bytes, hyper::Error>>, Error> {
    let (parts, body) = response.into_parts();
    Ok(Response::from_parts(parts, full(body)))
}
