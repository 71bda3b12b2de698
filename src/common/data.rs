use bytes::Bytes;
use percent_encoding::percent_decode_str;
use serde::Serialize;
use std::net::SocketAddr;

/// Connection data the listener attaches to every request as an extension.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RequestMetadata {
    pub(crate) remote_addr: SocketAddr,
}

impl RequestMetadata {
    pub(crate) fn new(remote_addr: SocketAddr) -> Self {
        Self { remote_addr }
    }
}

/// The percent-decoded path of `uri`, as used in request keys. Escapes that do not decode to
/// valid UTF-8 are replaced with `U+FFFD`.
pub(crate) fn decoded_path(uri: &http::Uri) -> String {
    percent_decode_str(uri.path()).decode_utf8_lossy().into_owned()
}

/// Builds the lookup key for a GET request: `<path>?<raw query>`.
///
/// `path` is expected in decoded form, e.g. `/a b` for a request to `/a%20b`. The query is
/// used verbatim (no decoding, no reordering). A request without a query
/// string produces a key that ends with `?`.
pub fn get_request_key(path: &str, query: Option<&str>) -> String {
    format!("{}?{}", path, query.unwrap_or(""))
}

/// Builds the lookup key for a POST request: `<path>?<raw query> <file content>`.
///
/// `file_content` is the content of the multipart file field named `file`. It is interpreted
/// as UTF-8 text, invalid sequences are replaced with `U+FFFD`.
pub fn post_request_key(path: &str, query: Option<&str>, file_content: &[u8]) -> String {
    format!(
        "{} {}",
        get_request_key(path, query),
        String::from_utf8_lossy(file_content)
    )
}

/// A response the server returns for a registered request key.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct CannedResponse {
    pub status: u16,
    pub body: String,
}

impl CannedResponse {
    /// A `200 OK` response with the given body.
    pub fn ok<S: Into<String>>(body: S) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }
}

/// An HTTP request received by the mock server, as it was recorded under its key.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct CapturedRequest {
    method: String,
    target: String,
    path: String,
    query: Option<String>,
    version: String,
    headers: Vec<(String, String)>,
    body: Bytes,
    file_content: Option<Bytes>,
    remote_addr: Option<SocketAddr>,
}

impl CapturedRequest {
    pub(crate) fn from_request(req: &http::Request<Bytes>, file_content: Option<Bytes>) -> Self {
        // Header values that are not valid UTF-8 are kept lossily rather than rejected, so
        // that every request reaching the server can be recorded.
        let headers = req
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();

        let target = req
            .uri()
            .path_and_query()
            .map_or_else(|| req.uri().path(), |pq| pq.as_str())
            .to_string();

        Self {
            method: req.method().to_string(),
            target,
            path: decoded_path(req.uri()),
            query: req.uri().query().map(|q| q.to_string()),
            version: format!("{:?}", req.version()),
            headers,
            // Since Bytes shares data, clone does not copy the body.
            body: req.body().clone(),
            file_content,
            remote_addr: req
                .extensions()
                .get::<RequestMetadata>()
                .map(|metadata| metadata.remote_addr),
        }
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    /// The request target as sent by the client, e.g. `/a%20b?q=1`.
    pub fn uri(&self) -> &str {
        &self.target
    }

    /// The percent-decoded path, e.g. `/a b` for a request to `/a%20b`. This is the path
    /// that forms the request key.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The raw (undecoded) query string, without the leading `?`.
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// The HTTP version the request was sent with, e.g. `HTTP/1.1`.
    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Returns the first value of the header `name`. Header names are compared
    /// case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn body_string(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Content of the multipart file field `file`. Only set for POST requests.
    pub fn file_content(&self) -> Option<&Bytes> {
        self.file_content.as_ref()
    }

    /// Address of the client connection the request arrived on. `None` for requests that did
    /// not come through the listener.
    pub fn remote_addr(&self) -> Option<SocketAddr> {
        self.remote_addr
    }
}
