use crate::{
    common::data::{
        decoded_path, get_request_key, post_request_key, CannedResponse, CapturedRequest,
    },
    server::{
        multipart,
        state::{Keyspace, StateManager},
    },
};

use async_trait::async_trait;
use bytes::Bytes;
use http::{header::CONTENT_TYPE, Method, Request, Response, StatusCode};
use std::sync::Arc;
use thiserror::Error;

/// Name of the multipart file field whose content becomes part of a POST request key.
pub(crate) const POST_FILE_FIELD: &str = "file";

const JSON_CONTENT_TYPE: &str = "application/json";
const TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid status code: {0}")]
    InvalidStatusCode(#[from] http::status::InvalidStatusCode),
    #[error("cannot build response: {0}")]
    ResponseBuildError(#[from] http::Error),
}

#[async_trait]
pub(crate) trait Handler {
    async fn handle(&self, req: Request<Bytes>) -> Result<Response<Bytes>, Error>;
}

/// Records every GET and POST request under its key and answers with the response
/// registered for that key.
pub(crate) struct KeyedHandler<S>
where
    S: StateManager + Send + Sync + 'static,
{
    state: Arc<S>,
}

#[async_trait]
impl<S> Handler for KeyedHandler<S>
where
    S: StateManager + Send + Sync + 'static,
{
    async fn handle(&self, req: Request<Bytes>) -> Result<Response<Bytes>, Error> {
        tracing::trace!("Handling incoming request: {:?}", req);

        match *req.method() {
            Method::GET => self.handle_get(req),
            Method::POST => self.handle_post(req).await,
            _ => {
                tracing::debug!("Rejecting request with unsupported method {}", req.method());
                Ok(Response::builder()
                    .status(StatusCode::METHOD_NOT_ALLOWED)
                    .header(http::header::ALLOW, "GET, POST")
                    .body(Bytes::new())?)
            }
        }
    }
}

impl<S> KeyedHandler<S>
where
    S: StateManager + Send + Sync + 'static,
{
    pub fn new(state: Arc<S>) -> Self {
        Self { state }
    }

    fn handle_get(&self, req: Request<Bytes>) -> Result<Response<Bytes>, Error> {
        let path = decoded_path(req.uri());
        let key = get_request_key(&path, req.uri().query());
        let captured = CapturedRequest::from_request(&req, None);

        match self.state.record(Keyspace::Get, key.clone(), captured) {
            Some(response) => canned_response(&response),
            None => text_response(
                StatusCode::NOT_FOUND,
                format!("No httpGETResponse for '{}'", key),
            ),
        }
    }

    async fn handle_post(&self, req: Request<Bytes>) -> Result<Response<Bytes>, Error> {
        let file_content =
            match multipart::read_file_field(req.headers(), req.body().clone(), POST_FILE_FIELD)
                .await
            {
                Ok(content) => content,
                Err(err) => {
                    tracing::warn!("Cannot extract file from POST request {}: {}", req.uri(), err);
                    return text_response(StatusCode::INTERNAL_SERVER_ERROR, err.to_string());
                }
            };

        let path = decoded_path(req.uri());
        let key = post_request_key(&path, req.uri().query(), &file_content);
        let captured = CapturedRequest::from_request(&req, Some(file_content));

        match self.state.record(Keyspace::Post, key.clone(), captured) {
            Some(response) => canned_response(&response),
            None => text_response(
                StatusCode::NOT_FOUND,
                format!("No httpPOSTResponse for '{}'", key),
            ),
        }
    }
}

// All headers are set on the builder, so they go out together with the status line.
fn canned_response(response: &CannedResponse) -> Result<Response<Bytes>, Error> {
    Ok(Response::builder()
        .status(StatusCode::from_u16(response.status)?)
        .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
        .body(Bytes::from(response.body.clone()))?)
}

fn text_response(status: StatusCode, body: String) -> Result<Response<Bytes>, Error> {
    Ok(Response::builder()
        .status(status)
        .header(CONTENT_TYPE, TEXT_CONTENT_TYPE)
        .body(Bytes::from(body))?)
}
