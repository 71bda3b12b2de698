use bytes::Bytes;
use http::{header::CONTENT_TYPE, HeaderMap};
use std::convert::Infallible;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("request Content-Type isn't multipart/form-data")]
    MissingContentType,
    #[error("cannot read Content-Type header: {0}")]
    InvalidContentType(#[from] http::header::ToStrError),
    #[error("cannot parse multipart body: {0}")]
    MultipartError(#[from] multer::Error),
    #[error("no multipart file field named '{0}'")]
    NoSuchFile(String),
}

/// Reads the full content of the multipart file field `field_name` from a buffered
/// `multipart/form-data` request body.
///
/// Only parts that carry a file name count as file fields; a plain form value with the same
/// name is skipped.
pub(crate) async fn read_file_field(
    headers: &HeaderMap,
    body: Bytes,
    field_name: &str,
) -> Result<Bytes, Error> {
    let content_type = headers
        .get(CONTENT_TYPE)
        .ok_or(Error::MissingContentType)?
        .to_str()?;
    let boundary = multer::parse_boundary(content_type)?;

    let stream = futures_util::stream::once(async move { Ok::<Bytes, Infallible>(body) });
    let mut multipart = multer::Multipart::new(stream, boundary);

    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some(field_name) && field.file_name().is_some() {
            return Ok(field.bytes().await?);
        }
    }

    Err(Error::NoSuchFile(field_name.to_string()))
}
