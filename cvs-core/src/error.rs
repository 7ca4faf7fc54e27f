use http::header::InvalidHeaderValue;
use thiserror::Error;

/// Possible errors when building requests.
#[derive(Error, Debug)]
pub enum Error {
    /// The request body could not be serialized to JSON
    #[error("failed to encode request body: {0}")]
    Encoding(#[source] serde_json::Error),

    /// Http based error
    #[error("HttpError: {0}")]
    HttpError(#[source] http::Error),

    /// The minted token is not usable as a header value
    #[error("invalid bearer token: {0}")]
    InvalidBearerToken(#[source] InvalidHeaderValue),
}
