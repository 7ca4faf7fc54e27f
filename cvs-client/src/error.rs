//! Error handling in [`cvs_client`][crate]
use thiserror::Error;

pub use cvs_core::{ApiErrorResponse, TransientKind};

use crate::client::CredentialError;

/// Possible errors when working with [`cvs_client`][crate]
#[derive(Error, Debug)]
pub enum Error {
    /// The control plane rejected the call and retrying will not help.
    ///
    /// Also used when a failed call returned a body that was not an error envelope;
    /// the envelope then carries the HTTP status and the raw body.
    #[error("ApiError: {0}")]
    Api(#[source] ApiErrorResponse),

    /// The control plane stayed busy for the whole retry budget
    #[error("still failing after {attempts} attempts ({kind}): {last}")]
    RetryExhausted {
        /// The busy condition that kept coming back
        kind: TransientKind,
        /// Attempts answered with `kind`
        attempts: u32,
        /// The last envelope received
        #[source]
        last: ApiErrorResponse,
    },

    /// Could not reach the control plane, or the connection failed mid-call
    #[error("ServiceError: {0}")]
    Service(#[source] tower::BoxError),

    /// UTF-8 Error
    #[error("UTF-8 Error: {0}")]
    FromUtf8(#[source] std::string::FromUtf8Error),

    /// A successful response did not decode into the expected type
    #[error("Error deserializing response: {0}")]
    SerdeError(#[source] serde_json::Error),

    /// Failed to build request
    #[error("Failed to build request: {0}")]
    BuildRequest(#[source] cvs_core::Error),

    /// Could not mint a token for the call
    #[error("credential error: {0}")]
    Credential(#[source] CredentialError),

    /// Configuration error
    #[error("invalid configuration: {0}")]
    Config(#[source] ConfigError),

    /// No volume matched the lookup
    #[error("no volume found for: {0}")]
    NotFound(String),

    /// The creation token matched a volume with a different name
    #[error("creation token {creation_token} does not match volume name {name}")]
    Conflict {
        /// The requested creation token
        creation_token: String,
        /// The requested name
        name: String,
        /// The name of the volume holding the token
        found: String,
    },

    /// More than one volume carries the requested name
    #[error("found {count} volumes named {name}")]
    AmbiguousMatch {
        /// The requested name
        name: String,
        /// How many volumes share it
        count: usize,
    },

    /// The control plane reported a failed update inside an otherwise successful response
    #[error("update rejected, code: {code}, message: {message}")]
    UpdateRejected {
        /// Returned code
        code: i64,
        /// Returned message
        message: String,
    },

    /// The request lacks fields the operation needs
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The operation was cancelled between attempts
    #[error("operation cancelled")]
    Cancelled,
}

impl Error {
    /// The envelope behind an API failure, if this is one.
    pub fn api_response(&self) -> Option<&ApiErrorResponse> {
        match self {
            Error::Api(e) | Error::RetryExhausted { last: e, .. } => Some(e),
            _ => None,
        }
    }
}

#[derive(Error, Debug)]
// Redundant with the error messages and machine names
#[allow(missing_docs)]
/// Possible errors when loading config
pub enum ConfigError {
    #[error("no project configured, set {0}")]
    MissingProject(&'static str),

    #[error("invalid host uri: {0}")]
    InvalidHost(#[source] http::uri::InvalidUri),

    #[error("failed to load native root certificates: {0}")]
    NativeRoots(#[source] std::io::Error),

    #[error("TLS required for {0}, enable the rustls-tls feature")]
    TlsRequired(http::Uri),
}
