use std::path::PathBuf;

use secrecy::SecretString;
use thiserror::Error;

mod service_account;
pub use service_account::ServiceAccountKeySource;

#[derive(Error, Debug)]
/// Possible errors when minting a token
pub enum CredentialError {
    /// Neither inline key material nor a key file was configured
    #[error("no credential source")]
    NoSource,

    /// Failed to read the key file
    #[error("unreadable key file '{1:?}': {0}")]
    UnreadableKeyFile(#[source] std::io::Error, PathBuf),

    /// The key material is not a service account key
    #[error("malformed key: {0}")]
    ParseKey(#[source] serde_json::Error),

    /// The private key could not be loaded
    #[error("malformed key: invalid private key: {0}")]
    InvalidPrivateKey(#[source] jsonwebtoken::errors::Error),

    /// Signing the token failed
    #[error("token issuance failed: {0}")]
    IssuanceFailed(#[source] jsonwebtoken::errors::Error),
}

/// Mints the bearer token attached to a single request.
///
/// The client calls [`TokenSource::mint`] once per outbound request and never caches the result.
pub trait TokenSource: Send + Sync {
    /// Produce a token valid for `audience`.
    fn mint(&self, audience: &str) -> Result<SecretString, CredentialError>;
}

/// A fixed token, for endpoints fronted by something that already authenticated the caller.
#[derive(Debug, Clone)]
pub struct StaticToken(SecretString);

impl StaticToken {
    /// Wrap an already minted token
    pub fn new(token: impl Into<String>) -> Self {
        Self(SecretString::from(token.into()))
    }
}

impl TokenSource for StaticToken {
    fn mint(&self, _audience: &str) -> Result<SecretString, CredentialError> {
        Ok(self.0.clone())
    }
}
