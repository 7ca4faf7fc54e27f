use std::path::PathBuf;

use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::{CredentialError, TokenSource};
use crate::config::Credentials;

/// Lifetime of a minted token.
///
/// Tokens are used for one call, so this only needs to cover a slow request.
const TOKEN_LIFETIME_SECS: i64 = 3600;

/// The parts of a service account key JSON file needed for signing.
#[derive(Deserialize)]
struct ServiceAccountKey {
    private_key_id: String,
    private_key: String,
    client_email: String,
}

#[derive(Serialize, Deserialize, Debug)]
struct Claims {
    iss: String,
    sub: String,
    aud: String,
    iat: i64,
    exp: i64,
}

/// Mints self-signed JWT access tokens from a service account key.
///
/// The key is re-read on every call so a rotated key file takes effect without a restart.
#[derive(Debug, Clone, Default)]
pub struct ServiceAccountKeySource {
    inline: Option<SecretString>,
    key_file: Option<PathBuf>,
}

impl ServiceAccountKeySource {
    /// Use inline key material, a key file, or both (inline wins).
    pub fn new(inline: Option<SecretString>, key_file: Option<PathBuf>) -> Self {
        Self { inline, key_file }
    }

    fn key_material(&self) -> Result<SecretString, CredentialError> {
        match (&self.inline, &self.key_file) {
            (Some(inline), _) => Ok(inline.clone()),
            (None, Some(path)) => std::fs::read_to_string(path)
                .map(SecretString::from)
                .map_err(|e| CredentialError::UnreadableKeyFile(e, path.clone())),
            (None, None) => Err(CredentialError::NoSource),
        }
    }
}

impl From<&Credentials> for ServiceAccountKeySource {
    fn from(credentials: &Credentials) -> Self {
        Self::new(credentials.inline.clone(), credentials.key_file.clone())
    }
}

impl TokenSource for ServiceAccountKeySource {
    fn mint(&self, audience: &str) -> Result<SecretString, CredentialError> {
        let material = self.key_material()?;
        let key: ServiceAccountKey =
            serde_json::from_str(material.expose_secret()).map_err(CredentialError::ParseKey)?;
        let signing_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .map_err(CredentialError::InvalidPrivateKey)?;

        let mut header = Header::new(Algorithm::RS256);
        header.kid = Some(key.private_key_id);
        let iat = Utc::now().timestamp();
        let claims = Claims {
            iss: key.client_email.clone(),
            sub: key.client_email,
            aud: audience.to_owned(),
            iat,
            exp: iat + TOKEN_LIFETIME_SECS,
        };
        let token = jsonwebtoken::encode(&header, &claims, &signing_key)
            .map_err(CredentialError::IssuanceFailed)?;
        tracing::trace!(audience, "minted service account token");
        Ok(SecretString::from(token))
    }
}
