//! Client configuration, from code or from the environment.
//!
//! # Usage
//! Build a [`Config`] with [`Config::new`] or [`Config::from_env`] and pass it to a
//! [`Client`][crate::Client].
use std::{env, path::PathBuf, time::Duration};

use secrecy::SecretString;

use crate::{error::ConfigError, Error, Result};

/// Control plane endpoint used when none is configured.
pub const DEFAULT_HOST: &str = "https://cloudvolumesgcp-api.netapp.com";

/// Connect, read and write timeout used when none is configured.
///
/// Volume calls can block server side for minutes, so this is generous.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(295);

const HOST_ENV: &str = "CVS_HOST";
const PROJECT_ENV: &str = "CVS_PROJECT";
const AUDIENCE_ENV: &str = "CVS_AUDIENCE";
const CREDENTIALS_ENV: &str = "CVS_CREDENTIALS";
const GOOGLE_APPLICATION_CREDENTIALS: &str = "GOOGLE_APPLICATION_CREDENTIALS";

/// Where the service account key comes from.
///
/// Inline key material wins when both are set.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    /// Service account key JSON
    pub inline: Option<SecretString>,
    /// Path to a service account key JSON file
    pub key_file: Option<PathBuf>,
}

/// Configuration object detailing the endpoint, project, credentials and timeouts.
#[derive(Debug, Clone)]
pub struct Config {
    /// The control plane url
    pub host: http::Uri,
    /// Project number every request is scoped to.
    ///
    /// Also the project a volume's network is resolved in, unless the volume names
    /// a shared VPC host project.
    pub project: String,
    /// Audience claim of minted tokens, the host by default
    pub audience: String,
    /// Service account key source
    pub credentials: Credentials,
    /// Timeout for calls to the API.
    ///
    /// A value of `None` means no timeout
    pub timeout: Option<Duration>,
    /// Seed for retry backoff jitter.
    ///
    /// `None` seeds every operation from the OS; a fixed seed makes retry delays reproducible.
    pub retry_seed: Option<u64>,
}

impl Config {
    /// Construct a config for `project` against the default host, with no credentials yet.
    pub fn new(project: impl Into<String>) -> Self {
        Self {
            host: http::Uri::from_static(DEFAULT_HOST),
            project: project.into(),
            audience: DEFAULT_HOST.to_owned(),
            credentials: Credentials::default(),
            timeout: Some(DEFAULT_TIMEOUT),
            retry_seed: None,
        }
    }

    /// Read the configuration from the environment.
    ///
    /// - `CVS_PROJECT` (required) project number
    /// - `CVS_HOST` control plane url
    /// - `CVS_AUDIENCE` token audience, the host by default
    /// - `CVS_CREDENTIALS` inline service account key
    /// - `GOOGLE_APPLICATION_CREDENTIALS` service account key file
    pub fn from_env() -> Result<Self> {
        let project = env::var(PROJECT_ENV)
            .ok()
            .filter(|p| !p.is_empty())
            .ok_or(Error::Config(ConfigError::MissingProject(PROJECT_ENV)))?;
        let mut config = Self::new(project);
        if let Ok(host) = env::var(HOST_ENV) {
            config = config.with_host(&host)?;
        }
        if let Ok(audience) = env::var(AUDIENCE_ENV) {
            config.audience = audience;
        }
        config.credentials = Credentials {
            inline: env::var(CREDENTIALS_ENV)
                .ok()
                .filter(|c| !c.is_empty())
                .map(SecretString::from),
            key_file: env::var_os(GOOGLE_APPLICATION_CREDENTIALS).map(PathBuf::from),
        };
        tracing::debug!(host = %config.host, project = %config.project, "loaded config from env");
        Ok(config)
    }

    /// Point at another host. The audience follows the host.
    pub fn with_host(mut self, host: &str) -> Result<Self> {
        self.host = host
            .parse::<http::Uri>()
            .map_err(|e| Error::Config(ConfigError::InvalidHost(e)))?;
        self.audience = host.trim_end_matches('/').to_owned();
        Ok(self)
    }

    /// Use an inline service account key.
    pub fn with_credentials(mut self, key: impl Into<String>) -> Self {
        self.credentials.inline = Some(SecretString::from(key.into()));
        self
    }

    /// Use a service account key file.
    pub fn with_key_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.credentials.key_file = Some(path.into());
        self
    }

    /// The url every request path is appended to.
    pub fn base_uri(&self) -> Result<http::Uri> {
        let base = format!(
            "{}/v2/projects/{}/locations",
            self.host.to_string().trim_end_matches('/'),
            self.project
        );
        base.parse::<http::Uri>()
            .map_err(|e| Error::Config(ConfigError::InvalidHost(e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_uri_scopes_to_project() {
        let config = Config::new("123456789");
        assert_eq!(
            config.base_uri().unwrap(),
            "https://cloudvolumesgcp-api.netapp.com/v2/projects/123456789/locations"
        );
        assert_eq!(config.audience, DEFAULT_HOST);
        assert_eq!(config.timeout, Some(DEFAULT_TIMEOUT));
    }

    #[test]
    fn custom_host_moves_audience() {
        let config = Config::new("42").with_host("http://localhost:8080/").unwrap();
        assert_eq!(config.audience, "http://localhost:8080");
        assert_eq!(
            config.base_uri().unwrap(),
            "http://localhost:8080/v2/projects/42/locations"
        );
    }

    // One test owns the process environment; the others never read it.
    #[test]
    fn from_env() {
        for var in [HOST_ENV, AUDIENCE_ENV, CREDENTIALS_ENV, GOOGLE_APPLICATION_CREDENTIALS] {
            env::remove_var(var);
        }
        env::set_var(PROJECT_ENV, "");
        let err = Config::from_env().unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::MissingProject(PROJECT_ENV))));

        env::set_var(PROJECT_ENV, "123456789");
        env::set_var(HOST_ENV, "http://localhost:8080");
        env::set_var(GOOGLE_APPLICATION_CREDENTIALS, "/var/run/cvs/key.json");
        let config = Config::from_env().unwrap();
        assert_eq!(config.project, "123456789");
        assert_eq!(config.audience, "http://localhost:8080");
        assert!(config.credentials.inline.is_none());
        assert_eq!(config.credentials.key_file, Some(PathBuf::from("/var/run/cvs/key.json")));

        env::set_var(AUDIENCE_ENV, "https://cloudvolumesgcp-api.netapp.com");
        let config = Config::from_env().unwrap();
        assert_eq!(config.audience, "https://cloudvolumesgcp-api.netapp.com");
        assert_eq!(config.base_uri().unwrap(), "http://localhost:8080/v2/projects/123456789/locations");

        for var in [PROJECT_ENV, HOST_ENV, AUDIENCE_ENV, GOOGLE_APPLICATION_CREDENTIALS] {
            env::remove_var(var);
        }
    }

    #[test]
    fn invalid_host_is_rejected() {
        let err = Config::new("42").with_host("http://[::1").unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::InvalidHost(_))));
    }
}
