//! A basic API client for interacting with the Cloud Volumes API
//!
//! The [`Client`] sends one authenticated request per call: it mints a token from its
//! [`TokenSource`], attaches it to a [`Prepared`] request and classifies the answer.
//! Retrying is left to the [`retry`] module and the lifecycle operations in [`api`](crate::api).
use std::sync::Arc;

use bytes::Bytes;
use cvs_core::{classify, Outcome, Prepared};
use futures::future::BoxFuture;
use http::{Request, Response, StatusCode};
use secrecy::ExposeSecret;
use tower::{buffer::Buffer, util::BoxService, BoxError, Layer, Service, ServiceExt};
use tower_http::map_response_body::MapResponseBodyLayer;

use crate::{config::DEFAULT_HOST, Config, Error, Result};

mod auth;
mod body;
mod builder;
pub mod middleware;
pub mod retry;

pub use auth::{CredentialError, ServiceAccountKeySource, StaticToken, TokenSource};
pub use body::Body;
pub use builder::{ClientBuilder, DynBody, GenericService};

/// Client for connecting with the Cloud Volumes control plane.
///
/// Cheap to clone; clones share the underlying connection pool and token source.
/// Construct one from a [`Config`] with [`Client::try_from`], or around a custom
/// service stack with [`Client::new`].
#[derive(Clone)]
pub struct Client {
    // - `Buffer` for cheap clone
    // - `BoxService` for dynamic response future type
    inner: Buffer<Request<Body>, BoxFuture<'static, Result<Response<Body>, BoxError>>>,
    tokens: Arc<dyn TokenSource>,
    audience: String,
    project: String,
    retry_seed: Option<u64>,
}

impl Client {
    /// Create a [`Client`] using a custom `Service` stack.
    ///
    /// The service receives requests with paths relative to the project's location root
    /// (e.g. `/us-west2/Volumes`), so it is expected to set the base URI, as the default
    /// stack does with [`project_scope`](middleware::project_scope).
    ///
    /// # Example
    ///
    /// ```rust
    /// # async fn doc() -> Result<(), Box<dyn std::error::Error>> {
    /// use cvs_client::{client::{middleware::project_scope, Body, StaticToken}, Client, Config};
    /// use hyper_util::{client::legacy::Client as HyperClient, rt::TokioExecutor};
    /// use tower::ServiceBuilder;
    ///
    /// let config = Config::new("123456789").with_host("http://localhost:8080")?;
    /// let service = ServiceBuilder::new()
    ///     .layer(project_scope(&config)?)
    ///     .service(HyperClient::builder(TokioExecutor::new()).build_http::<Body>());
    /// let client = Client::new(service, StaticToken::new("dev-token"), config.project);
    /// # Ok(())
    /// # }
    /// ```
    pub fn new<S, B, T>(service: S, tokens: T, project: impl Into<String>) -> Self
    where
        S: Service<Request<Body>, Response = Response<B>> + Send + 'static,
        S::Future: Send + 'static,
        S::Error: Into<BoxError>,
        B: http_body::Body<Data = Bytes> + Send + 'static,
        B::Error: Into<BoxError>,
        T: TokenSource + 'static,
    {
        Self::with_shared_tokens(service, Arc::new(tokens), project)
    }

    pub(crate) fn with_shared_tokens<S, B>(
        service: S,
        tokens: Arc<dyn TokenSource>,
        project: impl Into<String>,
    ) -> Self
    where
        S: Service<Request<Body>, Response = Response<B>> + Send + 'static,
        S::Future: Send + 'static,
        S::Error: Into<BoxError>,
        B: http_body::Body<Data = Bytes> + Send + 'static,
        B::Error: Into<BoxError>,
    {
        // Transform response body to `crate::client::Body` and use type erased error
        // to avoid type parameters.
        let service = MapResponseBodyLayer::new(|b: B| Body::wrap_body(b))
            .layer(service)
            .map_err(|e| e.into());
        Self {
            inner: Buffer::new(BoxService::new(service), 1024),
            tokens,
            audience: DEFAULT_HOST.to_owned(),
            project: project.into(),
            retry_seed: None,
        }
    }

    /// Set the audience claim of minted tokens.
    #[must_use]
    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = audience.into();
        self
    }

    /// Make retry backoff jitter reproducible.
    #[must_use]
    pub fn with_retry_seed(mut self, seed: Option<u64>) -> Self {
        self.retry_seed = seed;
        self
    }

    /// The project this client is scoped to.
    pub fn project(&self) -> &str {
        &self.project
    }

    pub(crate) fn retry_seed(&self) -> Option<u64> {
        self.retry_seed
    }

    /// Perform a raw HTTP request against the API and return the raw response back.
    pub async fn send(&self, request: Request<Body>) -> Result<Response<Body>> {
        let mut svc = self.inner.clone();
        let res = svc
            .ready()
            .await
            .map_err(Error::Service)?
            .call(request)
            .await
            .map_err(|err| {
                // Error decorating request
                err.downcast::<Error>()
                    .map(|e| *e)
                    // Error requesting, or from another middleware
                    .unwrap_or_else(Error::Service)
            })?;
        Ok(res)
    }

    /// Perform a raw HTTP request and get back the status and the body as a string.
    ///
    /// Unlike the lifecycle operations this does not judge the status.
    pub async fn request_text(&self, request: Request<Vec<u8>>) -> Result<(StatusCode, String)> {
        let res = self.send(request.map(Body::from)).await?;
        let status = res.status();
        let body_bytes = res.into_body().collect_bytes().await?;
        let text = String::from_utf8(body_bytes.to_vec()).map_err(Error::FromUtf8)?;
        Ok((status, text))
    }

    /// Mint a fresh token and attach it to `prepared`.
    pub fn authorize(&self, prepared: &Prepared) -> Result<Request<Vec<u8>>> {
        let token = self.tokens.mint(&self.audience).map_err(Error::Credential)?;
        prepared
            .authorize(token.expose_secret())
            .map_err(Error::BuildRequest)
    }

    /// Send `prepared` once and classify the answer.
    ///
    /// Credential and transport failures are returned as errors; everything the control
    /// plane answered is an [`Outcome`].
    pub async fn call(&self, prepared: &Prepared, operation: &str) -> Result<Outcome> {
        let request = self.authorize(prepared)?;
        tracing::debug!(
            operation,
            method = %request.method(),
            path = prepared.url_path(),
            "requesting"
        );
        let (status, text) = self.request_text(request).await?;
        tracing::trace!(operation, %status, "response body: {}", text);
        Ok(classify(status, &text, operation))
    }
}

impl TryFrom<Config> for Client {
    type Error = Error;

    /// Builds a default [`Client`] from a [`Config`], see [`ClientBuilder`] if more customization is required
    fn try_from(config: Config) -> Result<Self> {
        Ok(ClientBuilder::try_from(config)?.build())
    }
}

#[cfg(test)]
mod tests {
    use super::{Body, Client, StaticToken};
    use crate::Error;
    use cvs_core::{Outcome, Request as CvsRequest, TransientKind};
    use futures::pin_mut;
    use http::{header::AUTHORIZATION, Request, Response, StatusCode};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower_test::mock;

    #[tokio::test]
    async fn call_attaches_token_and_classifies() {
        let (mock_service, handle) = mock::pair::<Request<Body>, Response<Body>>();
        let spawned = tokio::spawn(async move {
            pin_mut!(handle);
            let (request, send) = handle.next_request().await.expect("service not called");
            assert_eq!(request.method(), http::Method::GET);
            assert_eq!(request.uri().to_string(), "/us-west2/Volumes/v1");
            assert_eq!(request.headers()[AUTHORIZATION], "Bearer t0ken");
            send.send_response(
                Response::builder()
                    .status(StatusCode::INTERNAL_SERVER_ERROR)
                    .body(Body::from(
                        r#"{"code":500,"message":"Post http://cloud-volumes-service.sde.svc.cluster.local/v2/Volumes: context deadline exceeded"}"#,
                    ))
                    .unwrap(),
            );
        });

        let client = Client::new(mock_service, StaticToken::new("t0ken"), "123");
        let outcome = client
            .call(&CvsRequest::new("us-west2/Volumes/v1").fetch(), "getVolumeByID")
            .await
            .unwrap();
        assert!(matches!(outcome, Outcome::Transient(TransientKind::DeadlineExceeded, _)));
        spawned.await.unwrap();
    }

    struct CountingTokens(AtomicUsize);

    impl super::TokenSource for CountingTokens {
        fn mint(&self, _audience: &str) -> Result<secrecy::SecretString, super::CredentialError> {
            let n = self.0.fetch_add(1, Ordering::SeqCst);
            Ok(secrecy::SecretString::from(format!("token-{n}")))
        }
    }

    #[tokio::test]
    async fn every_request_gets_a_new_token() {
        let (mock_service, handle) = mock::pair::<Request<Body>, Response<Body>>();
        let spawned = tokio::spawn(async move {
            pin_mut!(handle);
            for expected in ["Bearer token-0", "Bearer token-1"] {
                let (request, send) = handle.next_request().await.expect("service not called");
                assert_eq!(request.headers()[AUTHORIZATION], expected);
                send.send_response(Response::builder().body(Body::from("[]")).unwrap());
            }
        });

        let client = Client::new(mock_service, CountingTokens(AtomicUsize::new(0)), "123");
        let prepared = CvsRequest::new("us-west2/Volumes").fetch();
        for _ in 0..2 {
            let outcome = client.call(&prepared, "getVolumeByRegion").await.unwrap();
            assert_eq!(outcome, Outcome::Success("[]".into()));
        }
        spawned.await.unwrap();
    }

    #[tokio::test]
    async fn credential_failure_sends_nothing() {
        let (mock_service, handle) = mock::pair::<Request<Body>, Response<Body>>();
        let client = Client::new(mock_service, super::ServiceAccountKeySource::default(), "123");
        let err = client
            .call(&CvsRequest::new("us-west2/Volumes").fetch(), "getVolumeByRegion")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Credential(super::CredentialError::NoSource)));
        drop(client);
        pin_mut!(handle);
        assert!(handle.next_request().await.is_none());
    }
}
