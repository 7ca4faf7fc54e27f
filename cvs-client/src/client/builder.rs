use bytes::Bytes;
use http::{header::HeaderMap, Request, Response};
use hyper::body::Incoming;
use hyper_timeout::TimeoutConnector;
use hyper_util::{client::legacy::connect::HttpConnector, rt::TokioExecutor};

use std::{sync::Arc, time::Duration};
use tower::{util::BoxService, BoxError, Layer, Service, ServiceBuilder};
use tower_http::{
    classify::ServerErrorsFailureClass, map_response_body::MapResponseBodyLayer, trace::TraceLayer,
};
use tracing::Span;

use super::{body::Body, middleware::project_scope, ServiceAccountKeySource, TokenSource};
use crate::{Client, Config, Error, Result};

/// HTTP body of a dynamic backing type.
///
/// The suggested implementation type is [`crate::client::Body`].
pub type DynBody = dyn http_body::Body<Data = Bytes, Error = BoxError> + Send + Unpin;

/// Builder for [`Client`] instances with customized [tower](`Service`) middleware.
pub struct ClientBuilder<Svc> {
    service: Svc,
    tokens: Arc<dyn TokenSource>,
    project: String,
    audience: String,
    retry_seed: Option<u64>,
}

impl<Svc> ClientBuilder<Svc> {
    /// Construct a [`ClientBuilder`] from scratch with a fully custom [`Service`] stack.
    ///
    /// This method is only intended for advanced use cases, most users will want to use
    /// [`ClientBuilder::try_from`] instead, which provides a default stack as a starting point.
    pub fn new<T>(service: Svc, tokens: T, config: &Config) -> Self
    where
        Svc: Service<Request<Body>>,
        T: TokenSource + 'static,
    {
        Self {
            service,
            tokens: Arc::new(tokens),
            project: config.project.clone(),
            audience: config.audience.clone(),
            retry_seed: config.retry_seed,
        }
    }

    /// Add a [`Layer`] to the current [`Service`] stack.
    pub fn with_layer<L: Layer<Svc>>(self, layer: &L) -> ClientBuilder<L::Service> {
        let Self {
            service: stack,
            tokens,
            project,
            audience,
            retry_seed,
        } = self;
        ClientBuilder {
            service: layer.layer(stack),
            tokens,
            project,
            audience,
            retry_seed,
        }
    }

    /// Build a [`Client`] instance with the current [`Service`] stack.
    pub fn build<B>(self) -> Client
    where
        Svc: Service<Request<Body>, Response = Response<B>> + Send + 'static,
        Svc::Future: Send + 'static,
        Svc::Error: Into<BoxError>,
        B: http_body::Body<Data = bytes::Bytes> + Send + 'static,
        B::Error: Into<BoxError>,
    {
        Client::with_shared_tokens(self.service, self.tokens, self.project)
            .with_audience(self.audience)
            .with_retry_seed(self.retry_seed)
    }
}

/// The type-erased service stack built by [`ClientBuilder::try_from`].
pub type GenericService = BoxService<Request<Body>, Response<Box<DynBody>>, BoxError>;

impl TryFrom<Config> for ClientBuilder<GenericService> {
    type Error = Error;

    /// Builds a default [`ClientBuilder`] stack from a given configuration
    fn try_from(config: Config) -> Result<Self> {
        let mut connector = HttpConnector::new();
        connector.enforce_http(false);

        let client: hyper_util::client::legacy::Client<_, Body> = {
            // If the TLS feature is not enabled, the http connector will be used.
            #[cfg(feature = "rustls-tls")]
            let connector = hyper_rustls::HttpsConnectorBuilder::new()
                .with_native_roots()
                .map_err(|e| Error::Config(crate::error::ConfigError::NativeRoots(e)))?
                .https_or_http()
                .enable_http1()
                .wrap_connector(connector);
            #[cfg(not(feature = "rustls-tls"))]
            if config.host.scheme() == Some(&http::uri::Scheme::HTTPS) {
                // no tls stack situation only works with http scheme
                return Err(Error::Config(crate::error::ConfigError::TlsRequired(
                    config.host.clone(),
                )));
            }

            let mut connector = TimeoutConnector::new(connector);

            connector.set_connect_timeout(config.timeout);
            connector.set_read_timeout(config.timeout);
            connector.set_write_timeout(config.timeout);

            hyper_util::client::legacy::Builder::new(TokioExecutor::new()).build(connector)
        };

        let service = ServiceBuilder::new()
            .layer(project_scope(&config)?)
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(|req: &Request<Body>| {
                        tracing::debug_span!(
                            "HTTP",
                             http.method = %req.method(),
                             http.url = %req.uri(),
                             http.status_code = tracing::field::Empty,
                             otel.kind = "client",
                             otel.status_code = tracing::field::Empty,
                        )
                    })
                    .on_request(|_req: &Request<Body>, _span: &Span| {
                        tracing::debug!("requesting");
                    })
                    .on_response(|res: &Response<Incoming>, _latency: Duration, span: &Span| {
                        let status = res.status();
                        span.record("http.status_code", status.as_u16());
                        if status.is_client_error() || status.is_server_error() {
                            span.record("otel.status_code", "ERROR");
                        }
                    })
                    .on_body_chunk(())
                    .on_eos(|_: Option<&HeaderMap>, _duration: Duration, _span: &Span| {
                        tracing::debug!("stream closed");
                    })
                    .on_failure(|ec: ServerErrorsFailureClass, _latency: Duration, span: &Span| {
                        span.record("otel.status_code", "ERROR");
                        match ec {
                            // Busy answers are 5xx too, so these stay below error level.
                            ServerErrorsFailureClass::StatusCode(status) => {
                                span.record("http.status_code", status.as_u16());
                                tracing::debug!("failed with status {}", status)
                            }
                            ServerErrorsFailureClass::Error(err) => {
                                tracing::error!("failed with error {}", err)
                            }
                        }
                    }),
            )
            .map_err(BoxError::from)
            .service(client);

        let tokens = ServiceAccountKeySource::from(&config.credentials);
        Ok(ClientBuilder::new(
            BoxService::new(
                MapResponseBodyLayer::new(|body| {
                    Box::new(http_body_util::BodyExt::map_err(body, BoxError::from)) as Box<DynBody>
                })
                .layer(service),
            ),
            tokens,
            &config,
        ))
    }
}
