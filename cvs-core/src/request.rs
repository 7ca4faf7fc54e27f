//! Request builder for the Cloud Volumes API.
use http::{
    header::{AUTHORIZATION, CONTENT_TYPE},
    HeaderValue, Method,
};
use serde::Serialize;

use crate::{Error, Result};

const JSON_MIME: &str = "application/json";

/// The operations the control plane understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    /// Read a resource or a collection
    Fetch,
    /// Submit a new resource
    Create,
    /// Overwrite an existing resource
    Replace,
    /// Remove a resource
    Remove,
}

impl Verb {
    /// Whether requests with this verb carry a JSON body.
    pub fn carries_body(self) -> bool {
        matches!(self, Verb::Create | Verb::Replace)
    }

    fn method(self) -> Method {
        match self {
            Verb::Fetch => Method::GET,
            Verb::Create => Method::POST,
            Verb::Replace => Method::PUT,
            Verb::Remove => Method::DELETE,
        }
    }
}

/// A Cloud Volumes request builder
///
/// Takes a path relative to the project's location root, e.g. `us-west2/Volumes`.
#[derive(Debug, Clone)]
pub struct Request {
    /// The path component of a url
    pub url_path: String,
}

impl Request {
    /// New request with a resource's url path
    pub fn new<S: Into<String>>(url_path: S) -> Self {
        let url_path = url_path.into();
        let url_path = if url_path.starts_with('/') {
            url_path
        } else {
            format!("/{url_path}")
        };
        Self { url_path }
    }

    /// Build a complete request authorized with `token`.
    ///
    /// `body` is dropped for [`Verb::Fetch`] and [`Verb::Remove`].
    pub fn build<B>(&self, verb: Verb, body: Option<&B>, token: &str) -> Result<http::Request<Vec<u8>>>
    where
        B: Serialize + ?Sized,
    {
        self.prepare(verb, body)?.authorize(token)
    }

    /// Serialize the body once so the exact same bytes can be sent on every attempt.
    pub fn prepare<B>(&self, verb: Verb, body: Option<&B>) -> Result<Prepared>
    where
        B: Serialize + ?Sized,
    {
        let body = match body {
            Some(data) if verb.carries_body() => Some(serde_json::to_vec(data).map_err(Error::Encoding)?),
            _ => None,
        };
        Ok(Prepared {
            verb,
            url_path: self.url_path.clone(),
            body,
        })
    }

    /// Prepare a body-less read
    pub fn fetch(&self) -> Prepared {
        Prepared {
            verb: Verb::Fetch,
            url_path: self.url_path.clone(),
            body: None,
        }
    }

    /// Prepare a removal
    pub fn remove(&self) -> Prepared {
        Prepared {
            verb: Verb::Remove,
            url_path: self.url_path.clone(),
            body: None,
        }
    }
}

/// A request whose body is already serialized, waiting for a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prepared {
    verb: Verb,
    url_path: String,
    body: Option<Vec<u8>>,
}

impl Prepared {
    /// The verb of this request
    pub fn verb(&self) -> Verb {
        self.verb
    }

    /// The path of this request
    pub fn url_path(&self) -> &str {
        &self.url_path
    }

    /// The serialized body, if the verb carries one
    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    /// Produce the outbound request with JSON and bearer headers set.
    pub fn authorize(&self, token: &str) -> Result<http::Request<Vec<u8>>> {
        let mut auth = HeaderValue::try_from(format!("Bearer {token}")).map_err(Error::InvalidBearerToken)?;
        auth.set_sensitive(true);
        http::Request::builder()
            .method(self.verb.method())
            .uri(self.url_path.as_str())
            .header(CONTENT_TYPE, HeaderValue::from_static(JSON_MIME))
            .header(AUTHORIZATION, auth)
            .body(self.body.clone().unwrap_or_default())
            .map_err(Error::HttpError)
    }
}
