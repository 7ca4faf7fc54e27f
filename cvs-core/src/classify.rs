//! Sorting control plane responses into success, fatal failure and "try again later".
//!
//! The control plane has no dedicated status or field for busy conditions. It returns a
//! generic `500` envelope and puts the condition in free text, so the known conditions are
//! matched on their exact message in [`TRANSIENT_ALLOWLIST`]. Anything not listed there is fatal.
use std::fmt;

use http::StatusCode;

use crate::response::ApiErrorResponse;

/// A backend condition known to clear up on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TransientKind {
    /// The job queue is full while creating a volume
    CreateJobExhaustion,
    /// The job queue is full while deleting a volume
    DeleteJobExhaustion,
    /// An internal call of the control plane timed out
    DeadlineExceeded,
}

impl fmt::Display for TransientKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TransientKind::CreateJobExhaustion => "create job exhaustion",
            TransientKind::DeleteJobExhaustion => "delete job exhaustion",
            TransientKind::DeadlineExceeded => "deadline exceeded",
        })
    }
}

/// Envelopes that mean "retry later", as `(code, exact message, kind)`.
pub const TRANSIENT_ALLOWLIST: &[(i64, &str, TransientKind)] = &[
    (
        500,
        "Error creating volume - Cannot spawn additional jobs. Please wait for the ongoing jobs to finish and try again",
        TransientKind::CreateJobExhaustion,
    ),
    (
        500,
        "Error deleting volume - Cannot spawn additional jobs. Please wait for the ongoing jobs to finish and try again",
        TransientKind::DeleteJobExhaustion,
    ),
    (
        500,
        "Post http://cloud-volumes-service.sde.svc.cluster.local/v2/Volumes: context deadline exceeded",
        TransientKind::DeadlineExceeded,
    ),
];

impl TransientKind {
    /// Look up an envelope in the allowlist.
    pub fn matching(err: &ApiErrorResponse) -> Option<Self> {
        TRANSIENT_ALLOWLIST
            .iter()
            .find(|(code, message, _)| *code == err.code && *message == err.message)
            .map(|(_, _, kind)| *kind)
    }
}

/// What a single HTTP exchange amounted to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The call went through; holds the raw body for the caller to decode
    Success(String),
    /// A failed status carrying a `code: 0`, empty message envelope; holds the raw body.
    ///
    /// Only a call resubmitted after a transient answer may take this as success.
    /// Anywhere else it is a failure like [`Outcome::Fatal`].
    Settled(String),
    /// The call failed and retrying will not help
    Fatal(StatusCode, ApiErrorResponse),
    /// The backend is busy; the envelope is kept for reporting once retries run out
    Transient(TransientKind, ApiErrorResponse),
}

impl Outcome {
    /// Whether the control plane reported a missing resource, by status or by envelope code.
    pub fn is_not_found(&self) -> bool {
        match self {
            Outcome::Fatal(status, err) => *status == StatusCode::NOT_FOUND || err.is_not_found(),
            _ => false,
        }
    }

    /// The body of a successful call, or the envelope of any other answer.
    ///
    /// For calls that are never retried: a [`Outcome::Settled`] answer is a failure here.
    pub fn into_body(self) -> Result<String, ApiErrorResponse> {
        match self {
            Outcome::Success(body) => Ok(body),
            Outcome::Settled(_) => Err(ApiErrorResponse {
                code: 0,
                message: String::new(),
            }),
            Outcome::Fatal(_, err) | Outcome::Transient(_, err) => Err(err),
        }
    }
}

/// Classify a response by status and body.
///
/// Bodies of failed calls that do not decode as an [`ApiErrorResponse`] are fatal,
/// with the raw text as message, so protocol garbage is never retried. A failed call whose
/// envelope reports code 0 is [`Outcome::Settled`], never [`Outcome::Success`].
pub fn classify(status: StatusCode, body: &str, operation: &str) -> Outcome {
    if status.is_success() {
        return Outcome::Success(body.to_owned());
    }
    let err = match serde_json::from_str::<ApiErrorResponse>(body) {
        Ok(err) => err,
        Err(e) => {
            tracing::warn!(operation, %status, "Unsuccessful data error parse: {}", e);
            return Outcome::Fatal(status, ApiErrorResponse {
                code: i64::from(status.as_u16()),
                message: body.to_owned(),
            });
        }
    };
    if err.is_success() {
        tracing::debug!(operation, %status, "error framed response reported code 0");
        return Outcome::Settled(body.to_owned());
    }
    if status.is_server_error() {
        if let Some(kind) = TransientKind::matching(&err) {
            tracing::debug!(operation, %kind, "transient failure");
            return Outcome::Transient(kind, err);
        }
    }
    tracing::debug!(operation, %status, "Unsuccessful: {:?}", err);
    Outcome::Fatal(status, err)
}
