//! Envelopes the control plane answers with.
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// An error response from the API.
///
/// The control plane wraps every failure in this shape, including the ones it
/// wants retried; the difference lives only in `message`.
#[derive(Error, Deserialize, Serialize, Debug, Clone, Eq, PartialEq)]
#[error("{message} (code {code})")]
pub struct ApiErrorResponse {
    /// The error code, usually mirroring the HTTP status
    pub code: i64,
    /// A message about the error
    #[serde(default)]
    pub message: String,
}

impl ApiErrorResponse {
    /// The `code: 0`, empty message envelope the control plane uses when a call
    /// framed as an error actually went through.
    pub fn is_success(&self) -> bool {
        self.code == 0 && self.message.is_empty()
    }

    /// Whether this envelope reports a missing resource.
    pub fn is_not_found(&self) -> bool {
        self.code == 404
    }
}

/// Outcome envelope of calls that do not return a resource, e.g. updates.
///
/// Unlike [`ApiErrorResponse`], both fields are optional on the wire.
#[derive(Deserialize, Serialize, Debug, Default, Clone, Eq, PartialEq)]
pub struct OperationStatus {
    /// Zero on success
    #[serde(default)]
    pub code: i64,
    /// Empty on success
    #[serde(default)]
    pub message: String,
}

impl OperationStatus {
    /// A status only counts as success when the code is zero and there is no message.
    ///
    /// The control plane reports some logical failures inside a 2xx response. A code of
    /// `200` is not treated as zero, even with an empty message.
    pub fn is_success(&self) -> bool {
        self.code == 0 && self.message.is_empty()
    }
}

/// Response to a volume create.
///
/// The job that creates the volume is keyed by an opaque name:
///
/// ```json
/// {"response": {"AnyValue": {"volumeId": "..."}}, "code": 0, "message": ""}
/// ```
#[derive(Deserialize, Serialize, Debug, Default, Clone, Eq, PartialEq)]
pub struct CreateVolumeResult {
    /// Single entry container keyed by an opaque job name
    #[serde(default)]
    pub response: Option<BTreeMap<String, CreatedVolume>>,
    /// Zero on success
    #[serde(default)]
    pub code: i64,
    /// Empty on success
    #[serde(default)]
    pub message: String,
    /// Creation token the volume was submitted with.
    ///
    /// Not part of the response; filled in by the client.
    #[serde(skip)]
    pub creation_token: String,
}

/// Inner entry of a [`CreateVolumeResult`].
#[derive(Deserialize, Serialize, Debug, Default, Clone, Eq, PartialEq)]
pub struct CreatedVolume {
    /// Server assigned volume id
    #[serde(rename = "volumeId", default)]
    pub volume_id: String,
}

impl CreateVolumeResult {
    /// The id of the created volume, whatever the container key is called.
    pub fn volume_id(&self) -> Option<&str> {
        self.response
            .as_ref()
            .and_then(|jobs| jobs.values().next())
            .map(|job| job.volume_id.as_str())
            .filter(|id| !id.is_empty())
    }
}
