//! Types and client-less behavior for the Cloud Volumes Service API.
//!
//! This crate contains the parts of a Cloud Volumes client that do not perform IO:
//!
//! - [`volume`] for the volume data model sent to and decoded from the control plane
//! - [`response`] for the wire envelopes the control plane answers with
//! - [`request`] for building authenticated [`http::Request`] objects
//! - [`classify`] for deciding whether a response succeeded, failed, or asked to be retried
//!
//! The `cvs-client` crate drives these against a live endpoint.
#![forbid(unsafe_code)]

pub mod classify;
pub use classify::{classify, Outcome, TransientKind};

pub mod request;
pub use request::{Prepared, Request, Verb};

pub mod response;
pub use response::{ApiErrorResponse, CreateVolumeResult, CreatedVolume, OperationStatus};

pub mod volume;
pub use volume::{
    DailySchedule, ExportPolicy, ExportPolicyRule, HourlySchedule, MountPoint, MonthlySchedule, Nfs,
    SnapshotPolicy, VolumeRequest, VolumeResult, WeeklySchedule,
};

mod error;
pub use error::Error;

/// Convient alias for `Result<T, Error>`
pub type Result<T, E = Error> = std::result::Result<T, E>;
