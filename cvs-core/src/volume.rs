//! The volume data model exchanged with the control plane.
//!
//! Field names follow the wire format (`camelCase`). Empty identity fields are
//! left out of request bodies so the control plane fills in its own defaults;
//! the export policy is always sent since an empty rule list is how a policy is cleared.
use serde::{Deserialize, Serialize};

fn is_zero(v: &u64) -> bool {
    *v == 0
}

/// What a caller wants a volume to look like.
///
/// Used for creates, updates and as the lookup key for reads.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VolumeRequest {
    /// Human readable volume name
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    /// Region the volume lives in, e.g. `us-west2`
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub region: String,

    /// Idempotency key of the create request, also used as the export path
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub creation_token: String,

    /// Protocols the volume is exported with, e.g. `NFSv3`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub protocol_types: Vec<String>,

    /// Network name; the create path expands it to a full network resource path
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub network: String,

    /// Capacity in bytes
    #[serde(rename = "quotaInBytes", default, skip_serializing_if = "is_zero")]
    pub size: u64,

    /// Service level, e.g. `basic`, `standard`, `extreme`
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub service_level: String,

    /// Snapshot schedules
    #[serde(default, skip_serializing_if = "SnapshotPolicy::is_unset")]
    pub snapshot_policy: SnapshotPolicy,

    /// Client access rules
    #[serde(default)]
    pub export_policy: ExportPolicy,

    /// Server assigned volume id
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub volume_id: String,

    /// Zone for zonal storage classes
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub zone: String,

    /// Storage class, e.g. `hardware` or `software`
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub storage_class: String,

    /// Host project of a shared VPC network.
    ///
    /// Only affects how the network path is resolved on create; never sent.
    #[serde(skip)]
    pub shared_vpc_project_number: Option<String>,
}

/// The control plane's view of a volume.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VolumeResult {
    /// Human readable volume name
    #[serde(default)]
    pub name: String,
    /// Region the volume lives in
    #[serde(default)]
    pub region: String,
    /// Idempotency key the volume was created with
    #[serde(default)]
    pub creation_token: String,
    /// Protocols the volume is exported with
    #[serde(default)]
    pub protocol_types: Vec<String>,
    /// Full network resource path
    #[serde(default)]
    pub network: String,
    /// Capacity in bytes
    #[serde(rename = "quotaInBytes", default)]
    pub size: u64,
    /// Service level
    #[serde(default)]
    pub service_level: String,
    /// Snapshot schedules
    #[serde(default)]
    pub snapshot_policy: SnapshotPolicy,
    /// Client access rules
    #[serde(default)]
    pub export_policy: ExportPolicy,
    /// Server assigned volume id
    #[serde(default)]
    pub volume_id: String,
    /// Provisioning status, e.g. `creating`, `available`, `error`
    #[serde(rename = "lifeCycleState", default)]
    pub lifecycle_state: String,
    /// Free text accompanying `lifecycle_state`
    #[serde(rename = "lifeCycleStateDetails", default)]
    pub lifecycle_state_details: String,
    /// Where the volume can be mounted from
    #[serde(default)]
    pub mount_points: Vec<MountPoint>,
    /// Zone for zonal storage classes
    #[serde(default)]
    pub zone: String,
    /// Storage class
    #[serde(default)]
    pub storage_class: String,
}

/// Snapshot schedules of a volume.
///
/// All four schedules always travel on the wire; `enabled` decides whether any of them apply.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotPolicy {
    /// Whether scheduled snapshots are taken
    #[serde(default)]
    pub enabled: bool,
    /// Once a day
    #[serde(default)]
    pub daily_schedule: DailySchedule,
    /// Once an hour
    #[serde(default)]
    pub hourly_schedule: HourlySchedule,
    /// On given days of the month
    #[serde(default)]
    pub monthly_schedule: MonthlySchedule,
    /// On given days of the week
    #[serde(default)]
    pub weekly_schedule: WeeklySchedule,
}

impl SnapshotPolicy {
    /// True when nothing was configured, in which case requests leave the policy out.
    pub fn is_unset(&self) -> bool {
        *self == Self::default()
    }
}

#[allow(missing_docs)]
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DailySchedule {
    #[serde(default)]
    pub hour: u32,
    #[serde(default)]
    pub minute: u32,
    #[serde(default)]
    pub snapshots_to_keep: u32,
}

#[allow(missing_docs)]
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HourlySchedule {
    #[serde(default)]
    pub minute: u32,
    #[serde(default)]
    pub snapshots_to_keep: u32,
}

#[allow(missing_docs)]
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MonthlySchedule {
    /// Comma separated days, e.g. `1,15`
    #[serde(default)]
    pub days_of_month: String,
    #[serde(default)]
    pub hour: u32,
    #[serde(default)]
    pub minute: u32,
    #[serde(default)]
    pub snapshots_to_keep: u32,
}

#[allow(missing_docs)]
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WeeklySchedule {
    /// Comma separated weekday names, e.g. `Monday,Friday`
    #[serde(default)]
    pub day: String,
    #[serde(default)]
    pub hour: u32,
    #[serde(default)]
    pub minute: u32,
    #[serde(default)]
    pub snapshots_to_keep: u32,
}

/// Ordered access rules; the control plane evaluates them first to last.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct ExportPolicy {
    /// The rules, in evaluation order
    #[serde(default)]
    pub rules: Vec<ExportPolicyRule>,
}

/// A single export policy entry.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ExportPolicyRule {
    /// `ReadWrite`, `ReadOnly` or `None`
    #[serde(default)]
    pub access: String,
    /// Client match pattern: comma separated hosts, IPs or CIDR ranges
    #[serde(default)]
    pub allowed_clients: String,
    /// NFSv3 access
    #[serde(default)]
    pub nfsv3: Nfs,
    /// NFSv4 access
    #[serde(default)]
    pub nfsv4: Nfs,
}

/// Per protocol toggle of an export rule.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct Nfs {
    /// Whether the rule applies to this protocol version
    #[serde(default)]
    pub checked: bool,
}

/// Where a volume can be mounted from.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MountPoint {
    /// Export path
    #[serde(default)]
    pub export: String,
    /// Server address
    #[serde(default)]
    pub server: String,
    /// Protocol of this mount point
    #[serde(default)]
    pub protocol_type: String,
}
