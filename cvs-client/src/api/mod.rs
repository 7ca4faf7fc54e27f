//! API helpers for managing volumes
mod volume;
pub use volume::select_volume;

use rand::{rngs::StdRng, SeedableRng};
use tokio_util::sync::CancellationToken;

pub use cvs_core::{
    CreateVolumeResult, ExportPolicy, ExportPolicyRule, MountPoint, SnapshotPolicy, VolumeRequest,
    VolumeResult,
};

use crate::Client;

/// Volume lifecycle operations against one project
///
/// Reads are single calls. Creates and deletes go through the
/// [retry loop](crate::client::retry) and may take several minutes while the
/// control plane is busy.
#[derive(Clone)]
pub struct VolumeApi {
    pub(crate) client: Client,
    cancel: CancellationToken,
}

impl VolumeApi {
    /// Manage volumes in the client's project
    pub fn new(client: Client) -> Self {
        Self {
            client,
            cancel: CancellationToken::new(),
        }
    }

    /// Stop retrying once `cancel` fires.
    ///
    /// Cancellation is observed between attempts; a request already in flight finishes first.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    // One generator per operation, so concurrent operations never share random state.
    fn rng(&self) -> StdRng {
        match self.client.retry_seed() {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        }
    }
}
