//! Asset metadata handling.

use crate::error::ServerResult;
use parking_lot::Mutex;
use sitesync_protocol::Patch;

/// Receives asset-namespace patches.
///
/// Asset binaries are uploaded out of band; only their metadata rides
/// the patch channel, and it lands here instead of the document store.
pub trait AssetChanges: Send + Sync {
    /// Applies one batch's asset patches.
    fn apply(&self, patches: &[Patch]) -> ServerResult<()>;
}

/// Discards asset patches. For deployments without an asset pipeline.
#[derive(Default)]
pub struct IgnoreAssets;

impl AssetChanges for IgnoreAssets {
    fn apply(&self, _patches: &[Patch]) -> ServerResult<()> {
        Ok(())
    }
}

/// Records asset patches for inspection in tests.
#[derive(Default)]
pub struct RecordingAssets {
    patches: Mutex<Vec<Patch>>,
}

impl RecordingAssets {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every patch received so far.
    pub fn patches(&self) -> Vec<Patch> {
        self.patches.lock().clone()
    }
}

impl AssetChanges for RecordingAssets {
    fn apply(&self, patches: &[Patch]) -> ServerResult<()> {
        self.patches.lock().extend_from_slice(patches);
        Ok(())
    }
}
