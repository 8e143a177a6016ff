//! The beacon-sync skeleton contract.

use crate::provider::ProviderResult;
use alloy_primitives::B256;
use corten_primitives::SealedBlock;
use std::sync::Arc;

/// A sparse, out-of-order representation of a future canonical chain,
/// maintained by the beacon-sync subsystem and fed by the engine.
pub trait SkeletonSync: Send + Sync {
    /// Returns `true` if beacon sync is currently driving the node.
    fn is_running(&self) -> bool;

    /// Switches the node to beacon sync.
    fn activate(&self);

    /// Returns a block tracked by the skeleton.
    fn block_by_hash(&self, hash: &B256) -> ProviderResult<Option<Arc<SealedBlock>>>;

    /// Offers a block to the skeleton without moving its head.
    ///
    /// Returns `true` if the skeleton linked the block in, meaning sync is
    /// expected to reach it; `false` if the skeleton had no place for it.
    fn try_extend(&self, block: Arc<SealedBlock>) -> ProviderResult<bool>;

    /// Directs the skeleton head to the given block.
    fn set_head(&self, block: Arc<SealedBlock>) -> ProviderResult<()>;

    /// Removes a block from the skeleton, if present. Best-effort.
    fn delete_block(&self, hash: &B256) -> bool;
}
