//! Mempool follow-ups of canonical head moves.

use corten_primitives::SealedBlock;
use std::sync::Arc;

/// The slice of the transaction pool the engine drives.
pub trait PoolMaintenance: Send + Sync {
    /// Drops transactions that were included in the given canonical blocks.
    fn remove_mined_transactions(&self, blocks: &[Arc<SealedBlock>]);

    /// Wakes the pool's processing loop, called when the node transitions
    /// into the synchronized state.
    fn resume(&self);
}
