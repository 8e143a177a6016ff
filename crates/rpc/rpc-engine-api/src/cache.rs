//! Block caches for payloads that are not canonical yet.

use alloy_primitives::{BlockNumber, B256};
use corten_primitives::SealedBlock;
use std::{collections::HashMap, sync::Arc};
use tracing::trace;

/// The engine's two block caches.
///
/// *Remote* blocks arrived via `newPayload` but are not canonical; *executed*
/// blocks have had their state transition applied against the VM without
/// their canonical status being committed. Both are pure optimization: losing
/// an entry can only turn a `VALID` answer into `SYNCING`/`ACCEPTED`, never
/// change a validation outcome.
#[derive(Debug, Default)]
pub(crate) struct EngineBlockCache {
    remote: HashMap<B256, Arc<SealedBlock>>,
    executed: HashMap<B256, Arc<SealedBlock>>,
}

impl EngineBlockCache {
    /// Stores a block seen via payload.
    pub(crate) fn insert_remote(&mut self, block: Arc<SealedBlock>) {
        self.remote.insert(block.hash(), block);
    }

    /// Stores a block whose state transition has been applied.
    pub(crate) fn insert_executed(&mut self, block: Arc<SealedBlock>) {
        self.executed.insert(block.hash(), block);
    }

    /// Returns a remotely delivered block.
    #[cfg(test)]
    pub(crate) fn remote(&self, hash: &B256) -> Option<&Arc<SealedBlock>> {
        self.remote.get(hash)
    }

    /// Returns a block from either map, preferring the executed one.
    pub(crate) fn any(&self, hash: &B256) -> Option<&Arc<SealedBlock>> {
        self.executed.get(hash).or_else(|| self.remote.get(hash))
    }

    /// Returns `true` if the block's state transition is cached as applied.
    pub(crate) fn is_executed(&self, hash: &B256) -> bool {
        self.executed.contains_key(hash)
    }

    /// Drops remote entries at or below the finalized height and executed
    /// entries at or below the executed watermark.
    pub(crate) fn prune(&mut self, finalized: BlockNumber, executed_watermark: BlockNumber) {
        let before = (self.remote.len(), self.executed.len());
        self.remote.retain(|_, block| block.number() > finalized);
        self.executed.retain(|_, block| block.number() > executed_watermark);
        trace!(
            target: "engine::cache",
            remote = before.0 - self.remote.len(),
            executed = before.1 - self.executed.len(),
            finalized,
            executed_watermark,
            "pruned block caches"
        );
    }

    #[cfg(test)]
    pub(crate) fn remote_len(&self) -> usize {
        self.remote.len()
    }

    #[cfg(test)]
    pub(crate) fn executed_len(&self) -> usize {
        self.executed.len()
    }
}
