//! The execution contract between the engine and the VM.

use crate::provider::ProviderError;
use alloy_primitives::B256;
use corten_primitives::{SealedBlock, SealedHeader};
use std::sync::Arc;

/// Failures while running a block or moving the canonical head.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BlockExecutionError {
    /// The state transition of the block failed.
    #[error("block execution failed: {0}")]
    Execution(String),
    /// The post-state root of the block does not match its header.
    #[error("state root mismatch: got {got}, expected {expected}")]
    StateRootMismatch {
        /// Root produced by the VM.
        got: B256,
        /// Root declared in the header.
        expected: B256,
    },
    /// The canonical head could not be moved to the requested chain.
    #[error("failed to set canonical head: {0}")]
    SetHead(String),
    /// The underlying store failed.
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// The VM-facing contract the engine drives.
///
/// The *VM head* is the block whose post-state the VM currently reflects. It
/// trails the forkchoice-declared head: `execute_block` advances state
/// without touching canonicality, and only `set_head` commits a canonical
/// chain.
pub trait BlockExecutor: Send + Sync {
    /// The header of the block whose state the VM currently reflects.
    fn vm_head(&self) -> Result<SealedHeader, BlockExecutionError>;

    /// Returns `true` if the state trie contains the given root.
    fn has_state_root(&self, root: &B256) -> Result<bool, BlockExecutionError>;

    /// Runs the block on top of the given parent state root without moving
    /// the canonical head.
    ///
    /// `force` runs the block even while the VM is busy with a competing
    /// task; the pending-build bridge relies on it.
    fn execute_block(
        &self,
        block: &SealedBlock,
        parent_state_root: B256,
        force: bool,
    ) -> Result<(), BlockExecutionError>;

    /// Commits the given chain segment as canonical, making the last block
    /// the new head, and records the safe and finalized markers.
    fn set_head(
        &self,
        blocks: &[Arc<SealedBlock>],
        safe: Option<Arc<SealedBlock>>,
        finalized: Option<Arc<SealedBlock>>,
    ) -> Result<(), BlockExecutionError>;

    /// Removes a block from the store, typically after it failed execution.
    fn delete_block(&self, hash: &B256) -> Result<(), BlockExecutionError>;
}
