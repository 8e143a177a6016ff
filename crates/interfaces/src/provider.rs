//! Read access to the canonical chain.

use alloy_primitives::{BlockNumber, B256, U256};
use corten_primitives::{ChainInfo, SealedBlock, SealedHeader};
use std::sync::Arc;

/// Result alias for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Failures of the underlying block store.
///
/// These are infrastructure errors; a block that is merely absent is
/// reported as `Ok(None)` by the lookup methods.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    /// The store failed to serve the request.
    #[error("storage error: {0}")]
    Storage(String),
    /// A block that the store promised to have could not be loaded.
    #[error("inconsistent store: missing block {0}")]
    Inconsistent(B256),
}

/// Client trait for fetching block headers.
pub trait HeaderProvider: Send + Sync {
    /// Returns the sealed header of the block with the given hash.
    fn sealed_header(&self, hash: &B256) -> ProviderResult<Option<SealedHeader>>;

    /// Returns the total difficulty accumulated up to and including the given
    /// block, if the block is part of a known ancestry.
    fn total_difficulty(&self, hash: &B256) -> ProviderResult<Option<U256>>;

    /// Returns the header of the highest canonical block.
    fn latest_header(&self) -> ProviderResult<SealedHeader>;
}

/// Client trait for fetching blocks.
pub trait BlockProvider: HeaderProvider {
    /// Returns the block with the given hash, canonical or not.
    fn block_by_hash(&self, hash: &B256) -> ProviderResult<Option<Arc<SealedBlock>>>;

    /// Returns the canonical block at the given height.
    fn block_by_number(&self, number: BlockNumber) -> ProviderResult<Option<Arc<SealedBlock>>>;

    /// Returns the canonical block hash at the given height.
    fn block_hash(&self, number: BlockNumber) -> ProviderResult<Option<B256>>;

    /// Returns the current canonical chain tip.
    fn chain_info(&self) -> ProviderResult<ChainInfo>;
}
