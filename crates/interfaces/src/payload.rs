//! The pending-block builder contract.

use alloy_primitives::{Address, Bytes, FixedBytes, B256, U256};
use corten_primitives::{PayloadId, SealedBlock, Withdrawals};
use std::sync::Arc;

/// Errors of the payload building process.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PayloadBuilderError {
    /// Thrown when the parent block is missing.
    #[error("missing parent block {0}")]
    MissingParentBlock(B256),
    /// Any other payload building error.
    #[error("payload build failed: {0}")]
    Other(String),
}

/// Everything a builder needs to start a build job on top of a parent.
///
/// The attribute fields map onto the header of the built block: `prev_randao`
/// becomes `mixHash`, the fee recipient becomes `beneficiary`.
#[derive(Debug, Clone)]
pub struct PayloadBuildArguments {
    /// The block to build on.
    pub parent: Arc<SealedBlock>,
    /// Timestamp of the block to build.
    pub timestamp: u64,
    /// Randomness value carried into the header's mix hash.
    pub prev_randao: B256,
    /// Beneficiary of the built block.
    pub suggested_fee_recipient: Address,
    /// Withdrawals to include, post-Shanghai.
    pub withdrawals: Option<Withdrawals>,
    /// Parent beacon block root, post-Cancun.
    pub parent_beacon_block_root: Option<B256>,
}

/// KZG commitments, proofs and blobs of a built block's blob transactions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlobsBundle {
    /// Blob KZG commitments.
    pub commitments: Vec<FixedBytes<48>>,
    /// Blob KZG proofs.
    pub proofs: Vec<FixedBytes<48>>,
    /// The blobs themselves.
    pub blobs: Vec<Bytes>,
}

/// The outcome of a build job.
#[derive(Debug, Clone)]
pub struct BuiltPayload {
    /// The built block.
    pub block: Arc<SealedBlock>,
    /// Fees collected by the block.
    pub fees: U256,
    /// Blob sidecar data of the block's blob transactions.
    pub blobs_bundle: BlobsBundle,
}

/// A type that starts and tracks payload build jobs.
pub trait PayloadJobGenerator: Send + Sync {
    /// Starts a build job, returning its identifier.
    ///
    /// A job for the same parent and attributes may be deduplicated by the
    /// builder, in which case the existing identifier is returned.
    fn start_build(&self, args: PayloadBuildArguments) -> Result<PayloadId, PayloadBuilderError>;

    /// Returns the best payload built so far for the given identifier.
    fn built_payload(&self, id: PayloadId) -> Option<BuiltPayload>;
}
