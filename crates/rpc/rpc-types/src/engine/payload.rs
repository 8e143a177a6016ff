use alloy_primitives::{Address, Bloom, Bytes, FixedBytes, B256, U256, U64};
use serde::{Deserialize, Serialize};

/// A withdrawal as it appears on the Engine API wire.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Withdrawal {
    /// Monotonically increasing identifier issued by the consensus layer.
    pub index: U64,
    /// Index of the validator associated with the withdrawal.
    pub validator_index: U64,
    /// Target address for the withdrawn ether.
    pub address: Address,
    /// Value of the withdrawal in gwei.
    pub amount: U64,
}

/// The execution payload body of `engine_newPayloadV1`, the Paris shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionPayloadV1 {
    /// Hash of the parent block.
    pub parent_hash: B256,
    /// The beneficiary of the block's fees.
    pub fee_recipient: Address,
    /// The post-execution state root.
    pub state_root: B256,
    /// The receipts commitment.
    pub receipts_root: B256,
    /// The logs bloom of the block.
    pub logs_bloom: Bloom,
    /// The RANDAO mix carried in the header's mix hash.
    pub prev_randao: B256,
    /// The block number.
    pub block_number: U64,
    /// The block gas limit.
    pub gas_limit: U64,
    /// Gas consumed by the block.
    pub gas_used: U64,
    /// The block timestamp.
    pub timestamp: U64,
    /// Arbitrary extra data, at most 32 bytes.
    pub extra_data: Bytes,
    /// The EIP-1559 base fee.
    pub base_fee_per_gas: U256,
    /// The declared hash of this block.
    pub block_hash: B256,
    /// The block's transactions in envelope encoding.
    pub transactions: Vec<Bytes>,
}

/// The execution payload of `engine_newPayloadV2`: Shanghai adds withdrawals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionPayloadV2 {
    /// Inner V1 payload.
    #[serde(flatten)]
    pub payload_inner: ExecutionPayloadV1,
    /// The block's withdrawals.
    pub withdrawals: Vec<Withdrawal>,
}

/// The execution payload of `engine_newPayloadV3`: Cancun adds blob gas
/// accounting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionPayloadV3 {
    /// Inner V2 payload.
    #[serde(flatten)]
    pub payload_inner: ExecutionPayloadV2,
    /// Blob gas consumed by the block.
    pub blob_gas_used: U64,
    /// Running excess of blob gas prior to this block.
    pub excess_blob_gas: U64,
}

/// The parameter object accepted by `engine_newPayloadV2`.
///
/// V2 takes either the V1 or the V2 shape; the union is modelled by making
/// the post-Paris fields optional. The blob-gas fields only exist so their
/// presence can be rejected: V2 never accepts them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionPayloadInputV2 {
    /// The common V1 fields.
    #[serde(flatten)]
    pub execution_payload: ExecutionPayloadV1,
    /// Withdrawals, present iff the payload has the V2 shape.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub withdrawals: Option<Vec<Withdrawal>>,
    /// Forbidden V3 field, carried only to be rejected when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blob_gas_used: Option<U64>,
    /// Forbidden V3 field, carried only to be rejected when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excess_blob_gas: Option<U64>,
}

impl ExecutionPayloadInputV2 {
    /// Returns `true` if either forbidden blob-gas field is present.
    pub fn has_blob_gas_fields(&self) -> bool {
        self.blob_gas_used.is_some() || self.excess_blob_gas.is_some()
    }

    /// Resolves the union into a tagged payload, discriminated by the
    /// presence of withdrawals.
    pub fn into_payload(self) -> ExecutionPayload {
        match self.withdrawals {
            Some(withdrawals) => ExecutionPayload::V2(ExecutionPayloadV2 {
                payload_inner: self.execution_payload,
                withdrawals,
            }),
            None => ExecutionPayload::V1(self.execution_payload),
        }
    }
}

/// An execution payload of any supported version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionPayload {
    /// V1 payload.
    V1(ExecutionPayloadV1),
    /// V2 payload.
    V2(ExecutionPayloadV2),
    /// V3 payload.
    V3(ExecutionPayloadV3),
}

impl ExecutionPayload {
    /// The common V1 view of the payload.
    pub fn as_v1(&self) -> &ExecutionPayloadV1 {
        match self {
            Self::V1(payload) => payload,
            Self::V2(payload) => &payload.payload_inner,
            Self::V3(payload) => &payload.payload_inner.payload_inner,
        }
    }

    /// The declared block hash.
    pub fn block_hash(&self) -> B256 {
        self.as_v1().block_hash
    }

    /// The parent block hash.
    pub fn parent_hash(&self) -> B256 {
        self.as_v1().parent_hash
    }

    /// The block number.
    pub fn block_number(&self) -> u64 {
        self.as_v1().block_number.to::<u64>()
    }

    /// The block timestamp.
    pub fn timestamp(&self) -> u64 {
        self.as_v1().timestamp.to::<u64>()
    }

    /// Gas consumed by the block.
    pub fn gas_used(&self) -> u64 {
        self.as_v1().gas_used.to::<u64>()
    }

    /// The payload's withdrawals, present from V2 on.
    pub fn withdrawals(&self) -> Option<&Vec<Withdrawal>> {
        match self {
            Self::V1(_) => None,
            Self::V2(payload) => Some(&payload.withdrawals),
            Self::V3(payload) => Some(&payload.payload_inner.withdrawals),
        }
    }
}

impl From<ExecutionPayloadV1> for ExecutionPayload {
    fn from(payload: ExecutionPayloadV1) -> Self {
        Self::V1(payload)
    }
}

impl From<ExecutionPayloadV2> for ExecutionPayload {
    fn from(payload: ExecutionPayloadV2) -> Self {
        Self::V2(payload)
    }
}

impl From<ExecutionPayloadV3> for ExecutionPayload {
    fn from(payload: ExecutionPayloadV3) -> Self {
        Self::V3(payload)
    }
}

/// The `executionPayload` field of a `engine_getPayloadV2` response: V1 or V2
/// shape, discriminated by withdrawals presence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExecutionPayloadFieldV2 {
    /// V2 shape.
    V2(ExecutionPayloadV2),
    /// V1 shape.
    V1(ExecutionPayloadV1),
}

/// Response object of `engine_getPayloadV2`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionPayloadEnvelopeV2 {
    /// The built payload.
    pub execution_payload: ExecutionPayloadFieldV2,
    /// The expected value of the block, in wei.
    pub block_value: U256,
}

/// Response object of `engine_getPayloadV3`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionPayloadEnvelopeV3 {
    /// The built payload.
    pub execution_payload: ExecutionPayloadV3,
    /// The expected value of the block, in wei.
    pub block_value: U256,
    /// Blob sidecar data of the block's blob transactions.
    pub blobs_bundle: BlobsBundleV1,
    /// Hint that the local payload should be preferred over a builder one.
    pub should_override_builder: bool,
}

/// KZG commitments, proofs and blobs of a built block, as returned by
/// `engine_getPayloadV3`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlobsBundleV1 {
    /// Blob KZG commitments.
    pub commitments: Vec<FixedBytes<48>>,
    /// Blob KZG proofs.
    pub proofs: Vec<FixedBytes<48>>,
    /// The blobs themselves.
    pub blobs: Vec<Bytes>,
}

/// A block body as returned by the `engine_getPayloadBodies` methods.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionPayloadBodyV1 {
    /// The block's transactions in envelope encoding.
    pub transactions: Vec<Bytes>,
    /// The block's withdrawals; `null` for pre-Shanghai blocks.
    pub withdrawals: Option<Vec<Withdrawal>>,
}

/// The build directive optionally carried by a forkchoice update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayloadAttributes {
    /// Timestamp of the block to build.
    pub timestamp: U64,
    /// Randomness value for the built block's mix hash.
    pub prev_randao: B256,
    /// Beneficiary of the built block.
    pub suggested_fee_recipient: Address,
    /// Withdrawals to include; required from V2 on, forbidden before.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub withdrawals: Option<Vec<Withdrawal>>,
    /// Parent beacon block root; required from V3 on, forbidden before.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_beacon_block_root: Option<B256>,
}

/// Structural failures while turning a payload into a block.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PayloadError {
    /// Invalid payload extra data.
    #[error("invalid payload extra data: {0}")]
    ExtraData(Bytes),
    /// Invalid payload base fee.
    #[error("invalid payload base fee: {0}")]
    BaseFee(U256),
    /// The declared block hash does not match the assembled header.
    #[error("block hash mismatch: execution {execution}, consensus {consensus}")]
    BlockHash {
        /// The hash of the locally assembled header.
        execution: B256,
        /// The hash declared by the consensus layer.
        consensus: B256,
    },
    /// A transaction failed to decode.
    #[error(transparent)]
    Decode(#[from] alloy_rlp::Error),
}

impl PayloadError {
    /// Returns `true` for the declared-hash mismatch, the one structural
    /// failure `engine_newPayloadV1` reports as `INVALID_BLOCK_HASH`.
    pub fn is_block_hash_mismatch(&self) -> bool {
        matches!(self, Self::BlockHash { .. })
    }
}
