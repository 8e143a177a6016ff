//! Wire types of the Engine API: <https://github.com/ethereum/execution-apis/tree/main/src/engine>
//!
//! Every scalar serializes as `0x`-prefixed hex via the `alloy-primitives`
//! serde implementations.

#![warn(missing_docs, unreachable_pub)]

pub mod engine;

pub use engine::{
    BlobsBundleV1, ExecutionPayload, ExecutionPayloadBodyV1, ExecutionPayloadEnvelopeV2,
    ExecutionPayloadEnvelopeV3, ExecutionPayloadFieldV2, ExecutionPayloadInputV2,
    ExecutionPayloadV1, ExecutionPayloadV2, ExecutionPayloadV3, ForkchoiceState,
    ForkchoiceUpdated, PayloadAttributes, PayloadError, PayloadId, PayloadStatus,
    PayloadStatusEnum, TransitionConfiguration, Withdrawal,
};
