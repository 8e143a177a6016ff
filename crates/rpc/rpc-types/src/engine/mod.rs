//! Engine API object types.

mod forkchoice;
mod payload;
mod transition;

pub use forkchoice::{ForkchoiceState, ForkchoiceUpdated, PayloadStatus, PayloadStatusEnum};
pub use payload::{
    BlobsBundleV1, ExecutionPayload, ExecutionPayloadBodyV1, ExecutionPayloadEnvelopeV2,
    ExecutionPayloadEnvelopeV3, ExecutionPayloadFieldV2, ExecutionPayloadInputV2,
    ExecutionPayloadV1, ExecutionPayloadV2, ExecutionPayloadV3, PayloadAttributes, PayloadError,
    Withdrawal,
};
pub use transition::TransitionConfiguration;

/// An 8-byte identifier of a payload build job.
pub type PayloadId = alloy_primitives::B64;
