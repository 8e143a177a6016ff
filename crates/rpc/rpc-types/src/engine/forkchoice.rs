use super::PayloadId;
use alloy_primitives::B256;
use serde::{Deserialize, Serialize};

/// The forkchoice state carried by `engine_forkchoiceUpdated`.
///
/// A zero hash means "absent"; a non-zero finalized hash must be accompanied
/// by a non-zero safe hash.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForkchoiceState {
    /// The hash of the desired head block.
    pub head_block_hash: B256,
    /// The hash of the safe block, head or one of its ancestors.
    pub safe_block_hash: B256,
    /// The hash of the finalized block.
    pub finalized_block_hash: B256,
}

/// The outcome of processing a payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayloadStatus {
    /// The validation status.
    #[serde(flatten)]
    pub status: PayloadStatusEnum,
    /// Hash of the most recent valid block in the branch defined by the
    /// payload and its ancestors.
    pub latest_valid_hash: Option<B256>,
}

impl PayloadStatus {
    /// Creates a status with a known latest valid hash.
    pub fn new(status: PayloadStatusEnum, latest_valid_hash: B256) -> Self {
        Self { status, latest_valid_hash: Some(latest_valid_hash) }
    }

    /// Creates a status without a latest valid hash.
    pub fn from_status(status: PayloadStatusEnum) -> Self {
        Self { status, latest_valid_hash: None }
    }

    /// Sets the latest valid hash.
    pub fn with_latest_valid_hash(mut self, hash: Option<B256>) -> Self {
        self.latest_valid_hash = hash;
        self
    }
}

/// The status value of [`PayloadStatus`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PayloadStatusEnum {
    /// The payload extends the canonical chain and was executed successfully.
    Valid,
    /// The payload or one of its ancestors is invalid.
    Invalid {
        /// Diagnostic text for operator logs.
        #[serde(rename = "validationError")]
        validation_error: String,
    },
    /// The node is syncing and cannot judge the payload yet.
    Syncing,
    /// The payload was stored for later processing but not executed.
    Accepted,
    /// The declared block hash does not match the payload contents. Only
    /// `engine_newPayloadV1` exposes this status; V2 and V3 fold it into
    /// `Invalid`.
    InvalidBlockHash {
        /// Diagnostic text for operator logs.
        #[serde(rename = "validationError")]
        validation_error: String,
    },
}

impl PayloadStatusEnum {
    /// Returns `true` for [`PayloadStatusEnum::Valid`].
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    /// Returns `true` for [`PayloadStatusEnum::Syncing`].
    pub fn is_syncing(&self) -> bool {
        matches!(self, Self::Syncing)
    }

    /// Returns `true` for both invalid statuses.
    pub fn is_invalid(&self) -> bool {
        matches!(self, Self::Invalid { .. } | Self::InvalidBlockHash { .. })
    }

    /// The diagnostic text of an invalid status, if any.
    pub fn validation_error(&self) -> Option<&str> {
        match self {
            Self::Invalid { validation_error } | Self::InvalidBlockHash { validation_error } => {
                Some(validation_error)
            }
            _ => None,
        }
    }
}

/// Response object of `engine_forkchoiceUpdated`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForkchoiceUpdated {
    /// Status of the head move. Only `VALID`, `INVALID` and `SYNCING` occur
    /// here.
    pub payload_status: PayloadStatus,
    /// Identifier of the started build job, if attributes were supplied.
    pub payload_id: Option<PayloadId>,
}

impl ForkchoiceUpdated {
    /// Creates a response with the given status and no payload id.
    pub fn from_status(status: PayloadStatusEnum) -> Self {
        Self { payload_status: PayloadStatus::from_status(status), payload_id: None }
    }

    /// Sets the latest valid hash of the payload status.
    pub fn with_latest_valid_hash(mut self, hash: B256) -> Self {
        self.payload_status.latest_valid_hash = Some(hash);
        self
    }

    /// Sets the payload id.
    pub fn with_payload_id(mut self, id: PayloadId) -> Self {
        self.payload_id = Some(id);
        self
    }

    /// Returns `true` if the status is `SYNCING`.
    pub fn is_syncing(&self) -> bool {
        self.payload_status.status.is_syncing()
    }
}
