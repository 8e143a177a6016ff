use crate::version::EngineObjectValidationError;
use alloy_primitives::U256;
use corten_interfaces::{BlockExecutionError, PayloadBuilderError, ProviderError};

/// The Engine API result type.
pub type EngineApiResult<T> = Result<T, EngineApiError>;

/// `Invalid params` JSON-RPC error code.
pub const INVALID_PARAMS_CODE: i32 = -32602;
/// `Internal error` JSON-RPC error code.
pub const INTERNAL_ERROR_CODE: i32 = -32603;
/// `Unknown payload` Engine API error code.
pub const UNKNOWN_PAYLOAD_CODE: i32 = -32001;
/// `Too large request` Engine API error code.
pub const REQUEST_TOO_LARGE_CODE: i32 = -38004;
/// `Unsupported fork` Engine API error code.
pub const UNSUPPORTED_FORK_CODE: i32 = -38005;

/// Error returned by the Engine API.
///
/// These are caller-misuse and infrastructure failures; validation outcomes
/// are *not* errors, they travel back as
/// [`PayloadStatus`](corten_rpc_types::PayloadStatus) values.
#[derive(Debug, thiserror::Error)]
pub enum EngineApiError {
    /// The payload build job is unknown. Consensus clients key on this exact
    /// code, so it is never folded into a generic internal error.
    #[error("Unknown payload")]
    UnknownPayload,
    /// A `getPayloadBodies` request named more entries than the protocol cap.
    #[error("requested count too large: {len}")]
    PayloadRequestTooLarge {
        /// Number of entries requested.
        len: u64,
    },
    /// A `getPayloadBodiesByRange` request with a zero start or count.
    #[error("invalid start ({start}) or count ({count})")]
    InvalidBodiesRange {
        /// Requested start block.
        start: u64,
        /// Requested count.
        count: u64,
    },
    /// A non-zero finalized hash arrived without a safe hash.
    #[error("finalized block hash set without a safe block hash")]
    FinalizedWithoutSafe,
    /// The safe block of a forkchoice update could not be resolved.
    #[error("safe block not available")]
    UnknownSafeBlock,
    /// The finalized block of a forkchoice update could not be resolved.
    #[error("finalized block not available")]
    UnknownFinalizedBlock,
    /// Payload attributes do not advance past the head block's timestamp.
    #[error("invalid timestamp in payloadAttributes, got {got}, need at least {need}")]
    InvalidPayloadAttributesTimestamp {
        /// The attribute timestamp.
        got: u64,
        /// The minimum acceptable timestamp.
        need: u64,
    },
    /// A version-matrix violation.
    #[error(transparent)]
    EngineObjectValidation(#[from] EngineObjectValidationError),
    /// The terminal total difficulty announced by the consensus layer does
    /// not match ours.
    #[error("invalid terminal total difficulty, execution: {execution}, consensus: {consensus}")]
    TerminalTotalDifficulty {
        /// Locally configured value.
        execution: U256,
        /// Value announced by the consensus layer.
        consensus: U256,
    },
    /// The merge terminal total difficulty is not configured for this chain.
    #[error("terminal total difficulty is not configured")]
    UnknownTerminalTotalDifficulty,
    /// The canonical head could not be moved to the requested block.
    #[error("{0}")]
    ForkchoiceUpdate(String),
    /// Re-execution of a built payload failed.
    #[error("failed to execute built payload: {0}")]
    BuiltPayloadExecution(#[source] BlockExecutionError),
    /// The execution layer failed to serve a request.
    #[error(transparent)]
    Execution(#[from] BlockExecutionError),
    /// The payload builder failed to start a job.
    #[error(transparent)]
    PayloadBuilder(#[from] PayloadBuilderError),
    /// The underlying store failed.
    #[error(transparent)]
    Provider(#[from] ProviderError),
    /// The engine task is gone.
    #[error("engine channel closed")]
    ChannelClosed,
}

impl EngineApiError {
    /// The JSON-RPC error code this error surfaces as.
    pub fn code(&self) -> i32 {
        match self {
            Self::UnknownPayload => UNKNOWN_PAYLOAD_CODE,
            Self::PayloadRequestTooLarge { .. } => REQUEST_TOO_LARGE_CODE,
            Self::EngineObjectValidation(err) if err.is_unsupported_fork() => {
                UNSUPPORTED_FORK_CODE
            }
            Self::InvalidBodiesRange { .. } |
            Self::FinalizedWithoutSafe |
            Self::UnknownSafeBlock |
            Self::UnknownFinalizedBlock |
            Self::InvalidPayloadAttributesTimestamp { .. } |
            Self::EngineObjectValidation(_) |
            Self::TerminalTotalDifficulty { .. } |
            Self::ForkchoiceUpdate(_) => INVALID_PARAMS_CODE,
            Self::UnknownTerminalTotalDifficulty |
            Self::BuiltPayloadExecution(_) |
            Self::Execution(_) |
            Self::PayloadBuilder(_) |
            Self::Provider(_) |
            Self::ChannelClosed => INTERNAL_ERROR_CODE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::EngineObjectValidationError;

    #[test]
    fn error_codes() {
        assert_eq!(EngineApiError::UnknownPayload.code(), -32001);
        assert_eq!(EngineApiError::PayloadRequestTooLarge { len: 33 }.code(), -38004);
        assert_eq!(EngineApiError::FinalizedWithoutSafe.code(), -32602);
        assert_eq!(EngineApiError::UnknownTerminalTotalDifficulty.code(), -32603);
        assert_eq!(
            EngineApiError::EngineObjectValidation(
                EngineObjectValidationError::UnsupportedFork
            )
            .code(),
            -38005
        );
        assert_eq!(
            EngineApiError::EngineObjectValidation(
                EngineObjectValidationError::WithdrawalsNotSupportedInV1
            )
            .code(),
            -32602
        );
    }
}
