//! The version↔timestamp↔fork matrix of the Engine API.
//!
//! Each method version tolerates exactly one set of fields for a given
//! fork window. Violations are parameter errors, except using a V3 method
//! outside the Cancun window, which is an unsupported-fork error.

use corten_primitives::ChainSpec;

/// The version of an Engine API method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EngineApiMessageVersion {
    /// Version 1, Paris.
    V1,
    /// Version 2, Shanghai.
    V2,
    /// Version 3, Cancun.
    V3,
}

/// A violation of the version matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum EngineObjectValidationError {
    /// The method version does not serve the fork the timestamp falls in.
    #[error("Unsupported fork")]
    UnsupportedFork,
    /// Payloads with Shanghai timestamps must use `newPayloadV2` or later.
    #[error("newPayloadV2 must be used for payloads with Shanghai timestamps")]
    ShanghaiPayloadOnV1,
    /// Payloads with Cancun timestamps must use `newPayloadV3`.
    #[error("newPayloadV3 must be used for payloads with Cancun timestamps")]
    CancunPayloadOnV2,
    /// Withdrawals are not supported in V1 objects.
    #[error("withdrawals not supported in V1")]
    WithdrawalsNotSupportedInV1,
    /// Post-Shanghai objects must carry withdrawals.
    #[error("no withdrawals post-Shanghai")]
    NoWithdrawalsPostShanghai,
    /// Pre-Shanghai objects must not carry withdrawals.
    #[error("withdrawals pre-Shanghai")]
    HasWithdrawalsPreShanghai,
    /// Blob gas fields are not supported before V3.
    #[error("blobGasUsed and excessBlobGas not supported before V3")]
    BlobGasFieldsBeforeV3,
    /// The parent beacon block root is not supported before V3.
    #[error("parentBeaconBlockRoot not supported before V3")]
    ParentBeaconBlockRootNotSupportedBeforeV3,
    /// Post-Cancun objects must carry a parent beacon block root.
    #[error("no parentBeaconBlockRoot post-Cancun")]
    NoParentBeaconBlockRootPostCancun,
}

impl EngineObjectValidationError {
    /// Returns `true` if this violation maps onto the unsupported-fork error
    /// code rather than invalid params.
    pub fn is_unsupported_fork(&self) -> bool {
        matches!(self, Self::UnsupportedFork)
    }
}

/// Validates that the timestamp of a V3 object falls within the Cancun
/// window and that a V2 object is not used for a Cancun payload.
pub(crate) fn validate_payload_timestamp(
    chain_spec: &ChainSpec,
    version: EngineApiMessageVersion,
    timestamp: u64,
) -> Result<(), EngineObjectValidationError> {
    let is_cancun = chain_spec.is_cancun_active_at_timestamp(timestamp);
    if version == EngineApiMessageVersion::V3 && !is_cancun {
        return Err(EngineObjectValidationError::UnsupportedFork);
    }
    if version == EngineApiMessageVersion::V2 && is_cancun {
        return Err(EngineObjectValidationError::CancunPayloadOnV2);
    }
    Ok(())
}

/// Validates the presence of the withdrawals field against the timestamp.
///
/// After Shanghai the field must be present, before Shanghai it must be
/// absent, and V1 objects can never carry it.
pub(crate) fn validate_withdrawals_presence(
    chain_spec: &ChainSpec,
    version: EngineApiMessageVersion,
    timestamp: u64,
    has_withdrawals: bool,
) -> Result<(), EngineObjectValidationError> {
    let is_shanghai = chain_spec.is_shanghai_active_at_timestamp(timestamp);

    match version {
        EngineApiMessageVersion::V1 => {
            if has_withdrawals {
                return Err(EngineObjectValidationError::WithdrawalsNotSupportedInV1);
            }
        }
        EngineApiMessageVersion::V2 | EngineApiMessageVersion::V3 => {
            if is_shanghai && !has_withdrawals {
                return Err(EngineObjectValidationError::NoWithdrawalsPostShanghai);
            }
            if !is_shanghai && has_withdrawals {
                return Err(EngineObjectValidationError::HasWithdrawalsPreShanghai);
            }
        }
    }

    Ok(())
}

/// Validates the presence of the parent beacon block root against the
/// timestamp: required from V3 on, forbidden before.
pub(crate) fn validate_parent_beacon_block_root_presence(
    chain_spec: &ChainSpec,
    version: EngineApiMessageVersion,
    timestamp: u64,
    has_parent_beacon_block_root: bool,
) -> Result<(), EngineObjectValidationError> {
    match version {
        EngineApiMessageVersion::V1 | EngineApiMessageVersion::V2 => {
            if has_parent_beacon_block_root {
                return Err(
                    EngineObjectValidationError::ParentBeaconBlockRootNotSupportedBeforeV3,
                );
            }
        }
        EngineApiMessageVersion::V3 => {
            if !has_parent_beacon_block_root {
                return Err(EngineObjectValidationError::NoParentBeaconBlockRootPostCancun);
            }
        }
    }

    validate_payload_timestamp(chain_spec, version, timestamp)
}

/// Validates the fork-gated fields of payload attributes for the given
/// method version.
pub(crate) fn validate_attributes_version(
    chain_spec: &ChainSpec,
    version: EngineApiMessageVersion,
    timestamp: u64,
    has_withdrawals: bool,
    has_parent_beacon_block_root: bool,
) -> Result<(), EngineObjectValidationError> {
    validate_withdrawals_presence(chain_spec, version, timestamp, has_withdrawals)?;
    validate_parent_beacon_block_root_presence(
        chain_spec,
        version,
        timestamp,
        has_parent_beacon_block_root,
    )
}
