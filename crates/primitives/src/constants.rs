//! Ethereum protocol-related constants.

use alloy_primitives::{b256, B256};

/// Multiplier for converting gwei to wei.
pub const GWEI_TO_WEI: u64 = 1_000_000_000;

/// Maximum size of the `extraData` field of a block header, in bytes.
pub const MAXIMUM_EXTRA_DATA_SIZE: usize = 32;

/// Keccak hash of an RLP-encoded empty list.
///
/// This is the commitment an empty ommers, transactions or withdrawals list
/// resolves to.
pub const EMPTY_LIST_HASH: B256 =
    b256!("1dcc4de8dec75d7aab85b567b6ccd41ad312451b948a7413f0a142fd40d49347");

/// Ommers hash of a block without ommers. Payload-derived blocks always carry
/// this value.
pub const EMPTY_OMMER_ROOT_HASH: B256 = EMPTY_LIST_HASH;
