//! EIP-4844 blob gas accounting and consensus checks.

use crate::{Header, SealedBlock};

/// Gas consumed per blob.
pub const DATA_GAS_PER_BLOB: u64 = 131_072;

/// Target blob gas per block (three blobs).
pub const TARGET_DATA_GAS_PER_BLOCK: u64 = 393_216;

/// Maximum blob gas per block (six blobs).
pub const MAX_DATA_GAS_PER_BLOCK: u64 = 786_432;

/// Version byte of a KZG versioned hash.
pub const VERSIONED_HASH_VERSION_KZG: u8 = 0x01;

/// Blob-level consensus violations of a block against its parent.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BlobGasError {
    /// A blob transaction carries a versioned hash with an unknown version byte.
    #[error("versioned hash with unknown version {version}")]
    InvalidVersionedHashVersion {
        /// The offending version byte.
        version: u8,
    },
    /// The block consumes more blob gas than the protocol maximum.
    #[error("blob gas used {blob_gas_used} exceeds maximum of {max}")]
    ExcessiveBlobGas {
        /// Blob gas consumed by the block's transactions.
        blob_gas_used: u64,
        /// The protocol maximum.
        max: u64,
    },
    /// The header's `blobGasUsed` does not match the transactions.
    #[error("blob gas used mismatch: header {header}, transactions {transactions}")]
    BlobGasUsedMismatch {
        /// Value declared in the header.
        header: u64,
        /// Value derived from the block's blob transactions.
        transactions: u64,
    },
    /// The header's `excessBlobGas` does not follow from the parent.
    #[error("excess blob gas mismatch: header {header}, expected {expected}")]
    ExcessBlobGasMismatch {
        /// Value declared in the header.
        header: u64,
        /// Value derived from the parent header.
        expected: u64,
    },
    /// A post-Cancun header is missing its blob gas fields.
    #[error("missing blob gas fields in header")]
    MissingBlobGasFields,
}

/// Computes the `excessBlobGas` of a block from its parent header fields.
pub fn calculate_excess_blob_gas(parent_excess_blob_gas: u64, parent_blob_gas_used: u64) -> u64 {
    (parent_excess_blob_gas + parent_blob_gas_used).saturating_sub(TARGET_DATA_GAS_PER_BLOCK)
}

/// Validates a block's blob transactions and blob gas fields against its
/// parent header.
pub fn validate_blob_transactions(block: &SealedBlock, parent: &Header) -> Result<(), BlobGasError> {
    let mut blob_gas_used = 0;
    for tx in block.body.iter() {
        if let Some(hashes) = tx.blob_versioned_hashes() {
            for hash in hashes {
                if hash[0] != VERSIONED_HASH_VERSION_KZG {
                    return Err(BlobGasError::InvalidVersionedHashVersion { version: hash[0] });
                }
            }
        }
        blob_gas_used += tx.blob_gas_used().unwrap_or(0);
    }

    if blob_gas_used > MAX_DATA_GAS_PER_BLOCK {
        return Err(BlobGasError::ExcessiveBlobGas {
            blob_gas_used,
            max: MAX_DATA_GAS_PER_BLOCK,
        });
    }

    let (header_blob_gas_used, header_excess_blob_gas) =
        match (block.header().blob_gas_used, block.header().excess_blob_gas) {
            (Some(used), Some(excess)) => (used, excess),
            _ => return Err(BlobGasError::MissingBlobGasFields),
        };

    if header_blob_gas_used != blob_gas_used {
        return Err(BlobGasError::BlobGasUsedMismatch {
            header: header_blob_gas_used,
            transactions: blob_gas_used,
        });
    }

    let expected = calculate_excess_blob_gas(
        parent.excess_blob_gas.unwrap_or(0),
        parent.blob_gas_used.unwrap_or(0),
    );
    if header_excess_blob_gas != expected {
        return Err(BlobGasError::ExcessBlobGasMismatch {
            header: header_excess_blob_gas,
            expected,
        });
    }

    Ok(())
}
