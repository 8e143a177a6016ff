//! Commonly used types for the corten execution client.
//!
//! Blocks, headers, transactions and withdrawals in their consensus form,
//! plus the chain specification and hardfork schedule the Engine API handler
//! validates against.

#![warn(missing_docs, unreachable_pub)]

mod block;
mod chain_spec;
pub mod constants;
pub mod eip4844;
mod hardfork;
mod header;
pub mod proofs;
mod transaction;
mod withdrawal;

pub use block::{Block, SealedBlock};
pub use chain_spec::{Chain, ChainInfo, ChainSpec, ChainSpecBuilder, MAINNET};
pub use hardfork::Hardfork;
pub use header::{Header, SealedHeader};
pub use transaction::{
    AccessList, AccessListItem, TransactionSigned, TxEip1559, TxEip2930, TxEip4844, TxLegacy,
    TxType,
};
pub use withdrawal::{Withdrawal, Withdrawals};

pub use alloy_primitives::{
    keccak256, Address, BlockHash, BlockNumber, Bloom, Bytes, TxHash, TxKind, B256, B64, U256, U64,
};

/// An 8-byte identifier for a payload build job, assigned by the builder and
/// handed back to the consensus layer.
pub type PayloadId = B64;
