use crate::{Header, SealedHeader, TransactionSigned, Withdrawals};
use alloy_primitives::{BlockHash, BlockNumber, Bytes, B256};
use std::ops::Deref;

/// An Ethereum block: header plus body parts.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Block {
    /// Block header.
    pub header: Header,
    /// Transactions in this block.
    pub body: Vec<TransactionSigned>,
    /// Ommer headers. Empty for every post-merge block.
    pub ommers: Vec<Header>,
    /// Withdrawals in the block, post-Shanghai.
    pub withdrawals: Option<Withdrawals>,
}

impl Block {
    /// Seals the block, memoizing the header hash.
    pub fn seal_slow(self) -> SealedBlock {
        SealedBlock {
            header: self.header.seal_slow(),
            body: self.body,
            ommers: self.ommers,
            withdrawals: self.withdrawals,
        }
    }
}

/// A block with its memoized header hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedBlock {
    /// Sealed block header.
    pub header: SealedHeader,
    /// Transactions in this block.
    pub body: Vec<TransactionSigned>,
    /// Ommer headers.
    pub ommers: Vec<Header>,
    /// Withdrawals in the block, post-Shanghai.
    pub withdrawals: Option<Withdrawals>,
}

impl SealedBlock {
    /// The memoized block hash.
    pub fn hash(&self) -> BlockHash {
        self.header.hash()
    }

    /// The block number.
    pub fn number(&self) -> BlockNumber {
        self.header.number
    }

    /// The parent block hash.
    pub fn parent_hash(&self) -> B256 {
        self.header.parent_hash
    }

    /// Returns a reference to the sealed header.
    pub fn header(&self) -> &SealedHeader {
        &self.header
    }

    /// Unseals the block.
    pub fn unseal(self) -> Block {
        Block {
            header: self.header.unseal(),
            body: self.body,
            ommers: self.ommers,
            withdrawals: self.withdrawals,
        }
    }

    /// The transactions of this block in their network envelope encoding.
    pub fn raw_transactions(&self) -> Vec<Bytes> {
        self.body.iter().map(TransactionSigned::envelope_encoded).collect()
    }

    /// Flattens the versioned hashes of all blob transactions, in
    /// transaction order.
    pub fn blob_versioned_hashes(&self) -> Vec<B256> {
        self.body
            .iter()
            .filter_map(TransactionSigned::blob_versioned_hashes)
            .flatten()
            .copied()
            .collect()
    }
}

impl Deref for SealedBlock {
    type Target = SealedHeader;

    fn deref(&self) -> &Self::Target {
        &self.header
    }
}
