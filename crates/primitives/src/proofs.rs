//! Commitments over the list-shaped parts of a block.
//!
//! A commitment is the keccak hash of the RLP encoding of the ordered list.
//! Producers (test generators, the payload builder) and consumers (payload
//! assembly) share these functions, so a block round-trips through its wire
//! form without drift.

use crate::{Header, TransactionSigned, Withdrawal};
use alloy_primitives::{keccak256, B256};
use alloy_rlp::Encodable;

fn ordered_list_hash<T: Encodable>(items: &[T]) -> B256 {
    let mut buf = Vec::new();
    alloy_rlp::encode_list::<T, T>(items, &mut buf);
    keccak256(&buf)
}

/// Commitment to an ordered list of transactions, in envelope form.
pub fn calculate_transaction_root(transactions: &[TransactionSigned]) -> B256 {
    let raw: Vec<_> = transactions.iter().map(TransactionSigned::envelope_encoded).collect();
    ordered_list_hash(&raw)
}

/// Commitment to an ordered list of withdrawals.
pub fn calculate_withdrawals_root(withdrawals: &[Withdrawal]) -> B256 {
    ordered_list_hash(withdrawals)
}

/// Commitment to an ordered list of ommer headers.
pub fn calculate_ommers_root(ommers: &[Header]) -> B256 {
    ordered_list_hash(ommers)
}
