use crate::constants::GWEI_TO_WEI;
use alloy_primitives::Address;
use alloy_rlp::{RlpDecodable, RlpDecodableWrapper, RlpEncodable, RlpEncodableWrapper};
use std::ops::{Deref, DerefMut};

/// Withdrawal represents a validator withdrawal from the consensus layer.
#[derive(Debug, Clone, PartialEq, Eq, Default, Hash, RlpEncodable, RlpDecodable)]
pub struct Withdrawal {
    /// Monotonically increasing identifier issued by the consensus layer.
    pub index: u64,
    /// Index of the validator associated with the withdrawal.
    pub validator_index: u64,
    /// Target address for the withdrawn ether.
    pub address: Address,
    /// Value of the withdrawal in gwei.
    pub amount: u64,
}

impl Withdrawal {
    /// Return the withdrawal amount in wei.
    pub fn amount_wei(&self) -> u128 {
        self.amount as u128 * GWEI_TO_WEI as u128
    }
}

/// A collection of withdrawals carried by a post-Shanghai block.
#[derive(
    Debug, Clone, PartialEq, Eq, Default, Hash, RlpEncodableWrapper, RlpDecodableWrapper,
)]
pub struct Withdrawals(pub Vec<Withdrawal>);

impl Withdrawals {
    /// Create a new withdrawals collection.
    pub fn new(withdrawals: Vec<Withdrawal>) -> Self {
        Self(withdrawals)
    }

    /// Consumes the wrapper, returning the inner withdrawals.
    pub fn into_inner(self) -> Vec<Withdrawal> {
        self.0
    }
}

impl Deref for Withdrawals {
    type Target = Vec<Withdrawal>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for Withdrawals {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl IntoIterator for Withdrawals {
    type Item = Withdrawal;
    type IntoIter = std::vec::IntoIter<Withdrawal>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
