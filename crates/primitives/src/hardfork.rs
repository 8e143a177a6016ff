use std::fmt;

/// The name of an Ethereum hardfork.
///
/// Only the forks the Engine API handler distinguishes are listed; everything
/// before the merge that does not change engine behaviour is folded into its
/// closest predecessor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Hardfork {
    /// Frontier, the genesis protocol.
    Frontier,
    /// Berlin: typed transactions and access lists (EIP-2718/2930).
    Berlin,
    /// London: EIP-1559 fee market.
    London,
    /// Paris: the merge (EIP-3675), activated by terminal total difficulty.
    Paris,
    /// Shanghai: withdrawals (EIP-4895), activated by timestamp.
    Shanghai,
    /// Cancun: blob transactions (EIP-4844), activated by timestamp.
    Cancun,
}

impl Hardfork {
    /// Returns `true` if this fork is the merge or later.
    pub fn is_post_merge(&self) -> bool {
        *self >= Self::Paris
    }
}

impl fmt::Display for Hardfork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Frontier => "frontier",
            Self::Berlin => "berlin",
            Self::London => "london",
            Self::Paris => "paris",
            Self::Shanghai => "shanghai",
            Self::Cancun => "cancun",
        };
        f.write_str(name)
    }
}
