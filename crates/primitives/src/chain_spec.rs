use crate::Hardfork;
use alloy_primitives::{b256, BlockHash, BlockNumber, B256, U256};
use once_cell::sync::Lazy;

/// The Ethereum mainnet spec.
pub static MAINNET: Lazy<ChainSpec> = Lazy::new(|| ChainSpec {
    chain: Chain::mainnet(),
    genesis_hash: b256!("d4e56740f876aef8c010b86a40d5f56745a118d0906a34e69aec8c0db1cb8fa3"),
    paris_block: Some(15537394),
    paris_ttd: Some(U256::from(58750000000000000000000_u128)),
    shanghai_time: Some(1681338455),
    cancun_time: Some(1710338135),
});

/// An Ethereum chain identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Chain(u64);

impl Chain {
    /// Returns the mainnet chain.
    pub const fn mainnet() -> Self {
        Self(1)
    }

    /// Returns a development chain.
    pub const fn dev() -> Self {
        Self(1337)
    }

    /// The numeric chain id.
    pub const fn id(&self) -> u64 {
        self.0
    }
}

/// Current status of the canonical chain, as reported by the block store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainInfo {
    /// The hash of the highest canonical block.
    pub best_hash: BlockHash,
    /// The number of the highest canonical block.
    pub best_number: BlockNumber,
}

/// The chain specification: activation schedule of the forks the engine
/// distinguishes, pivoting on the Paris terminal total difficulty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainSpec {
    chain: Chain,
    genesis_hash: B256,
    paris_block: Option<u64>,
    paris_ttd: Option<U256>,
    shanghai_time: Option<u64>,
    cancun_time: Option<u64>,
}

impl ChainSpec {
    /// Returns the chain id.
    pub fn chain(&self) -> Chain {
        self.chain
    }

    /// Returns the chain genesis hash.
    pub fn genesis_hash(&self) -> B256 {
        self.genesis_hash
    }

    /// The merge terminal total difficulty, if the merge is scheduled.
    pub fn terminal_total_difficulty(&self) -> Option<U256> {
        self.paris_ttd
    }

    /// The block number the merge activated at, once known.
    pub fn paris_block(&self) -> Option<u64> {
        self.paris_block
    }

    /// Returns `true` if Shanghai is active at the given timestamp.
    pub fn is_shanghai_active_at_timestamp(&self, timestamp: u64) -> bool {
        self.shanghai_time.map(|time| time <= timestamp).unwrap_or(false)
    }

    /// Returns `true` if Cancun is active at the given timestamp.
    pub fn is_cancun_active_at_timestamp(&self, timestamp: u64) -> bool {
        self.cancun_time.map(|time| time <= timestamp).unwrap_or(false)
    }

    /// Resolves the hardfork a block belongs to.
    ///
    /// Timestamp-scheduled forks take precedence; otherwise the merge pivot
    /// decides: a chain total difficulty at or above the terminal total
    /// difficulty (or a block at/after the known Paris block) is Paris,
    /// everything else is pre-merge.
    pub fn hardfork_at(
        &self,
        number: u64,
        total_difficulty: Option<U256>,
        timestamp: u64,
    ) -> Hardfork {
        if self.is_cancun_active_at_timestamp(timestamp) {
            return Hardfork::Cancun;
        }
        if self.is_shanghai_active_at_timestamp(timestamp) {
            return Hardfork::Shanghai;
        }
        let merged = match (total_difficulty, self.paris_ttd) {
            (Some(td), Some(ttd)) => td >= ttd,
            _ => self.paris_block.map(|block| block <= number).unwrap_or(false),
        };
        if merged {
            Hardfork::Paris
        } else {
            Hardfork::London
        }
    }
}

/// A helper to build custom chain specs, mainly for tests.
#[derive(Debug, Clone, Default)]
pub struct ChainSpecBuilder {
    chain: Option<Chain>,
    genesis_hash: Option<B256>,
    paris_block: Option<u64>,
    paris_ttd: Option<U256>,
    shanghai_time: Option<u64>,
    cancun_time: Option<u64>,
}

impl ChainSpecBuilder {
    /// Seeds the builder from the mainnet spec.
    pub fn mainnet() -> Self {
        Self {
            chain: Some(MAINNET.chain),
            genesis_hash: Some(MAINNET.genesis_hash),
            paris_block: MAINNET.paris_block,
            paris_ttd: MAINNET.paris_ttd,
            shanghai_time: MAINNET.shanghai_time,
            cancun_time: MAINNET.cancun_time,
        }
    }

    /// Marks the chain as merged from genesis.
    pub fn paris_activated(mut self) -> Self {
        self.paris_block = Some(0);
        self.paris_ttd = Some(U256::ZERO);
        self
    }

    /// Activates Shanghai (and the merge) from genesis.
    pub fn shanghai_activated(mut self) -> Self {
        self = self.paris_activated();
        self.shanghai_time = Some(0);
        self
    }

    /// Activates Cancun (and everything before it) from genesis.
    pub fn cancun_activated(mut self) -> Self {
        self = self.shanghai_activated();
        self.cancun_time = Some(0);
        self
    }

    /// Sets the terminal total difficulty.
    pub fn with_terminal_total_difficulty(mut self, ttd: U256) -> Self {
        self.paris_ttd = Some(ttd);
        self
    }

    /// Schedules Shanghai at the given timestamp.
    pub fn with_shanghai_time(mut self, time: u64) -> Self {
        self.shanghai_time = Some(time);
        self
    }

    /// Schedules Cancun at the given timestamp.
    pub fn with_cancun_time(mut self, time: u64) -> Self {
        self.cancun_time = Some(time);
        self
    }

    /// Builds the spec.
    pub fn build(self) -> ChainSpec {
        ChainSpec {
            chain: self.chain.unwrap_or(Chain::dev()),
            genesis_hash: self.genesis_hash.unwrap_or_default(),
            paris_block: self.paris_block,
            paris_ttd: self.paris_ttd,
            shanghai_time: self.shanghai_time,
            cancun_time: self.cancun_time,
        }
    }
}
