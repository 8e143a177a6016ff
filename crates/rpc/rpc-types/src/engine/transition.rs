use alloy_primitives::{B256, U256, U64};
use serde::{Deserialize, Serialize};

/// Parameter and response object of `engine_exchangeTransitionConfigurationV1`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionConfiguration {
    /// Maps on the `TERMINAL_TOTAL_DIFFICULTY` parameter of EIP-3675.
    pub terminal_total_difficulty: U256,
    /// Maps on the `TERMINAL_BLOCK_HASH` parameter of EIP-3675.
    pub terminal_block_hash: B256,
    /// Maps on the `TERMINAL_BLOCK_NUMBER` parameter of EIP-3675.
    pub terminal_block_number: U64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transition_configuration_roundtrip() {
        let config = TransitionConfiguration {
            terminal_total_difficulty: U256::from(58750000000000000000000u128),
            terminal_block_hash: B256::repeat_byte(0x10),
            terminal_block_number: U64::from(15537393u64),
        };
        let json = serde_json::to_value(config).unwrap();
        assert_eq!(json["terminalTotalDifficulty"], "0xc70d808a128d7380000");
        let roundtripped: TransitionConfiguration = serde_json::from_value(json).unwrap();
        assert_eq!(roundtripped, config);
    }
}
