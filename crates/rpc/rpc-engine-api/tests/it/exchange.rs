//! Capability and transition-configuration exchanges.

use crate::setup::*;
use alloy_primitives::{B256, U256, U64};
use assert_matches::assert_matches;
use corten_primitives::ChainSpecBuilder;
use corten_rpc_engine_api::{EngineApiError, CAPABILITIES};
use corten_rpc_types::TransitionConfiguration;

#[tokio::test]
async fn capabilities_list_the_served_methods() {
    let ctx = spawn_engine(post_merge_spec());

    let capabilities =
        ctx.handle.exchange_capabilities(vec!["engine_newPayloadV1".to_string()]).await.unwrap();
    let mut expected: Vec<_> = CAPABILITIES.iter().map(|cap| cap.to_string()).collect();
    expected.sort_unstable();
    assert_eq!(capabilities, expected);
    assert!(!capabilities.iter().any(|cap| cap.contains("exchangeCapabilities")));
}

#[tokio::test]
async fn transition_configuration_echoes_on_matching_ttd() {
    let spec = ChainSpecBuilder::default()
        .paris_activated()
        .with_terminal_total_difficulty(U256::from(5_000u64))
        .build();
    let ctx = spawn_engine(spec);

    let config = TransitionConfiguration {
        terminal_total_difficulty: U256::from(5_000u64),
        terminal_block_hash: B256::repeat_byte(0x42),
        terminal_block_number: U64::from(77u64),
    };
    // Terminal block hash and number are echoed unchecked.
    let echoed = ctx.handle.exchange_transition_configuration(config).await.unwrap();
    assert_eq!(echoed, config);
}

#[tokio::test]
async fn transition_configuration_rejects_ttd_mismatch() {
    let spec = ChainSpecBuilder::default()
        .paris_activated()
        .with_terminal_total_difficulty(U256::from(5_000u64))
        .build();
    let ctx = spawn_engine(spec);

    let config = TransitionConfiguration {
        terminal_total_difficulty: U256::from(4_999u64),
        ..Default::default()
    };
    let error = ctx.handle.exchange_transition_configuration(config).await.unwrap_err();
    assert_matches!(
        error,
        EngineApiError::TerminalTotalDifficulty { execution, consensus }
            if execution == U256::from(5_000u64) && consensus == U256::from(4_999u64)
    );
    assert_eq!(error.code(), -32602);
}

#[tokio::test]
async fn transition_configuration_requires_a_configured_ttd() {
    let ctx = spawn_engine(ChainSpecBuilder::default().build());

    let error = ctx
        .handle
        .exchange_transition_configuration(TransitionConfiguration::default())
        .await
        .unwrap_err();
    assert_matches!(error, EngineApiError::UnknownTerminalTotalDifficulty);
    assert_eq!(error.code(), -32603);
}
