//! forkchoiceUpdated behaviour over the message channel.

use crate::setup::*;
use alloy_primitives::{Address, B256, U256, U64};
use assert_matches::assert_matches;
use corten_interfaces::test_utils::{generators, MockSkeleton};
use corten_rpc_engine_api::{block_to_payload_v1, EngineApiError, EngineConfig};
use corten_rpc_types::{ForkchoiceState, PayloadAttributes, PayloadStatusEnum};

fn head_only(head: B256) -> ForkchoiceState {
    ForkchoiceState { head_block_hash: head, ..Default::default() }
}

fn attrs(timestamp: u64) -> PayloadAttributes {
    PayloadAttributes {
        timestamp: U64::from(timestamp),
        prev_randao: B256::repeat_byte(0x77),
        suggested_fee_recipient: Address::repeat_byte(0x88),
        withdrawals: None,
        parent_beacon_block_root: None,
    }
}

#[tokio::test]
async fn head_already_canonical_is_valid_without_side_effects() {
    let mut rng = generators::rng();
    let ctx = spawn_engine(post_merge_spec());
    let genesis = seed_genesis(&ctx.chain, &mut rng);

    let updated = ctx.handle.fork_choice_updated_v1(head_only(genesis.hash()), None).await.unwrap();
    assert_eq!(updated.payload_status.status, PayloadStatusEnum::Valid);
    assert_eq!(updated.payload_status.latest_valid_hash, Some(genesis.hash()));
    assert_eq!(updated.payload_id, None);

    assert!(ctx.chain.set_head_calls.lock().is_empty());
    assert!(ctx.pool.removed_for.lock().is_empty());
    assert_eq!(*ctx.pool.resumed.lock(), 0);
}

#[tokio::test]
async fn finalized_without_safe_is_invalid_params() {
    let mut rng = generators::rng();
    let ctx = spawn_engine(post_merge_spec());
    let genesis = seed_genesis(&ctx.chain, &mut rng);

    let state = ForkchoiceState {
        head_block_hash: genesis.hash(),
        safe_block_hash: B256::ZERO,
        finalized_block_hash: genesis.hash(),
    };
    let error = ctx.handle.fork_choice_updated_v1(state, None).await.unwrap_err();
    assert_matches!(error, EngineApiError::FinalizedWithoutSafe);
    assert_eq!(error.code(), -32602);
}

#[tokio::test]
async fn unknown_head_is_syncing() {
    let mut rng = generators::rng();
    let ctx = spawn_engine(post_merge_spec());
    seed_genesis(&ctx.chain, &mut rng);

    let updated = ctx
        .handle
        .fork_choice_updated_v1(head_only(B256::repeat_byte(0xaa)), None)
        .await
        .unwrap();
    assert!(updated.is_syncing());
    assert_eq!(updated.payload_id, None);
}

#[tokio::test]
async fn unexecuted_head_is_syncing() {
    let mut rng = generators::rng();
    let ctx = spawn_engine(post_merge_spec());
    let genesis = seed_genesis(&ctx.chain, &mut rng);

    // Known block, but its post-state is not in the state trie.
    let block = generators::random_block(&mut rng, 1, Some(genesis.hash()), Some(0));
    ctx.chain.insert_canonical(block.clone().into());

    let updated = ctx.handle.fork_choice_updated_v1(head_only(block.hash()), None).await.unwrap();
    assert!(updated.is_syncing());
}

#[tokio::test]
async fn forkchoice_activates_beacon_sync_and_directs_the_skeleton() {
    let mut rng = generators::rng();
    let ctx = spawn_engine(post_merge_spec());
    let genesis = seed_genesis(&ctx.chain, &mut rng);
    assert!(!*ctx.skeleton.running.lock());

    ctx.handle.fork_choice_updated_v1(head_only(genesis.hash()), None).await.unwrap();
    assert!(*ctx.skeleton.running.lock());
    assert_eq!(*ctx.skeleton.activations.lock(), 1);
    assert_eq!(*ctx.skeleton.head.lock(), Some(genesis.hash()));

    // A second update does not re-activate.
    ctx.handle.fork_choice_updated_v1(head_only(genesis.hash()), None).await.unwrap();
    assert_eq!(*ctx.skeleton.activations.lock(), 1);
}

#[tokio::test]
async fn beacon_sync_activation_can_be_disabled() {
    let mut rng = generators::rng();
    let ctx = spawn_engine_with(
        post_merge_spec(),
        MockSkeleton::new(),
        EngineConfig { disable_beacon_sync: true, ..Default::default() },
    );
    let genesis = seed_genesis(&ctx.chain, &mut rng);

    ctx.handle.fork_choice_updated_v1(head_only(genesis.hash()), None).await.unwrap();
    assert!(!*ctx.skeleton.running.lock());
}

#[tokio::test]
async fn new_head_is_canonicalized_and_pool_maintained() {
    let mut rng = generators::rng();
    let ctx = spawn_engine(post_merge_spec());
    let genesis = seed_genesis(&ctx.chain, &mut rng);
    let block = generators::random_block(&mut rng, 1, Some(genesis.hash()), Some(2));

    let status = ctx.handle.new_payload_v1(block_to_payload_v1(&block)).await.unwrap();
    assert_eq!(status.status, PayloadStatusEnum::Valid);

    let updated = ctx.handle.fork_choice_updated_v1(head_only(block.hash()), None).await.unwrap();
    assert_eq!(updated.payload_status.status, PayloadStatusEnum::Valid);
    assert_eq!(updated.payload_status.latest_valid_hash, Some(block.hash()));

    let calls = ctx.chain.set_head_calls.lock().clone();
    assert_eq!(calls, vec![(vec![block.hash()], None, None)]);
    assert_eq!(ctx.pool.removed_for.lock().clone(), vec![block.hash()]);
    assert_eq!(*ctx.pool.resumed.lock(), 1);

    // Re-announcing the same head is a no-op for canonicalization.
    ctx.handle.fork_choice_updated_v1(head_only(block.hash()), None).await.unwrap();
    assert_eq!(ctx.chain.set_head_calls.lock().len(), 1);
    assert_eq!(*ctx.pool.resumed.lock(), 1);
}

#[tokio::test]
async fn safe_and_finalized_must_resolve() {
    let mut rng = generators::rng();
    let ctx = spawn_engine(post_merge_spec());
    let genesis = seed_genesis(&ctx.chain, &mut rng);

    let state = ForkchoiceState {
        head_block_hash: genesis.hash(),
        safe_block_hash: B256::repeat_byte(0x01),
        finalized_block_hash: B256::ZERO,
    };
    let error = ctx.handle.fork_choice_updated_v1(state, None).await.unwrap_err();
    assert_matches!(error, EngineApiError::UnknownSafeBlock);
    assert_eq!(error.to_string(), "safe block not available");

    let state = ForkchoiceState {
        head_block_hash: genesis.hash(),
        safe_block_hash: genesis.hash(),
        finalized_block_hash: B256::repeat_byte(0x02),
    };
    let error = ctx.handle.fork_choice_updated_v1(state, None).await.unwrap_err();
    assert_matches!(error, EngineApiError::UnknownFinalizedBlock);
    assert_eq!(error.to_string(), "finalized block not available");
}

#[tokio::test]
async fn set_head_failure_surfaces_as_invalid_params() {
    let mut rng = generators::rng();
    let ctx = spawn_engine(post_merge_spec());
    let genesis = seed_genesis(&ctx.chain, &mut rng);
    let block = generators::random_block(&mut rng, 1, Some(genesis.hash()), Some(0));
    ctx.handle.new_payload_v1(block_to_payload_v1(&block)).await.unwrap();

    ctx.chain.fail_set_head_with("canonical commit refused");
    let error = ctx.handle.fork_choice_updated_v1(head_only(block.hash()), None).await.unwrap_err();
    assert_matches!(error, EngineApiError::ForkchoiceUpdate(_));
    assert_eq!(error.code(), -32602);
    assert!(error.to_string().contains("canonical commit refused"));
}

#[tokio::test]
async fn stale_attribute_timestamp_is_rejected() {
    let mut rng = generators::rng();
    let ctx = spawn_engine(post_merge_spec());
    let genesis = seed_genesis(&ctx.chain, &mut rng);
    let head_timestamp = genesis.header().timestamp;

    let error = ctx
        .handle
        .fork_choice_updated_v1(head_only(genesis.hash()), Some(attrs(head_timestamp)))
        .await
        .unwrap_err();
    assert_eq!(
        error.to_string(),
        format!(
            "invalid timestamp in payloadAttributes, got {head_timestamp}, need at least {}",
            head_timestamp + 1
        )
    );
    assert_eq!(error.code(), -32602);
}

#[tokio::test]
async fn attributes_start_a_build() {
    let mut rng = generators::rng();
    let ctx = spawn_engine(post_merge_spec());
    let genesis = seed_genesis(&ctx.chain, &mut rng);
    let build_attrs = attrs(genesis.header().timestamp + 12);

    let expected_id = ctx.builder.peek_next_id();
    let updated = ctx
        .handle
        .fork_choice_updated_v1(head_only(genesis.hash()), Some(build_attrs.clone()))
        .await
        .unwrap();
    assert_eq!(updated.payload_status.status, PayloadStatusEnum::Valid);
    assert_eq!(updated.payload_id, Some(expected_id));

    let started = ctx.builder.started.lock().clone();
    assert_eq!(started.len(), 1);
    assert_eq!(started[0].parent.hash(), genesis.hash());
    assert_eq!(started[0].timestamp, genesis.header().timestamp + 12);
    assert_eq!(started[0].prev_randao, build_attrs.prev_randao);
    assert_eq!(started[0].suggested_fee_recipient, build_attrs.suggested_fee_recipient);
    assert!(started[0].withdrawals.is_none());
}

#[tokio::test]
async fn pow_head_must_be_terminal() {
    let mut rng = generators::rng();
    let spec = corten_primitives::ChainSpecBuilder::default()
        .paris_activated()
        .with_terminal_total_difficulty(U256::from(1_000u64))
        .build();
    let ctx = spawn_engine(spec);
    let genesis = seed_genesis(&ctx.chain, &mut rng);

    let pow_head = transform_block(
        &generators::random_block(&mut rng, 1, Some(genesis.hash()), Some(0)),
        |mut block| {
            block.header.difficulty = U256::from(500u64);
            block
        },
    );
    ctx.chain.insert_canonical(pow_head.clone().into());
    ctx.chain.set_td(pow_head.hash(), U256::from(500u64));

    let updated = ctx.handle.fork_choice_updated_v1(head_only(pow_head.hash()), None).await.unwrap();
    assert_matches!(
        updated.payload_status.status,
        PayloadStatusEnum::Invalid { validation_error }
            if validation_error.contains("terminal block")
    );
    assert_eq!(updated.payload_status.latest_valid_hash, Some(B256::ZERO));
}

#[tokio::test]
async fn v3_attributes_before_cancun_are_unsupported_fork() {
    let mut rng = generators::rng();
    let ctx = spawn_engine(staged_spec());
    let genesis = seed_genesis(&ctx.chain, &mut rng);

    let mut build_attrs = attrs(SHANGHAI + 1);
    build_attrs.withdrawals = Some(vec![]);
    build_attrs.parent_beacon_block_root = Some(B256::ZERO);
    let error = ctx
        .handle
        .fork_choice_updated_v3(head_only(genesis.hash()), Some(build_attrs))
        .await
        .unwrap_err();
    assert_eq!(error.code(), -38005);
}

#[tokio::test]
async fn v2_attribute_withdrawals_must_match_shanghai() {
    let mut rng = generators::rng();
    let ctx = spawn_engine(staged_spec());
    let genesis = seed_genesis(&ctx.chain, &mut rng);

    // Withdrawals before Shanghai.
    let mut early = attrs(10);
    early.withdrawals = Some(vec![]);
    let error = ctx
        .handle
        .fork_choice_updated_v2(head_only(genesis.hash()), Some(early))
        .await
        .unwrap_err();
    assert_eq!(error.code(), -32602);

    // No withdrawals after Shanghai.
    let late = attrs(SHANGHAI + 1);
    let error = ctx
        .handle
        .fork_choice_updated_v2(head_only(genesis.hash()), Some(late))
        .await
        .unwrap_err();
    assert_eq!(error.code(), -32602);
}
