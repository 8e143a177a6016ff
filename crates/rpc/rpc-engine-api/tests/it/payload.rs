//! newPayload and getPayload behaviour over the message channel.

use crate::setup::*;
use alloy_primitives::{Bytes, B256, B64, U256, U64};
use assert_matches::assert_matches;
use corten_interfaces::{test_utils::generators, BlobsBundle, BuiltPayload, PayloadJobGenerator};
use corten_interfaces::PayloadBuildArguments;
use corten_rpc_engine_api::{
    block_to_payload_v1, block_to_payload_v3, EngineApiError, UNSUPPORTED_FORK_CODE,
};
use corten_rpc_types::{
    ExecutionPayloadFieldV2, ExecutionPayloadInputV2, PayloadStatus, PayloadStatusEnum,
};
use std::sync::Arc;

fn input_v2(payload: corten_rpc_types::ExecutionPayloadV1) -> ExecutionPayloadInputV2 {
    ExecutionPayloadInputV2 {
        execution_payload: payload,
        withdrawals: None,
        blob_gas_used: None,
        excess_blob_gas: None,
    }
}

#[tokio::test]
async fn valid_payload_on_canonical_head() {
    let mut rng = generators::rng();
    let ctx = spawn_engine(post_merge_spec());
    let genesis = seed_genesis(&ctx.chain, &mut rng);
    let block = generators::random_block(&mut rng, 1, Some(genesis.hash()), Some(2));

    let status = ctx.handle.new_payload_v1(block_to_payload_v1(&block)).await.unwrap();
    assert_eq!(status, PayloadStatus::new(PayloadStatusEnum::Valid, block.hash()));
    assert_eq!(ctx.chain.executed_count(), 1);

    // Submitting the same payload again short-circuits on the executed cache.
    let status = ctx.handle.new_payload_v1(block_to_payload_v1(&block)).await.unwrap();
    assert_eq!(status.status, PayloadStatusEnum::Valid);
    assert_eq!(ctx.chain.executed_count(), 1);
}

#[tokio::test]
async fn unknown_parent_is_accepted_and_remote_cached() {
    let mut rng = generators::rng();
    let ctx = spawn_engine(post_merge_spec());
    seed_genesis(&ctx.chain, &mut rng);
    let block = generators::random_block(&mut rng, 5, None, Some(0));

    let status = ctx.handle.new_payload_v1(block_to_payload_v1(&block)).await.unwrap();
    assert_eq!(status.status, PayloadStatusEnum::Accepted);
    assert_eq!(status.latest_valid_hash, None);

    // The block landed in the remote cache: a forkchoice update can resolve
    // it as head (and hands it to the skeleton), even though nothing else
    // knows the hash.
    let state = corten_rpc_types::ForkchoiceState {
        head_block_hash: block.hash(),
        ..Default::default()
    };
    let updated = ctx.handle.fork_choice_updated_v1(state, None).await.unwrap();
    assert_eq!(updated.payload_status.status, PayloadStatusEnum::Syncing);
    assert_eq!(*ctx.skeleton.head.lock(), Some(block.hash()));
}

#[tokio::test]
async fn skeleton_acceptance_turns_accepted_into_syncing() {
    let mut rng = generators::rng();
    let ctx = spawn_engine_with(
        post_merge_spec(),
        corten_interfaces::test_utils::MockSkeleton::accepting(),
        Default::default(),
    );
    seed_genesis(&ctx.chain, &mut rng);
    let block = generators::random_block(&mut rng, 5, None, Some(0));

    let status = ctx.handle.new_payload_v1(block_to_payload_v1(&block)).await.unwrap();
    assert_eq!(status.status, PayloadStatusEnum::Syncing);
    assert_eq!(status.latest_valid_hash, None);
    assert_eq!(ctx.skeleton.extended.lock().as_slice(), &[block.hash()]);
}

#[tokio::test]
async fn declared_hash_mismatch_is_invalid_block_hash_only_on_v1() {
    let mut rng = generators::rng();
    let ctx = spawn_engine(post_merge_spec());
    let genesis = seed_genesis(&ctx.chain, &mut rng);
    let block = generators::random_block(&mut rng, 1, Some(genesis.hash()), Some(1));
    let mut payload = block_to_payload_v1(&block);
    payload.block_hash = B256::repeat_byte(0xba);

    let status = ctx.handle.new_payload_v1(payload.clone()).await.unwrap();
    assert_matches!(status.status, PayloadStatusEnum::InvalidBlockHash { .. });
    assert_eq!(status.latest_valid_hash, Some(genesis.hash()));

    // V2 folds the same outcome into plain INVALID.
    let status = ctx.handle.new_payload_v2(input_v2(payload)).await.unwrap();
    assert_matches!(
        status.status,
        PayloadStatusEnum::Invalid { validation_error }
            if validation_error.contains("block hash mismatch")
    );
    assert_eq!(status.latest_valid_hash, Some(genesis.hash()));
}

#[tokio::test]
async fn undecodable_transaction_is_plain_invalid() {
    let mut rng = generators::rng();
    let ctx = spawn_engine(post_merge_spec());
    let genesis = seed_genesis(&ctx.chain, &mut rng);
    let block = generators::random_block(&mut rng, 1, Some(genesis.hash()), Some(1));
    let mut payload = block_to_payload_v1(&block);
    payload.transactions = vec![Bytes::new()];

    let status = ctx.handle.new_payload_v1(payload).await.unwrap();
    assert_matches!(status.status, PayloadStatusEnum::Invalid { .. });
}

#[tokio::test]
async fn blob_hash_count_mismatch_is_invalid() {
    let mut rng = generators::rng();
    let ctx = spawn_engine(cancun_spec());
    let genesis = seed_genesis(&ctx.chain, &mut rng);
    let root = B256::repeat_byte(0x11);
    let block = blob_block(&mut rng, &genesis, vec![kzg_hash(0xa1), kzg_hash(0xa2)], root);

    let status = ctx
        .handle
        .new_payload_v3(block_to_payload_v3(&block), vec![kzg_hash(0xa1)], root)
        .await
        .unwrap();
    assert_matches!(
        status.status,
        PayloadStatusEnum::Invalid { validation_error }
            if validation_error == "Error verifying versionedHashes: expected=2 received=1"
    );
    assert_eq!(status.latest_valid_hash, Some(genesis.hash()));
}

#[tokio::test]
async fn blob_payload_with_matching_hashes_is_valid() {
    let mut rng = generators::rng();
    let ctx = spawn_engine(cancun_spec());
    let genesis = seed_genesis(&ctx.chain, &mut rng);
    let root = B256::repeat_byte(0x11);
    let hashes = vec![kzg_hash(0xa1), kzg_hash(0xa2)];
    let block = blob_block(&mut rng, &genesis, hashes.clone(), root);

    let status =
        ctx.handle.new_payload_v3(block_to_payload_v3(&block), hashes, root).await.unwrap();
    assert_eq!(status, PayloadStatus::new(PayloadStatusEnum::Valid, block.hash()));
}

#[tokio::test]
async fn execution_failure_is_invalid_and_deletes_the_block() {
    let mut rng = generators::rng();
    let ctx = spawn_engine(post_merge_spec());
    let genesis = seed_genesis(&ctx.chain, &mut rng);
    let block = generators::random_block(&mut rng, 1, Some(genesis.hash()), Some(1));
    ctx.chain.fail_execution_of(block.hash());

    let status = ctx.handle.new_payload_v1(block_to_payload_v1(&block)).await.unwrap();
    assert_matches!(
        status.status,
        PayloadStatusEnum::Invalid { validation_error }
            if validation_error.contains("mock execution failure")
    );
    assert_eq!(status.latest_valid_hash, Some(genesis.hash()));
    assert!(ctx.chain.deleted.lock().contains(&block.hash()));
    assert!(ctx.skeleton.deleted.lock().contains(&block.hash()));
}

// === version matrix ===

#[tokio::test]
async fn v1_rejects_shanghai_payloads() {
    let mut rng = generators::rng();
    let ctx = spawn_engine(staged_spec());
    let genesis = seed_genesis(&ctx.chain, &mut rng);
    let block = generators::random_block(&mut rng, 1, Some(genesis.hash()), Some(0));
    let block = transform_block(&block, |mut block| {
        block.header.timestamp = SHANGHAI;
        block
    });

    let error = ctx.handle.new_payload_v1(block_to_payload_v1(&block)).await.unwrap_err();
    assert_eq!(error.code(), -32602);
}

#[tokio::test]
async fn v2_rejects_cancun_payloads() {
    let mut rng = generators::rng();
    let ctx = spawn_engine(staged_spec());
    let genesis = seed_genesis(&ctx.chain, &mut rng);
    let block = generators::random_block(&mut rng, 1, Some(genesis.hash()), Some(0));
    let block = transform_block(&block, |mut block| {
        block.header.timestamp = CANCUN;
        block
    });

    let error = ctx.handle.new_payload_v2(input_v2(block_to_payload_v1(&block))).await.unwrap_err();
    assert_eq!(error.code(), -32602);
}

#[tokio::test]
async fn v2_withdrawals_presence_must_match_shanghai() {
    let mut rng = generators::rng();
    let ctx = spawn_engine(staged_spec());
    let genesis = seed_genesis(&ctx.chain, &mut rng);
    let pre = generators::random_block(&mut rng, 1, Some(genesis.hash()), Some(0));

    // Withdrawals before Shanghai.
    let mut input = input_v2(block_to_payload_v1(&pre));
    input.withdrawals = Some(vec![]);
    let error = ctx.handle.new_payload_v2(input).await.unwrap_err();
    assert_eq!(error.code(), -32602);

    // No withdrawals after Shanghai.
    let post = transform_block(&pre, |mut block| {
        block.header.timestamp = SHANGHAI + 1;
        block
    });
    let error = ctx.handle.new_payload_v2(input_v2(block_to_payload_v1(&post))).await.unwrap_err();
    assert_eq!(error.code(), -32602);
}

#[tokio::test]
async fn v2_rejects_blob_gas_fields() {
    let mut rng = generators::rng();
    let ctx = spawn_engine(staged_spec());
    let genesis = seed_genesis(&ctx.chain, &mut rng);
    let block = generators::random_block(&mut rng, 1, Some(genesis.hash()), Some(0));

    let mut input = input_v2(block_to_payload_v1(&block));
    input.blob_gas_used = Some(U64::ZERO);
    let error = ctx.handle.new_payload_v2(input).await.unwrap_err();
    assert_eq!(error.code(), -32602);
}

#[tokio::test]
async fn v3_before_cancun_is_unsupported_fork() {
    let mut rng = generators::rng();
    let ctx = spawn_engine(staged_spec());
    let genesis = seed_genesis(&ctx.chain, &mut rng);
    let block = generators::random_block(&mut rng, 1, Some(genesis.hash()), Some(0));

    let error = ctx
        .handle
        .new_payload_v3(block_to_payload_v3(&block), vec![], B256::ZERO)
        .await
        .unwrap_err();
    assert_eq!(error.code(), UNSUPPORTED_FORK_CODE);
    assert_matches!(error, EngineApiError::EngineObjectValidation(_));
}

// === getPayload ===

#[tokio::test]
async fn unknown_payload_id_is_dedicated_error() {
    let ctx = spawn_engine(post_merge_spec());
    let error = ctx.handle.get_payload_v1(B64::repeat_byte(0x42)).await.unwrap_err();
    assert_matches!(error, EngineApiError::UnknownPayload);
    assert_eq!(error.code(), -32001);
    assert_eq!(error.to_string(), "Unknown payload");
}

#[tokio::test]
async fn get_payload_v2_reexecutes_and_returns_the_envelope() {
    let mut rng = generators::rng();
    let ctx = spawn_engine(post_merge_spec());
    let genesis = seed_genesis(&ctx.chain, &mut rng);

    let built = Arc::new(generators::random_block(&mut rng, 1, Some(genesis.hash()), Some(2)));
    let id = ctx
        .builder
        .start_build(PayloadBuildArguments {
            parent: genesis,
            timestamp: 1,
            prev_randao: B256::ZERO,
            suggested_fee_recipient: Default::default(),
            withdrawals: None,
            parent_beacon_block_root: None,
        })
        .unwrap();
    ctx.builder.insert_payload(
        id,
        BuiltPayload {
            block: built.clone(),
            fees: U256::from(1234u64),
            blobs_bundle: BlobsBundle::default(),
        },
    );

    let envelope = ctx.handle.get_payload_v2(id).await.unwrap();
    assert_eq!(envelope.block_value, U256::from(1234u64));
    assert_matches!(
        envelope.execution_payload,
        ExecutionPayloadFieldV2::V1(payload) if payload.block_hash == built.hash()
    );

    // The block was run under force and is now cached as executed: the same
    // block arriving as a payload short-circuits.
    assert_eq!(ctx.chain.forced.lock().as_slice(), &[built.hash()]);
    let status = ctx.handle.new_payload_v1(block_to_payload_v1(&built)).await.unwrap();
    assert_eq!(status.status, PayloadStatusEnum::Valid);
    assert_eq!(ctx.chain.executed_count(), 1);
}

#[tokio::test]
async fn get_payload_v3_carries_the_blobs_bundle() {
    let mut rng = generators::rng();
    let ctx = spawn_engine(cancun_spec());
    let genesis = seed_genesis(&ctx.chain, &mut rng);
    let root = B256::repeat_byte(0x22);
    let block = Arc::new(blob_block(&mut rng, &genesis, vec![kzg_hash(0xb1)], root));

    let id = ctx
        .builder
        .start_build(PayloadBuildArguments {
            parent: genesis,
            timestamp: 1,
            prev_randao: B256::ZERO,
            suggested_fee_recipient: Default::default(),
            withdrawals: Some(Default::default()),
            parent_beacon_block_root: Some(root),
        })
        .unwrap();
    ctx.builder.insert_payload(
        id,
        BuiltPayload {
            block: block.clone(),
            fees: U256::from(7u64),
            blobs_bundle: BlobsBundle {
                commitments: vec![alloy_primitives::FixedBytes::<48>::repeat_byte(0xcc)],
                proofs: vec![alloy_primitives::FixedBytes::<48>::repeat_byte(0xdd)],
                blobs: vec![Bytes::from_static(&[0xee])],
            },
        },
    );

    let envelope = ctx.handle.get_payload_v3(id).await.unwrap();
    assert_eq!(envelope.execution_payload.payload_inner.payload_inner.block_hash, block.hash());
    assert_eq!(envelope.block_value, U256::from(7u64));
    assert_eq!(envelope.blobs_bundle.commitments.len(), 1);
    assert!(!envelope.should_override_builder);
}
