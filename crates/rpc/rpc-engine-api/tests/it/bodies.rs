//! getPayloadBodies behaviour over the message channel.

use crate::setup::*;
use alloy_primitives::B256;
use assert_matches::assert_matches;
use corten_interfaces::test_utils::generators;
use corten_rpc_engine_api::{EngineApiError, MAX_PAYLOAD_BODIES_LIMIT};
use std::sync::Arc;

#[tokio::test]
async fn bodies_by_hash_caps_the_request_size() {
    let ctx = spawn_engine(post_merge_spec());
    let hashes = vec![B256::ZERO; MAX_PAYLOAD_BODIES_LIMIT as usize + 1];

    let error = ctx.handle.get_payload_bodies_by_hash_v1(hashes).await.unwrap_err();
    assert_matches!(error, EngineApiError::PayloadRequestTooLarge { len: 33 });
    assert_eq!(error.code(), -38004);
}

#[tokio::test]
async fn bodies_by_hash_returns_null_for_unknown_blocks() {
    let mut rng = generators::rng();
    let ctx = spawn_engine(post_merge_spec());
    let genesis = seed_genesis(&ctx.chain, &mut rng);
    let known = Arc::new(generators::random_block(&mut rng, 1, Some(genesis.hash()), Some(2)));
    ctx.chain.insert_canonical(known.clone());

    let bodies = ctx
        .handle
        .get_payload_bodies_by_hash_v1(vec![
            known.hash(),
            B256::repeat_byte(0xee),
            genesis.hash(),
        ])
        .await
        .unwrap();

    assert_eq!(bodies.len(), 3);
    let body = bodies[0].as_ref().unwrap();
    assert_eq!(body.transactions, known.raw_transactions());
    assert_eq!(body.withdrawals, None);
    assert!(bodies[1].is_none());
    assert!(bodies[2].is_some());
}

#[tokio::test]
async fn bodies_by_range_validates_the_parameters() {
    let ctx = spawn_engine(post_merge_spec());

    let error = ctx.handle.get_payload_bodies_by_range_v1(0, 1).await.unwrap_err();
    assert_matches!(error, EngineApiError::InvalidBodiesRange { start: 0, count: 1 });
    assert_eq!(error.code(), -32602);

    let error = ctx.handle.get_payload_bodies_by_range_v1(1, 0).await.unwrap_err();
    assert_matches!(error, EngineApiError::InvalidBodiesRange { start: 1, count: 0 });

    let error = ctx.handle.get_payload_bodies_by_range_v1(1, 33).await.unwrap_err();
    assert_matches!(error, EngineApiError::PayloadRequestTooLarge { len: 33 });
}

#[tokio::test]
async fn bodies_by_range_clamps_to_the_chain_tip() {
    let mut rng = generators::rng();
    let ctx = spawn_engine(post_merge_spec());
    let genesis = seed_genesis(&ctx.chain, &mut rng);
    for block in generators::random_block_range(&mut rng, 1, 10, genesis.hash(), Some(1)) {
        ctx.chain.insert_canonical(Arc::new(block));
    }

    // The range pokes past the tip: one entry per existing block.
    let bodies = ctx.handle.get_payload_bodies_by_range_v1(8, 5).await.unwrap();
    assert_eq!(bodies.len(), 3);
    assert!(bodies.iter().all(Option::is_some));

    // Start beyond the tip: empty.
    let bodies = ctx.handle.get_payload_bodies_by_range_v1(11, 5).await.unwrap();
    assert!(bodies.is_empty());

    // Fully inside the chain: exactly `count` entries.
    let bodies = ctx.handle.get_payload_bodies_by_range_v1(2, 4).await.unwrap();
    assert_eq!(bodies.len(), 4);
}
