//! Shared harness: an engine task spawned over mocks.

use alloy_primitives::B256;
use corten_interfaces::test_utils::{generators, MockBuilder, MockChain, MockPool, MockSkeleton};
use corten_primitives::{
    eip4844::{DATA_GAS_PER_BLOB, VERSIONED_HASH_VERSION_KZG},
    proofs, Block, ChainSpec, ChainSpecBuilder, SealedBlock, TransactionSigned, TxEip4844,
};
use corten_rpc_engine_api::{EngineApi, EngineApiHandle, EngineConfig};
use rand::rngs::StdRng;
use std::sync::Arc;

/// Shanghai activation timestamp of [`staged_spec`].
pub(crate) const SHANGHAI: u64 = 1_000;
/// Cancun activation timestamp of [`staged_spec`].
pub(crate) const CANCUN: u64 = 2_000;

pub(crate) struct TestContext {
    pub(crate) handle: EngineApiHandle,
    pub(crate) chain: MockChain,
    pub(crate) skeleton: MockSkeleton,
    pub(crate) builder: MockBuilder,
    pub(crate) pool: MockPool,
}

/// A chain that merged at genesis, with no timestamp forks scheduled.
pub(crate) fn post_merge_spec() -> ChainSpec {
    ChainSpecBuilder::default().paris_activated().build()
}

/// A chain with every fork up to Cancun active from genesis.
pub(crate) fn cancun_spec() -> ChainSpec {
    ChainSpecBuilder::default().cancun_activated().build()
}

/// A merged chain with Shanghai and Cancun scheduled at fixed timestamps.
pub(crate) fn staged_spec() -> ChainSpec {
    ChainSpecBuilder::default()
        .paris_activated()
        .with_shanghai_time(SHANGHAI)
        .with_cancun_time(CANCUN)
        .build()
}

pub(crate) fn spawn_engine_with(
    spec: ChainSpec,
    skeleton: MockSkeleton,
    config: EngineConfig,
) -> TestContext {
    let chain = MockChain::new();
    let builder = MockBuilder::new();
    let pool = MockPool::new();
    let (engine, handle) = EngineApi::new(
        Arc::new(chain.clone()),
        Arc::new(spec),
        skeleton.clone(),
        builder.clone(),
        pool.clone(),
        config,
    );
    tokio::spawn(engine);
    TestContext { handle, chain, skeleton, builder, pool }
}

pub(crate) fn spawn_engine(spec: ChainSpec) -> TestContext {
    spawn_engine_with(spec, MockSkeleton::new(), EngineConfig::default())
}

/// Seeds the chain with an executed genesis at the VM head.
pub(crate) fn seed_genesis(chain: &MockChain, rng: &mut StdRng) -> Arc<SealedBlock> {
    let genesis = Arc::new(generators::random_block(rng, 0, Some(B256::ZERO), Some(0)));
    chain.insert_executed_head(genesis.clone());
    genesis
}

/// Applies a transformation to a block and recomputes the body commitments so
/// the result still assembles cleanly.
pub(crate) fn transform_block(
    src: &SealedBlock,
    f: impl FnOnce(Block) -> Block,
) -> SealedBlock {
    let mut block = f(src.clone().unseal());
    block.header.transactions_root = proofs::calculate_transaction_root(&block.body);
    if let Some(withdrawals) = &block.withdrawals {
        block.header.withdrawals_root = Some(proofs::calculate_withdrawals_root(withdrawals));
    }
    block.seal_slow()
}

/// A well-formed KZG versioned hash.
pub(crate) fn kzg_hash(byte: u8) -> B256 {
    let mut hash = B256::repeat_byte(byte);
    hash.0[0] = VERSIONED_HASH_VERSION_KZG;
    hash
}

/// Builds a Cancun block carrying a single blob transaction committing to the
/// given versioned hashes.
pub(crate) fn blob_block(
    rng: &mut StdRng,
    parent: &SealedBlock,
    hashes: Vec<B256>,
    parent_beacon_block_root: B256,
) -> SealedBlock {
    let blob_count = hashes.len() as u64;
    let tx = TransactionSigned::Eip4844(TxEip4844 {
        chain_id: 1,
        to: alloy_primitives::Address::repeat_byte(0x99),
        max_fee_per_blob_gas: 1,
        blob_versioned_hashes: hashes,
        ..Default::default()
    });
    let base = generators::random_block(rng, parent.number() + 1, Some(parent.hash()), Some(0));
    transform_block(&base, move |mut block| {
        block.body = vec![tx];
        block.header.blob_gas_used = Some(blob_count * DATA_GAS_PER_BLOB);
        block.header.excess_blob_gas = Some(0);
        block.header.parent_beacon_block_root = Some(parent_beacon_block_root);
        block.header.withdrawals_root = Some(proofs::calculate_withdrawals_root(&[]));
        block.withdrawals = Some(Default::default());
        block
    })
}
