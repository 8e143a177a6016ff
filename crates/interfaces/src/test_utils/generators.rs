//! Random block and header generators.

use alloy_primitives::{Address, B256, U256};
use corten_primitives::{
    proofs, Block, Header, SealedBlock, SealedHeader, TransactionSigned, TxKind, TxLegacy,
};
use rand::{rngs::StdRng, Rng, SeedableRng};

/// Returns a seedable rng for test generators.
pub fn rng() -> StdRng {
    StdRng::from_entropy()
}

/// Generates a random post-merge header at the given height.
pub fn random_header(rng: &mut StdRng, number: u64, parent: Option<B256>) -> SealedHeader {
    Header {
        parent_hash: parent.unwrap_or_else(|| B256::from(rng.gen::<[u8; 32]>())),
        number,
        timestamp: number,
        state_root: B256::from(rng.gen::<[u8; 32]>()),
        gas_limit: 30_000_000,
        base_fee_per_gas: Some(rng.gen_range(1..=1_000u64)),
        ..Default::default()
    }
    .seal_slow()
}

/// Generates a random signed legacy transaction.
pub fn random_tx(rng: &mut StdRng) -> TransactionSigned {
    TransactionSigned::Legacy(TxLegacy {
        nonce: rng.gen::<u16>() as u64,
        gas_price: rng.gen_range(1..=1_000_000_000u128),
        gas_limit: 21_000,
        to: TxKind::Call(Address::from(rng.gen::<[u8; 20]>())),
        value: U256::from(rng.gen::<u32>()),
        v: 27,
        r: U256::from(rng.gen::<u64>()),
        s: U256::from(rng.gen::<u64>()),
        ..Default::default()
    })
}

/// Generates a random post-merge block with consistent body commitments.
pub fn random_block(
    rng: &mut StdRng,
    number: u64,
    parent: Option<B256>,
    tx_count: Option<u8>,
) -> SealedBlock {
    let tx_count = tx_count.map(usize::from).unwrap_or_else(|| rng.gen_range(0..4));
    let body: Vec<_> = (0..tx_count).map(|_| random_tx(rng)).collect();
    let mut header = random_header(rng, number, parent).unseal();
    header.transactions_root = proofs::calculate_transaction_root(&body);
    header.gas_used = 21_000 * body.len() as u64;
    Block { header, body, ommers: vec![], withdrawals: None }.seal_slow()
}

/// Generates a linked range of blocks `[start..=end]` on top of `head`.
pub fn random_block_range(
    rng: &mut StdRng,
    start: u64,
    end: u64,
    head: B256,
    tx_count: Option<u8>,
) -> Vec<SealedBlock> {
    let mut parent = head;
    (start..=end)
        .map(|number| {
            let block = random_block(rng, number, Some(parent), tx_count);
            parent = block.hash();
            block
        })
        .collect()
}
