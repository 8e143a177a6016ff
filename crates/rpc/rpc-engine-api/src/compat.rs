//! Conversions between Engine API payloads and consensus blocks.

use alloy_primitives::{B256, U256, U64};
use corten_primitives::{
    constants::{EMPTY_OMMER_ROOT_HASH, MAXIMUM_EXTRA_DATA_SIZE},
    proofs, Block, Header, SealedBlock, TransactionSigned, Withdrawal, Withdrawals,
};
use corten_rpc_types::{
    ExecutionPayload, ExecutionPayloadBodyV1, ExecutionPayloadFieldV2, ExecutionPayloadV1,
    ExecutionPayloadV2, ExecutionPayloadV3, PayloadError,
};

/// Converts a wire withdrawal to its consensus form.
pub fn convert_standalone_withdraw_to_withdrawal(
    withdrawal: &corten_rpc_types::Withdrawal,
) -> Withdrawal {
    Withdrawal {
        index: withdrawal.index.to(),
        validator_index: withdrawal.validator_index.to(),
        address: withdrawal.address,
        amount: withdrawal.amount.to(),
    }
}

/// Converts a consensus withdrawal to its wire form.
pub fn convert_withdrawal_to_standalone_withdraw(
    withdrawal: &Withdrawal,
) -> corten_rpc_types::Withdrawal {
    corten_rpc_types::Withdrawal {
        index: U64::from(withdrawal.index),
        validator_index: U64::from(withdrawal.validator_index),
        address: withdrawal.address,
        amount: U64::from(withdrawal.amount),
    }
}

fn try_payload_v1_to_block(payload: ExecutionPayloadV1) -> Result<Block, PayloadError> {
    if payload.extra_data.len() > MAXIMUM_EXTRA_DATA_SIZE {
        return Err(PayloadError::ExtraData(payload.extra_data));
    }

    if payload.base_fee_per_gas.is_zero() {
        return Err(PayloadError::BaseFee(payload.base_fee_per_gas));
    }
    let base_fee_per_gas = u64::try_from(payload.base_fee_per_gas)
        .map_err(|_| PayloadError::BaseFee(payload.base_fee_per_gas))?;

    let transactions = payload
        .transactions
        .iter()
        .map(|tx| TransactionSigned::decode_enveloped(&mut tx.as_ref()))
        .collect::<Result<Vec<_>, _>>()?;
    let transactions_root = proofs::calculate_transaction_root(&transactions);

    let header = Header {
        parent_hash: payload.parent_hash,
        beneficiary: payload.fee_recipient,
        state_root: payload.state_root,
        transactions_root,
        receipts_root: payload.receipts_root,
        logs_bloom: payload.logs_bloom,
        number: payload.block_number.to(),
        gas_limit: payload.gas_limit.to(),
        gas_used: payload.gas_used.to(),
        timestamp: payload.timestamp.to(),
        mix_hash: payload.prev_randao,
        base_fee_per_gas: Some(base_fee_per_gas),
        extra_data: payload.extra_data,
        // Defaults: payload blocks never carry ommers, difficulty or a nonce.
        ommers_hash: EMPTY_OMMER_ROOT_HASH,
        ..Default::default()
    };

    Ok(Block { header, body: transactions, ommers: vec![], withdrawals: None })
}

fn try_payload_v2_to_block(payload: ExecutionPayloadV2) -> Result<Block, PayloadError> {
    // Same conversion as the underlying V1 payload, plus the withdrawals and
    // their commitment.
    let mut block = try_payload_v1_to_block(payload.payload_inner)?;
    let withdrawals = Withdrawals::new(
        payload.withdrawals.iter().map(convert_standalone_withdraw_to_withdrawal).collect(),
    );
    block.header.withdrawals_root = Some(proofs::calculate_withdrawals_root(&withdrawals));
    block.withdrawals = Some(withdrawals);
    Ok(block)
}

fn try_payload_v3_to_block(payload: ExecutionPayloadV3) -> Result<Block, PayloadError> {
    let mut block = try_payload_v2_to_block(payload.payload_inner)?;
    block.header.blob_gas_used = Some(payload.blob_gas_used.to());
    block.header.excess_blob_gas = Some(payload.excess_blob_gas.to());
    Ok(block)
}

/// Converts a payload of any version into an unsealed block.
pub fn try_payload_to_block(payload: ExecutionPayload) -> Result<Block, PayloadError> {
    match payload {
        ExecutionPayload::V1(payload) => try_payload_v1_to_block(payload),
        ExecutionPayload::V2(payload) => try_payload_v2_to_block(payload),
        ExecutionPayload::V3(payload) => try_payload_v3_to_block(payload),
    }
}

/// Assembles a payload into a sealed block and verifies the declared block
/// hash against the assembled header.
pub(crate) fn try_into_sealed_block(
    payload: ExecutionPayload,
    parent_beacon_block_root: Option<B256>,
) -> Result<SealedBlock, PayloadError> {
    let expected_hash = payload.block_hash();
    let mut block = try_payload_to_block(payload)?;
    block.header.parent_beacon_block_root = parent_beacon_block_root;

    let sealed = block.seal_slow();
    if sealed.hash() != expected_hash {
        return Err(PayloadError::BlockHash {
            execution: sealed.hash(),
            consensus: expected_hash,
        });
    }
    Ok(sealed)
}

/// Converts a sealed block into the V1 payload shape.
pub fn block_to_payload_v1(block: &SealedBlock) -> ExecutionPayloadV1 {
    ExecutionPayloadV1 {
        parent_hash: block.header().parent_hash,
        fee_recipient: block.header().beneficiary,
        state_root: block.header().state_root,
        receipts_root: block.header().receipts_root,
        logs_bloom: block.header().logs_bloom,
        prev_randao: block.header().mix_hash,
        block_number: U64::from(block.number()),
        gas_limit: U64::from(block.header().gas_limit),
        gas_used: U64::from(block.header().gas_used),
        timestamp: U64::from(block.header().timestamp),
        extra_data: block.header().extra_data.clone(),
        base_fee_per_gas: U256::from(block.header().base_fee_per_gas.unwrap_or_default()),
        block_hash: block.hash(),
        transactions: block.raw_transactions(),
    }
}

/// Converts a sealed block into the V2 payload shape.
pub fn block_to_payload_v2(block: &SealedBlock) -> ExecutionPayloadV2 {
    ExecutionPayloadV2 {
        payload_inner: block_to_payload_v1(block),
        withdrawals: block
            .withdrawals
            .as_ref()
            .map(|withdrawals| {
                withdrawals.iter().map(convert_withdrawal_to_standalone_withdraw).collect()
            })
            .unwrap_or_default(),
    }
}

/// Converts a sealed block into the V3 payload shape.
pub fn block_to_payload_v3(block: &SealedBlock) -> ExecutionPayloadV3 {
    ExecutionPayloadV3 {
        payload_inner: block_to_payload_v2(block),
        blob_gas_used: U64::from(block.header().blob_gas_used.unwrap_or_default()),
        excess_blob_gas: U64::from(block.header().excess_blob_gas.unwrap_or_default()),
    }
}

/// Converts a sealed block into the newest payload shape its fields call for.
pub fn block_to_payload(block: &SealedBlock) -> ExecutionPayload {
    if block.header().parent_beacon_block_root.is_some() {
        ExecutionPayload::V3(block_to_payload_v3(block))
    } else if block.withdrawals.is_some() {
        ExecutionPayload::V2(block_to_payload_v2(block))
    } else {
        ExecutionPayload::V1(block_to_payload_v1(block))
    }
}

/// Converts a sealed block into the V1-or-V2 output shape of
/// `engine_getPayloadV2`.
pub fn block_to_payload_field_v2(block: &SealedBlock) -> ExecutionPayloadFieldV2 {
    if block.withdrawals.is_some() {
        ExecutionPayloadFieldV2::V2(block_to_payload_v2(block))
    } else {
        ExecutionPayloadFieldV2::V1(block_to_payload_v1(block))
    }
}

/// Converts a sealed block into a `getPayloadBodies` entry.
pub fn block_to_payload_body_v1(block: &SealedBlock) -> ExecutionPayloadBodyV1 {
    ExecutionPayloadBodyV1 {
        transactions: block.raw_transactions(),
        withdrawals: block.withdrawals.as_ref().map(|withdrawals| {
            withdrawals.iter().map(convert_withdrawal_to_standalone_withdraw).collect()
        }),
    }
}
