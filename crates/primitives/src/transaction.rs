use crate::eip4844::DATA_GAS_PER_BLOB;
use alloy_primitives::{keccak256, Address, Bytes, TxHash, TxKind, B256, U256};
use alloy_rlp::{Decodable, Encodable, RlpDecodable, RlpDecodableWrapper, RlpEncodable, RlpEncodableWrapper};
use std::ops::Deref;

/// A list of addresses and storage keys that a transaction plans to access
/// (EIP-2930).
#[derive(Debug, Clone, PartialEq, Eq, Default, Hash, RlpEncodableWrapper, RlpDecodableWrapper)]
pub struct AccessList(pub Vec<AccessListItem>);

impl Deref for AccessList {
    type Target = Vec<AccessListItem>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// A single access-list entry.
#[derive(Debug, Clone, PartialEq, Eq, Default, Hash, RlpEncodable, RlpDecodable)]
pub struct AccessListItem {
    /// Account address to be accessed.
    pub address: Address,
    /// Storage keys to be accessed.
    pub storage_keys: Vec<B256>,
}

/// Legacy pre-EIP-2718 transaction.
///
/// The signature scalars are carried inline so the codec is exactly the
/// consensus list layout; `v` retains its raw (possibly EIP-155 folded) value.
#[derive(Debug, Clone, PartialEq, Eq, Default, Hash, RlpEncodable, RlpDecodable)]
pub struct TxLegacy {
    /// A scalar value equal to the number of transactions sent by the sender.
    pub nonce: u64,
    /// A scalar value equal to the number of wei paid per unit of gas.
    pub gas_price: u128,
    /// A scalar value equal to the maximum amount of gas that should be used
    /// in executing this transaction.
    pub gas_limit: u64,
    /// The recipient, or [`TxKind::Create`] for contract creation.
    pub to: TxKind,
    /// A scalar value equal to the number of wei to be transferred.
    pub value: U256,
    /// Input data of the transaction.
    pub input: Bytes,
    /// Raw recovery id, possibly folded with a chain id per EIP-155.
    pub v: u64,
    /// Signature r value.
    pub r: U256,
    /// Signature s value.
    pub s: U256,
}

/// EIP-2930 access-list transaction.
#[derive(Debug, Clone, PartialEq, Eq, Default, Hash, RlpEncodable, RlpDecodable)]
pub struct TxEip2930 {
    /// Chain id of the network the transaction is valid on.
    pub chain_id: u64,
    /// Sender nonce.
    pub nonce: u64,
    /// Gas price in wei.
    pub gas_price: u128,
    /// Gas limit.
    pub gas_limit: u64,
    /// The recipient, or [`TxKind::Create`] for contract creation.
    pub to: TxKind,
    /// Transferred value in wei.
    pub value: U256,
    /// Input data of the transaction.
    pub input: Bytes,
    /// Warmed addresses and storage slots.
    pub access_list: AccessList,
    /// Signature parity bit.
    pub odd_y_parity: bool,
    /// Signature r value.
    pub r: U256,
    /// Signature s value.
    pub s: U256,
}

/// EIP-1559 dynamic-fee transaction.
#[derive(Debug, Clone, PartialEq, Eq, Default, Hash, RlpEncodable, RlpDecodable)]
pub struct TxEip1559 {
    /// Chain id of the network the transaction is valid on.
    pub chain_id: u64,
    /// Sender nonce.
    pub nonce: u64,
    /// Maximum priority fee per gas, in wei.
    pub max_priority_fee_per_gas: u128,
    /// Maximum total fee per gas, in wei.
    pub max_fee_per_gas: u128,
    /// Gas limit.
    pub gas_limit: u64,
    /// The recipient, or [`TxKind::Create`] for contract creation.
    pub to: TxKind,
    /// Transferred value in wei.
    pub value: U256,
    /// Input data of the transaction.
    pub input: Bytes,
    /// Warmed addresses and storage slots.
    pub access_list: AccessList,
    /// Signature parity bit.
    pub odd_y_parity: bool,
    /// Signature r value.
    pub r: U256,
    /// Signature s value.
    pub s: U256,
}

/// EIP-4844 blob transaction.
///
/// Blob transactions must name a recipient, so `to` is a plain [`Address`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Hash, RlpEncodable, RlpDecodable)]
pub struct TxEip4844 {
    /// Chain id of the network the transaction is valid on.
    pub chain_id: u64,
    /// Sender nonce.
    pub nonce: u64,
    /// Maximum priority fee per gas, in wei.
    pub max_priority_fee_per_gas: u128,
    /// Maximum total fee per gas, in wei.
    pub max_fee_per_gas: u128,
    /// Gas limit.
    pub gas_limit: u64,
    /// The recipient of the transaction.
    pub to: Address,
    /// Transferred value in wei.
    pub value: U256,
    /// Input data of the transaction.
    pub input: Bytes,
    /// Warmed addresses and storage slots.
    pub access_list: AccessList,
    /// Maximum fee per blob gas, in wei.
    pub max_fee_per_blob_gas: u128,
    /// Commitments to the blobs carried alongside this transaction.
    pub blob_versioned_hashes: Vec<B256>,
    /// Signature parity bit.
    pub odd_y_parity: bool,
    /// Signature r value.
    pub r: U256,
    /// Signature s value.
    pub s: U256,
}

/// The EIP-2718 transaction type identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TxType {
    /// Legacy transaction.
    Legacy = 0,
    /// EIP-2930 access-list transaction.
    Eip2930 = 1,
    /// EIP-1559 dynamic-fee transaction.
    Eip1559 = 2,
    /// EIP-4844 blob transaction.
    Eip4844 = 3,
}

/// A signed transaction in any of the supported envelope formats.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TransactionSigned {
    /// Legacy transaction.
    Legacy(TxLegacy),
    /// EIP-2930 transaction.
    Eip2930(TxEip2930),
    /// EIP-1559 transaction.
    Eip1559(TxEip1559),
    /// EIP-4844 transaction.
    Eip4844(TxEip4844),
}

impl TransactionSigned {
    /// The EIP-2718 type of this transaction.
    pub fn tx_type(&self) -> TxType {
        match self {
            Self::Legacy(_) => TxType::Legacy,
            Self::Eip2930(_) => TxType::Eip2930,
            Self::Eip1559(_) => TxType::Eip1559,
            Self::Eip4844(_) => TxType::Eip4844,
        }
    }

    /// Returns `true` if this is a blob transaction.
    pub fn is_eip4844(&self) -> bool {
        matches!(self, Self::Eip4844(_))
    }

    /// The versioned hashes committed to by a blob transaction, `None` for
    /// all other types.
    pub fn blob_versioned_hashes(&self) -> Option<&[B256]> {
        match self {
            Self::Eip4844(tx) => Some(&tx.blob_versioned_hashes),
            _ => None,
        }
    }

    /// Blob gas consumed by a blob transaction, `None` for all other types.
    pub fn blob_gas_used(&self) -> Option<u64> {
        match self {
            Self::Eip4844(tx) => Some(tx.blob_versioned_hashes.len() as u64 * DATA_GAS_PER_BLOB),
            _ => None,
        }
    }

    /// Encodes the transaction in its network envelope form: the raw RLP list
    /// for legacy transactions, a type byte followed by the RLP list for
    /// typed transactions.
    pub fn encode_enveloped(&self, out: &mut Vec<u8>) {
        match self {
            Self::Legacy(tx) => tx.encode(out),
            Self::Eip2930(tx) => {
                out.push(TxType::Eip2930 as u8);
                tx.encode(out);
            }
            Self::Eip1559(tx) => {
                out.push(TxType::Eip1559 as u8);
                tx.encode(out);
            }
            Self::Eip4844(tx) => {
                out.push(TxType::Eip4844 as u8);
                tx.encode(out);
            }
        }
    }

    /// Returns the envelope encoding as freshly allocated bytes.
    pub fn envelope_encoded(&self) -> Bytes {
        let mut buf = Vec::new();
        self.encode_enveloped(&mut buf);
        buf.into()
    }

    /// The transaction hash: keccak of the envelope encoding.
    pub fn hash(&self) -> TxHash {
        keccak256(self.envelope_encoded())
    }

    /// Decodes a transaction from its network envelope form.
    pub fn decode_enveloped(buf: &mut &[u8]) -> alloy_rlp::Result<Self> {
        let first = *buf.first().ok_or(alloy_rlp::Error::InputTooShort)?;
        // Legacy transactions start with their RLP list header.
        if first >= 0xc0 {
            return Ok(Self::Legacy(TxLegacy::decode(buf)?));
        }
        *buf = &buf[1..];
        match first {
            1 => Ok(Self::Eip2930(TxEip2930::decode(buf)?)),
            2 => Ok(Self::Eip1559(TxEip1559::decode(buf)?)),
            3 => Ok(Self::Eip4844(TxEip4844::decode(buf)?)),
            _ => Err(alloy_rlp::Error::Custom("unsupported transaction type")),
        }
    }
}
