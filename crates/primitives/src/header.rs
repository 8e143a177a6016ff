use crate::constants::EMPTY_OMMER_ROOT_HASH;
use alloy_primitives::{keccak256, Address, BlockHash, BlockNumber, Bloom, Bytes, B256, B64, U256};
use alloy_rlp::{Decodable, Encodable, Header as RlpHeader};
use std::ops::Deref;

/// An Ethereum block header.
///
/// Fields introduced by later forks are optional; encoding follows the
/// conditional-tail scheme, so a header only carries the fields its fork
/// defines.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Header {
    /// The Keccak 256-bit hash of the parent block's header.
    pub parent_hash: B256,
    /// The Keccak 256-bit hash of the ommers list portion of this block.
    pub ommers_hash: B256,
    /// The 160-bit address to which all fees collected from the successful
    /// mining of this block are transferred.
    pub beneficiary: Address,
    /// The Keccak 256-bit hash of the root node of the state trie, after all
    /// transactions are executed and finalisations applied.
    pub state_root: B256,
    /// The commitment to the transactions list portion of the block.
    pub transactions_root: B256,
    /// The commitment to the receipts of each transaction in the block.
    pub receipts_root: B256,
    /// The Bloom filter composed from indexable information contained in each
    /// log entry from the receipt of each transaction.
    pub logs_bloom: Bloom,
    /// A scalar value corresponding to the difficulty level of this block.
    /// Zero for all post-merge blocks.
    pub difficulty: U256,
    /// A scalar value equal to the number of ancestor blocks.
    pub number: BlockNumber,
    /// A scalar value equal to the current limit of gas expenditure per block.
    pub gas_limit: u64,
    /// A scalar value equal to the total gas used in transactions in this block.
    pub gas_used: u64,
    /// A scalar value equal to the reasonable output of Unix time() at this
    /// block's inception.
    pub timestamp: u64,
    /// An arbitrary byte array containing data relevant to this block. Must be
    /// 32 bytes or fewer.
    pub extra_data: Bytes,
    /// Pre-merge: the PoW mix hash. Post-merge: the `prevRandao` value.
    pub mix_hash: B256,
    /// Pre-merge PoW nonce. Zero for all post-merge blocks.
    pub nonce: B64,
    /// Base fee per gas introduced by EIP-1559.
    pub base_fee_per_gas: Option<u64>,
    /// The commitment to the withdrawals list, introduced by EIP-4895.
    pub withdrawals_root: Option<B256>,
    /// The total amount of blob gas consumed by the transactions within the
    /// block, introduced by EIP-4844.
    pub blob_gas_used: Option<u64>,
    /// A running total of blob gas consumed in excess of the target, prior to
    /// this block, introduced by EIP-4844.
    pub excess_blob_gas: Option<u64>,
    /// The hash of the parent beacon block's root, introduced by EIP-4788.
    pub parent_beacon_block_root: Option<B256>,
}

impl Default for Header {
    fn default() -> Self {
        Self {
            parent_hash: B256::ZERO,
            ommers_hash: EMPTY_OMMER_ROOT_HASH,
            beneficiary: Address::ZERO,
            state_root: B256::ZERO,
            transactions_root: B256::ZERO,
            receipts_root: B256::ZERO,
            logs_bloom: Bloom::default(),
            difficulty: U256::ZERO,
            number: 0,
            gas_limit: 0,
            gas_used: 0,
            timestamp: 0,
            extra_data: Bytes::new(),
            mix_hash: B256::ZERO,
            nonce: B64::ZERO,
            base_fee_per_gas: None,
            withdrawals_root: None,
            blob_gas_used: None,
            excess_blob_gas: None,
            parent_beacon_block_root: None,
        }
    }
}

impl Header {
    /// Computes the block hash by hashing the RLP encoding of this header.
    pub fn hash_slow(&self) -> BlockHash {
        let mut buf = Vec::with_capacity(self.length());
        self.encode(&mut buf);
        keccak256(&buf)
    }

    /// Seals the header, memoizing its hash.
    pub fn seal_slow(self) -> SealedHeader {
        let hash = self.hash_slow();
        SealedHeader { header: self, hash }
    }

    fn rlp_payload_length(&self) -> usize {
        let mut length = 0;
        length += self.parent_hash.length();
        length += self.ommers_hash.length();
        length += self.beneficiary.length();
        length += self.state_root.length();
        length += self.transactions_root.length();
        length += self.receipts_root.length();
        length += self.logs_bloom.length();
        length += self.difficulty.length();
        length += self.number.length();
        length += self.gas_limit.length();
        length += self.gas_used.length();
        length += self.timestamp.length();
        length += self.extra_data.length();
        length += self.mix_hash.length();
        length += self.nonce.length();
        if let Some(base_fee) = self.base_fee_per_gas {
            length += base_fee.length();
        }
        if let Some(root) = self.withdrawals_root {
            length += root.length();
        }
        if let Some(blob_gas_used) = self.blob_gas_used {
            length += blob_gas_used.length();
        }
        if let Some(excess_blob_gas) = self.excess_blob_gas {
            length += excess_blob_gas.length();
        }
        if let Some(root) = self.parent_beacon_block_root {
            length += root.length();
        }
        length
    }
}

impl Encodable for Header {
    fn encode(&self, out: &mut dyn alloy_rlp::BufMut) {
        RlpHeader { list: true, payload_length: self.rlp_payload_length() }.encode(out);
        self.parent_hash.encode(out);
        self.ommers_hash.encode(out);
        self.beneficiary.encode(out);
        self.state_root.encode(out);
        self.transactions_root.encode(out);
        self.receipts_root.encode(out);
        self.logs_bloom.encode(out);
        self.difficulty.encode(out);
        self.number.encode(out);
        self.gas_limit.encode(out);
        self.gas_used.encode(out);
        self.timestamp.encode(out);
        self.extra_data.encode(out);
        self.mix_hash.encode(out);
        self.nonce.encode(out);

        // The tail fields are fork-gated: a header only encodes a field if it
        // also encodes every earlier tail field of its fork lineage.
        if let Some(base_fee) = self.base_fee_per_gas {
            base_fee.encode(out);
        }
        if let Some(root) = self.withdrawals_root {
            root.encode(out);
        }
        if let Some(blob_gas_used) = self.blob_gas_used {
            blob_gas_used.encode(out);
        }
        if let Some(excess_blob_gas) = self.excess_blob_gas {
            excess_blob_gas.encode(out);
        }
        if let Some(root) = self.parent_beacon_block_root {
            root.encode(out);
        }
    }

    fn length(&self) -> usize {
        let payload_length = self.rlp_payload_length();
        payload_length + alloy_rlp::length_of_length(payload_length)
    }
}

impl Decodable for Header {
    fn decode(buf: &mut &[u8]) -> alloy_rlp::Result<Self> {
        let rlp_head = RlpHeader::decode(buf)?;
        if !rlp_head.list {
            return Err(alloy_rlp::Error::UnexpectedString);
        }
        let started_len = buf.len();
        let mut this = Self {
            parent_hash: Decodable::decode(buf)?,
            ommers_hash: Decodable::decode(buf)?,
            beneficiary: Decodable::decode(buf)?,
            state_root: Decodable::decode(buf)?,
            transactions_root: Decodable::decode(buf)?,
            receipts_root: Decodable::decode(buf)?,
            logs_bloom: Decodable::decode(buf)?,
            difficulty: Decodable::decode(buf)?,
            number: Decodable::decode(buf)?,
            gas_limit: Decodable::decode(buf)?,
            gas_used: Decodable::decode(buf)?,
            timestamp: Decodable::decode(buf)?,
            extra_data: Decodable::decode(buf)?,
            mix_hash: Decodable::decode(buf)?,
            nonce: Decodable::decode(buf)?,
            base_fee_per_gas: None,
            withdrawals_root: None,
            blob_gas_used: None,
            excess_blob_gas: None,
            parent_beacon_block_root: None,
        };

        if started_len - buf.len() < rlp_head.payload_length {
            this.base_fee_per_gas = Some(Decodable::decode(buf)?);
        }
        if started_len - buf.len() < rlp_head.payload_length {
            this.withdrawals_root = Some(Decodable::decode(buf)?);
        }
        if started_len - buf.len() < rlp_head.payload_length {
            this.blob_gas_used = Some(Decodable::decode(buf)?);
        }
        if started_len - buf.len() < rlp_head.payload_length {
            this.excess_blob_gas = Some(Decodable::decode(buf)?);
        }
        if started_len - buf.len() < rlp_head.payload_length {
            this.parent_beacon_block_root = Some(Decodable::decode(buf)?);
        }

        let consumed = started_len - buf.len();
        if consumed != rlp_head.payload_length {
            return Err(alloy_rlp::Error::ListLengthMismatch {
                expected: rlp_head.payload_length,
                got: consumed,
            });
        }
        Ok(this)
    }
}

/// A [`Header`] with its memoized block hash.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SealedHeader {
    header: Header,
    hash: BlockHash,
}

impl SealedHeader {
    /// Creates a sealed header from its parts without re-hashing.
    ///
    /// The caller is responsible for `hash` matching the header.
    pub fn new(header: Header, hash: BlockHash) -> Self {
        Self { header, hash }
    }

    /// The memoized block hash.
    pub fn hash(&self) -> BlockHash {
        self.hash
    }

    /// Returns the wrapped header.
    pub fn unseal(self) -> Header {
        self.header
    }

    /// Returns a reference to the wrapped header.
    pub fn header(&self) -> &Header {
        &self.header
    }
}

impl Deref for SealedHeader {
    type Target = Header;

    fn deref(&self) -> &Self::Target {
        &self.header
    }
}
