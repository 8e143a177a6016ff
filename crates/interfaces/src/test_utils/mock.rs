use crate::{
    executor::{BlockExecutionError, BlockExecutor},
    payload::{BuiltPayload, PayloadBuildArguments, PayloadBuilderError, PayloadJobGenerator},
    pool::PoolMaintenance,
    provider::{BlockProvider, HeaderProvider, ProviderError, ProviderResult},
    sync::SkeletonSync,
};
use alloy_primitives::{BlockNumber, B256, B64, U256};
use corten_primitives::{ChainInfo, PayloadId, SealedBlock, SealedHeader};
use parking_lot::Mutex;
use std::{
    collections::{BTreeMap, HashMap, HashSet},
    sync::Arc,
};

/// A mock implementation of the chain store and VM in one object.
///
/// All state lives behind shared `Arc<Mutex<_>>` maps, so clones observe the
/// same chain while the engine under test owns another clone.
#[derive(Debug, Clone, Default)]
pub struct MockChain {
    /// All known blocks, canonical or not.
    pub blocks: Arc<Mutex<HashMap<B256, Arc<SealedBlock>>>>,
    /// Canonical chain index: number to hash.
    pub canonical: Arc<Mutex<BTreeMap<BlockNumber, B256>>>,
    /// Total difficulty per block hash.
    pub td: Arc<Mutex<HashMap<B256, U256>>>,
    /// State roots available in the state trie.
    pub state_roots: Arc<Mutex<HashSet<B256>>>,
    /// The block whose state the VM currently reflects.
    pub vm_head: Arc<Mutex<Option<B256>>>,
    /// Hashes of the blocks executed, in order.
    pub executed: Arc<Mutex<Vec<B256>>>,
    /// Hashes of the blocks executed with `force`.
    pub forced: Arc<Mutex<Vec<B256>>>,
    /// Blocks whose execution is configured to fail.
    pub fail_execution: Arc<Mutex<HashSet<B256>>>,
    /// Error message `set_head` is configured to fail with.
    pub fail_set_head: Arc<Mutex<Option<String>>>,
    /// Deleted block hashes, in order.
    pub deleted: Arc<Mutex<Vec<B256>>>,
    /// Arguments of every `set_head` call: block hashes, safe, finalized.
    pub set_head_calls: Arc<Mutex<Vec<(Vec<B256>, Option<B256>, Option<B256>)>>>,
}

impl MockChain {
    /// Creates a new, empty instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the block known without making it canonical.
    pub fn insert_block(&self, block: Arc<SealedBlock>) {
        self.blocks.lock().insert(block.hash(), block);
    }

    /// Makes the block known and canonical at its height.
    pub fn insert_canonical(&self, block: Arc<SealedBlock>) {
        self.canonical.lock().insert(block.number(), block.hash());
        self.insert_block(block);
    }

    /// Makes the block canonical, executed and the VM head: the shape of a
    /// fully synced tip.
    pub fn insert_executed_head(&self, block: Arc<SealedBlock>) {
        self.state_roots.lock().insert(block.header().state_root);
        *self.vm_head.lock() = Some(block.hash());
        self.insert_canonical(block);
    }

    /// Sets the total difficulty of a block.
    pub fn set_td(&self, hash: B256, td: U256) {
        self.td.lock().insert(hash, td);
    }

    /// Makes a state root available.
    pub fn add_state_root(&self, root: B256) {
        self.state_roots.lock().insert(root);
    }

    /// Configures execution of the given block to fail.
    pub fn fail_execution_of(&self, hash: B256) {
        self.fail_execution.lock().insert(hash);
    }

    /// Configures `set_head` to fail with the given message.
    pub fn fail_set_head_with(&self, message: impl Into<String>) {
        *self.fail_set_head.lock() = Some(message.into());
    }

    /// The number of blocks executed so far.
    pub fn executed_count(&self) -> usize {
        self.executed.lock().len()
    }
}

impl HeaderProvider for MockChain {
    fn sealed_header(&self, hash: &B256) -> ProviderResult<Option<SealedHeader>> {
        Ok(self.blocks.lock().get(hash).map(|block| block.header().clone()))
    }

    fn total_difficulty(&self, hash: &B256) -> ProviderResult<Option<U256>> {
        Ok(self.td.lock().get(hash).copied())
    }

    fn latest_header(&self) -> ProviderResult<SealedHeader> {
        let canonical = self.canonical.lock();
        let (_, hash) = canonical
            .iter()
            .next_back()
            .ok_or_else(|| ProviderError::Storage("empty chain".to_string()))?;
        self.blocks
            .lock()
            .get(hash)
            .map(|block| block.header().clone())
            .ok_or(ProviderError::Inconsistent(*hash))
    }
}

impl BlockProvider for MockChain {
    fn block_by_hash(&self, hash: &B256) -> ProviderResult<Option<Arc<SealedBlock>>> {
        Ok(self.blocks.lock().get(hash).cloned())
    }

    fn block_by_number(&self, number: BlockNumber) -> ProviderResult<Option<Arc<SealedBlock>>> {
        let canonical = self.canonical.lock();
        let Some(hash) = canonical.get(&number) else { return Ok(None) };
        Ok(self.blocks.lock().get(hash).cloned())
    }

    fn block_hash(&self, number: BlockNumber) -> ProviderResult<Option<B256>> {
        Ok(self.canonical.lock().get(&number).copied())
    }

    fn chain_info(&self) -> ProviderResult<ChainInfo> {
        let canonical = self.canonical.lock();
        let (number, hash) = canonical
            .iter()
            .next_back()
            .ok_or_else(|| ProviderError::Storage("empty chain".to_string()))?;
        Ok(ChainInfo { best_hash: *hash, best_number: *number })
    }
}

impl BlockExecutor for MockChain {
    fn vm_head(&self) -> Result<SealedHeader, BlockExecutionError> {
        let hash = self
            .vm_head
            .lock()
            .ok_or_else(|| ProviderError::Storage("vm head not set".to_string()))?;
        self.sealed_header(&hash)?.ok_or(BlockExecutionError::Provider(
            ProviderError::Inconsistent(hash),
        ))
    }

    fn has_state_root(&self, root: &B256) -> Result<bool, BlockExecutionError> {
        Ok(self.state_roots.lock().contains(root))
    }

    fn execute_block(
        &self,
        block: &SealedBlock,
        _parent_state_root: B256,
        force: bool,
    ) -> Result<(), BlockExecutionError> {
        if self.fail_execution.lock().contains(&block.hash()) {
            return Err(BlockExecutionError::Execution("mock execution failure".to_string()));
        }
        self.executed.lock().push(block.hash());
        if force {
            self.forced.lock().push(block.hash());
        }
        self.state_roots.lock().insert(block.header().state_root);
        Ok(())
    }

    fn set_head(
        &self,
        blocks: &[Arc<SealedBlock>],
        safe: Option<Arc<SealedBlock>>,
        finalized: Option<Arc<SealedBlock>>,
    ) -> Result<(), BlockExecutionError> {
        if let Some(message) = self.fail_set_head.lock().clone() {
            return Err(BlockExecutionError::SetHead(message));
        }
        self.set_head_calls.lock().push((
            blocks.iter().map(|block| block.hash()).collect(),
            safe.map(|block| block.hash()),
            finalized.map(|block| block.hash()),
        ));
        for block in blocks {
            self.insert_canonical(block.clone());
        }
        if let Some(head) = blocks.last() {
            *self.vm_head.lock() = Some(head.hash());
        }
        Ok(())
    }

    fn delete_block(&self, hash: &B256) -> Result<(), BlockExecutionError> {
        if let Some(block) = self.blocks.lock().remove(hash) {
            self.canonical.lock().remove(&block.number());
        }
        self.deleted.lock().push(*hash);
        Ok(())
    }
}

/// A mock beacon-sync skeleton.
#[derive(Debug, Clone, Default)]
pub struct MockSkeleton {
    /// Whether beacon sync is running.
    pub running: Arc<Mutex<bool>>,
    /// Number of `activate` calls.
    pub activations: Arc<Mutex<usize>>,
    /// Blocks tracked by the skeleton.
    pub blocks: Arc<Mutex<HashMap<B256, Arc<SealedBlock>>>>,
    /// Whether `try_extend` accepts offered blocks.
    pub accept_extensions: Arc<Mutex<bool>>,
    /// Hashes offered via `try_extend`, in order.
    pub extended: Arc<Mutex<Vec<B256>>>,
    /// The current skeleton head.
    pub head: Arc<Mutex<Option<B256>>>,
    /// Deleted block hashes, in order.
    pub deleted: Arc<Mutex<Vec<B256>>>,
}

impl MockSkeleton {
    /// Creates a new skeleton that rejects optimistic extensions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new skeleton that accepts optimistic extensions.
    pub fn accepting() -> Self {
        let skeleton = Self::default();
        *skeleton.accept_extensions.lock() = true;
        skeleton
    }

    /// Makes a block known to the skeleton.
    pub fn insert_block(&self, block: Arc<SealedBlock>) {
        self.blocks.lock().insert(block.hash(), block);
    }
}

impl SkeletonSync for MockSkeleton {
    fn is_running(&self) -> bool {
        *self.running.lock()
    }

    fn activate(&self) {
        *self.running.lock() = true;
        *self.activations.lock() += 1;
    }

    fn block_by_hash(&self, hash: &B256) -> ProviderResult<Option<Arc<SealedBlock>>> {
        Ok(self.blocks.lock().get(hash).cloned())
    }

    fn try_extend(&self, block: Arc<SealedBlock>) -> ProviderResult<bool> {
        self.extended.lock().push(block.hash());
        if *self.accept_extensions.lock() {
            self.insert_block(block);
            return Ok(true);
        }
        Ok(false)
    }

    fn set_head(&self, block: Arc<SealedBlock>) -> ProviderResult<()> {
        *self.head.lock() = Some(block.hash());
        self.insert_block(block);
        Ok(())
    }

    fn delete_block(&self, hash: &B256) -> bool {
        self.deleted.lock().push(*hash);
        self.blocks.lock().remove(hash).is_some()
    }
}

/// A mock payload builder handing out sequential payload ids.
#[derive(Debug, Clone, Default)]
pub struct MockBuilder {
    /// Build jobs started, in order.
    pub started: Arc<Mutex<Vec<PayloadBuildArguments>>>,
    /// Payloads retrievable by id.
    pub payloads: Arc<Mutex<HashMap<PayloadId, BuiltPayload>>>,
    next_id: Arc<Mutex<u64>>,
}

impl MockBuilder {
    /// Creates a new, empty instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a built payload under the given id.
    pub fn insert_payload(&self, id: PayloadId, payload: BuiltPayload) {
        self.payloads.lock().insert(id, payload);
    }

    /// The id the next build job will be assigned.
    pub fn peek_next_id(&self) -> PayloadId {
        B64::new((*self.next_id.lock() + 1).to_be_bytes())
    }
}

impl PayloadJobGenerator for MockBuilder {
    fn start_build(&self, args: PayloadBuildArguments) -> Result<PayloadId, PayloadBuilderError> {
        self.started.lock().push(args);
        let mut next_id = self.next_id.lock();
        *next_id += 1;
        Ok(B64::new(next_id.to_be_bytes()))
    }

    fn built_payload(&self, id: PayloadId) -> Option<BuiltPayload> {
        self.payloads.lock().get(&id).cloned()
    }
}

/// A mock transaction pool recording maintenance calls.
#[derive(Debug, Clone, Default)]
pub struct MockPool {
    /// Hashes of blocks whose transactions were removed, in order.
    pub removed_for: Arc<Mutex<Vec<B256>>>,
    /// Number of `resume` calls.
    pub resumed: Arc<Mutex<usize>>,
}

impl MockPool {
    /// Creates a new, empty instance.
    pub fn new() -> Self {
        Self::default()
    }
}

impl PoolMaintenance for MockPool {
    fn remove_mined_transactions(&self, blocks: &[Arc<SealedBlock>]) {
        self.removed_for.lock().extend(blocks.iter().map(|block| block.hash()));
    }

    fn resume(&self) {
        *self.resumed.lock() += 1;
    }
}
