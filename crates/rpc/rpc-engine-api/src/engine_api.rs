use crate::{
    cache::EngineBlockCache,
    capabilities::EngineCapabilities,
    compat::{
        block_to_payload_body_v1, block_to_payload_field_v2, block_to_payload_v1,
        block_to_payload_v3, convert_standalone_withdraw_to_withdrawal, try_into_sealed_block,
    },
    config::EngineConfig,
    error::{EngineApiError, EngineApiResult},
    message::{EngineApiHandle, EngineApiMessage},
    metrics::EngineApiMetrics,
    version::{
        validate_attributes_version, validate_payload_timestamp, validate_withdrawals_presence,
        EngineApiMessageVersion, EngineObjectValidationError,
    },
    MAX_PAYLOAD_BODIES_LIMIT,
};
use alloy_primitives::{B256, U256};
use corten_interfaces::{
    BlockExecutionError, BlockExecutor, BlockProvider, BuiltPayload, PayloadBuildArguments,
    PayloadJobGenerator, PoolMaintenance, SkeletonSync,
};
use corten_primitives::{eip4844, ChainSpec, Hardfork, PayloadId, SealedBlock, Withdrawals};
use corten_rpc_types::{
    BlobsBundleV1, ExecutionPayload, ExecutionPayloadBodyV1, ExecutionPayloadEnvelopeV2,
    ExecutionPayloadEnvelopeV3, ExecutionPayloadInputV2, ExecutionPayloadV1, ExecutionPayloadV3,
    ForkchoiceState, ForkchoiceUpdated, PayloadAttributes, PayloadStatus, PayloadStatusEnum,
    TransitionConfiguration,
};
use futures::StreamExt;
use std::{
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{ready, Context, Poll},
    time::Instant,
};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{debug, info, warn};

/// Outcome of the bounded ancestor walk.
#[derive(Debug)]
enum AncestorWalk {
    /// More than the permitted number of blocks separate the target from the
    /// VM head.
    DepthExceeded(u64),
    /// An ancestor could not be resolved from the caches or the store.
    MissingAncestor(B256),
}

/// The Engine API implementation that grants the consensus layer access to
/// data and functions in the execution layer that are crucial for the
/// consensus process.
///
/// The engine runs as a single task over a message channel, so requests are
/// handled strictly one at a time and the block caches never need locking.
#[must_use = "EngineApi does nothing unless polled."]
pub struct EngineApi<Client, Skeleton, Builder, Pool> {
    client: Arc<Client>,
    /// Consensus configuration
    chain_spec: Arc<ChainSpec>,
    beacon_sync: Skeleton,
    payload_builder: Builder,
    pool: Pool,
    config: EngineConfig,
    rx: UnboundedReceiverStream<EngineApiMessage>,
    /// Blocks seen via payload but not yet canonical, plus blocks whose state
    /// transition has been applied but not committed.
    blocks: EngineBlockCache,
    last_new_payload_fork: Option<Hardfork>,
    last_forkchoice_fork: Option<Hardfork>,
    synchronized: bool,
    capabilities: EngineCapabilities,
    metrics: EngineApiMetrics,
}

impl<Client, Skeleton, Builder, Pool> EngineApi<Client, Skeleton, Builder, Pool>
where
    Client: BlockProvider + BlockExecutor,
    Skeleton: SkeletonSync,
    Builder: PayloadJobGenerator,
    Pool: PoolMaintenance,
{
    /// Creates the engine task and the handle the transport talks to it
    /// through.
    pub fn new(
        client: Arc<Client>,
        chain_spec: Arc<ChainSpec>,
        beacon_sync: Skeleton,
        payload_builder: Builder,
        pool: Pool,
        config: EngineConfig,
    ) -> (Self, EngineApiHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let engine = Self {
            client,
            chain_spec,
            beacon_sync,
            payload_builder,
            pool,
            config,
            rx: UnboundedReceiverStream::new(rx),
            blocks: EngineBlockCache::default(),
            last_new_payload_fork: None,
            last_forkchoice_fork: None,
            synchronized: false,
            capabilities: EngineCapabilities::default(),
            metrics: EngineApiMetrics::default(),
        };
        (engine, EngineApiHandle::new(tx))
    }

    fn on_message(&mut self, message: EngineApiMessage) {
        match message {
            EngineApiMessage::NewPayloadV1(payload, tx) => {
                let start = Instant::now();
                let gas_used = payload.gas_used.to::<u64>();
                let result = self.new_payload_v1(payload);
                let elapsed = start.elapsed();
                self.metrics.latency.new_payload_v1.record(elapsed);
                self.metrics.new_payload_response.update_response_metrics(
                    &result, gas_used, elapsed,
                );
                let _ = tx.send(result);
            }
            EngineApiMessage::NewPayloadV2(payload, tx) => {
                let start = Instant::now();
                let gas_used = payload.execution_payload.gas_used.to::<u64>();
                let result = self.new_payload_v2(payload);
                let elapsed = start.elapsed();
                self.metrics.latency.new_payload_v2.record(elapsed);
                self.metrics.new_payload_response.update_response_metrics(
                    &result, gas_used, elapsed,
                );
                let _ = tx.send(result);
            }
            EngineApiMessage::NewPayloadV3(payload, versioned_hashes, parent_beacon_root, tx) => {
                let start = Instant::now();
                let gas_used = payload.payload_inner.payload_inner.gas_used.to::<u64>();
                let result = self.new_payload_v3(payload, versioned_hashes, parent_beacon_root);
                let elapsed = start.elapsed();
                self.metrics.latency.new_payload_v3.record(elapsed);
                self.metrics.new_payload_response.update_response_metrics(
                    &result, gas_used, elapsed,
                );
                let _ = tx.send(result);
            }
            EngineApiMessage::ForkchoiceUpdatedV1(state, attrs, tx) => {
                let start = Instant::now();
                let result = self.fork_choice_updated_v1(state, attrs);
                self.metrics.latency.fork_choice_updated_v1.record(start.elapsed());
                self.metrics.fcu_response.update_response_metrics(&result);
                let _ = tx.send(result);
            }
            EngineApiMessage::ForkchoiceUpdatedV2(state, attrs, tx) => {
                let start = Instant::now();
                let result = self.fork_choice_updated_v2(state, attrs);
                self.metrics.latency.fork_choice_updated_v2.record(start.elapsed());
                self.metrics.fcu_response.update_response_metrics(&result);
                let _ = tx.send(result);
            }
            EngineApiMessage::ForkchoiceUpdatedV3(state, attrs, tx) => {
                let start = Instant::now();
                let result = self.fork_choice_updated_v3(state, attrs);
                self.metrics.latency.fork_choice_updated_v3.record(start.elapsed());
                self.metrics.fcu_response.update_response_metrics(&result);
                let _ = tx.send(result);
            }
            EngineApiMessage::GetPayloadV1(id, tx) => {
                let start = Instant::now();
                let result = self.get_payload_v1(id);
                self.metrics.latency.get_payload_v1.record(start.elapsed());
                let _ = tx.send(result);
            }
            EngineApiMessage::GetPayloadV2(id, tx) => {
                let start = Instant::now();
                let result = self.get_payload_v2(id);
                self.metrics.latency.get_payload_v2.record(start.elapsed());
                let _ = tx.send(result);
            }
            EngineApiMessage::GetPayloadV3(id, tx) => {
                let start = Instant::now();
                let result = self.get_payload_v3(id);
                self.metrics.latency.get_payload_v3.record(start.elapsed());
                let _ = tx.send(result);
            }
            EngineApiMessage::GetPayloadBodiesByHashV1(hashes, tx) => {
                let start = Instant::now();
                let result = self.get_payload_bodies_by_hash_v1(hashes);
                self.metrics.latency.get_payload_bodies_by_hash_v1.record(start.elapsed());
                let _ = tx.send(result);
            }
            EngineApiMessage::GetPayloadBodiesByRangeV1(first, count, tx) => {
                let start = Instant::now();
                let result = self.get_payload_bodies_by_range_v1(first, count);
                self.metrics.latency.get_payload_bodies_by_range_v1.record(start.elapsed());
                let _ = tx.send(result);
            }
            EngineApiMessage::ExchangeTransitionConfiguration(config, tx) => {
                let start = Instant::now();
                let result = self.exchange_transition_configuration(config);
                self.metrics.latency.exchange_transition_configuration.record(start.elapsed());
                let _ = tx.send(result);
            }
            EngineApiMessage::ExchangeCapabilities(cl_capabilities, tx) => {
                let _ = tx.send(Ok(self.exchange_capabilities(cl_capabilities)));
            }
        }
    }

    // === Version guards ===

    /// Handles `engine_newPayloadV1`: pre-Shanghai payloads only, and the
    /// only method that exposes `INVALID_BLOCK_HASH`.
    pub fn new_payload_v1(
        &mut self,
        payload: ExecutionPayloadV1,
    ) -> EngineApiResult<PayloadStatus> {
        if self.chain_spec.is_shanghai_active_at_timestamp(payload.timestamp.to()) {
            return Err(EngineObjectValidationError::ShanghaiPayloadOnV1.into());
        }
        self.new_payload_inner(payload.into(), None, None)
    }

    /// Handles `engine_newPayloadV2`: accepts the V1/V2 union and folds
    /// `INVALID_BLOCK_HASH` into `INVALID`.
    pub fn new_payload_v2(
        &mut self,
        payload: ExecutionPayloadInputV2,
    ) -> EngineApiResult<PayloadStatus> {
        let timestamp = payload.execution_payload.timestamp.to::<u64>();
        if payload.has_blob_gas_fields() {
            return Err(EngineObjectValidationError::BlobGasFieldsBeforeV3.into());
        }
        validate_payload_timestamp(&self.chain_spec, EngineApiMessageVersion::V2, timestamp)?;
        validate_withdrawals_presence(
            &self.chain_spec,
            EngineApiMessageVersion::V2,
            timestamp,
            payload.withdrawals.is_some(),
        )?;
        let status = self.new_payload_inner(payload.into_payload(), None, None)?;
        Ok(fold_invalid_block_hash(status))
    }

    /// Handles `engine_newPayloadV3`: Cancun payloads only, requires the
    /// expected blob versioned hashes and the parent beacon block root, and
    /// folds `INVALID_BLOCK_HASH` into `INVALID`.
    pub fn new_payload_v3(
        &mut self,
        payload: ExecutionPayloadV3,
        versioned_hashes: Vec<B256>,
        parent_beacon_block_root: B256,
    ) -> EngineApiResult<PayloadStatus> {
        let timestamp = payload.payload_inner.payload_inner.timestamp.to::<u64>();
        validate_payload_timestamp(&self.chain_spec, EngineApiMessageVersion::V3, timestamp)?;
        let status = self.new_payload_inner(
            payload.into(),
            Some(versioned_hashes),
            Some(parent_beacon_block_root),
        )?;
        Ok(fold_invalid_block_hash(status))
    }

    /// Handles `engine_forkchoiceUpdatedV1`.
    pub fn fork_choice_updated_v1(
        &mut self,
        state: ForkchoiceState,
        attrs: Option<PayloadAttributes>,
    ) -> EngineApiResult<ForkchoiceUpdated> {
        self.validate_attributes(EngineApiMessageVersion::V1, attrs.as_ref())?;
        self.fork_choice_updated(state, attrs)
    }

    /// Handles `engine_forkchoiceUpdatedV2`.
    pub fn fork_choice_updated_v2(
        &mut self,
        state: ForkchoiceState,
        attrs: Option<PayloadAttributes>,
    ) -> EngineApiResult<ForkchoiceUpdated> {
        self.validate_attributes(EngineApiMessageVersion::V2, attrs.as_ref())?;
        self.fork_choice_updated(state, attrs)
    }

    /// Handles `engine_forkchoiceUpdatedV3`.
    pub fn fork_choice_updated_v3(
        &mut self,
        state: ForkchoiceState,
        attrs: Option<PayloadAttributes>,
    ) -> EngineApiResult<ForkchoiceUpdated> {
        self.validate_attributes(EngineApiMessageVersion::V3, attrs.as_ref())?;
        self.fork_choice_updated(state, attrs)
    }

    fn validate_attributes(
        &self,
        version: EngineApiMessageVersion,
        attrs: Option<&PayloadAttributes>,
    ) -> EngineApiResult<()> {
        if let Some(attrs) = attrs {
            validate_attributes_version(
                &self.chain_spec,
                version,
                attrs.timestamp.to(),
                attrs.withdrawals.is_some(),
                attrs.parent_beacon_block_root.is_some(),
            )?;
        }
        Ok(())
    }

    // === newPayload ===

    /// When the consensus layer receives a new block via the consensus gossip
    /// protocol, the transactions in the block are sent to the execution
    /// layer in the form of an `ExecutionPayload`. The execution layer
    /// assembles the block, validates it against its parent and, if the
    /// ancestry is close enough to the VM head, executes it without moving
    /// the canonical head.
    fn new_payload_inner(
        &mut self,
        payload: ExecutionPayload,
        versioned_hashes: Option<Vec<B256>>,
        parent_beacon_block_root: Option<B256>,
    ) -> EngineApiResult<PayloadStatus> {
        let block_number = payload.block_number();
        let block_hash = payload.block_hash();
        let parent_hash = payload.parent_hash();
        let timestamp = payload.timestamp();

        debug!(target: "rpc::engine", number = block_number, hash = %block_hash, "received new payload");

        let block = match try_into_sealed_block(payload, parent_beacon_block_root) {
            Ok(block) => Arc::new(block),
            Err(error) => {
                warn!(target: "rpc::engine", %error, hash = %block_hash, "failed to assemble payload");
                let latest_valid_hash = self.valid_hash(parent_hash);
                let status = if error.is_block_hash_mismatch() {
                    PayloadStatusEnum::InvalidBlockHash { validation_error: error.to_string() }
                } else {
                    PayloadStatusEnum::Invalid { validation_error: error.to_string() }
                };
                return Ok(
                    PayloadStatus::from_status(status).with_latest_valid_hash(latest_valid_hash)
                );
            }
        };

        let fork = self.hardfork_of(block_number, timestamp);
        note_hardfork_transition(&mut self.last_new_payload_fork, fork, "newPayload");

        let cancun_active = self.chain_spec.is_cancun_active_at_timestamp(timestamp);
        if let Some(status) =
            self.validate_versioned_hashes(&block, cancun_active, versioned_hashes.as_deref())
        {
            return Ok(status);
        }

        // Short-circuit if the block's state transition was already applied.
        if self.block_executed(&block_hash, block_number)? {
            return Ok(PayloadStatus::new(PayloadStatusEnum::Valid, block_hash));
        }

        let parent = match self.lookup_payload_parent(&parent_hash)? {
            Some(parent) => parent,
            None => {
                debug!(target: "rpc::engine", %parent_hash, "parent block not known");
                return Ok(self.accepted_or_syncing(block));
            }
        };

        // A PoW parent must be the terminal block.
        if parent.header().difficulty > U256::ZERO && !self.is_terminal_block(&parent)? {
            return Ok(PayloadStatus::from_status(PayloadStatusEnum::Invalid {
                validation_error: "parent block is not a valid terminal block".to_string(),
            })
            .with_latest_valid_hash(Some(B256::ZERO)));
        }

        if cancun_active {
            if let Err(error) = eip4844::validate_blob_transactions(&block, parent.header()) {
                return Ok(PayloadStatus::from_status(PayloadStatusEnum::Invalid {
                    validation_error: error.to_string(),
                })
                .with_latest_valid_hash(self.valid_hash(parent_hash)));
            }
        }

        // The parent itself must be executed before we can extend it. This
        // and the missing-parent case above answer the same way; they are
        // only logged apart.
        if !self.block_executed(&parent_hash, parent.number())? {
            debug!(target: "rpc::engine", %parent_hash, "parent block not yet executed");
            return Ok(self.accepted_or_syncing(block));
        }

        self.execute_toward(block)
    }

    /// Runs every not-yet-executed block between the VM head and the new
    /// block (inclusive) through the VM, within the per-request budget.
    fn execute_toward(&mut self, block: Arc<SealedBlock>) -> EngineApiResult<PayloadStatus> {
        let vm_head = self.client.vm_head()?;
        let mut chain = if vm_head.hash() == block.parent_hash() {
            Vec::new()
        } else {
            match self.ancestor_chain(
                vm_head.hash(),
                block.parent_hash(),
                self.config.parent_lookup_max_depth,
            ) {
                Ok(chain) => chain,
                Err(error) => {
                    debug!(target: "rpc::engine", ?error, "cannot bridge payload to vm head");
                    return Ok(self.accepted_or_syncing(block));
                }
            }
        };
        chain.push(block.clone());

        // The root fed to the VM for the oldest block comes from its
        // chain-fetched parent; afterwards each block supplies the next.
        let mut parent_state_root = match self.lookup_state_root(&chain[0].parent_hash())? {
            Some(root) => root,
            None => return Ok(self.accepted_or_syncing(block)),
        };

        for (index, ancestor) in chain.iter().enumerate() {
            if !self.block_executed(&ancestor.hash(), ancestor.number())? {
                let remaining = (chain.len() - index) as u64;
                if remaining > self.config.new_payload_max_execute {
                    debug!(
                        target: "rpc::engine",
                        remaining,
                        budget = self.config.new_payload_max_execute,
                        "too many blocks pending execution"
                    );
                    return Ok(self.accepted_or_syncing(block));
                }
                if let Err(error) = self.client.execute_block(ancestor, parent_state_root, false) {
                    warn!(target: "rpc::engine", %error, hash = %ancestor.hash(), "block execution failed");
                    // Best effort: the offending block must not linger in the
                    // store or the skeleton.
                    let _ = self.client.delete_block(&ancestor.hash());
                    self.beacon_sync.delete_block(&ancestor.hash());
                    return Ok(PayloadStatus::from_status(PayloadStatusEnum::Invalid {
                        validation_error: error.to_string(),
                    })
                    .with_latest_valid_hash(self.valid_hash(ancestor.parent_hash())));
                }
                self.blocks.insert_executed(ancestor.clone());
            }
            parent_state_root = ancestor.header().state_root;
        }

        self.blocks.insert_remote(block.clone());
        Ok(PayloadStatus::new(PayloadStatusEnum::Valid, block.hash()))
    }

    /// Verifies the versioned hashes announced with a payload against the
    /// hashes committed to by its blob transactions, element-wise and in
    /// order.
    fn validate_versioned_hashes(
        &self,
        block: &Arc<SealedBlock>,
        cancun_active: bool,
        received: Option<&[B256]>,
    ) -> Option<PayloadStatus> {
        let validation_error = if !cancun_active {
            received.is_some().then(|| {
                "Error verifying versionedHashes: versioned hashes are not supported before Cancun"
                    .to_string()
            })
        } else {
            match received {
                None => Some(
                    "Error verifying versionedHashes: missing versionedHashes post-Cancun"
                        .to_string(),
                ),
                Some(received) => {
                    let expected = block.blob_versioned_hashes();
                    if expected.len() != received.len() {
                        Some(format!(
                            "Error verifying versionedHashes: expected={} received={}",
                            expected.len(),
                            received.len()
                        ))
                    } else {
                        expected
                            .iter()
                            .zip(received)
                            .position(|(expected, received)| expected != received)
                            .map(|index| {
                                format!(
                                    "Error verifying versionedHashes: mismatch at index {index}"
                                )
                            })
                    }
                }
            }
        };

        validation_error.map(|validation_error| {
            PayloadStatus::from_status(PayloadStatusEnum::Invalid { validation_error })
                .with_latest_valid_hash(self.valid_hash(block.parent_hash()))
        })
    }

    /// Collapses an unjudgeable payload: `SYNCING` if the skeleton linked the
    /// block in, `ACCEPTED` (and remote-cached) otherwise.
    fn accepted_or_syncing(&mut self, block: Arc<SealedBlock>) -> PayloadStatus {
        let optimistic = self.beacon_sync.try_extend(block.clone()).unwrap_or(false);
        if optimistic {
            debug!(target: "rpc::engine", hash = %block.hash(), "payload linked into beacon skeleton");
            PayloadStatus::from_status(PayloadStatusEnum::Syncing)
        } else {
            self.blocks.insert_remote(block);
            PayloadStatus::from_status(PayloadStatusEnum::Accepted)
        }
    }

    // === forkchoiceUpdated ===

    /// Called to resolve chain forks and ensure that the execution layer is
    /// working with the latest valid chain.
    fn fork_choice_updated(
        &mut self,
        state: ForkchoiceState,
        attrs: Option<PayloadAttributes>,
    ) -> EngineApiResult<ForkchoiceUpdated> {
        let ForkchoiceState { head_block_hash, safe_block_hash, finalized_block_hash } = state;

        if head_block_hash.is_zero() {
            return Ok(ForkchoiceUpdated::from_status(PayloadStatusEnum::Invalid {
                validation_error: "forkchoice requested update to zero hash".to_string(),
            }));
        }
        if !finalized_block_hash.is_zero() && safe_block_hash.is_zero() {
            return Err(EngineApiError::FinalizedWithoutSafe);
        }

        if !self.beacon_sync.is_running() && !self.config.disable_beacon_sync {
            self.beacon_sync.activate();
        }

        let Some(head) = self.lookup_forkchoice_head(&head_block_hash)? else {
            debug!(target: "rpc::engine", %head_block_hash, "forkchoice head not known");
            return Ok(ForkchoiceUpdated::from_status(PayloadStatusEnum::Syncing));
        };

        let fork = self.hardfork_of(head.number(), head.header().timestamp);
        note_hardfork_transition(&mut self.last_forkchoice_fork, fork, "forkchoiceUpdated");

        self.beacon_sync.set_head(head.clone())?;

        // A PoW head must be the terminal block.
        if head.header().difficulty > U256::ZERO && !self.is_terminal_block(&head)? {
            return Ok(ForkchoiceUpdated::from_status(PayloadStatusEnum::Invalid {
                validation_error: "block is not a valid terminal block".to_string(),
            })
            .with_latest_valid_hash(B256::ZERO));
        }

        if !self.client.has_state_root(&head.header().state_root)? {
            debug!(target: "rpc::engine", hash = %head.hash(), "forkchoice head not executed");
            return Ok(ForkchoiceUpdated::from_status(PayloadStatusEnum::Syncing));
        }

        let safe = if safe_block_hash.is_zero() {
            None
        } else if safe_block_hash == head.hash() {
            Some(head.clone())
        } else {
            Some(self.lookup_marker(&safe_block_hash)?.ok_or(EngineApiError::UnknownSafeBlock)?)
        };
        let finalized = if finalized_block_hash.is_zero() {
            None
        } else {
            Some(
                self.lookup_marker(&finalized_block_hash)?
                    .ok_or(EngineApiError::UnknownFinalizedBlock)?,
            )
        };

        let vm_head = self.client.vm_head()?;
        if vm_head.hash() != head.hash() {
            let latest = self.client.latest_header()?;
            let ancestors = if latest.number < head.number() {
                match self.ancestor_chain(
                    vm_head.hash(),
                    head.parent_hash(),
                    self.config.parent_lookup_max_depth,
                ) {
                    Ok(ancestors) => ancestors,
                    Err(error) => {
                        debug!(target: "rpc::engine", ?error, "cannot assemble forkchoice ancestry");
                        return Ok(ForkchoiceUpdated::from_status(PayloadStatusEnum::Syncing));
                    }
                }
            } else {
                Vec::new()
            };
            let mut blocks = ancestors;
            blocks.push(head.clone());
            self.client
                .set_head(&blocks, safe.clone(), finalized.clone())
                .map_err(|error| EngineApiError::ForkchoiceUpdate(error.to_string()))?;
            info!(target: "rpc::engine", number = head.number(), hash = %head.hash(), "canonical head updated");
            self.pool.remove_mined_transactions(&blocks);
            if !self.synchronized {
                self.synchronized = true;
                self.pool.resume();
            }
        }

        let mut payload_id = None;
        if let Some(attrs) = attrs {
            let timestamp = attrs.timestamp.to::<u64>();
            if timestamp <= head.header().timestamp {
                return Err(EngineApiError::InvalidPayloadAttributesTimestamp {
                    got: timestamp,
                    need: head.header().timestamp + 1,
                });
            }
            let args = PayloadBuildArguments {
                parent: head.clone(),
                timestamp,
                prev_randao: attrs.prev_randao,
                suggested_fee_recipient: attrs.suggested_fee_recipient,
                withdrawals: attrs.withdrawals.map(|withdrawals| {
                    Withdrawals::new(
                        withdrawals.iter().map(convert_standalone_withdraw_to_withdrawal).collect(),
                    )
                }),
                parent_beacon_block_root: attrs.parent_beacon_block_root,
            };
            let id = self.payload_builder.start_build(args)?;
            debug!(target: "rpc::engine", %id, "started payload build");
            payload_id = Some(id);
        }

        self.prune_caches(finalized.as_deref());

        let mut response = ForkchoiceUpdated::from_status(PayloadStatusEnum::Valid)
            .with_latest_valid_hash(head.hash());
        if let Some(id) = payload_id {
            response = response.with_payload_id(id);
        }
        Ok(response)
    }

    // === getPayload ===

    /// Retrieves a build job's outcome, re-executes the built block against
    /// the VM and caches it as executed.
    fn resolve_built_payload(&mut self, id: PayloadId) -> EngineApiResult<BuiltPayload> {
        let built = self.payload_builder.built_payload(id).ok_or(EngineApiError::UnknownPayload)?;
        let block = built.block.clone();
        let parent_state_root = self.lookup_state_root(&block.parent_hash())?.ok_or_else(|| {
            EngineApiError::BuiltPayloadExecution(BlockExecutionError::Execution(format!(
                "missing parent state root for built block {}",
                block.hash()
            )))
        })?;
        // Forced: the VM may be busy with a competing task, the built block
        // still has to be runnable when the consensus layer asks for it.
        self.client
            .execute_block(&block, parent_state_root, true)
            .map_err(EngineApiError::BuiltPayloadExecution)?;
        self.blocks.insert_executed(block);
        Ok(built)
    }

    /// Handles `engine_getPayloadV1`.
    pub fn get_payload_v1(&mut self, id: PayloadId) -> EngineApiResult<ExecutionPayloadV1> {
        let built = self.resolve_built_payload(id)?;
        Ok(block_to_payload_v1(&built.block))
    }

    /// Handles `engine_getPayloadV2`.
    pub fn get_payload_v2(&mut self, id: PayloadId) -> EngineApiResult<ExecutionPayloadEnvelopeV2> {
        let built = self.resolve_built_payload(id)?;
        Ok(ExecutionPayloadEnvelopeV2 {
            execution_payload: block_to_payload_field_v2(&built.block),
            block_value: built.fees,
        })
    }

    /// Handles `engine_getPayloadV3`.
    pub fn get_payload_v3(&mut self, id: PayloadId) -> EngineApiResult<ExecutionPayloadEnvelopeV3> {
        let built = self.resolve_built_payload(id)?;
        Ok(ExecutionPayloadEnvelopeV3 {
            execution_payload: block_to_payload_v3(&built.block),
            block_value: built.fees,
            blobs_bundle: BlobsBundleV1 {
                commitments: built.blobs_bundle.commitments,
                proofs: built.blobs_bundle.proofs,
                blobs: built.blobs_bundle.blobs,
            },
            should_override_builder: false,
        })
    }

    // === payload bodies ===

    /// Handles `engine_getPayloadBodiesByHashV1`: one body per requested
    /// hash, explicit `null` for anything that cannot be served.
    pub fn get_payload_bodies_by_hash_v1(
        &self,
        hashes: Vec<B256>,
    ) -> EngineApiResult<Vec<Option<ExecutionPayloadBodyV1>>> {
        let len = hashes.len() as u64;
        if len > MAX_PAYLOAD_BODIES_LIMIT {
            return Err(EngineApiError::PayloadRequestTooLarge { len });
        }
        Ok(hashes
            .iter()
            .map(|hash| match self.client.block_by_hash(hash) {
                Ok(Some(block)) => Some(block_to_payload_body_v1(&block)),
                _ => None,
            })
            .collect())
    }

    /// Handles `engine_getPayloadBodiesByRangeV1`: the range is clamped to
    /// the canonical chain tip.
    pub fn get_payload_bodies_by_range_v1(
        &self,
        start: u64,
        count: u64,
    ) -> EngineApiResult<Vec<Option<ExecutionPayloadBodyV1>>> {
        if count > MAX_PAYLOAD_BODIES_LIMIT {
            return Err(EngineApiError::PayloadRequestTooLarge { len: count });
        }
        if start == 0 || count == 0 {
            return Err(EngineApiError::InvalidBodiesRange { start, count });
        }
        let height = self.client.chain_info()?.best_number;
        if start > height {
            return Ok(Vec::new());
        }
        let end = (start + count - 1).min(height);
        Ok((start..=end)
            .map(|number| match self.client.block_by_number(number) {
                Ok(Some(block)) => Some(block_to_payload_body_v1(&block)),
                _ => None,
            })
            .collect())
    }

    // === configuration exchange ===

    /// Handles `engine_exchangeTransitionConfigurationV1`: echoes the
    /// caller's configuration iff the terminal total difficulty matches.
    /// Terminal block hash and number are not enforced.
    pub fn exchange_transition_configuration(
        &self,
        config: TransitionConfiguration,
    ) -> EngineApiResult<TransitionConfiguration> {
        let terminal_total_difficulty = self
            .chain_spec
            .terminal_total_difficulty()
            .ok_or(EngineApiError::UnknownTerminalTotalDifficulty)?;
        if terminal_total_difficulty != config.terminal_total_difficulty {
            return Err(EngineApiError::TerminalTotalDifficulty {
                execution: terminal_total_difficulty,
                consensus: config.terminal_total_difficulty,
            });
        }
        Ok(config)
    }

    /// Handles `engine_exchangeCapabilities`: returns the list of served
    /// methods, regardless of what the consensus layer announced.
    pub fn exchange_capabilities(&self, cl_capabilities: Vec<String>) -> Vec<String> {
        debug!(target: "rpc::engine", announced = cl_capabilities.len(), "exchanged capabilities");
        self.capabilities.list()
    }

    // === shared lookups ===

    /// Resolves the parent of a delivered payload: skeleton, then the block
    /// caches, then the chain.
    fn lookup_payload_parent(&self, hash: &B256) -> EngineApiResult<Option<Arc<SealedBlock>>> {
        if let Some(block) = self.beacon_sync.block_by_hash(hash)? {
            return Ok(Some(block));
        }
        if let Some(block) = self.blocks.any(hash) {
            return Ok(Some(block.clone()));
        }
        Ok(self.client.block_by_hash(hash)?)
    }

    /// Resolves a forkchoice head: the block caches, then the skeleton, then
    /// the chain.
    fn lookup_forkchoice_head(&self, hash: &B256) -> EngineApiResult<Option<Arc<SealedBlock>>> {
        if let Some(block) = self.blocks.any(hash) {
            return Ok(Some(block.clone()));
        }
        if let Some(block) = self.beacon_sync.block_by_hash(hash)? {
            return Ok(Some(block));
        }
        Ok(self.client.block_by_hash(hash)?)
    }

    /// Resolves a safe or finalized marker: the skeleton, then the chain.
    fn lookup_marker(&self, hash: &B256) -> EngineApiResult<Option<Arc<SealedBlock>>> {
        if let Some(block) = self.beacon_sync.block_by_hash(hash)? {
            return Ok(Some(block));
        }
        Ok(self.client.block_by_hash(hash)?)
    }

    /// Returns the hash back if it names a known block, `None` otherwise.
    fn valid_hash(&self, hash: B256) -> Option<B256> {
        if self.blocks.any(&hash).is_some() {
            return Some(hash);
        }
        matches!(self.client.block_by_hash(&hash), Ok(Some(_))).then_some(hash)
    }

    /// Returns `true` if the block's state transition has been applied:
    /// either cached as executed, or canonical at or below the VM head.
    fn block_executed(&self, hash: &B256, number: u64) -> EngineApiResult<bool> {
        if self.blocks.is_executed(hash) {
            return Ok(true);
        }
        let vm_head = self.client.vm_head()?;
        if number > vm_head.number {
            return Ok(false);
        }
        Ok(self.client.block_hash(number)? == Some(*hash))
    }

    /// Resolves the state root of a block from the caches or the store.
    fn lookup_state_root(&self, hash: &B256) -> EngineApiResult<Option<B256>> {
        if let Some(block) = self.blocks.any(hash) {
            return Ok(Some(block.header().state_root));
        }
        Ok(self.client.sealed_header(hash)?.map(|header| header.state_root))
    }

    /// Returns an ordered sequence `[oldest … newest]` of blocks bridging
    /// `start_parent` back to (and excluding) `vm_head_hash`. The walk stops
    /// at the VM head or the zero hash and resolves, it never executes.
    fn ancestor_chain(
        &self,
        vm_head_hash: B256,
        start_parent: B256,
        max_depth: u64,
    ) -> Result<Vec<Arc<SealedBlock>>, AncestorWalk> {
        let mut chain = Vec::new();
        let mut current = start_parent;
        while current != vm_head_hash && !current.is_zero() {
            if chain.len() as u64 >= max_depth {
                return Err(AncestorWalk::DepthExceeded(max_depth));
            }
            let block = match self.blocks.any(&current) {
                Some(block) => block.clone(),
                None => self
                    .client
                    .block_by_hash(&current)
                    .ok()
                    .flatten()
                    .ok_or(AncestorWalk::MissingAncestor(current))?,
            };
            current = block.parent_hash();
            chain.push(block);
        }
        chain.reverse();
        Ok(chain)
    }

    /// A block `B` is terminal iff `td(B) ≥ TTD` and `td(parent(B)) < TTD`;
    /// genesis with sufficient difficulty is also terminal.
    fn is_terminal_block(&self, block: &SealedBlock) -> EngineApiResult<bool> {
        let ttd = self
            .chain_spec
            .terminal_total_difficulty()
            .ok_or(EngineApiError::UnknownTerminalTotalDifficulty)?;
        let Some(td) = self.client.total_difficulty(&block.hash())? else {
            return Ok(false);
        };
        if td < ttd {
            return Ok(false);
        }
        if block.number() == 0 {
            return Ok(true);
        }
        let Some(parent_td) = self.client.total_difficulty(&block.parent_hash())? else {
            return Ok(false);
        };
        Ok(parent_td < ttd)
    }

    /// The hardfork a block at the given height and timestamp belongs to,
    /// judged against the chain's accumulated difficulty.
    fn hardfork_of(&self, number: u64, timestamp: u64) -> Hardfork {
        let td = self
            .client
            .chain_info()
            .ok()
            .and_then(|info| self.client.total_difficulty(&info.best_hash).ok().flatten());
        self.chain_spec.hardfork_at(number, td, timestamp)
    }

    /// Drops cache entries that finality made irrelevant. Best-effort: a
    /// failed watermark read only skips the pruning.
    fn prune_caches(&mut self, finalized: Option<&SealedBlock>) {
        let Some(finalized) = finalized else { return };
        let Ok(vm_head) = self.client.vm_head() else { return };
        let executed_watermark = vm_head.number.min(finalized.number());
        self.blocks.prune(finalized.number(), executed_watermark);
    }
}

/// V2 and V3 answer a declared-hash mismatch as plain `INVALID`.
fn fold_invalid_block_hash(status: PayloadStatus) -> PayloadStatus {
    match status.status {
        PayloadStatusEnum::InvalidBlockHash { validation_error } => PayloadStatus {
            status: PayloadStatusEnum::Invalid { validation_error },
            latest_valid_hash: status.latest_valid_hash,
        },
        _ => status,
    }
}

fn note_hardfork_transition(last: &mut Option<Hardfork>, fork: Hardfork, family: &'static str) {
    if *last != Some(fork) {
        if let Some(previous) = *last {
            info!(target: "rpc::engine", %previous, current = %fork, family, "hardfork transition observed");
        }
        *last = Some(fork);
    }
}

impl<Client, Skeleton, Builder, Pool> Future for EngineApi<Client, Skeleton, Builder, Pool>
where
    Client: BlockProvider + BlockExecutor + Unpin,
    Skeleton: SkeletonSync + Unpin,
    Builder: PayloadJobGenerator + Unpin,
    Pool: PoolMaintenance + Unpin,
{
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        loop {
            match ready!(this.rx.poll_next_unpin(cx)) {
                Some(message) => this.on_message(message),
                None => {
                    // channel closed
                    return Poll::Ready(());
                }
            }
        }
    }
}
