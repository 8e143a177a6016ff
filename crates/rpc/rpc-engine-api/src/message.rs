use crate::{EngineApiError, EngineApiResult};
use alloy_primitives::B256;
use corten_rpc_types::{
    ExecutionPayloadBodyV1, ExecutionPayloadEnvelopeV2, ExecutionPayloadEnvelopeV3,
    ExecutionPayloadInputV2, ExecutionPayloadV1, ExecutionPayloadV3, ForkchoiceState,
    ForkchoiceUpdated, PayloadAttributes, PayloadId, PayloadStatus, TransitionConfiguration,
};
use tokio::sync::{mpsc, oneshot};

/// The Engine API response sender.
pub type EngineApiSender<Ok> = oneshot::Sender<EngineApiResult<Ok>>;

/// Message type for communicating with the [`EngineApi`](crate::EngineApi)
/// task.
#[derive(Debug)]
pub enum EngineApiMessage {
    /// `engine_newPayloadV1` message
    NewPayloadV1(ExecutionPayloadV1, EngineApiSender<PayloadStatus>),
    /// `engine_newPayloadV2` message
    NewPayloadV2(ExecutionPayloadInputV2, EngineApiSender<PayloadStatus>),
    /// `engine_newPayloadV3` message, carrying the expected blob versioned
    /// hashes and the parent beacon block root
    NewPayloadV3(ExecutionPayloadV3, Vec<B256>, B256, EngineApiSender<PayloadStatus>),
    /// `engine_forkchoiceUpdatedV1` message
    ForkchoiceUpdatedV1(
        ForkchoiceState,
        Option<PayloadAttributes>,
        EngineApiSender<ForkchoiceUpdated>,
    ),
    /// `engine_forkchoiceUpdatedV2` message
    ForkchoiceUpdatedV2(
        ForkchoiceState,
        Option<PayloadAttributes>,
        EngineApiSender<ForkchoiceUpdated>,
    ),
    /// `engine_forkchoiceUpdatedV3` message
    ForkchoiceUpdatedV3(
        ForkchoiceState,
        Option<PayloadAttributes>,
        EngineApiSender<ForkchoiceUpdated>,
    ),
    /// `engine_getPayloadV1` message
    GetPayloadV1(PayloadId, EngineApiSender<ExecutionPayloadV1>),
    /// `engine_getPayloadV2` message
    GetPayloadV2(PayloadId, EngineApiSender<ExecutionPayloadEnvelopeV2>),
    /// `engine_getPayloadV3` message
    GetPayloadV3(PayloadId, EngineApiSender<ExecutionPayloadEnvelopeV3>),
    /// `engine_getPayloadBodiesByHashV1` message
    GetPayloadBodiesByHashV1(Vec<B256>, EngineApiSender<Vec<Option<ExecutionPayloadBodyV1>>>),
    /// `engine_getPayloadBodiesByRangeV1` message
    GetPayloadBodiesByRangeV1(u64, u64, EngineApiSender<Vec<Option<ExecutionPayloadBodyV1>>>),
    /// `engine_exchangeTransitionConfigurationV1` message
    ExchangeTransitionConfiguration(
        TransitionConfiguration,
        EngineApiSender<TransitionConfiguration>,
    ),
    /// `engine_exchangeCapabilities` message
    ExchangeCapabilities(Vec<String>, EngineApiSender<Vec<String>>),
}

/// A cloneable handle for submitting requests to the engine task.
///
/// This is what the JSON-RPC transport holds: one async method per Engine API
/// method, each resolving once the engine task has answered.
#[derive(Debug, Clone)]
pub struct EngineApiHandle {
    to_engine: mpsc::UnboundedSender<EngineApiMessage>,
}

impl EngineApiHandle {
    /// Creates a new handle for the given channel.
    pub(crate) fn new(to_engine: mpsc::UnboundedSender<EngineApiMessage>) -> Self {
        Self { to_engine }
    }

    async fn send<Ok>(
        &self,
        message: impl FnOnce(EngineApiSender<Ok>) -> EngineApiMessage,
    ) -> EngineApiResult<Ok> {
        let (tx, rx) = oneshot::channel();
        self.to_engine.send(message(tx)).map_err(|_| EngineApiError::ChannelClosed)?;
        rx.await.map_err(|_| EngineApiError::ChannelClosed)?
    }

    /// Handles `engine_newPayloadV1`.
    pub async fn new_payload_v1(
        &self,
        payload: ExecutionPayloadV1,
    ) -> EngineApiResult<PayloadStatus> {
        self.send(|tx| EngineApiMessage::NewPayloadV1(payload, tx)).await
    }

    /// Handles `engine_newPayloadV2`.
    pub async fn new_payload_v2(
        &self,
        payload: ExecutionPayloadInputV2,
    ) -> EngineApiResult<PayloadStatus> {
        self.send(|tx| EngineApiMessage::NewPayloadV2(payload, tx)).await
    }

    /// Handles `engine_newPayloadV3`.
    pub async fn new_payload_v3(
        &self,
        payload: ExecutionPayloadV3,
        versioned_hashes: Vec<B256>,
        parent_beacon_block_root: B256,
    ) -> EngineApiResult<PayloadStatus> {
        self.send(|tx| {
            EngineApiMessage::NewPayloadV3(payload, versioned_hashes, parent_beacon_block_root, tx)
        })
        .await
    }

    /// Handles `engine_forkchoiceUpdatedV1`.
    pub async fn fork_choice_updated_v1(
        &self,
        state: ForkchoiceState,
        attrs: Option<PayloadAttributes>,
    ) -> EngineApiResult<ForkchoiceUpdated> {
        self.send(|tx| EngineApiMessage::ForkchoiceUpdatedV1(state, attrs, tx)).await
    }

    /// Handles `engine_forkchoiceUpdatedV2`.
    pub async fn fork_choice_updated_v2(
        &self,
        state: ForkchoiceState,
        attrs: Option<PayloadAttributes>,
    ) -> EngineApiResult<ForkchoiceUpdated> {
        self.send(|tx| EngineApiMessage::ForkchoiceUpdatedV2(state, attrs, tx)).await
    }

    /// Handles `engine_forkchoiceUpdatedV3`.
    pub async fn fork_choice_updated_v3(
        &self,
        state: ForkchoiceState,
        attrs: Option<PayloadAttributes>,
    ) -> EngineApiResult<ForkchoiceUpdated> {
        self.send(|tx| EngineApiMessage::ForkchoiceUpdatedV3(state, attrs, tx)).await
    }

    /// Handles `engine_getPayloadV1`.
    pub async fn get_payload_v1(&self, id: PayloadId) -> EngineApiResult<ExecutionPayloadV1> {
        self.send(|tx| EngineApiMessage::GetPayloadV1(id, tx)).await
    }

    /// Handles `engine_getPayloadV2`.
    pub async fn get_payload_v2(
        &self,
        id: PayloadId,
    ) -> EngineApiResult<ExecutionPayloadEnvelopeV2> {
        self.send(|tx| EngineApiMessage::GetPayloadV2(id, tx)).await
    }

    /// Handles `engine_getPayloadV3`.
    pub async fn get_payload_v3(
        &self,
        id: PayloadId,
    ) -> EngineApiResult<ExecutionPayloadEnvelopeV3> {
        self.send(|tx| EngineApiMessage::GetPayloadV3(id, tx)).await
    }

    /// Handles `engine_getPayloadBodiesByHashV1`.
    pub async fn get_payload_bodies_by_hash_v1(
        &self,
        hashes: Vec<B256>,
    ) -> EngineApiResult<Vec<Option<ExecutionPayloadBodyV1>>> {
        self.send(|tx| EngineApiMessage::GetPayloadBodiesByHashV1(hashes, tx)).await
    }

    /// Handles `engine_getPayloadBodiesByRangeV1`.
    pub async fn get_payload_bodies_by_range_v1(
        &self,
        start: u64,
        count: u64,
    ) -> EngineApiResult<Vec<Option<ExecutionPayloadBodyV1>>> {
        self.send(|tx| EngineApiMessage::GetPayloadBodiesByRangeV1(start, count, tx)).await
    }

    /// Handles `engine_exchangeTransitionConfigurationV1`.
    pub async fn exchange_transition_configuration(
        &self,
        config: TransitionConfiguration,
    ) -> EngineApiResult<TransitionConfiguration> {
        self.send(|tx| EngineApiMessage::ExchangeTransitionConfiguration(config, tx)).await
    }

    /// Handles `engine_exchangeCapabilities`.
    pub async fn exchange_capabilities(
        &self,
        cl_capabilities: Vec<String>,
    ) -> EngineApiResult<Vec<String>> {
        self.send(|tx| EngineApiMessage::ExchangeCapabilities(cl_capabilities, tx)).await
    }
}
