use crate::EngineApiError;
use corten_rpc_types::{ForkchoiceUpdated, PayloadStatus, PayloadStatusEnum};
use metrics::{counter, histogram, Counter, Histogram};
use std::time::Duration;

/// All Engine API handler metrics.
#[derive(Default)]
pub(crate) struct EngineApiMetrics {
    /// Engine API latency metrics
    pub(crate) latency: EngineApiLatencyMetrics,
    /// Engine API forkchoiceUpdated response type metrics
    pub(crate) fcu_response: ForkchoiceUpdatedResponseMetrics,
    /// Engine API newPayload response type metrics
    pub(crate) new_payload_response: NewPayloadStatusResponseMetrics,
}

/// Engine API latency metrics, one histogram per method.
pub(crate) struct EngineApiLatencyMetrics {
    /// Latency for `engine_newPayloadV1`
    pub(crate) new_payload_v1: Histogram,
    /// Latency for `engine_newPayloadV2`
    pub(crate) new_payload_v2: Histogram,
    /// Latency for `engine_newPayloadV3`
    pub(crate) new_payload_v3: Histogram,
    /// Latency for `engine_forkchoiceUpdatedV1`
    pub(crate) fork_choice_updated_v1: Histogram,
    /// Latency for `engine_forkchoiceUpdatedV2`
    pub(crate) fork_choice_updated_v2: Histogram,
    /// Latency for `engine_forkchoiceUpdatedV3`
    pub(crate) fork_choice_updated_v3: Histogram,
    /// Latency for `engine_getPayloadV1`
    pub(crate) get_payload_v1: Histogram,
    /// Latency for `engine_getPayloadV2`
    pub(crate) get_payload_v2: Histogram,
    /// Latency for `engine_getPayloadV3`
    pub(crate) get_payload_v3: Histogram,
    /// Latency for `engine_getPayloadBodiesByHashV1`
    pub(crate) get_payload_bodies_by_hash_v1: Histogram,
    /// Latency for `engine_getPayloadBodiesByRangeV1`
    pub(crate) get_payload_bodies_by_range_v1: Histogram,
    /// Latency for `engine_exchangeTransitionConfigurationV1`
    pub(crate) exchange_transition_configuration: Histogram,
}

impl Default for EngineApiLatencyMetrics {
    fn default() -> Self {
        Self {
            new_payload_v1: histogram!("engine.rpc.new_payload_v1"),
            new_payload_v2: histogram!("engine.rpc.new_payload_v2"),
            new_payload_v3: histogram!("engine.rpc.new_payload_v3"),
            fork_choice_updated_v1: histogram!("engine.rpc.fork_choice_updated_v1"),
            fork_choice_updated_v2: histogram!("engine.rpc.fork_choice_updated_v2"),
            fork_choice_updated_v3: histogram!("engine.rpc.fork_choice_updated_v3"),
            get_payload_v1: histogram!("engine.rpc.get_payload_v1"),
            get_payload_v2: histogram!("engine.rpc.get_payload_v2"),
            get_payload_v3: histogram!("engine.rpc.get_payload_v3"),
            get_payload_bodies_by_hash_v1: histogram!("engine.rpc.get_payload_bodies_by_hash_v1"),
            get_payload_bodies_by_range_v1: histogram!(
                "engine.rpc.get_payload_bodies_by_range_v1"
            ),
            exchange_transition_configuration: histogram!(
                "engine.rpc.exchange_transition_configuration"
            ),
        }
    }
}

/// Metrics for engine API forkchoiceUpdated responses.
pub(crate) struct ForkchoiceUpdatedResponseMetrics {
    /// The total count of forkchoice updated messages received.
    pub(crate) forkchoice_updated_messages: Counter,
    /// The total count of forkchoice updated messages answered `INVALID`.
    pub(crate) forkchoice_updated_invalid: Counter,
    /// The total count of forkchoice updated messages answered `VALID`.
    pub(crate) forkchoice_updated_valid: Counter,
    /// The total count of forkchoice updated messages answered `SYNCING`.
    pub(crate) forkchoice_updated_syncing: Counter,
    /// The total count of forkchoice updated messages that were answered with
    /// an error rather than a status.
    pub(crate) forkchoice_updated_error: Counter,
}

impl Default for ForkchoiceUpdatedResponseMetrics {
    fn default() -> Self {
        Self {
            forkchoice_updated_messages: counter!("engine.rpc.forkchoice_updated_messages"),
            forkchoice_updated_invalid: counter!("engine.rpc.forkchoice_updated_invalid"),
            forkchoice_updated_valid: counter!("engine.rpc.forkchoice_updated_valid"),
            forkchoice_updated_syncing: counter!("engine.rpc.forkchoice_updated_syncing"),
            forkchoice_updated_error: counter!("engine.rpc.forkchoice_updated_error"),
        }
    }
}

/// Metrics for engine API newPayload responses.
pub(crate) struct NewPayloadStatusResponseMetrics {
    /// The total count of new payload messages received.
    pub(crate) new_payload_messages: Counter,
    /// The total count of new payload messages answered `INVALID` or
    /// `INVALID_BLOCK_HASH`.
    pub(crate) new_payload_invalid: Counter,
    /// The total count of new payload messages answered `VALID`.
    pub(crate) new_payload_valid: Counter,
    /// The total count of new payload messages answered `SYNCING`.
    pub(crate) new_payload_syncing: Counter,
    /// The total count of new payload messages answered `ACCEPTED`.
    pub(crate) new_payload_accepted: Counter,
    /// The total count of new payload messages that were answered with an
    /// error rather than a status.
    pub(crate) new_payload_error: Counter,
    /// The total gas of valid new payload messages received.
    pub(crate) new_payload_total_gas: Histogram,
    /// The gas per second of valid new payload messages received.
    pub(crate) new_payload_gas_per_second: Histogram,
}

impl Default for NewPayloadStatusResponseMetrics {
    fn default() -> Self {
        Self {
            new_payload_messages: counter!("engine.rpc.new_payload_messages"),
            new_payload_invalid: counter!("engine.rpc.new_payload_invalid"),
            new_payload_valid: counter!("engine.rpc.new_payload_valid"),
            new_payload_syncing: counter!("engine.rpc.new_payload_syncing"),
            new_payload_accepted: counter!("engine.rpc.new_payload_accepted"),
            new_payload_error: counter!("engine.rpc.new_payload_error"),
            new_payload_total_gas: histogram!("engine.rpc.new_payload_total_gas"),
            new_payload_gas_per_second: histogram!("engine.rpc.new_payload_gas_per_second"),
        }
    }
}

impl NewPayloadStatusResponseMetrics {
    /// Increment the newPayload counter based on the given rpc result
    pub(crate) fn update_response_metrics(
        &self,
        result: &Result<PayloadStatus, EngineApiError>,
        gas_used: u64,
        time: Duration,
    ) {
        match result {
            Ok(status) => match status.status {
                PayloadStatusEnum::Valid => {
                    self.new_payload_valid.increment(1);
                    self.new_payload_total_gas.record(gas_used as f64);
                    self.new_payload_gas_per_second.record(gas_used as f64 / time.as_secs_f64());
                }
                PayloadStatusEnum::Syncing => self.new_payload_syncing.increment(1),
                PayloadStatusEnum::Accepted => self.new_payload_accepted.increment(1),
                PayloadStatusEnum::Invalid { .. } | PayloadStatusEnum::InvalidBlockHash { .. } => {
                    self.new_payload_invalid.increment(1)
                }
            },
            Err(_) => self.new_payload_error.increment(1),
        }
        self.new_payload_messages.increment(1);
    }
}

impl ForkchoiceUpdatedResponseMetrics {
    /// Increment the forkchoiceUpdated counter based on the given rpc result
    pub(crate) fn update_response_metrics(
        &self,
        result: &Result<ForkchoiceUpdated, EngineApiError>,
    ) {
        match result {
            Ok(updated) => match updated.payload_status.status {
                PayloadStatusEnum::Valid => self.forkchoice_updated_valid.increment(1),
                PayloadStatusEnum::Syncing => self.forkchoice_updated_syncing.increment(1),
                _ => self.forkchoice_updated_invalid.increment(1),
            },
            Err(_) => self.forkchoice_updated_error.increment(1),
        }
        self.forkchoice_updated_messages.increment(1);
    }
}
