//! Engine API capabilities.

use std::collections::HashSet;

/// All Engine API methods this handler serves.
///
/// `engine_exchangeCapabilities` itself is deliberately not listed, per the
/// Engine API common definitions.
pub const CAPABILITIES: &[&str] = &[
    "engine_exchangeTransitionConfigurationV1",
    "engine_forkchoiceUpdatedV1",
    "engine_forkchoiceUpdatedV2",
    "engine_forkchoiceUpdatedV3",
    "engine_getPayloadBodiesByHashV1",
    "engine_getPayloadBodiesByRangeV1",
    "engine_getPayloadV1",
    "engine_getPayloadV2",
    "engine_getPayloadV3",
    "engine_newPayloadV1",
    "engine_newPayloadV2",
    "engine_newPayloadV3",
];

/// The set of Engine API methods advertised to the consensus layer.
#[derive(Debug, Clone)]
pub struct EngineCapabilities {
    inner: HashSet<String>,
}

impl EngineCapabilities {
    /// Creates from an iterator of capability strings.
    pub fn new(capabilities: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self { inner: capabilities.into_iter().map(Into::into).collect() }
    }

    /// Returns the capabilities as a sorted list of strings, the
    /// `engine_exchangeCapabilities` response shape.
    pub fn list(&self) -> Vec<String> {
        let mut list: Vec<_> = self.inner.iter().cloned().collect();
        list.sort_unstable();
        list
    }
}

impl Default for EngineCapabilities {
    fn default() -> Self {
        Self::new(CAPABILITIES.iter().copied())
    }
}
