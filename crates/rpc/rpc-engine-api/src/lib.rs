//! The server-side implementation of the Engine API, the protocol a consensus
//! client drives an execution client through.
//!
//! The [`EngineApi`] runs as a single task over a message channel; the
//! transport holds an [`EngineApiHandle`] and awaits one oneshot reply per
//! request. Because requests are processed strictly one at a time, the
//! engine's block caches need no locking and every request observes the
//! effects of its predecessors.

#![warn(missing_docs, unreachable_pub)]

mod cache;
mod capabilities;
mod compat;
mod config;
mod engine_api;
mod error;
mod message;
mod metrics;
mod version;

pub use capabilities::{EngineCapabilities, CAPABILITIES};
pub use compat::{
    block_to_payload, block_to_payload_body_v1, block_to_payload_field_v2, block_to_payload_v1,
    block_to_payload_v2, block_to_payload_v3, convert_standalone_withdraw_to_withdrawal,
    convert_withdrawal_to_standalone_withdraw, try_payload_to_block,
};
pub use config::EngineConfig;
pub use engine_api::EngineApi;
pub use error::{
    EngineApiError, EngineApiResult, INTERNAL_ERROR_CODE, INVALID_PARAMS_CODE,
    REQUEST_TOO_LARGE_CODE, UNKNOWN_PAYLOAD_CODE, UNSUPPORTED_FORK_CODE,
};
pub use message::{EngineApiHandle, EngineApiMessage, EngineApiSender};
pub use version::{EngineApiMessageVersion, EngineObjectValidationError};

/// Maximum number of entries a `getPayloadBodies` request may name or cover.
pub const MAX_PAYLOAD_BODIES_LIMIT: u64 = 32;
