//! Interfaces between the corten engine and the subsystems it drives.
//!
//! The Engine API handler never owns storage, the VM, the beacon-sync
//! skeleton, the payload builder or the transaction pool; it consumes them
//! through the traits in this crate. Shared mocks and block generators for
//! tests live in [`test_utils`].

#![warn(missing_docs, unreachable_pub)]

pub mod executor;
pub mod payload;
pub mod pool;
pub mod provider;
pub mod sync;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use executor::{BlockExecutionError, BlockExecutor};
pub use payload::{
    BlobsBundle, BuiltPayload, PayloadBuildArguments, PayloadBuilderError, PayloadJobGenerator,
};
pub use pool::PoolMaintenance;
pub use provider::{BlockProvider, HeaderProvider, ProviderError, ProviderResult};
pub use sync::SkeletonSync;
