//! Shared test helpers: mock collaborators and block generators.

pub mod generators;
mod mock;

pub use mock::{MockBuilder, MockChain, MockPool, MockSkeleton};
