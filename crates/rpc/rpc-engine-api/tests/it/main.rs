//! Integration tests for the Engine API handler.

mod bodies;
mod exchange;
mod forkchoice;
mod payload;
mod setup;
