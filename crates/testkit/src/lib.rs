//! # milvus-otel-testkit
//!
//! Test doubles for the vector DB port.
//! This crate depends on `ports` and `shared`.

pub mod errors;
pub mod in_memory;

pub use in_memory::{FaultyVectorDb, InMemoryVectorDb, Operation};
