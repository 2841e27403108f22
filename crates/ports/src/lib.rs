//! # milvus-otel-ports
//!
//! Port traits for the milvus-otel hexagonal architecture.
//!
//! This crate defines the interface between the quick-setup procedure and the
//! vector database adapters. It depends only on `domain` and `shared`.

use std::future::Future;
use std::pin::Pin;

/// Boxed future used by port traits.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub mod vectordb;

pub use vectordb::*;

// Re-export the domain types used in port signatures, so adapter crates can
// implement ports without directly depending on `milvus-otel-domain`.
pub use milvus_otel_domain::{CollectionName, Dimension, InsertOutcome, LoadState, RecordBatch};
