//! Vector DB boundary contract.

use crate::BoxFuture;
use milvus_otel_domain::{CollectionName, Dimension, InsertOutcome, LoadState, RecordBatch};
use milvus_otel_shared::{RequestContext, Result};
use std::sync::Arc;

/// Provider descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VectorDbProviderInfo {
    /// Stable provider identifier (e.g. `milvus_grpc`).
    pub id: Box<str>,
    /// Human-readable provider name.
    pub name: Box<str>,
}

/// Collection lifecycle and insert operations used by the quick-setup run.
///
/// Every call takes the run's [`RequestContext`]; implementations check it
/// for cancellation before doing any I/O.
pub trait VectorDbPort: Send + Sync {
    /// Provider info for this implementation.
    fn provider(&self) -> &VectorDbProviderInfo;

    /// Return true when the collection exists.
    fn has_collection(
        &self,
        ctx: &RequestContext,
        collection_name: CollectionName,
    ) -> BoxFuture<'_, Result<bool>>;

    /// Create a quick-setup collection (`id` primary key, `vector` of
    /// `dimension` floats, dynamic fields enabled) and make it queryable.
    fn create_collection(
        &self,
        ctx: &RequestContext,
        collection_name: CollectionName,
        dimension: Dimension,
    ) -> BoxFuture<'_, Result<()>>;

    /// Current load state of the collection.
    fn get_load_state(
        &self,
        ctx: &RequestContext,
        collection_name: CollectionName,
    ) -> BoxFuture<'_, Result<LoadState>>;

    /// Insert a validated batch.
    fn insert(
        &self,
        ctx: &RequestContext,
        collection_name: CollectionName,
        batch: RecordBatch,
    ) -> BoxFuture<'_, Result<InsertOutcome>>;

    /// Drop a collection.
    fn drop_collection(
        &self,
        ctx: &RequestContext,
        collection_name: CollectionName,
    ) -> BoxFuture<'_, Result<()>>;

    /// Release the connection. Further calls fail.
    fn close(&self) -> BoxFuture<'_, Result<()>>;
}

impl<T: VectorDbPort + ?Sized> VectorDbPort for Arc<T> {
    fn provider(&self) -> &VectorDbProviderInfo {
        (**self).provider()
    }

    fn has_collection(
        &self,
        ctx: &RequestContext,
        collection_name: CollectionName,
    ) -> BoxFuture<'_, Result<bool>> {
        (**self).has_collection(ctx, collection_name)
    }

    fn create_collection(
        &self,
        ctx: &RequestContext,
        collection_name: CollectionName,
        dimension: Dimension,
    ) -> BoxFuture<'_, Result<()>> {
        (**self).create_collection(ctx, collection_name, dimension)
    }

    fn get_load_state(
        &self,
        ctx: &RequestContext,
        collection_name: CollectionName,
    ) -> BoxFuture<'_, Result<LoadState>> {
        (**self).get_load_state(ctx, collection_name)
    }

    fn insert(
        &self,
        ctx: &RequestContext,
        collection_name: CollectionName,
        batch: RecordBatch,
    ) -> BoxFuture<'_, Result<InsertOutcome>> {
        (**self).insert(ctx, collection_name, batch)
    }

    fn drop_collection(
        &self,
        ctx: &RequestContext,
        collection_name: CollectionName,
    ) -> BoxFuture<'_, Result<()>> {
        (**self).drop_collection(ctx, collection_name)
    }

    fn close(&self) -> BoxFuture<'_, Result<()>> {
        (**self).close()
    }
}
