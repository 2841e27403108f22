//! In-memory vector DB doubles.
//!
//! [`InMemoryVectorDb`] follows the Milvus quick-setup semantics closely
//! enough for the procedure tests: collections are loaded on creation,
//! inserts report one row per record and every call is recorded in order.
//! [`FaultyVectorDb`] wraps it to inject failures, cancel the run mid-call
//! or misreport counts.

use crate::errors::{closed_error, collection_not_found, injected_failure};
use milvus_otel_ports::{
    BoxFuture, CollectionName, Dimension, InsertOutcome, LoadState, RecordBatch, VectorDbPort,
    VectorDbProviderInfo,
};
use milvus_otel_shared::{ErrorCode, ErrorEnvelope, RequestContext, Result};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use tokio::sync::RwLock;

/// Port operations, as recorded by the doubles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// `has_collection`
    HasCollection,
    /// `create_collection`
    CreateCollection,
    /// `get_load_state`
    GetLoadState,
    /// `insert`
    Insert,
    /// `drop_collection`
    DropCollection,
    /// `close`
    Close,
}

impl Operation {
    /// Port method name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::HasCollection => "has_collection",
            Self::CreateCollection => "create_collection",
            Self::GetLoadState => "get_load_state",
            Self::Insert => "insert",
            Self::DropCollection => "drop_collection",
            Self::Close => "close",
        }
    }
}

#[derive(Debug)]
struct CollectionState {
    dimension: Dimension,
    row_ids: Vec<i64>,
}

/// Vector DB double backed by a map of collections.
#[derive(Debug)]
pub struct InMemoryVectorDb {
    provider: VectorDbProviderInfo,
    collections: RwLock<HashMap<CollectionName, CollectionState>>,
    calls: Mutex<Vec<Operation>>,
    closed: AtomicBool,
}

impl Default for InMemoryVectorDb {
    fn default() -> Self {
        Self::new(VectorDbProviderInfo {
            id: "in_memory".into(),
            name: "In-memory".into(),
        })
    }
}

impl InMemoryVectorDb {
    /// Create an empty store.
    #[must_use]
    pub fn new(provider: VectorDbProviderInfo) -> Self {
        Self {
            provider,
            collections: RwLock::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
        }
    }

    /// Create a store that already holds `collection_name`.
    pub async fn with_collection(collection_name: CollectionName, dimension: Dimension) -> Self {
        let store = Self::default();
        store.collections.write().await.insert(
            collection_name,
            CollectionState {
                dimension,
                row_ids: Vec::new(),
            },
        );
        store
    }

    /// Operations received so far, in order.
    pub fn calls(&self) -> Vec<Operation> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Names of the collections that currently exist.
    pub async fn collection_names(&self) -> BTreeSet<String> {
        self.collections
            .read()
            .await
            .keys()
            .map(|name| name.as_str().to_owned())
            .collect()
    }

    /// Rows stored in a collection, or `None` when it does not exist.
    pub async fn row_count(&self, collection_name: &CollectionName) -> Option<usize> {
        self.collections
            .read()
            .await
            .get(collection_name)
            .map(|state| state.row_ids.len())
    }

    /// Returns true once `close` was called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn enter(&self, ctx: &RequestContext, operation: Operation) -> Result<()> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(operation);
        ctx.ensure_not_cancelled(operation.as_str())?;
        if self.is_closed() {
            return Err(closed_error(operation));
        }
        Ok(())
    }
}

impl VectorDbPort for InMemoryVectorDb {
    fn provider(&self) -> &VectorDbProviderInfo {
        &self.provider
    }

    fn has_collection(
        &self,
        ctx: &RequestContext,
        collection_name: CollectionName,
    ) -> BoxFuture<'_, Result<bool>> {
        let ctx = ctx.clone();
        Box::pin(async move {
            self.enter(&ctx, Operation::HasCollection)?;
            Ok(self.collections.read().await.contains_key(&collection_name))
        })
    }

    fn create_collection(
        &self,
        ctx: &RequestContext,
        collection_name: CollectionName,
        dimension: Dimension,
    ) -> BoxFuture<'_, Result<()>> {
        let ctx = ctx.clone();
        Box::pin(async move {
            self.enter(&ctx, Operation::CreateCollection)?;
            let mut collections = self.collections.write().await;
            match collections.get(&collection_name) {
                Some(existing) if existing.dimension != dimension => Err(ErrorEnvelope::expected(
                    ErrorCode::new("vector", "vdb_collection_exists"),
                    format!("collection {collection_name} exists with a different schema"),
                )
                .with_metadata("dimension", existing.dimension.to_string())),
                Some(_) => Ok(()),
                None => {
                    collections.insert(
                        collection_name,
                        CollectionState {
                            dimension,
                            row_ids: Vec::new(),
                        },
                    );
                    Ok(())
                },
            }
        })
    }

    fn get_load_state(
        &self,
        ctx: &RequestContext,
        collection_name: CollectionName,
    ) -> BoxFuture<'_, Result<LoadState>> {
        let ctx = ctx.clone();
        Box::pin(async move {
            self.enter(&ctx, Operation::GetLoadState)?;
            let collections = self.collections.read().await;
            Ok(if collections.contains_key(&collection_name) {
                LoadState::Loaded
            } else {
                LoadState::NotExist
            })
        })
    }

    fn insert(
        &self,
        ctx: &RequestContext,
        collection_name: CollectionName,
        batch: RecordBatch,
    ) -> BoxFuture<'_, Result<InsertOutcome>> {
        let ctx = ctx.clone();
        Box::pin(async move {
            self.enter(&ctx, Operation::Insert)?;
            let mut collections = self.collections.write().await;
            let Some(state) = collections.get_mut(&collection_name) else {
                return Err(collection_not_found(collection_name.as_str()));
            };
            if batch.dimension() != state.dimension {
                return Err(ErrorEnvelope::expected(
                    ErrorCode::invalid_input(),
                    "vector dimension mismatch",
                )
                .with_metadata("expected", state.dimension.to_string())
                .with_metadata("actual", batch.dimension().to_string()));
            }

            let ids: Vec<i64> = batch.ids().collect();
            state.row_ids.extend_from_slice(&ids);
            Ok(InsertOutcome {
                insert_count: u64::try_from(ids.len()).unwrap_or(u64::MAX),
                ids,
            })
        })
    }

    fn drop_collection(
        &self,
        ctx: &RequestContext,
        collection_name: CollectionName,
    ) -> BoxFuture<'_, Result<()>> {
        let ctx = ctx.clone();
        Box::pin(async move {
            self.enter(&ctx, Operation::DropCollection)?;
            self.collections.write().await.remove(&collection_name);
            Ok(())
        })
    }

    fn close(&self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            self.calls
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(Operation::Close);
            self.closed.store(true, Ordering::SeqCst);
            Ok(())
        })
    }
}

/// Wraps an [`InMemoryVectorDb`] and injects faults.
#[derive(Debug, Default)]
pub struct FaultyVectorDb {
    inner: InMemoryVectorDb,
    fail_on: HashSet<Operation>,
    cancel_on: HashSet<Operation>,
    reported_insert_count: Option<u64>,
}

impl FaultyVectorDb {
    /// Wrap `inner` without faults.
    #[must_use]
    pub fn new(inner: InMemoryVectorDb) -> Self {
        Self {
            inner,
            fail_on: HashSet::new(),
            cancel_on: HashSet::new(),
            reported_insert_count: None,
        }
    }

    /// Fail every call of `operation` with an injected error.
    ///
    /// Chain to fail several operations.
    #[must_use]
    pub fn failing_on(mut self, operation: Operation) -> Self {
        self.fail_on.insert(operation);
        self
    }

    /// Cancel the caller's context when `operation` is called, as an
    /// interrupt arriving mid-call would.
    #[must_use]
    pub fn cancelling_on(mut self, operation: Operation) -> Self {
        self.cancel_on.insert(operation);
        self
    }

    /// Store inserted rows but report `count` as the insert count.
    #[must_use]
    pub fn reporting_insert_count(mut self, count: u64) -> Self {
        self.reported_insert_count = Some(count);
        self
    }

    /// The wrapped store.
    pub fn inner(&self) -> &InMemoryVectorDb {
        &self.inner
    }

    fn check(&self, ctx: &RequestContext, operation: Operation) -> Result<()> {
        if self.cancel_on.contains(&operation) {
            ctx.cancel();
        }
        if self.fail_on.contains(&operation) {
            return Err(injected_failure(operation));
        }
        Ok(())
    }
}

impl VectorDbPort for FaultyVectorDb {
    fn provider(&self) -> &VectorDbProviderInfo {
        self.inner.provider()
    }

    fn has_collection(
        &self,
        ctx: &RequestContext,
        collection_name: CollectionName,
    ) -> BoxFuture<'_, Result<bool>> {
        let ctx = ctx.clone();
        Box::pin(async move {
            self.check(&ctx, Operation::HasCollection)?;
            self.inner.has_collection(&ctx, collection_name).await
        })
    }

    fn create_collection(
        &self,
        ctx: &RequestContext,
        collection_name: CollectionName,
        dimension: Dimension,
    ) -> BoxFuture<'_, Result<()>> {
        let ctx = ctx.clone();
        Box::pin(async move {
            self.check(&ctx, Operation::CreateCollection)?;
            self.inner
                .create_collection(&ctx, collection_name, dimension)
                .await
        })
    }

    fn get_load_state(
        &self,
        ctx: &RequestContext,
        collection_name: CollectionName,
    ) -> BoxFuture<'_, Result<LoadState>> {
        let ctx = ctx.clone();
        Box::pin(async move {
            self.check(&ctx, Operation::GetLoadState)?;
            self.inner.get_load_state(&ctx, collection_name).await
        })
    }

    fn insert(
        &self,
        ctx: &RequestContext,
        collection_name: CollectionName,
        batch: RecordBatch,
    ) -> BoxFuture<'_, Result<InsertOutcome>> {
        let ctx = ctx.clone();
        Box::pin(async move {
            self.check(&ctx, Operation::Insert)?;
            let mut outcome = self.inner.insert(&ctx, collection_name, batch).await?;
            if let Some(count) = self.reported_insert_count {
                outcome.insert_count = count;
            }
            Ok(outcome)
        })
    }

    fn drop_collection(
        &self,
        ctx: &RequestContext,
        collection_name: CollectionName,
    ) -> BoxFuture<'_, Result<()>> {
        let ctx = ctx.clone();
        Box::pin(async move {
            self.check(&ctx, Operation::DropCollection)?;
            self.inner.drop_collection(&ctx, collection_name).await
        })
    }

    fn close(&self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            if self.fail_on.contains(&Operation::Close) {
                return Err(injected_failure(Operation::Close));
            }
            self.inner.close().await
        })
    }
}
