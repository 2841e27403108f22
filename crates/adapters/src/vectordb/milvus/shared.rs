//! Shared Milvus helpers.

pub const ID_FIELD: &str = "id";
pub const VECTOR_FIELD: &str = "vector";
pub const DYNAMIC_FIELD: &str = "$meta";
pub const VECTOR_INDEX_NAME: &str = "vector";
pub const DEFAULT_COLLECTION_DESCRIPTION: &str = "";

/// Interval between `GetLoadState` polls while waiting for a load.
pub const LOAD_POLL_INTERVAL_MS: u64 = 500;
