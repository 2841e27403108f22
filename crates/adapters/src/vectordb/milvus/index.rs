//! Milvus index configuration.

use std::collections::BTreeMap;

/// Single-field Milvus index spec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MilvusIndexSpec {
    /// Index type (e.g. `AUTOINDEX`, `HNSW`).
    pub index_type: Box<str>,
    /// Metric type (e.g. `COSINE`, `IP`, `L2`).
    pub metric_type: Box<str>,
    /// Index build parameters.
    pub params: BTreeMap<Box<str>, Box<str>>,
}

impl Default for MilvusIndexSpec {
    fn default() -> Self {
        Self {
            index_type: "AUTOINDEX".into(),
            metric_type: "COSINE".into(),
            params: BTreeMap::new(),
        }
    }
}
