//! Collection load state and insert results.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Load state as reported by Milvus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadState {
    /// The collection does not exist.
    NotExist,
    /// Exists but is not loaded into memory.
    NotLoad,
    /// Load in progress.
    Loading,
    /// Loaded and searchable.
    Loaded,
}

impl LoadState {
    /// Returns true once the collection is queryable.
    #[must_use]
    pub const fn is_loaded(self) -> bool {
        matches!(self, Self::Loaded)
    }

    /// Stable lowercase label used in logs and reports.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotExist => "not_exist",
            Self::NotLoad => "not_load",
            Self::Loading => "loading",
            Self::Loaded => "loaded",
        }
    }
}

impl fmt::Display for LoadState {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// What the store reported after an insert.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertOutcome {
    /// Number of rows the store accepted.
    pub insert_count: u64,
    /// Primary keys acknowledged by the store.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ids: Vec<i64>,
}
