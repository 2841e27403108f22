//! # milvus-otel-domain
//!
//! Value objects for the traced Milvus quick-setup harness.
//!
//! - **Primitives** - `CollectionName`, `Dimension`
//! - **Records** - `Record`, `RecordBatch`
//! - **States** - `LoadState`, `InsertOutcome`
//!
//! ## Dependency Rules
//!
//! - Depends only on `shared` crate
//! - No infrastructure or adapter dependencies
//! - Pure domain logic with no I/O

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod primitives;
pub mod record;
pub mod states;

pub use primitives::{CollectionName, Dimension, MAX_COLLECTION_NAME_LEN, MAX_DIMENSION, PrimitiveError};
pub use record::{Record, RecordBatch};
pub use states::{InsertOutcome, LoadState};
