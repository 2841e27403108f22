//! # milvus-otel-app
//!
//! The quick-setup procedure and its fixed data set.
//! This crate depends on `ports`, `domain`, and `shared`.

pub mod fixture;
pub mod quick_setup;

pub use fixture::{
    QUICK_SETUP_COLLECTION, QUICK_SETUP_DIMENSION, QUICK_SETUP_RECORD_COUNT, quick_setup_batch,
    quick_setup_collection, quick_setup_records,
};
pub use quick_setup::{
    CleanupPolicy, EXECUTION_SPAN, QuickSetupDeps, QuickSetupInput, QuickSetupReport, SETUP_SPAN,
    check_insert_count, run_harness, run_quick_setup, step,
};
