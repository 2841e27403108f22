//! Milvus vector database adapter over gRPC.

mod error;
mod grpc;
mod index;
mod proto;
mod schema;
mod shared;

pub use error::{MilvusErrorContext, PROVIDER_ID, map_grpc_error};
pub use grpc::{MilvusGrpcConfig, MilvusGrpcVectorDb};
pub use index::MilvusIndexSpec;
pub use schema::{MilvusFieldSpec, MilvusSchemaSpec, build_quick_setup_schema_spec};
