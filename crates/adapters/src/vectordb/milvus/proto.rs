//! Protobuf messages and a unary client for the subset of
//! `milvus.proto.{common,schema,milvus}` used by the quick-setup run.
//!
//! Field numbers follow the upstream `.proto` files. Messages the adapter
//! never sends or reads are left out, and so are fields of kept messages
//! that it never sets.

#![allow(
    dead_code,
    missing_docs,
    clippy::derive_partial_eq_without_eq,
    clippy::upper_case_acronyms
)]

pub mod common {
    use std::collections::HashMap;

    /// Legacy `ErrorCode` values. Newer servers report through
    /// [`Status::code`] and leave this at `Success`.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
    #[repr(i32)]
    pub enum ErrorCode {
        Success = 0,
        UnexpectedError = 1,
        ConnectFailed = 2,
        PermissionDenied = 3,
        CollectionNotExists = 4,
        IllegalArgument = 5,
        IllegalDimension = 7,
        IllegalIndexType = 8,
        IllegalCollectionName = 9,
        IllegalTopk = 10,
        IllegalMetricType = 23,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
    #[repr(i32)]
    pub enum MsgType {
        Undefined = 0,
        CreateCollection = 100,
        DropCollection = 101,
        HasCollection = 102,
        LoadCollection = 106,
        CreateIndex = 300,
        Insert = 400,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
    #[repr(i32)]
    pub enum ConsistencyLevel {
        Strong = 0,
        Session = 1,
        Bounded = 2,
        Eventually = 3,
        Customized = 4,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
    #[repr(i32)]
    pub enum LoadState {
        NotExist = 0,
        NotLoad = 1,
        Loading = 2,
        Loaded = 3,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Status {
        #[prost(enumeration = "ErrorCode", tag = "1")]
        pub error_code: i32,
        #[prost(string, tag = "2")]
        pub reason: String,
        #[prost(int32, tag = "3")]
        pub code: i32,
        #[prost(bool, tag = "4")]
        pub retriable: bool,
        #[prost(string, tag = "5")]
        pub detail: String,
        #[prost(map = "string, string", tag = "6")]
        pub extra_info: HashMap<String, String>,
    }

    impl Status {
        /// Both the legacy and the current code report success.
        pub const fn is_success(&self) -> bool {
            self.code == 0 && self.error_code == ErrorCode::Success as i32
        }
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct KeyValuePair {
        #[prost(string, tag = "1")]
        pub key: String,
        #[prost(string, tag = "2")]
        pub value: String,
    }

    impl KeyValuePair {
        pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
            Self {
                key: key.into(),
                value: value.into(),
            }
        }
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct MsgBase {
        #[prost(enumeration = "MsgType", tag = "1")]
        pub msg_type: i32,
        #[prost(int64, tag = "2")]
        pub msg_id: i64,
        #[prost(uint64, tag = "3")]
        pub timestamp: u64,
        #[prost(int64, tag = "4")]
        pub source_id: i64,
        #[prost(int64, tag = "5")]
        pub target_id: i64,
    }

    impl MsgBase {
        pub fn new(msg_type: MsgType) -> Self {
            Self {
                msg_type: msg_type as i32,
                ..Self::default()
            }
        }
    }
}

pub mod schema {
    use super::common::KeyValuePair;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
    #[repr(i32)]
    pub enum DataType {
        None = 0,
        Bool = 1,
        Int64 = 5,
        Float = 10,
        VarChar = 21,
        Json = 23,
        FloatVector = 101,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct FieldSchema {
        #[prost(int64, tag = "1")]
        pub field_id: i64,
        #[prost(string, tag = "2")]
        pub name: String,
        #[prost(bool, tag = "3")]
        pub is_primary_key: bool,
        #[prost(string, tag = "4")]
        pub description: String,
        #[prost(enumeration = "DataType", tag = "5")]
        pub data_type: i32,
        #[prost(message, repeated, tag = "6")]
        pub type_params: Vec<KeyValuePair>,
        #[prost(message, repeated, tag = "7")]
        pub index_params: Vec<KeyValuePair>,
        #[prost(bool, tag = "8")]
        pub auto_id: bool,
        #[prost(bool, tag = "12")]
        pub is_dynamic: bool,
        #[prost(bool, tag = "13")]
        pub is_partition_key: bool,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct CollectionSchema {
        #[prost(string, tag = "1")]
        pub name: String,
        #[prost(string, tag = "2")]
        pub description: String,
        #[prost(bool, tag = "3")]
        pub auto_id: bool,
        #[prost(message, repeated, tag = "4")]
        pub fields: Vec<FieldSchema>,
        #[prost(bool, tag = "5")]
        pub enable_dynamic_field: bool,
        #[prost(message, repeated, tag = "6")]
        pub properties: Vec<KeyValuePair>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct LongArray {
        #[prost(int64, repeated, tag = "1")]
        pub data: Vec<i64>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct FloatArray {
        #[prost(float, repeated, tag = "1")]
        pub data: Vec<f32>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct StringArray {
        #[prost(string, repeated, tag = "1")]
        pub data: Vec<String>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct JsonArray {
        #[prost(bytes = "vec", repeated, tag = "1")]
        pub data: Vec<Vec<u8>>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct ScalarField {
        #[prost(oneof = "scalar_field::Data", tags = "3, 6, 9")]
        pub data: Option<scalar_field::Data>,
    }

    pub mod scalar_field {
        #[derive(Clone, PartialEq, ::prost::Oneof)]
        pub enum Data {
            #[prost(message, tag = "3")]
            LongData(super::LongArray),
            #[prost(message, tag = "6")]
            StringData(super::StringArray),
            #[prost(message, tag = "9")]
            JsonData(super::JsonArray),
        }
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct VectorField {
        #[prost(int64, tag = "1")]
        pub dim: i64,
        #[prost(oneof = "vector_field::Data", tags = "2")]
        pub data: Option<vector_field::Data>,
    }

    pub mod vector_field {
        #[derive(Clone, PartialEq, ::prost::Oneof)]
        pub enum Data {
            #[prost(message, tag = "2")]
            FloatVector(super::FloatArray),
        }
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct FieldData {
        #[prost(enumeration = "DataType", tag = "1")]
        pub r#type: i32,
        #[prost(string, tag = "2")]
        pub field_name: String,
        #[prost(oneof = "field_data::Field", tags = "3, 4")]
        pub field: Option<field_data::Field>,
        #[prost(int64, tag = "5")]
        pub field_id: i64,
        #[prost(bool, tag = "6")]
        pub is_dynamic: bool,
    }

    pub mod field_data {
        #[derive(Clone, PartialEq, ::prost::Oneof)]
        pub enum Field {
            #[prost(message, tag = "3")]
            Scalars(super::ScalarField),
            #[prost(message, tag = "4")]
            Vectors(super::VectorField),
        }
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct IDs {
        #[prost(oneof = "i_ds::IdField", tags = "1, 2")]
        pub id_field: Option<i_ds::IdField>,
    }

    pub mod i_ds {
        #[derive(Clone, PartialEq, ::prost::Oneof)]
        pub enum IdField {
            #[prost(message, tag = "1")]
            IntId(super::LongArray),
            #[prost(message, tag = "2")]
            StrId(super::StringArray),
        }
    }
}

pub mod milvus {
    use super::common::{KeyValuePair, MsgBase, Status};
    use super::schema::{FieldData, IDs};
    use std::collections::HashMap;
    use tonic::codegen::{Body, Bytes, StdError, http};

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct HasCollectionRequest {
        #[prost(message, optional, tag = "1")]
        pub base: Option<MsgBase>,
        #[prost(string, tag = "2")]
        pub db_name: String,
        #[prost(string, tag = "3")]
        pub collection_name: String,
        #[prost(uint64, tag = "4")]
        pub time_stamp: u64,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct BoolResponse {
        #[prost(message, optional, tag = "1")]
        pub status: Option<Status>,
        #[prost(bool, tag = "2")]
        pub value: bool,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct CreateCollectionRequest {
        #[prost(message, optional, tag = "1")]
        pub base: Option<MsgBase>,
        #[prost(string, tag = "2")]
        pub db_name: String,
        #[prost(string, tag = "3")]
        pub collection_name: String,
        /// Encoded `schema.CollectionSchema`.
        #[prost(bytes = "vec", tag = "4")]
        pub schema: Vec<u8>,
        #[prost(int32, tag = "5")]
        pub shards_num: i32,
        #[prost(enumeration = "super::common::ConsistencyLevel", tag = "6")]
        pub consistency_level: i32,
        #[prost(message, repeated, tag = "7")]
        pub properties: Vec<KeyValuePair>,
        #[prost(int64, tag = "8")]
        pub num_partitions: i64,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct DropCollectionRequest {
        #[prost(message, optional, tag = "1")]
        pub base: Option<MsgBase>,
        #[prost(string, tag = "2")]
        pub db_name: String,
        #[prost(string, tag = "3")]
        pub collection_name: String,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct CreateIndexRequest {
        #[prost(message, optional, tag = "1")]
        pub base: Option<MsgBase>,
        #[prost(string, tag = "2")]
        pub db_name: String,
        #[prost(string, tag = "3")]
        pub collection_name: String,
        #[prost(string, tag = "4")]
        pub field_name: String,
        #[prost(message, repeated, tag = "5")]
        pub extra_params: Vec<KeyValuePair>,
        #[prost(string, tag = "6")]
        pub index_name: String,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct LoadCollectionRequest {
        #[prost(message, optional, tag = "1")]
        pub base: Option<MsgBase>,
        #[prost(string, tag = "2")]
        pub db_name: String,
        #[prost(string, tag = "3")]
        pub collection_name: String,
        #[prost(int32, tag = "4")]
        pub replica_number: i32,
        #[prost(string, repeated, tag = "5")]
        pub resource_groups: Vec<String>,
        #[prost(bool, tag = "6")]
        pub refresh: bool,
        #[prost(string, repeated, tag = "7")]
        pub load_fields: Vec<String>,
        #[prost(bool, tag = "8")]
        pub skip_load_dynamic_field: bool,
        #[prost(map = "string, string", tag = "9")]
        pub load_params: HashMap<String, String>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct GetLoadStateRequest {
        #[prost(message, optional, tag = "1")]
        pub base: Option<MsgBase>,
        #[prost(string, tag = "2")]
        pub collection_name: String,
        #[prost(string, repeated, tag = "3")]
        pub partition_names: Vec<String>,
        #[prost(string, tag = "4")]
        pub db_name: String,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct GetLoadStateResponse {
        #[prost(message, optional, tag = "1")]
        pub status: Option<Status>,
        #[prost(enumeration = "super::common::LoadState", tag = "2")]
        pub state: i32,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct InsertRequest {
        #[prost(message, optional, tag = "1")]
        pub base: Option<MsgBase>,
        #[prost(string, tag = "2")]
        pub db_name: String,
        #[prost(string, tag = "3")]
        pub collection_name: String,
        #[prost(string, tag = "4")]
        pub partition_name: String,
        #[prost(message, repeated, tag = "5")]
        pub fields_data: Vec<FieldData>,
        #[prost(uint32, repeated, tag = "6")]
        pub hash_keys: Vec<u32>,
        #[prost(uint32, tag = "7")]
        pub num_rows: u32,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct MutationResult {
        #[prost(message, optional, tag = "1")]
        pub status: Option<Status>,
        #[prost(message, optional, tag = "2")]
        pub ids: Option<IDs>,
        #[prost(uint32, repeated, tag = "3")]
        pub succ_index: Vec<u32>,
        #[prost(uint32, repeated, tag = "4")]
        pub err_index: Vec<u32>,
        #[prost(bool, tag = "5")]
        pub acknowledged: bool,
        #[prost(int64, tag = "6")]
        pub insert_cnt: i64,
        #[prost(int64, tag = "7")]
        pub delete_cnt: i64,
        #[prost(int64, tag = "8")]
        pub upsert_cnt: i64,
        #[prost(uint64, tag = "9")]
        pub timestamp: u64,
    }

    /// Fully qualified gRPC service name.
    pub const SERVICE_NAME: &str = "milvus.proto.milvus.MilvusService";

    /// Unary client for `milvus.proto.milvus.MilvusService`.
    #[derive(Debug, Clone)]
    pub struct MilvusServiceClient<T> {
        inner: tonic::client::Grpc<T>,
    }

    impl<T> MilvusServiceClient<T>
    where
        T: tonic::client::GrpcService<tonic::body::Body>,
        T::Error: Into<StdError>,
        T::ResponseBody: Body<Data = Bytes> + Send + 'static,
        <T::ResponseBody as Body>::Error: Into<StdError> + Send,
    {
        pub fn new(inner: T) -> Self {
            Self {
                inner: tonic::client::Grpc::new(inner),
            }
        }

        async fn unary<Req, Resp>(
            &mut self,
            path: &'static str,
            request: Req,
        ) -> Result<tonic::Response<Resp>, tonic::Status>
        where
            Req: ::prost::Message + Send + Sync + 'static,
            Resp: ::prost::Message + Default + Send + Sync + 'static,
        {
            self.inner.ready().await.map_err(|error| {
                let error: StdError = error.into();
                tonic::Status::unknown(format!("Service was not ready: {error}"))
            })?;
            let codec = tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static(path);
            self.inner
                .unary(tonic::Request::new(request), path, codec)
                .await
        }

        pub async fn has_collection(
            &mut self,
            request: HasCollectionRequest,
        ) -> Result<tonic::Response<BoolResponse>, tonic::Status> {
            self.unary("/milvus.proto.milvus.MilvusService/HasCollection", request)
                .await
        }

        pub async fn create_collection(
            &mut self,
            request: CreateCollectionRequest,
        ) -> Result<tonic::Response<Status>, tonic::Status> {
            self.unary(
                "/milvus.proto.milvus.MilvusService/CreateCollection",
                request,
            )
            .await
        }

        pub async fn drop_collection(
            &mut self,
            request: DropCollectionRequest,
        ) -> Result<tonic::Response<Status>, tonic::Status> {
            self.unary("/milvus.proto.milvus.MilvusService/DropCollection", request)
                .await
        }

        pub async fn create_index(
            &mut self,
            request: CreateIndexRequest,
        ) -> Result<tonic::Response<Status>, tonic::Status> {
            self.unary("/milvus.proto.milvus.MilvusService/CreateIndex", request)
                .await
        }

        pub async fn load_collection(
            &mut self,
            request: LoadCollectionRequest,
        ) -> Result<tonic::Response<Status>, tonic::Status> {
            self.unary("/milvus.proto.milvus.MilvusService/LoadCollection", request)
                .await
        }

        pub async fn get_load_state(
            &mut self,
            request: GetLoadStateRequest,
        ) -> Result<tonic::Response<GetLoadStateResponse>, tonic::Status> {
            self.unary("/milvus.proto.milvus.MilvusService/GetLoadState", request)
                .await
        }

        pub async fn insert(
            &mut self,
            request: InsertRequest,
        ) -> Result<tonic::Response<MutationResult>, tonic::Status> {
            self.unary("/milvus.proto.milvus.MilvusService/Insert", request)
                .await
        }
    }
}
