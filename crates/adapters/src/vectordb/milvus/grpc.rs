//! Milvus gRPC adapter.

use crate::telemetry::{GrpcTraceLayer, GrpcTraceService, TracingContext};
use crate::vectordb::milvus::error::{
    MilvusErrorContext, PROVIDER_ID, ensure_status_ok, map_grpc_error,
};
use crate::vectordb::milvus::index::MilvusIndexSpec;
use crate::vectordb::milvus::proto::common::{
    ConsistencyLevel, KeyValuePair, LoadState as ProtoLoadState, MsgBase, MsgType, Status,
};
use crate::vectordb::milvus::proto::milvus::{
    CreateCollectionRequest, CreateIndexRequest, DropCollectionRequest, GetLoadStateRequest,
    HasCollectionRequest, InsertRequest, LoadCollectionRequest, MilvusServiceClient,
    MutationResult,
};
use crate::vectordb::milvus::proto::schema::{
    DataType, FieldData, FloatArray, JsonArray, LongArray, ScalarField, VectorField, field_data,
    i_ds, scalar_field, vector_field,
};
use crate::vectordb::milvus::schema::{build_grpc_schema, build_quick_setup_schema_spec};
use crate::vectordb::milvus::shared::{
    DYNAMIC_FIELD, ID_FIELD, LOAD_POLL_INTERVAL_MS, VECTOR_FIELD, VECTOR_INDEX_NAME,
};
use base64::Engine;
use base64::engine::general_purpose;
use bytes::BytesMut;
use milvus_otel_config::{MilvusAuth, MilvusConfig};
use milvus_otel_ports::{
    BoxFuture, CollectionName, Dimension, InsertOutcome, LoadState, RecordBatch, VectorDbPort,
    VectorDbProviderInfo,
};
use milvus_otel_shared::{
    ErrorClass, ErrorCode, ErrorEnvelope, RequestContext, Result, timeout_with_context,
};
use prost::Message;
use std::future::Future;
use std::str::FromStr;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tonic::codegen::InterceptedService;
use tonic::metadata::AsciiMetadataValue;
use tonic::service::Interceptor;
use tonic::transport::{Channel, ClientTlsConfig, Endpoint};
use tower::Layer;

/// Milvus gRPC adapter configuration.
#[derive(Debug, Clone)]
pub struct MilvusGrpcConfig {
    /// Milvus endpoint, `host:port` or an `http(s)://` URI.
    pub address: Box<str>,
    /// Credentials sent in the `authorization` header.
    pub auth: MilvusAuth,
    /// Optional database name header.
    pub database: Option<Box<str>>,
    /// Per-call timeout in milliseconds.
    pub timeout_ms: u64,
    /// Wait-for-load timeout in milliseconds.
    pub load_timeout_ms: u64,
    /// Index created on the vector field.
    pub index: MilvusIndexSpec,
}

impl MilvusGrpcConfig {
    /// Validates configuration invariants for the gRPC adapter.
    pub fn validate(&self) -> Result<()> {
        if self.address.trim().is_empty() {
            return Err(ErrorEnvelope::expected(
                ErrorCode::invalid_input(),
                "Milvus gRPC address is required",
            ));
        }
        if self.timeout_ms == 0 {
            return Err(ErrorEnvelope::expected(
                ErrorCode::invalid_input(),
                "Milvus timeout must be greater than zero",
            ));
        }
        if self.load_timeout_ms == 0 {
            return Err(ErrorEnvelope::expected(
                ErrorCode::invalid_input(),
                "Milvus load timeout must be greater than zero",
            ));
        }
        Ok(())
    }
}

impl From<&MilvusConfig> for MilvusGrpcConfig {
    fn from(config: &MilvusConfig) -> Self {
        Self {
            address: config.uri.clone(),
            auth: config.auth(),
            database: config.db_name.clone(),
            timeout_ms: config.timeout_ms,
            load_timeout_ms: config.load_timeout_ms,
            index: MilvusIndexSpec::default(),
        }
    }
}

#[derive(Debug, Clone)]
struct AuthInterceptor {
    auth_header: Option<AsciiMetadataValue>,
    db_name: Option<AsciiMetadataValue>,
}

impl Interceptor for AuthInterceptor {
    fn call(
        &mut self,
        mut req: tonic::Request<()>,
    ) -> std::result::Result<tonic::Request<()>, tonic::Status> {
        if let Some(header) = self.auth_header.clone() {
            req.metadata_mut().insert("authorization", header);
        }
        if let Some(db_name) = self.db_name.clone() {
            req.metadata_mut().insert("dbname", db_name);
        }
        Ok(req)
    }
}

type MilvusClient =
    MilvusServiceClient<InterceptedService<GrpcTraceService<Channel>, AuthInterceptor>>;

/// Milvus gRPC vector DB adapter.
///
/// Every RPC goes through [`GrpcTraceLayer`], so each call shows up as a
/// client span under the caller's current span.
pub struct MilvusGrpcVectorDb {
    provider: VectorDbProviderInfo,
    client: RwLock<Option<MilvusClient>>,
    timeout: Duration,
    load_timeout: Duration,
    index: MilvusIndexSpec,
    db_name: String,
}

impl std::fmt::Debug for MilvusGrpcVectorDb {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("MilvusGrpcVectorDb")
            .field("provider", &self.provider)
            .field("timeout", &self.timeout)
            .field("load_timeout", &self.load_timeout)
            .field("db_name", &self.db_name)
            .finish_non_exhaustive()
    }
}

impl MilvusGrpcVectorDb {
    /// Connects to Milvus and registers the tracing layer on the channel.
    pub async fn connect(config: MilvusGrpcConfig, tracing_ctx: &TracingContext) -> Result<Self> {
        config.validate()?;
        let address = normalize_grpc_address(&config.address);
        let ssl = address.starts_with("https://");
        let timeout = Duration::from_millis(config.timeout_ms);
        let mut endpoint = Endpoint::from_shared(address.clone()).map_err(|error| {
            ErrorEnvelope::expected(
                ErrorCode::invalid_input(),
                format!("invalid Milvus address: {error}"),
            )
            .with_metadata("address", address.clone())
        })?;
        endpoint = endpoint.timeout(timeout).connect_timeout(timeout);
        if ssl {
            let tls = ClientTlsConfig::new().with_native_roots();
            endpoint = endpoint.tls_config(tls).map_err(|error| {
                ErrorEnvelope::expected(
                    ErrorCode::invalid_input(),
                    format!("invalid TLS config: {error}"),
                )
            })?;
        }
        let server_address = endpoint
            .uri()
            .authority()
            .map_or_else(|| address.clone(), ToString::to_string);

        tracing::debug!(address = %address, "connecting to Milvus");
        let channel = endpoint.connect().await.map_err(|error| {
            ErrorEnvelope::unexpected(
                ErrorCode::new("vector", "vdb_connection"),
                format!("failed to connect to Milvus gRPC: {error}"),
                ErrorClass::Retriable,
            )
            .with_metadata("address", address.clone())
        })?;

        let interceptor = AuthInterceptor {
            auth_header: build_auth_header(&config.auth)?,
            db_name: build_db_header(config.database.as_deref())?,
        };
        let traced = GrpcTraceLayer::new(tracing_ctx.clone(), server_address).layer(channel);
        let client = MilvusServiceClient::new(InterceptedService::new(traced, interceptor));

        Ok(Self {
            provider: VectorDbProviderInfo {
                id: PROVIDER_ID.into(),
                name: "Milvus gRPC".into(),
            },
            client: RwLock::new(Some(client)),
            timeout,
            load_timeout: Duration::from_millis(config.load_timeout_ms),
            index: config.index,
            db_name: config
                .database
                .as_deref()
                .map(str::trim)
                .unwrap_or_default()
                .to_owned(),
        })
    }

    fn context(operation: &'static str, collection: Option<&CollectionName>) -> MilvusErrorContext {
        MilvusErrorContext {
            operation,
            collection_name: collection.map(|c| c.as_str().to_owned()),
        }
    }

    async fn client(&self, operation: &'static str) -> Result<MilvusClient> {
        self.client.read().await.clone().ok_or_else(|| {
            ErrorEnvelope::expected(
                ErrorCode::new("vector", "vdb_closed"),
                "Milvus client is closed",
            )
            .with_metadata("operation", operation)
        })
    }

    async fn call_with_timeout<T>(
        &self,
        ctx: &RequestContext,
        operation: &'static str,
        collection: Option<&CollectionName>,
        fut: impl Future<Output = std::result::Result<tonic::Response<T>, tonic::Status>>,
    ) -> Result<T> {
        let call = async {
            fut.await
                .map(tonic::Response::into_inner)
                .map_err(|status| map_grpc_error(&status, &Self::context(operation, collection)))
        };
        timeout_with_context(ctx, self.timeout, operation, call)
            .await
            .map_err(|error| {
                if error.code == ErrorCode::timeout() {
                    timeout_error(operation, self.timeout)
                } else {
                    error
                }
            })
    }

    async fn call_status(
        &self,
        ctx: &RequestContext,
        operation: &'static str,
        collection: &CollectionName,
        fut: impl Future<Output = std::result::Result<tonic::Response<Status>, tonic::Status>>,
    ) -> Result<()> {
        let status = self
            .call_with_timeout(ctx, operation, Some(collection), fut)
            .await?;
        ensure_status_ok(&status, &Self::context(operation, Some(collection)))
    }

    async fn fetch_load_state(
        &self,
        ctx: &RequestContext,
        collection: &CollectionName,
    ) -> Result<LoadState> {
        let operation = "milvus_grpc.get_load_state";
        let mut client = self.client(operation).await?;
        let request = GetLoadStateRequest {
            base: None,
            collection_name: collection.as_str().to_owned(),
            partition_names: Vec::new(),
            db_name: self.db_name.clone(),
        };
        let response = self
            .call_with_timeout(
                ctx,
                operation,
                Some(collection),
                client.get_load_state(request),
            )
            .await?;
        if let Some(status) = response.status.as_ref() {
            ensure_status_ok(status, &Self::context(operation, Some(collection)))?;
        }
        map_load_state(response.state)
    }

    async fn create_index(&self, ctx: &RequestContext, collection: &CollectionName) -> Result<()> {
        let operation = "milvus_grpc.create_index";
        let mut client = self.client(operation).await?;
        let mut extra_params = vec![
            KeyValuePair::new("index_type", self.index.index_type.to_string()),
            KeyValuePair::new("metric_type", self.index.metric_type.to_string()),
        ];
        for (key, value) in &self.index.params {
            extra_params.push(KeyValuePair::new(key.to_string(), value.to_string()));
        }
        let request = CreateIndexRequest {
            base: Some(MsgBase::new(MsgType::CreateIndex)),
            db_name: self.db_name.clone(),
            collection_name: collection.as_str().to_owned(),
            field_name: VECTOR_FIELD.to_owned(),
            extra_params,
            index_name: VECTOR_INDEX_NAME.to_owned(),
        };
        self.call_status(ctx, operation, collection, client.create_index(request))
            .await
    }

    async fn load_collection(&self, ctx: &RequestContext, collection: &CollectionName) -> Result<()> {
        let operation = "milvus_grpc.load_collection";
        let mut client = self.client(operation).await?;
        let request = LoadCollectionRequest {
            base: Some(MsgBase::new(MsgType::LoadCollection)),
            db_name: self.db_name.clone(),
            collection_name: collection.as_str().to_owned(),
            replica_number: 1,
            ..LoadCollectionRequest::default()
        };
        self.call_status(ctx, operation, collection, client.load_collection(request))
            .await
    }

    async fn wait_for_loaded(
        &self,
        ctx: &RequestContext,
        collection: &CollectionName,
    ) -> Result<()> {
        let operation = "milvus_grpc.wait_for_load";
        let start = Instant::now();
        while start.elapsed() < self.load_timeout {
            ctx.ensure_not_cancelled(operation)?;
            let state = self.fetch_load_state(ctx, collection).await?;
            if state.is_loaded() {
                return Ok(());
            }
            tracing::debug!(collection = %collection, state = %state, "waiting for collection load");
            tokio::time::sleep(Duration::from_millis(LOAD_POLL_INTERVAL_MS)).await;
        }

        Err(ErrorEnvelope::unexpected(
            ErrorCode::new("vector", "vdb_load_timeout"),
            "timed out waiting for Milvus collection load",
            ErrorClass::Retriable,
        )
        .with_metadata("collection", collection.as_str())
        .with_metadata("timeoutMs", self.load_timeout.as_millis().to_string()))
    }
}

impl VectorDbPort for MilvusGrpcVectorDb {
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
            let operation = "milvus_grpc.has_collection";
            let mut client = self.client(operation).await?;
            let request = HasCollectionRequest {
                base: Some(MsgBase::new(MsgType::HasCollection)),
                db_name: self.db_name.clone(),
                collection_name: collection_name.as_str().to_owned(),
                time_stamp: 0,
            };
            let response = self
                .call_with_timeout(
                    &ctx,
                    operation,
                    Some(&collection_name),
                    client.has_collection(request),
                )
                .await?;
            if let Some(status) = response.status.as_ref() {
                ensure_status_ok(status, &Self::context(operation, Some(&collection_name)))?;
            }
            Ok(response.value)
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
            let operation = "milvus_grpc.create_collection";
            let spec = build_quick_setup_schema_spec(dimension);
            let schema = build_grpc_schema(&spec, collection_name.as_str());
            let mut buf = BytesMut::new();
            schema.encode(&mut buf).map_err(|error| {
                ErrorEnvelope::unexpected(
                    ErrorCode::new("vector", "vdb_schema_encode"),
                    format!("failed to encode Milvus schema: {error}"),
                    ErrorClass::NonRetriable,
                )
            })?;

            let mut client = self.client(operation).await?;
            let request = CreateCollectionRequest {
                base: Some(MsgBase::new(MsgType::CreateCollection)),
                db_name: self.db_name.clone(),
                collection_name: collection_name.as_str().to_owned(),
                schema: buf.to_vec(),
                shards_num: 0,
                consistency_level: ConsistencyLevel::Bounded as i32,
                properties: Vec::new(),
                num_partitions: 0,
            };
            self.call_status(
                &ctx,
                operation,
                &collection_name,
                client.create_collection(request),
            )
            .await?;

            self.create_index(&ctx, &collection_name).await?;
            self.load_collection(&ctx, &collection_name).await?;
            self.wait_for_loaded(&ctx, &collection_name).await?;
            tracing::debug!(collection = %collection_name, dimension = %dimension, "collection ready");
            Ok(())
        })
    }

    fn get_load_state(
        &self,
        ctx: &RequestContext,
        collection_name: CollectionName,
    ) -> BoxFuture<'_, Result<LoadState>> {
        let ctx = ctx.clone();
        Box::pin(async move { self.fetch_load_state(&ctx, &collection_name).await })
    }

    fn insert(
        &self,
        ctx: &RequestContext,
        collection_name: CollectionName,
        batch: RecordBatch,
    ) -> BoxFuture<'_, Result<InsertOutcome>> {
        let ctx = ctx.clone();
        Box::pin(async move {
            let operation = "milvus_grpc.insert";
            let fields_data = build_insert_fields(&batch)?;
            let num_rows = u32::try_from(batch.len()).map_err(|_| {
                ErrorEnvelope::expected(ErrorCode::invalid_input(), "insert batch is too large")
                    .with_metadata("rows", batch.len().to_string())
            })?;

            let mut client = self.client(operation).await?;
            let request = InsertRequest {
                base: Some(MsgBase::new(MsgType::Insert)),
                db_name: self.db_name.clone(),
                collection_name: collection_name.as_str().to_owned(),
                partition_name: String::new(),
                fields_data,
                hash_keys: Vec::new(),
                num_rows,
            };
            let response = self
                .call_with_timeout(&ctx, operation, Some(&collection_name), client.insert(request))
                .await?;
            if let Some(status) = response.status.as_ref() {
                ensure_status_ok(status, &Self::context(operation, Some(&collection_name)))?;
            }
            parse_mutation_result(response)
        })
    }

    fn drop_collection(
        &self,
        ctx: &RequestContext,
        collection_name: CollectionName,
    ) -> BoxFuture<'_, Result<()>> {
        let ctx = ctx.clone();
        Box::pin(async move {
            let operation = "milvus_grpc.drop_collection";
            let mut client = self.client(operation).await?;
            let request = DropCollectionRequest {
                base: Some(MsgBase::new(MsgType::DropCollection)),
                db_name: self.db_name.clone(),
                collection_name: collection_name.as_str().to_owned(),
            };
            self.call_status(
                &ctx,
                operation,
                &collection_name,
                client.drop_collection(request),
            )
            .await
        })
    }

    fn close(&self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            if self.client.write().await.take().is_some() {
                tracing::debug!("Milvus client closed");
            }
            Ok(())
        })
    }
}

fn build_insert_fields(batch: &RecordBatch) -> Result<Vec<FieldData>> {
    let records = batch.records();
    let dim = batch.dimension();
    let mut ids = Vec::with_capacity(records.len());
    let mut vectors = Vec::with_capacity(records.len() * dim.as_usize());
    let mut dynamic_rows = Vec::with_capacity(records.len());

    for record in records {
        if record.vector.len() != dim.as_usize() {
            return Err(ErrorEnvelope::expected(
                ErrorCode::invalid_input(),
                "vector length does not match the batch dimension",
            )
            .with_metadata("id", record.id.to_string())
            .with_metadata("expected", dim.to_string())
            .with_metadata("actual", record.vector.len().to_string()));
        }
        ids.push(record.id);
        vectors.extend_from_slice(&record.vector);
        let row = serde_json::json!({ "color": &*record.color });
        let encoded = serde_json::to_vec(&row).map_err(|error| {
            ErrorEnvelope::unexpected(
                ErrorCode::new("vector", "vdb_row_encode"),
                format!("failed to encode dynamic fields: {error}"),
                ErrorClass::NonRetriable,
            )
        })?;
        dynamic_rows.push(encoded);
    }

    Ok(vec![
        FieldData {
            r#type: DataType::Int64 as i32,
            field_name: ID_FIELD.to_owned(),
            field: Some(field_data::Field::Scalars(ScalarField {
                data: Some(scalar_field::Data::LongData(LongArray { data: ids })),
            })),
            ..FieldData::default()
        },
        FieldData {
            r#type: DataType::FloatVector as i32,
            field_name: VECTOR_FIELD.to_owned(),
            field: Some(field_data::Field::Vectors(VectorField {
                dim: i64::from(dim.get()),
                data: Some(vector_field::Data::FloatVector(FloatArray { data: vectors })),
            })),
            ..FieldData::default()
        },
        FieldData {
            r#type: DataType::Json as i32,
            field_name: DYNAMIC_FIELD.to_owned(),
            field: Some(field_data::Field::Scalars(ScalarField {
                data: Some(scalar_field::Data::JsonData(JsonArray {
                    data: dynamic_rows,
                })),
            })),
            is_dynamic: true,
            ..FieldData::default()
        },
    ])
}

fn parse_mutation_result(response: MutationResult) -> Result<InsertOutcome> {
    let insert_count = u64::try_from(response.insert_cnt).map_err(|_| {
        ErrorEnvelope::unexpected(
            ErrorCode::new("vector", "vdb_protocol"),
            "Milvus reported a negative insert count",
            ErrorClass::NonRetriable,
        )
        .with_metadata("insert_cnt", response.insert_cnt.to_string())
    })?;
    let ids = match response.ids.and_then(|ids| ids.id_field) {
        Some(i_ds::IdField::IntId(LongArray { data })) => data,
        Some(i_ds::IdField::StrId(_)) | None => Vec::new(),
    };
    Ok(InsertOutcome { insert_count, ids })
}

fn map_load_state(raw: i32) -> Result<LoadState> {
    match ProtoLoadState::try_from(raw) {
        Ok(ProtoLoadState::NotExist) => Ok(LoadState::NotExist),
        Ok(ProtoLoadState::NotLoad) => Ok(LoadState::NotLoad),
        Ok(ProtoLoadState::Loading) => Ok(LoadState::Loading),
        Ok(ProtoLoadState::Loaded) => Ok(LoadState::Loaded),
        Err(_) => Err(ErrorEnvelope::unexpected(
            ErrorCode::new("vector", "vdb_protocol"),
            "Milvus reported an unknown load state",
            ErrorClass::NonRetriable,
        )
        .with_metadata("state", raw.to_string())),
    }
}

fn normalize_grpc_address(address: &str) -> String {
    let trimmed = address.trim();
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        return trimmed.trim_end_matches('/').to_owned();
    }
    format!("http://{trimmed}")
}

fn build_auth_header(auth: &MilvusAuth) -> Result<Option<AsciiMetadataValue>> {
    let raw = match auth {
        MilvusAuth::None => return Ok(None),
        MilvusAuth::Token(token) => token.expose().trim().to_owned(),
        MilvusAuth::Basic { user, password } => format!("{user}:{}", password.expose()),
    };
    if raw.is_empty() {
        return Ok(None);
    }
    let encoded = general_purpose::STANDARD.encode(raw);
    let value = AsciiMetadataValue::from_str(&encoded).map_err(|_| {
        ErrorEnvelope::expected(
            ErrorCode::invalid_input(),
            "Milvus auth header contains invalid characters",
        )
    })?;
    Ok(Some(value))
}

fn build_db_header(database: Option<&str>) -> Result<Option<AsciiMetadataValue>> {
    let Some(db_name) = database.map(str::trim).filter(|value| !value.is_empty()) else {
        return Ok(None);
    };
    let value = AsciiMetadataValue::from_str(db_name).map_err(|_| {
        ErrorEnvelope::expected(
            ErrorCode::invalid_input(),
            "Milvus database name contains invalid characters",
        )
    })?;
    Ok(Some(value))
}

fn timeout_error(operation: &'static str, timeout: Duration) -> ErrorEnvelope {
    ErrorEnvelope::unexpected(
        ErrorCode::new("vector", "vdb_timeout"),
        "Milvus request timed out",
        ErrorClass::Retriable,
    )
    .with_metadata("operation", operation)
    .with_metadata("timeoutMs", timeout.as_millis().to_string())
}
