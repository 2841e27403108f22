//! Quick-setup collection schema.

use crate::vectordb::milvus::proto::common::KeyValuePair;
use crate::vectordb::milvus::proto::schema::{CollectionSchema, DataType, FieldSchema};
use crate::vectordb::milvus::shared::{DEFAULT_COLLECTION_DESCRIPTION, ID_FIELD, VECTOR_FIELD};
use milvus_otel_domain::Dimension;

/// Field definition for a quick-setup collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MilvusFieldSpec {
    /// 64-bit integer field.
    Int64 {
        /// Field name.
        name: Box<str>,
        /// Whether this field is the collection primary key.
        is_primary_key: bool,
    },
    /// Dense float vector field.
    FloatVector {
        /// Field name.
        name: Box<str>,
        /// Vector dimension.
        dim: Dimension,
    },
}

/// Collection schema definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MilvusSchemaSpec {
    /// Field definitions in declaration order.
    pub fields: Vec<MilvusFieldSpec>,
    /// Whether undeclared keys land in the `$meta` JSON field.
    pub enable_dynamic_field: bool,
}

/// `id` (Int64 primary key, caller-assigned) and `vector` (`dimension`
/// floats), with dynamic fields enabled.
pub fn build_quick_setup_schema_spec(dimension: Dimension) -> MilvusSchemaSpec {
    MilvusSchemaSpec {
        fields: vec![
            MilvusFieldSpec::Int64 {
                name: ID_FIELD.into(),
                is_primary_key: true,
            },
            MilvusFieldSpec::FloatVector {
                name: VECTOR_FIELD.into(),
                dim: dimension,
            },
        ],
        enable_dynamic_field: true,
    }
}

/// Builds the protobuf schema sent in `CreateCollectionRequest.schema`.
pub fn build_grpc_schema(spec: &MilvusSchemaSpec, collection_name: &str) -> CollectionSchema {
    CollectionSchema {
        name: collection_name.to_owned(),
        description: DEFAULT_COLLECTION_DESCRIPTION.to_owned(),
        auto_id: false,
        fields: spec
            .fields
            .iter()
            .enumerate()
            .map(|(idx, field)| build_grpc_field_schema(grpc_field_id(idx), field))
            .collect(),
        enable_dynamic_field: spec.enable_dynamic_field,
        properties: Vec::new(),
    }
}

fn grpc_field_id(idx: usize) -> i64 {
    i64::try_from(idx).unwrap_or(i64::MAX)
}

fn build_grpc_field_schema(field_id: i64, field: &MilvusFieldSpec) -> FieldSchema {
    match field {
        MilvusFieldSpec::Int64 {
            name,
            is_primary_key,
        } => FieldSchema {
            field_id,
            name: name.to_string(),
            is_primary_key: *is_primary_key,
            data_type: DataType::Int64 as i32,
            ..FieldSchema::default()
        },
        MilvusFieldSpec::FloatVector { name, dim } => FieldSchema {
            field_id,
            name: name.to_string(),
            data_type: DataType::FloatVector as i32,
            type_params: vec![KeyValuePair::new("dim", dim.to_string())],
            ..FieldSchema::default()
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quick_setup_schema_declares_id_and_vector() -> Result<(), Box<dyn std::error::Error>> {
        let spec = build_quick_setup_schema_spec(Dimension::new(5)?);
        let schema = build_grpc_schema(&spec, "quick_setup");

        assert_eq!(schema.name, "quick_setup");
        assert!(schema.enable_dynamic_field);
        assert!(!schema.auto_id);
        assert_eq!(schema.fields.len(), 2);

        let id = &schema.fields[0];
        assert_eq!(id.name, "id");
        assert!(id.is_primary_key);
        assert!(!id.auto_id);
        assert_eq!(id.data_type, DataType::Int64 as i32);

        let vector = &schema.fields[1];
        assert_eq!(vector.name, "vector");
        assert_eq!(vector.data_type, DataType::FloatVector as i32);
        assert_eq!(vector.type_params, vec![KeyValuePair::new("dim", "5")]);
        Ok(())
    }
}
