//! Integration coverage for domain primitives and record batches.

use milvus_otel_domain::{
    CollectionName, Dimension, LoadState, MAX_DIMENSION, PrimitiveError, Record, RecordBatch,
};
use milvus_otel_shared::ErrorEnvelope;

#[test]
fn primitive_errors_map_into_error_envelopes() -> Result<(), PrimitiveError> {
    let Err(error) = CollectionName::parse("9lives") else {
        return Err(PrimitiveError::InvalidCollectionName {
            input: "9lives".to_owned(),
        });
    };

    let envelope: ErrorEnvelope = error.into();
    assert_eq!(envelope.code.namespace(), "domain");
    assert_eq!(envelope.code.code(), "invalid_collection_name");
    assert_eq!(envelope.metadata.get("input"), Some(&"9lives".to_string()));

    let Err(dimension_error) = Dimension::new(u64::from(MAX_DIMENSION) + 1) else {
        return Err(PrimitiveError::InvalidDimension { value: 0 });
    };
    let envelope: ErrorEnvelope = dimension_error.into();
    assert_eq!(envelope.code.code(), "invalid_dimension");
    assert_eq!(envelope.metadata.get("dimension"), Some(&"32769".to_string()));
    Ok(())
}

#[test]
fn mismatched_vector_names_the_record() -> Result<(), PrimitiveError> {
    let Err(error) = RecordBatch::new(
        Dimension::new(5)?,
        vec![
            Record::new(0, vec![0.1; 5], "pink_8682"),
            Record::new(1, vec![0.2; 4], "red_7025"),
        ],
    ) else {
        return Err(PrimitiveError::EmptyBatch);
    };

    let envelope: ErrorEnvelope = error.into();
    assert_eq!(envelope.code.code(), "vector_dimension_mismatch");
    assert_eq!(envelope.metadata.get("id"), Some(&"1".to_string()));
    assert_eq!(envelope.metadata.get("expected"), Some(&"5".to_string()));
    assert_eq!(envelope.metadata.get("actual"), Some(&"4".to_string()));
    Ok(())
}

#[test]
fn dimension_and_load_state_serialize_as_plain_values() -> Result<(), Box<dyn std::error::Error>> {
    let dimension = Dimension::new(5)?;
    assert_eq!(serde_json::to_value(dimension)?, serde_json::json!(5));
    assert_eq!(serde_json::from_value::<Dimension>(serde_json::json!(5))?, dimension);
    assert!(serde_json::from_value::<Dimension>(serde_json::json!(0)).is_err());

    assert_eq!(
        serde_json::to_value(LoadState::NotExist)?,
        serde_json::json!("not_exist")
    );
    Ok(())
}
