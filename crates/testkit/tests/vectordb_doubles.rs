//! Contract-style tests for the vector DB doubles.

use milvus_otel_domain::{CollectionName, Dimension, Record, RecordBatch};
use milvus_otel_ports::{LoadState, VectorDbPort};
use milvus_otel_shared::{ErrorCode, ErrorEnvelope, RequestContext, Result};
use milvus_otel_testkit::errors::injected_failure_code;
use milvus_otel_testkit::{FaultyVectorDb, InMemoryVectorDb, Operation};

fn collection() -> Result<CollectionName> {
    CollectionName::parse("contract_smoke").map_err(ErrorEnvelope::from)
}

fn batch(dim: u64, ids: &[i64]) -> Result<RecordBatch> {
    let dimension = Dimension::new(dim).map_err(ErrorEnvelope::from)?;
    let records = ids
        .iter()
        .map(|id| Record::new(*id, vec![0.5; dimension.as_usize()], "grey"))
        .collect();
    RecordBatch::new(dimension, records).map_err(ErrorEnvelope::from)
}

#[tokio::test]
async fn lifecycle_matches_quick_setup_semantics() -> Result<()> {
    let ctx = RequestContext::new_run();
    let db = InMemoryVectorDb::default();
    let name = collection()?;
    let dim = Dimension::new(3).map_err(ErrorEnvelope::from)?;

    assert!(!db.has_collection(&ctx, name.clone()).await?);
    assert_eq!(db.get_load_state(&ctx, name.clone()).await?, LoadState::NotExist);

    db.create_collection(&ctx, name.clone(), dim).await?;
    assert_eq!(db.get_load_state(&ctx, name.clone()).await?, LoadState::Loaded);

    let outcome = db.insert(&ctx, name.clone(), batch(3, &[1, 2, 3])?).await?;
    assert_eq!(outcome.insert_count, 3);
    assert_eq!(outcome.ids, vec![1, 2, 3]);
    assert_eq!(db.row_count(&name).await, Some(3));

    db.drop_collection(&ctx, name.clone()).await?;
    assert!(db.collection_names().await.is_empty());
    assert_eq!(
        db.calls(),
        vec![
            Operation::HasCollection,
            Operation::GetLoadState,
            Operation::CreateCollection,
            Operation::GetLoadState,
            Operation::Insert,
            Operation::DropCollection,
        ]
    );
    Ok(())
}

#[tokio::test]
async fn insert_into_missing_collection_fails() -> Result<()> {
    let ctx = RequestContext::new_run();
    let db = InMemoryVectorDb::default();
    let error = db
        .insert(&ctx, collection()?, batch(2, &[1])?)
        .await
        .err()
        .ok_or_else(|| ErrorEnvelope::expected(ErrorCode::internal(), "insert should fail"))?;
    assert_eq!(error.code, ErrorCode::new("vector", "vdb_collection_not_found"));
    Ok(())
}

#[tokio::test]
async fn recreating_with_another_dimension_is_rejected() -> Result<()> {
    let ctx = RequestContext::new_run();
    let name = collection()?;
    let db = InMemoryVectorDb::with_collection(
        name.clone(),
        Dimension::new(4).map_err(ErrorEnvelope::from)?,
    )
    .await;

    let result = db
        .create_collection(&ctx, name, Dimension::new(5).map_err(ErrorEnvelope::from)?)
        .await;
    assert!(result.is_err_and(|error| error.code.code() == "vdb_collection_exists"));
    Ok(())
}

#[tokio::test]
async fn calls_after_close_fail() -> Result<()> {
    let ctx = RequestContext::new_run();
    let db = InMemoryVectorDb::default();
    db.close().await?;
    assert!(db.is_closed());
    let result = db.has_collection(&ctx, collection()?).await;
    assert!(result.is_err_and(|error| error.code.code() == "vdb_closed"));
    Ok(())
}

#[tokio::test]
async fn cancelled_context_is_honored() -> Result<()> {
    let ctx = RequestContext::new_run();
    ctx.cancel();
    let db = InMemoryVectorDb::default();
    let result = db.has_collection(&ctx, collection()?).await;
    assert!(result.is_err_and(|error| error.is_cancelled()));
    Ok(())
}

#[tokio::test]
async fn faulty_double_injects_failures_and_counts() -> Result<()> {
    let ctx = RequestContext::new_run();
    let name = collection()?;
    let dim = Dimension::new(2).map_err(ErrorEnvelope::from)?;

    let failing = FaultyVectorDb::default().failing_on(Operation::CreateCollection);
    let error = failing
        .create_collection(&ctx, name.clone(), dim)
        .await
        .err()
        .ok_or_else(|| ErrorEnvelope::expected(ErrorCode::internal(), "create should fail"))?;
    assert_eq!(error.code, injected_failure_code());
    assert!(failing.inner().collection_names().await.is_empty());

    let miscounting = FaultyVectorDb::default().reporting_insert_count(7);
    miscounting.create_collection(&ctx, name.clone(), dim).await?;
    let outcome = miscounting.insert(&ctx, name.clone(), batch(2, &[1, 2])?).await?;
    assert_eq!(outcome.insert_count, 7);
    assert_eq!(miscounting.inner().row_count(&name).await, Some(2));
    Ok(())
}

#[tokio::test]
async fn faulty_double_fails_several_operations_and_cancels_mid_call() -> Result<()> {
    let ctx = RequestContext::new_run();
    let name = collection()?;
    let dim = Dimension::new(2).map_err(ErrorEnvelope::from)?;

    let failing = FaultyVectorDb::default()
        .failing_on(Operation::Insert)
        .failing_on(Operation::DropCollection);
    failing.create_collection(&ctx, name.clone(), dim).await?;
    let insert = failing.insert(&ctx, name.clone(), batch(2, &[1])?).await;
    let drop = failing.drop_collection(&ctx, name.clone()).await;
    assert!(insert.is_err_and(|error| error.code == injected_failure_code()));
    assert!(drop.is_err_and(|error| error.code == injected_failure_code()));
    assert!(failing.inner().collection_names().await.contains("contract_smoke"));

    let cancelling = FaultyVectorDb::default().cancelling_on(Operation::Insert);
    cancelling.create_collection(&ctx, name.clone(), dim).await?;
    let insert = cancelling.insert(&ctx, name.clone(), batch(2, &[1])?).await;
    assert!(insert.is_err_and(|error| error.is_cancelled()));
    assert!(ctx.is_cancelled());
    assert_eq!(cancelling.inner().row_count(&name).await, Some(0));
    Ok(())
}
