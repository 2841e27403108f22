//! Records written to a collection.

use crate::primitives::{Dimension, PrimitiveError};
use serde::{Deserialize, Serialize};

/// One row: primary key, embedding and a color label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Primary key, unique within a batch by convention.
    pub id: i64,
    /// Embedding; its length must equal the collection dimension.
    pub vector: Vec<f32>,
    /// Free-form label stored as a dynamic field.
    pub color: Box<str>,
}

impl Record {
    /// Build a record.
    pub fn new(id: i64, vector: impl Into<Vec<f32>>, color: impl Into<Box<str>>) -> Self {
        Self {
            id,
            vector: vector.into(),
            color: color.into(),
        }
    }
}

/// Non-empty batch whose vectors all match one dimension.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordBatch {
    dimension: Dimension,
    records: Vec<Record>,
}

impl RecordBatch {
    /// Validate `records` against `dimension`.
    ///
    /// The first record whose vector length differs is reported.
    pub fn new(dimension: Dimension, records: Vec<Record>) -> Result<Self, PrimitiveError> {
        if records.is_empty() {
            return Err(PrimitiveError::EmptyBatch);
        }
        if let Some(record) = records
            .iter()
            .find(|record| record.vector.len() != dimension.as_usize())
        {
            return Err(PrimitiveError::VectorDimensionMismatch {
                id: record.id,
                expected: dimension.get(),
                actual: record.vector.len(),
            });
        }
        Ok(Self { dimension, records })
    }

    /// Declared dimension.
    #[must_use]
    pub const fn dimension(&self) -> Dimension {
        self.dimension
    }

    /// Records in insertion order.
    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Always false for a constructed batch.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Primary keys in insertion order.
    pub fn ids(&self) -> impl Iterator<Item = i64> + '_ {
        self.records.iter().map(|record| record.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dim(value: u64) -> Result<Dimension, PrimitiveError> {
        Dimension::new(value)
    }

    #[test]
    fn batch_accepts_matching_vectors() -> Result<(), PrimitiveError> {
        let batch = RecordBatch::new(
            dim(2)?,
            vec![
                Record::new(1, vec![0.1, 0.2], "red"),
                Record::new(2, vec![0.3, 0.4], "blue"),
            ],
        )?;
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.ids().collect::<Vec<_>>(), vec![1, 2]);
        Ok(())
    }

    #[test]
    fn batch_reports_first_mismatched_record() -> Result<(), PrimitiveError> {
        let result = RecordBatch::new(
            dim(3)?,
            vec![
                Record::new(7, vec![0.0; 3], "ok"),
                Record::new(8, vec![0.0; 4], "long"),
                Record::new(9, vec![0.0; 1], "short"),
            ],
        );
        assert_eq!(
            result.err(),
            Some(PrimitiveError::VectorDimensionMismatch {
                id: 8,
                expected: 3,
                actual: 4,
            })
        );
        Ok(())
    }

    #[test]
    fn batch_rejects_empty_input() -> Result<(), PrimitiveError> {
        assert_eq!(
            RecordBatch::new(dim(5)?, Vec::new()).err(),
            Some(PrimitiveError::EmptyBatch)
        );
        Ok(())
    }
}
