//! Domain primitives with validated constructors.

use milvus_otel_shared::{ErrorCode, ErrorEnvelope};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Longest collection name Milvus accepts.
pub const MAX_COLLECTION_NAME_LEN: usize = 255;

/// Largest vector dimension Milvus accepts for float vectors.
pub const MAX_DIMENSION: u32 = 32_768;

/// Validation failures for domain primitives and record batches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrimitiveError {
    /// `CollectionName` is empty after trimming.
    EmptyCollectionName {
        /// Length of the raw input before trimming.
        input_length: usize,
    },
    /// `CollectionName` violates the allowed pattern.
    InvalidCollectionName {
        /// Trimmed collection name that failed validation.
        input: String,
    },
    /// `CollectionName` is longer than [`MAX_COLLECTION_NAME_LEN`].
    CollectionNameTooLong {
        /// Length of the trimmed input.
        length: usize,
    },
    /// `Dimension` outside `1..=MAX_DIMENSION`.
    InvalidDimension {
        /// Rejected value.
        value: u64,
    },
    /// A record's vector length differs from the batch dimension.
    VectorDimensionMismatch {
        /// Primary key of the offending record.
        id: i64,
        /// Declared dimension.
        expected: u32,
        /// Observed vector length.
        actual: usize,
    },
    /// A batch has no records.
    EmptyBatch,
}

impl PrimitiveError {
    fn error_code(&self) -> ErrorCode {
        match self {
            Self::EmptyCollectionName { .. }
            | Self::InvalidCollectionName { .. }
            | Self::CollectionNameTooLong { .. } => {
                ErrorCode::new("domain", "invalid_collection_name")
            },
            Self::InvalidDimension { .. } => ErrorCode::new("domain", "invalid_dimension"),
            Self::VectorDimensionMismatch { .. } => {
                ErrorCode::new("domain", "vector_dimension_mismatch")
            },
            Self::EmptyBatch => ErrorCode::new("domain", "empty_batch"),
        }
    }
}

impl fmt::Display for PrimitiveError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyCollectionName { .. } => {
                formatter.write_str("CollectionName must be non-empty")
            },
            Self::InvalidCollectionName { .. } => {
                formatter.write_str("CollectionName must match /^[a-zA-Z_][a-zA-Z0-9_]*$/")
            },
            Self::CollectionNameTooLong { length } => write!(
                formatter,
                "CollectionName is {length} chars; at most {MAX_COLLECTION_NAME_LEN} allowed"
            ),
            Self::InvalidDimension { value } => {
                write!(formatter, "Dimension {value} outside 1..={MAX_DIMENSION}")
            },
            Self::VectorDimensionMismatch {
                id,
                expected,
                actual,
            } => write!(
                formatter,
                "record {id} has a vector of length {actual}; the collection dimension is {expected}"
            ),
            Self::EmptyBatch => formatter.write_str("insert batch must contain at least one record"),
        }
    }
}

impl std::error::Error for PrimitiveError {}

impl From<PrimitiveError> for ErrorEnvelope {
    fn from(error: PrimitiveError) -> Self {
        let envelope = Self::expected(error.error_code(), error.to_string());

        match error {
            PrimitiveError::EmptyCollectionName { input_length } => {
                envelope.with_metadata("input_length", input_length.to_string())
            },
            PrimitiveError::InvalidCollectionName { input } => envelope.with_metadata("input", input),
            PrimitiveError::CollectionNameTooLong { length } => {
                envelope.with_metadata("length", length.to_string())
            },
            PrimitiveError::InvalidDimension { value } => {
                envelope.with_metadata("dimension", value.to_string())
            },
            PrimitiveError::VectorDimensionMismatch {
                id,
                expected,
                actual,
            } => envelope
                .with_metadata("id", id.to_string())
                .with_metadata("expected", expected.to_string())
                .with_metadata("actual", actual.to_string()),
            PrimitiveError::EmptyBatch => envelope,
        }
    }
}

/// Identifier for a Milvus collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CollectionName(Box<str>);

impl CollectionName {
    /// Parse a collection name that satisfies the Milvus naming rules.
    pub fn parse(input: impl AsRef<str>) -> Result<Self, PrimitiveError> {
        let raw = input.as_ref();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(PrimitiveError::EmptyCollectionName {
                input_length: raw.len(),
            });
        }
        if trimmed.len() > MAX_COLLECTION_NAME_LEN {
            return Err(PrimitiveError::CollectionNameTooLong {
                length: trimmed.len(),
            });
        }
        if !is_valid_collection_name(trimmed) {
            return Err(PrimitiveError::InvalidCollectionName {
                input: trimmed.to_owned(),
            });
        }

        Ok(Self(trimmed.into()))
    }

    /// Access the underlying string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for CollectionName {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for CollectionName {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl TryFrom<String> for CollectionName {
    type Error = PrimitiveError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<CollectionName> for String {
    fn from(value: CollectionName) -> Self {
        value.0.into()
    }
}

/// Vector dimensionality of a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u32")]
pub struct Dimension(u32);

impl Dimension {
    /// Validate a dimension in `1..=MAX_DIMENSION`.
    pub fn new(value: u64) -> Result<Self, PrimitiveError> {
        match u32::try_from(value) {
            Ok(dim) if (1..=MAX_DIMENSION).contains(&dim) => Ok(Self(dim)),
            _ => Err(PrimitiveError::InvalidDimension { value }),
        }
    }

    /// Raw value.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Raw value as a length.
    #[must_use]
    pub const fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

impl TryFrom<u64> for Dimension {
    type Error = PrimitiveError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Dimension> for u32 {
    fn from(value: Dimension) -> Self {
        value.0
    }
}

fn is_valid_collection_name(candidate: &str) -> bool {
    let mut chars = candidate.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !(first.is_ascii_alphabetic() || first == '_') {
        return false;
    }

    chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
}
