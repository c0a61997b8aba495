use thiserror::Error;

use crate::kind::ResourceKind;

/// Errors raised while constructing model values.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("unknown resource kind `{0}`")]
    UnknownKind(String),
    #[error("malformed resource line: {0}")]
    MalformedResource(String),
}

/// Errors raised while mapping source records into resources.
///
/// Per-record failures (`InvalidKey`) cause that one record to be skipped;
/// `FieldMapping` failures downgrade to warnings and the record proceeds.
/// Only structural input failures (`Io`, `Json`) surface to the caller.
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("cannot mint {kind} identifier: {detail}")]
    InvalidKey { kind: ResourceKind, detail: String },
    #[error("field `{field}` value `{value}` could not be normalized: {detail}")]
    FieldMapping {
        field: String,
        value: String,
        detail: String,
    },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TransformError {
    pub fn invalid_key(kind: ResourceKind, detail: impl Into<String>) -> Self {
        TransformError::InvalidKey {
            kind,
            detail: detail.into(),
        }
    }

    pub fn field_mapping(
        field: impl Into<String>,
        value: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        TransformError::FieldMapping {
            field: field.into(),
            value: value.into(),
            detail: detail.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TransformError>;
