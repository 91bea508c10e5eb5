//! Engine errors and the single error type surfaced to callers.

use ontograph_schema::SchemaError;
use ontograph_sparql::StoreError;
use serde::Serialize;
use serde_json::{json, Value};

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("store request failed: {0}")]
    Backend(#[from] StoreError),

    #[error("invalid path {0}")]
    InvalidPath(String),

    #[error("invalid type {0}")]
    InvalidType(String),
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::Schema(err) => schema_kind(err),
            EngineError::Backend(_) => ErrorKind::BackendFailure,
            EngineError::InvalidPath(_) => ErrorKind::InvalidPath,
            EngineError::InvalidType(_) => ErrorKind::InvalidType,
        }
    }
}

fn schema_kind(err: &SchemaError) -> ErrorKind {
    match err {
        SchemaError::InvalidScalarFormat { .. } => ErrorKind::InvalidScalarFormat,
        SchemaError::UnknownNamespace(_) => ErrorKind::UnknownNamespace,
        SchemaError::InvalidType(_) => ErrorKind::InvalidType,
        SchemaError::Backend(_) => ErrorKind::BackendFailure,
        // A cache entry failing because the store failed is a cache failure;
        // a domain answer (unknown namespace, unknown type) keeps its kind.
        SchemaError::CacheFailure { .. } => match err.root_cause() {
            SchemaError::Backend(_) => ErrorKind::CacheFailure,
            other => schema_kind(other),
        },
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    InvalidScalarFormat,
    UnknownNamespace,
    InvalidType,
    InvalidPath,
    BackendFailure,
    CacheFailure,
}

pub const ERROR_CATEGORY: &str = "businessLogic";

/// Domain-level failure of one request, safe to show to the caller.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct ApiError {
    message: String,
    kind: ErrorKind,
    #[source]
    cause: EngineError,
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn cause(&self) -> &EngineError {
        &self.cause
    }

    pub fn is_client_safe(&self) -> bool {
        true
    }

    pub fn category(&self) -> &'static str {
        ERROR_CATEGORY
    }

    /// The `errors[]` entry for this failure.
    pub fn to_json(&self) -> Value {
        json!({
            "message": self.message,
            "extensions": {
                "category": self.category(),
                "kind": self.kind,
            }
        })
    }
}

impl From<EngineError> for ApiError {
    fn from(cause: EngineError) -> Self {
        let mut message = cause.to_string();
        if let EngineError::Schema(SchemaError::CacheFailure { source, .. }) = &cause {
            message = format!("{message}: {}", source.root_cause());
        }
        Self {
            message,
            kind: cause.kind(),
            cause,
        }
    }
}

impl From<SchemaError> for ApiError {
    fn from(err: SchemaError) -> Self {
        EngineError::from(err).into()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        EngineError::from(err).into()
    }
}
