use ontograph_sparql::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("value `{value}` is not a valid {datatype}")]
    InvalidScalarFormat { datatype: String, value: String },

    #[error("\"{0}\" has an unknown namespace")]
    UnknownNamespace(String),

    #[error("invalid type `{0}`")]
    InvalidType(String),

    #[error("ontology lookup failed: {0}")]
    Backend(#[from] StoreError),

    #[error("failed to populate cache entry `{key}`")]
    CacheFailure {
        key: String,
        #[source]
        source: Box<SchemaError>,
    },
}

impl SchemaError {
    pub fn invalid_scalar(datatype: impl Into<String>, value: impl Into<String>) -> Self {
        SchemaError::InvalidScalarFormat {
            datatype: datatype.into(),
            value: value.into(),
        }
    }

    /// Innermost cause, looking through cache wrappers.
    pub fn root_cause(&self) -> &SchemaError {
        match self {
            SchemaError::CacheFailure { source, .. } => source.root_cause(),
            other => other,
        }
    }
}
