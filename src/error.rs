use serde_json::Value;

pub type Result<T> = std::result::Result<T, GuideError>;

#[derive(Debug, thiserror::Error)]
pub enum GuideError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("invalid schema: {0}")]
    InvalidSchema(String),

    #[error("schema validation failed at '{instance_path}': {message}")]
    SchemaValidation {
        message: String,
        instance_path: String,
        schema_path: String,
    },

    #[error("\"id\" field must be in annotation")]
    MissingId,

    #[error("\"id\" field must be an integer, got {0}")]
    InvalidIdType(Value),

    #[error(transparent)]
    Resolver(#[from] anyhow::Error),
}

impl GuideError {
    pub(crate) fn schema(msg: impl Into<String>) -> Self {
        Self::InvalidSchema(msg.into())
    }

    pub(crate) fn argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}

impl From<jsonschema::ValidationError<'_>> for GuideError {
    fn from(err: jsonschema::ValidationError<'_>) -> Self {
        Self::SchemaValidation {
            message: err.to_string(),
            instance_path: err.instance_path.to_string(),
            schema_path: err.schema_path.to_string(),
        }
    }
}
