use thiserror::Error;

#[derive(Debug, Error)]
pub enum DatasourceError {
    #[error("Invalid datasource configuration: {0}")]
    ConfigError(String),

    #[error("Failed to serialize message payload: {0}")]
    SerializationError(String),

    #[error("Field/value count mismatch: {fields} fields, {values} values")]
    FieldCountMismatch { fields: usize, values: usize },

    #[error("Failed to interact with AWS services: {0}")]
    AwsError(String),

    #[error("Failed to parse queue response: {0}")]
    ParseError(String),
}

impl From<serde_json::Error> for DatasourceError {
    fn from(error: serde_json::Error) -> Self {
        DatasourceError::SerializationError(error.to_string())
    }
}

impl From<url::ParseError> for DatasourceError {
    fn from(error: url::ParseError) -> Self {
        DatasourceError::ConfigError(format!("queue url: {error}"))
    }
}
