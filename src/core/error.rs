use thiserror::Error;

/// Result alias used throughout the crate.
pub type GymResult<T> = Result<T, GymError>;

#[derive(Error, Debug)]
pub enum GymError {
    #[error("Data load failed: {0}")]
    DataLoad(String),
    #[error("Snapshot for '{entity}' is missing required column '{column}'")]
    MissingColumn { entity: String, column: String },
    #[error("Invalid value for '{field}': {message}")]
    Validation { field: String, message: String },
    #[error("Legacy record not found in '{table}' for key {key}")]
    RecordNotFound { table: String, key: i64 },
    #[error("Class {class_id} slot error: {message}")]
    Capacity { class_id: i64, message: String },
    #[error("Table '{0}' not found")]
    TableNotFound(String),
    #[error("Column '{0}' not found")]
    ColumnNotFound(String),
    #[error("Type mismatch")]
    TypeMismatch,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Snapshot parse error: {0}")]
    Snapshot(#[from] serde_json::Error),
    #[error("Binary serialization error: {0}")]
    BinarySerialization(String),
}

impl GymError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn data_load(message: impl Into<String>) -> Self {
        Self::DataLoad(message.into())
    }
}
