use thiserror::Error;

#[derive(Error, Debug)]
pub enum SalesError {
    #[error("Missing required columns: {}", missing.join(", "))]
    MissingRequiredColumns { missing: Vec<String> },

    #[error("Columns must be written in lowercase: {}", columns.join(", "))]
    MisnamedColumns { columns: Vec<String> },

    #[error("Input contains a header row but no data rows")]
    NoDataRows,

    #[error("Invalid issue date '{value}' on line {line}")]
    InvalidDate { line: usize, value: String },

    #[error("Date calculation error: {0}")]
    DateError(String),

    #[error("Bonus tier table is invalid: {0}")]
    InvalidTierTable(String),

    #[error("Invalid commission configuration: {0}")]
    InvalidConfig(String),

    #[error("Record store error: {0}")]
    Store(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SalesError>;
