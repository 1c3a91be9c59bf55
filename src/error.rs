use thiserror::Error;

#[derive(Error, Debug)]
pub enum StatementError {
    #[error("PDF error: {0}")]
    PdfError(#[from] lopdf::Error),

    #[error("Malformed content in {file}: {details}")]
    MalformedContent { file: String, details: String },

    #[error("Parser panicked on {file}: {details}")]
    ParserPanic { file: String, details: String },

    #[error("Invalid default month {0}: must be between 1 and 12")]
    InvalidDefaultMonth(u32),

    #[error("Invalid label column {column}: tables are only read when they have at least {min_columns} columns")]
    InvalidLabelColumn { column: usize, min_columns: usize },

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, StatementError>;
