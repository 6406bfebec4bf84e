use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CsvError {
    #[error("Malformed CSV: {0}")]
    Malformed(String),

    #[error("CSV file is empty")]
    Empty,

    #[error("File too large: {size} bytes exceeds the {limit} byte limit")]
    TooLarge { size: usize, limit: usize },

    #[error("Only .csv files are accepted (got '{0}')")]
    InvalidExtension(String),

    #[error("CSV file is not valid UTF-8")]
    InvalidEncoding,

    #[error("Failed to write CSV: {0}")]
    Write(String),
}
