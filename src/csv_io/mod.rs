//! CSV ingestion, column mapping and export.

pub mod error;
pub mod export;
pub mod ingest;
pub mod mapping;

pub use error::CsvError;
pub use export::{from_csv, template_csv, to_csv, ExportRecord, EXPORT_HEADERS, TEMPLATE_HEADERS};
pub use ingest::{check_upload, parse, ParsedCsv, RowValidationError};
pub use mapping::{detect_mapping, validate_column_mapping, ColumnMapping, LogicalColumn, MissingColumnError};
