pub mod bulk_import;
pub mod generation;

pub use bulk_import::{BulkImport, BulkImportStatus};
pub use generation::{ExportFilter, GenerationRecord, GenerationSource, NewGeneration};
