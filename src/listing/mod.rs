pub mod output;
pub mod row;

pub use output::{ListingError, ListingOutput, RawListing, FORBIDDEN_SYMBOLS, LISTING_LIST_LEN, MAX_ENTRY_CHARS};
pub use row::{split_list, CsvRow, RowIssue};
