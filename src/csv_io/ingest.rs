use serde::Serialize;
use std::path::Path;

use crate::listing::row::{optional_cell, split_list};
use crate::listing::CsvRow;

use super::error::CsvError;
use super::mapping::{detect_mapping, validate_column_mapping, ColumnMapping, MissingColumnError, ResolvedMapping};

pub const UTF8_BOM: char = '\u{feff}';

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RowValidationError {
    /// 1-based data row number (header excluded)
    pub row: usize,
    pub field: &'static str,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedCsv {
    pub headers: Vec<String>,
    /// Rows that passed validation, in file order
    pub rows: Vec<CsvRow>,
    pub column_mapping: ColumnMapping,
    pub validation_errors: Vec<RowValidationError>,
    pub missing_columns: Vec<MissingColumnError>,
    /// Data rows in the file, valid or not
    pub total_rows: usize,
}

impl ParsedCsv {
    pub fn needs_mapping(&self) -> bool {
        !self.missing_columns.is_empty()
    }
}

/// Header row plus data records, each tagged with its 1-based row number
#[derive(Debug, Clone)]
pub(crate) struct Table {
    pub headers: Vec<String>,
    pub records: Vec<(usize, Vec<String>)>,
}

/// Enforce upload constraints before any parsing work
pub fn check_upload<'a>(file_name: &str, bytes: &'a [u8], max_bytes: usize) -> Result<&'a str, CsvError> {
    let is_csv = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("csv"))
        .unwrap_or(false);
    if !is_csv {
        return Err(CsvError::InvalidExtension(file_name.to_string()));
    }

    if bytes.len() > max_bytes {
        return Err(CsvError::TooLarge { size: bytes.len(), limit: max_bytes });
    }

    let text = std::str::from_utf8(bytes).map_err(|_| CsvError::InvalidEncoding)?;
    if strip_bom(text).trim().is_empty() {
        return Err(CsvError::Empty);
    }

    Ok(text)
}

pub fn strip_bom(text: &str) -> &str {
    text.strip_prefix(UTF8_BOM).unwrap_or(text)
}

/// Parse uploaded CSV text into validated rows.
///
/// With no explicit mapping, headers are matched against the alias set. When a
/// required column cannot be mapped, `missing_columns` is populated and no rows
/// are returned.
pub fn parse(raw: &str, mapping: Option<&ColumnMapping>) -> Result<ParsedCsv, CsvError> {
    let text = strip_bom(raw);
    if text.trim().is_empty() {
        return Err(CsvError::Empty);
    }

    let table = read_table(text)?;
    let column_mapping = match mapping {
        Some(explicit) => explicit.clone(),
        None => detect_mapping(&table.headers),
    };

    let missing_columns = validate_column_mapping(&column_mapping, &table.headers);
    let total_rows = table.records.len();

    if !missing_columns.is_empty() {
        return Ok(ParsedCsv {
            headers: table.headers,
            rows: Vec::new(),
            column_mapping,
            validation_errors: Vec::new(),
            missing_columns,
            total_rows,
        });
    }

    let resolved = column_mapping.resolve(&table.headers);
    let mut rows = Vec::with_capacity(total_rows);
    let mut validation_errors = Vec::new();

    for (row_number, fields) in &table.records {
        let row = row_from_fields(fields, &resolved);
        let issues = row.issues();
        if issues.is_empty() {
            rows.push(row);
        } else {
            validation_errors.extend(issues.into_iter().map(|issue| RowValidationError {
                row: *row_number,
                field: issue.field,
                message: issue.message,
            }));
        }
    }

    Ok(ParsedCsv {
        headers: table.headers,
        rows,
        column_mapping,
        validation_errors,
        missing_columns,
        total_rows,
    })
}

fn row_from_fields(fields: &[String], mapping: &ResolvedMapping) -> CsvRow {
    let cell = |index: Option<usize>| index.and_then(|i| fields.get(i)).map(String::as_str).unwrap_or("");

    CsvRow {
        product_name: cell(mapping.product_name).trim().to_string(),
        niche: optional_cell(cell(mapping.niche)),
        audience: optional_cell(cell(mapping.audience)),
        keywords: split_list(cell(mapping.keywords)),
        tone: optional_cell(cell(mapping.tone)),
    }
}

/// Read a header row and records; short records are padded, records with extra
/// non-empty fields or unbalanced quoting are rejected.
pub(crate) fn read_table(text: &str) -> Result<Table, CsvError> {
    // The reader ends an unterminated quoted field at EOF without complaint
    if has_unclosed_quote(text) {
        return Err(CsvError::Malformed("unbalanced quotes".to_string()));
    }

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| CsvError::Malformed(format!("header row: {}", e)))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    if headers.iter().all(|h| h.is_empty()) {
        return Err(CsvError::Malformed("missing header row".to_string()));
    }

    let mut records = Vec::new();
    for (index, result) in reader.records().enumerate() {
        let row_number = index + 1;
        let record = result.map_err(|e| CsvError::Malformed(format!("row {}: {}", row_number, e)))?;

        if record.len() > headers.len() && record.iter().skip(headers.len()).any(|f| !f.is_empty()) {
            return Err(CsvError::Malformed(format!(
                "row {} has {} fields, expected {}",
                row_number,
                record.len(),
                headers.len()
            )));
        }

        if record.iter().all(|f| f.is_empty()) {
            continue;
        }

        let mut fields: Vec<String> = record.iter().take(headers.len()).map(str::to_string).collect();
        fields.resize(headers.len(), String::new());
        records.push((row_number, fields));
    }

    Ok(Table { headers, records })
}

/// Quoting only opens at the start of a field; a `"` anywhere else is literal,
/// as in `12" Frame`.
fn has_unclosed_quote(text: &str) -> bool {
    #[derive(Clone, Copy, PartialEq)]
    enum State {
        FieldStart,
        Unquoted,
        Quoted,
        QuoteInQuoted,
    }

    let state = text.chars().fold(State::FieldStart, |state, c| match (state, c) {
        (State::Quoted, '"') => State::QuoteInQuoted,
        (State::Quoted, _) => State::Quoted,
        (State::FieldStart, '"') | (State::QuoteInQuoted, '"') => State::Quoted,
        (_, ',' | '\n' | '\r') => State::FieldStart,
        _ => State::Unquoted,
    });

    state == State::Quoted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_quoted_fields_with_commas_and_newlines() {
        let text = "Product Name,Keywords,Tone\n\"Mug, large\",\"coffee, tea\",\"warm\nand cosy\"\n";
        let parsed = parse(text, None).unwrap();
        assert_eq!(parsed.rows.len(), 1);
        assert_eq!(parsed.rows[0].product_name, "Mug, large");
        assert_eq!(parsed.rows[0].keywords, vec!["coffee", "tea"]);
        assert_eq!(parsed.rows[0].tone.as_deref(), Some("warm\nand cosy"));
    }

    #[test]
    fn strips_bom_and_pads_short_rows() {
        let text = "\u{feff}Product Name,Keywords,Niche\nMug,coffee\n";
        let parsed = parse(text, None).unwrap();
        assert_eq!(parsed.headers[0], "Product Name");
        assert_eq!(parsed.rows.len(), 1);
        assert!(parsed.rows[0].niche.is_none());
    }

    #[test]
    fn rejects_unbalanced_quotes_and_overlong_rows() {
        assert!(matches!(
            parse("Product Name,Keywords\n\"Mug,coffee\n", None),
            Err(CsvError::Malformed(_))
        ));
        assert!(matches!(
            parse("Product Name,Keywords\nMug,coffee,extra\n", None),
            Err(CsvError::Malformed(_))
        ));
        // Trailing empty fields are recoverable
        assert!(parse("Product Name,Keywords\nMug,coffee,,\n", None).is_ok());
    }

    #[test]
    fn quote_inside_unquoted_field_is_literal() {
        let text = "Product Name,Keywords\n12\" Vinyl Record Frame,\"frame, vinyl\"\nMug,coffee\n";
        let parsed = parse(text, None).unwrap();
        assert_eq!(parsed.rows.len(), 2);
        assert_eq!(parsed.rows[0].product_name, "12\" Vinyl Record Frame");
        assert_eq!(parsed.rows[0].keywords, vec!["frame", "vinyl"]);

        let escaped = "Product Name,Keywords\n\"The \"\"Big\"\" Mug\",coffee\n";
        assert_eq!(parse(escaped, None).unwrap().rows[0].product_name, "The \"Big\" Mug");
    }

    #[test]
    fn missing_required_column_needs_mapping() {
        let parsed = parse("Colour,Keywords\nred,coffee\n", None).unwrap();
        assert!(parsed.needs_mapping());
        assert!(parsed.rows.is_empty());
        assert_eq!(parsed.total_rows, 1);
    }

    #[test]
    fn explicit_mapping_overrides_detection() {
        let mapping = ColumnMapping {
            product_name: Some("Colour".into()),
            keywords: Some("Words".into()),
            ..Default::default()
        };
        let parsed = parse("Colour,Words\nred,\"a,b\"\n", Some(&mapping)).unwrap();
        assert!(!parsed.needs_mapping());
        assert_eq!(parsed.rows[0].product_name, "red");
        assert_eq!(parsed.rows[0].keywords, vec!["a", "b"]);
    }

    #[test]
    fn upload_constraints() {
        assert!(matches!(check_upload("list.txt", b"a", 10), Err(CsvError::InvalidExtension(_))));
        assert!(matches!(check_upload("list.CSV", b"0123456789ab", 10), Err(CsvError::TooLarge { .. })));
        assert!(matches!(check_upload("list.csv", b"\xef\xbb\xbf \n", 10), Err(CsvError::Empty)));
        assert!(matches!(check_upload("list.csv", &[0xff, 0xfe], 10), Err(CsvError::InvalidEncoding)));
        assert_eq!(check_upload("list.csv", b"a,b", 10).unwrap(), "a,b");
    }
}
