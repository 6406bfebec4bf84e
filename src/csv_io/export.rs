use serde::{Deserialize, Serialize};

use crate::listing::row::{optional_cell, split_list};

use super::error::CsvError;
use super::ingest::{read_table, strip_bom, UTF8_BOM};
use super::mapping::normalize_header;

/// Input template columns; an export starts with the same columns so it re-imports directly
pub const TEMPLATE_HEADERS: [&str; 5] = ["Product Name", "Niche", "Audience", "Keywords", "Tone"];

pub const EXPORT_HEADERS: [&str; 9] = [
    "Product Name",
    "Niche",
    "Audience",
    "Keywords",
    "Tone",
    "Title",
    "Description",
    "Tags",
    "Materials",
];

const LIST_SEPARATOR: &str = ", ";

/// One exported generation: the input row followed by the generated listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRecord {
    pub product_name: String,
    pub niche: Option<String>,
    pub audience: Option<String>,
    pub keywords: Vec<String>,
    pub tone: Option<String>,
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub materials: Vec<String>,
}

impl ExportRecord {
    fn cells(&self) -> [String; 9] {
        [
            self.product_name.clone(),
            self.niche.clone().unwrap_or_default(),
            self.audience.clone().unwrap_or_default(),
            self.keywords.join(LIST_SEPARATOR),
            self.tone.clone().unwrap_or_default(),
            self.title.clone(),
            self.description.clone(),
            self.tags.join(LIST_SEPARATOR),
            self.materials.join(LIST_SEPARATOR),
        ]
    }
}

pub fn to_csv(records: &[ExportRecord]) -> Result<String, CsvError> {
    write_with_bom(&EXPORT_HEADERS, records.iter().map(|r| r.cells()))
}

/// Import template: header row plus one example row
pub fn template_csv() -> Result<String, CsvError> {
    let example = [
        "Handmade Ceramic Mug".to_string(),
        "Home & Kitchen".to_string(),
        "Coffee lovers".to_string(),
        "ceramic mug, handmade, coffee gift".to_string(),
        "Warm and friendly".to_string(),
    ];
    write_with_bom(&TEMPLATE_HEADERS, std::iter::once(example))
}

fn write_with_bom<const N: usize>(
    headers: &[&str; N],
    rows: impl Iterator<Item = [String; N]>,
) -> Result<String, CsvError> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::CRLF)
        .from_writer(Vec::new());

    writer
        .write_record(headers)
        .map_err(|e| CsvError::Write(e.to_string()))?;
    for row in rows {
        writer
            .write_record(&row)
            .map_err(|e| CsvError::Write(e.to_string()))?;
    }

    let bytes = writer.into_inner().map_err(|e| CsvError::Write(e.to_string()))?;
    let body = String::from_utf8(bytes).map_err(|_| CsvError::InvalidEncoding)?;

    let mut out = String::with_capacity(body.len() + UTF8_BOM.len_utf8());
    out.push(UTF8_BOM);
    out.push_str(&body);
    Ok(out)
}

/// Inverse of [`to_csv`]; list cells are split back into ordered sequences
pub fn from_csv(text: &str) -> Result<Vec<ExportRecord>, CsvError> {
    let table = read_table(strip_bom(text))?;

    let mut indices = [0usize; 9];
    for (slot, wanted) in indices.iter_mut().zip(EXPORT_HEADERS) {
        let wanted_norm = normalize_header(wanted);
        *slot = table
            .headers
            .iter()
            .position(|h| normalize_header(h) == wanted_norm)
            .ok_or_else(|| CsvError::Malformed(format!("missing column '{}'", wanted)))?;
    }

    Ok(table
        .records
        .iter()
        .map(|(_, fields)| {
            let cell = |i: usize| fields[indices[i]].as_str();
            ExportRecord {
                product_name: cell(0).to_string(),
                niche: optional_cell(cell(1)),
                audience: optional_cell(cell(2)),
                keywords: split_list(cell(3)),
                tone: optional_cell(cell(4)),
                title: cell(5).to_string(),
                description: cell(6).to_string(),
                tags: split_list(cell(7)),
                materials: split_list(cell(8)),
            }
        })
        .collect())
}
