use serde::{Deserialize, Serialize};

/// Logical input columns a header can map to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalColumn {
    ProductName,
    Niche,
    Audience,
    Keywords,
    Tone,
}

impl LogicalColumn {
    pub const ALL: [LogicalColumn; 5] = [
        LogicalColumn::ProductName,
        LogicalColumn::Niche,
        LogicalColumn::Audience,
        LogicalColumn::Keywords,
        LogicalColumn::Tone,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            LogicalColumn::ProductName => "productName",
            LogicalColumn::Niche => "niche",
            LogicalColumn::Audience => "audience",
            LogicalColumn::Keywords => "keywords",
            LogicalColumn::Tone => "tone",
        }
    }

    pub fn required(&self) -> bool {
        matches!(self, LogicalColumn::ProductName | LogicalColumn::Keywords)
    }

    /// Normalized aliases, highest priority first
    fn aliases(&self) -> &'static [&'static str] {
        match self {
            LogicalColumn::ProductName => &[
                "productname",
                "product",
                "name",
                "itemname",
                "item",
                "producttitle",
                "title",
            ],
            LogicalColumn::Niche => &["niche", "category", "market", "productcategory"],
            LogicalColumn::Audience => &[
                "audience",
                "targetaudience",
                "target",
                "customer",
                "customers",
                "buyer",
            ],
            LogicalColumn::Keywords => &[
                "keywords",
                "keyword",
                "searchterms",
                "seokeywords",
                "keyphrases",
                "tags",
            ],
            LogicalColumn::Tone => &["tone", "voice", "style", "brandvoice", "toneofvoice"],
        }
    }
}

/// Header chosen for each logical column
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnMapping {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub niche: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audience: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MissingColumnError {
    pub column: &'static str,
    pub message: String,
}

/// Column indices into a record for each logical column
#[derive(Debug, Clone, Copy, Default)]
pub struct ResolvedMapping {
    pub product_name: Option<usize>,
    pub niche: Option<usize>,
    pub audience: Option<usize>,
    pub keywords: Option<usize>,
    pub tone: Option<usize>,
}

impl ColumnMapping {
    pub fn get(&self, column: LogicalColumn) -> Option<&str> {
        match column {
            LogicalColumn::ProductName => self.product_name.as_deref(),
            LogicalColumn::Niche => self.niche.as_deref(),
            LogicalColumn::Audience => self.audience.as_deref(),
            LogicalColumn::Keywords => self.keywords.as_deref(),
            LogicalColumn::Tone => self.tone.as_deref(),
        }
        .filter(|h| !h.trim().is_empty())
    }

    fn set(&mut self, column: LogicalColumn, header: String) {
        let slot = match column {
            LogicalColumn::ProductName => &mut self.product_name,
            LogicalColumn::Niche => &mut self.niche,
            LogicalColumn::Audience => &mut self.audience,
            LogicalColumn::Keywords => &mut self.keywords,
            LogicalColumn::Tone => &mut self.tone,
        };
        *slot = Some(header);
    }

    pub fn resolve(&self, headers: &[String]) -> ResolvedMapping {
        let index = |column| self.get(column).and_then(|h| find_header(headers, h));
        ResolvedMapping {
            product_name: index(LogicalColumn::ProductName),
            niche: index(LogicalColumn::Niche),
            audience: index(LogicalColumn::Audience),
            keywords: index(LogicalColumn::Keywords),
            tone: index(LogicalColumn::Tone),
        }
    }
}

/// Lowercase and drop everything but letters and digits
pub fn normalize_header(header: &str) -> String {
    header
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(|c| c.to_lowercase())
        .collect()
}

fn find_header(headers: &[String], wanted: &str) -> Option<usize> {
    let wanted = normalize_header(wanted);
    if wanted.is_empty() {
        return None;
    }
    headers.iter().position(|h| normalize_header(h) == wanted)
}

/// Map headers to logical columns by alias; a header is claimed at most once
pub fn detect_mapping(headers: &[String]) -> ColumnMapping {
    let normalized: Vec<String> = headers.iter().map(|h| normalize_header(h)).collect();
    let mut claimed = vec![false; headers.len()];
    let mut mapping = ColumnMapping::default();

    for column in LogicalColumn::ALL {
        'aliases: for alias in column.aliases() {
            for (i, header) in normalized.iter().enumerate() {
                if !claimed[i] && header == alias {
                    claimed[i] = true;
                    mapping.set(column, headers[i].clone());
                    break 'aliases;
                }
            }
        }
    }

    mapping
}

pub fn validate_column_mapping(mapping: &ColumnMapping, headers: &[String]) -> Vec<MissingColumnError> {
    LogicalColumn::ALL
        .iter()
        .filter(|c| c.required())
        .filter_map(|column| match mapping.get(*column) {
            None => Some(MissingColumnError {
                column: column.key(),
                message: format!("No column mapped to required field '{}'", column.key()),
            }),
            Some(header) if find_header(headers, header).is_none() => Some(MissingColumnError {
                column: column.key(),
                message: format!("Mapped column '{}' for '{}' not found in file", header, column.key()),
            }),
            Some(_) => None,
        })
        .collect()
}
