use serde::{Deserialize, Serialize};

pub const MAX_PRODUCT_NAME_CHARS: usize = 200;

/// One product to generate a listing for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CsvRow {
    pub product_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub niche: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audience: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowIssue {
    pub field: &'static str,
    pub message: String,
}

impl CsvRow {
    /// Field-level problems that keep this row out of the ready set
    pub fn issues(&self) -> Vec<RowIssue> {
        let mut issues = Vec::new();

        let name = self.product_name.trim();
        if name.is_empty() {
            issues.push(RowIssue {
                field: "productName",
                message: "Product name is required".to_string(),
            });
        } else if name.chars().count() > MAX_PRODUCT_NAME_CHARS {
            issues.push(RowIssue {
                field: "productName",
                message: format!("Product name must be at most {} characters", MAX_PRODUCT_NAME_CHARS),
            });
        }

        if !self.keywords.iter().any(|k| !k.trim().is_empty()) {
            issues.push(RowIssue {
                field: "keywords",
                message: "At least one keyword is required".to_string(),
            });
        }

        issues
    }

    /// The row as it would read back from a CSV cell: trimmed name, blank
    /// optionals dropped, keyword entries split on commas.
    pub fn normalized(self) -> Self {
        Self {
            product_name: self.product_name.trim().to_string(),
            niche: self.niche.as_deref().and_then(optional_cell),
            audience: self.audience.as_deref().and_then(optional_cell),
            keywords: self.keywords.iter().flat_map(|k| split_list(k)).collect(),
            tone: self.tone.as_deref().and_then(optional_cell),
        }
    }
}

/// Split a keyword cell on commas, dropping blanks
pub fn split_list(cell: &str) -> Vec<String> {
    cell.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Trimmed optional cell; blank means absent
pub fn optional_cell(cell: &str) -> Option<String> {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str, keywords: &[&str]) -> CsvRow {
        CsvRow {
            product_name: name.to_string(),
            niche: None,
            audience: None,
            keywords: keywords.iter().map(|s| s.to_string()).collect(),
            tone: None,
        }
    }

    #[test]
    fn requires_name_and_keywords() {
        assert!(row("Mug", &["coffee"]).issues().is_empty());

        let issues = row("  ", &[" "]).issues();
        let fields: Vec<_> = issues.iter().map(|i| i.field).collect();
        assert_eq!(fields, vec!["productName", "keywords"]);
    }

    #[test]
    fn normalized_matches_what_a_csv_cell_reads_back_as() {
        let mut raw = row(" Mug ", &["coffee, tea", " ", "gift"]);
        raw.niche = Some("  ".into());
        raw.tone = Some(" warm ".into());

        let row = raw.normalized();
        assert_eq!(row.product_name, "Mug");
        assert_eq!(row.keywords, vec!["coffee", "tea", "gift"]);
        assert!(row.niche.is_none());
        assert_eq!(row.tone.as_deref(), Some("warm"));
    }

    #[test]
    fn split_list_trims_and_drops_blanks() {
        assert_eq!(split_list(" a, b ,,c "), vec!["a", "b", "c"]);
        assert!(split_list(" , ").is_empty());
    }

    #[test]
    fn deserializes_camel_case_with_defaults() {
        let row: CsvRow = serde_json::from_str(r#"{"productName":"Mug"}"#).unwrap();
        assert_eq!(row.product_name, "Mug");
        assert!(row.keywords.is_empty());
        assert!(!row.issues().is_empty());
    }
}
