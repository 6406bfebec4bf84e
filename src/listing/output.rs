use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Tags and materials must each have exactly this many entries
pub const LISTING_LIST_LEN: usize = 13;
pub const MAX_ENTRY_CHARS: usize = 20;
pub const MAX_TITLE_CHARS: usize = 140;

/// Marketplace-rejected symbols, plus the comma used as the export list separator
pub const FORBIDDEN_SYMBOLS: &[char] = &[
    '&', '#', '@', '%', '^', '*', '!', '~', '`', '|', '\\', '<', '>', ',',
];

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ListingError {
    #[error("Listing title is empty")]
    MissingTitle,

    #[error("Listing description is empty")]
    MissingDescription,

    #[error("Expected {expected} {field}, got {found} usable entries")]
    WrongCount {
        field: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("Invalid {field} entry '{entry}': {reason}")]
    InvalidEntry {
        field: &'static str,
        entry: String,
        reason: &'static str,
    },
}

/// Listing as returned by the generation engine, before normalization
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawListing {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub materials: Vec<String>,
    #[serde(default)]
    pub alt_texts: Vec<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(flatten)]
    pub extras: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingOutput {
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub materials: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alt_texts: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extras: Map<String, Value>,
}

impl ListingOutput {
    /// Normalize raw engine output into a listing that satisfies every invariant
    pub fn from_raw(raw: RawListing) -> Result<Self, ListingError> {
        let title = truncate_chars(&collapse_whitespace(&raw.title), MAX_TITLE_CHARS);
        if title.is_empty() {
            return Err(ListingError::MissingTitle);
        }

        let description = raw.description.trim().to_string();
        if description.is_empty() {
            return Err(ListingError::MissingDescription);
        }

        let listing = Self {
            title,
            description,
            tags: normalize_entries("tags", &raw.tags)?,
            materials: normalize_entries("materials", &raw.materials)?,
            alt_texts: raw
                .alt_texts
                .iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            price: raw.price.filter(|p| p.is_finite() && *p >= 0.0),
            extras: raw.extras,
        };

        listing.validate()?;
        Ok(listing)
    }

    pub fn validate(&self) -> Result<(), ListingError> {
        if self.title.trim().is_empty() {
            return Err(ListingError::MissingTitle);
        }
        if self.description.trim().is_empty() {
            return Err(ListingError::MissingDescription);
        }
        validate_entries("tags", &self.tags)?;
        validate_entries("materials", &self.materials)
    }
}

/// Strip forbidden symbols, trim, truncate, de-duplicate and keep the first 13
fn normalize_entries(field: &'static str, entries: &[String]) -> Result<Vec<String>, ListingError> {
    let mut out: Vec<String> = Vec::with_capacity(LISTING_LIST_LEN);

    for entry in entries {
        let cleaned: String = entry.chars().filter(|c| !FORBIDDEN_SYMBOLS.contains(c)).collect();
        let cleaned = truncate_chars(&collapse_whitespace(&cleaned), MAX_ENTRY_CHARS);
        if cleaned.is_empty() {
            continue;
        }
        if out.iter().any(|e| e.eq_ignore_ascii_case(&cleaned)) {
            continue;
        }
        out.push(cleaned);
        if out.len() == LISTING_LIST_LEN {
            break;
        }
    }

    if out.len() != LISTING_LIST_LEN {
        return Err(ListingError::WrongCount {
            field,
            expected: LISTING_LIST_LEN,
            found: out.len(),
        });
    }

    Ok(out)
}

fn validate_entries(field: &'static str, entries: &[String]) -> Result<(), ListingError> {
    if entries.len() != LISTING_LIST_LEN {
        return Err(ListingError::WrongCount {
            field,
            expected: LISTING_LIST_LEN,
            found: entries.len(),
        });
    }

    for entry in entries {
        let reason = if entry.trim().is_empty() {
            Some("empty")
        } else if entry.chars().count() > MAX_ENTRY_CHARS {
            Some("longer than 20 characters")
        } else if entry.chars().any(|c| FORBIDDEN_SYMBOLS.contains(&c)) {
            Some("contains a forbidden symbol")
        } else if entry.trim() != entry {
            Some("surrounding whitespace")
        } else {
            None
        };

        if let Some(reason) = reason {
            return Err(ListingError::InvalidEntry {
                field,
                entry: entry.clone(),
                reason,
            });
        }
    }

    Ok(())
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect::<String>().trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(prefix: &str, n: usize) -> Vec<String> {
        (0..n).map(|i| format!("{prefix} {i}")).collect()
    }

    fn raw(tags: Vec<String>, materials: Vec<String>) -> RawListing {
        RawListing {
            title: "  Handmade   ceramic mug ".into(),
            description: "A mug.".into(),
            tags,
            materials,
            ..Default::default()
        }
    }

    #[test]
    fn normalizes_symbols_length_and_count() {
        let mut tags = vec![
            "gift & idea!".to_string(),
            "a very long tag that keeps going".to_string(),
            "GIFT idea".to_string(), // duplicate after cleaning
        ];
        tags.extend(entries("tag", 15));

        let listing = ListingOutput::from_raw(raw(tags, entries("clay", 13))).unwrap();
        assert_eq!(listing.title, "Handmade ceramic mug");
        assert_eq!(listing.tags.len(), 13);
        assert_eq!(listing.tags[0], "gift idea");
        assert_eq!(listing.tags[1], "a very long tag that");
        assert!(listing.tags.iter().all(|t| t.chars().count() <= MAX_ENTRY_CHARS));
        assert!(listing.validate().is_ok());
    }

    #[test]
    fn too_few_usable_entries_is_an_error() {
        let err = ListingOutput::from_raw(raw(entries("tag", 12), entries("clay", 13))).unwrap_err();
        assert_eq!(
            err,
            ListingError::WrongCount { field: "tags", expected: 13, found: 12 }
        );

        let mut materials = entries("clay", 12);
        materials.push("@@##".into());
        assert!(ListingOutput::from_raw(raw(entries("tag", 13), materials)).is_err());
    }

    #[test]
    fn extras_are_kept() {
        let json = serde_json::json!({
            "title": "Mug",
            "description": "Nice",
            "tags": entries("tag", 13),
            "materials": entries("clay", 13),
            "seoScore": 87
        });
        let raw: RawListing = serde_json::from_value(json).unwrap();
        let listing = ListingOutput::from_raw(raw).unwrap();
        assert_eq!(listing.extras.get("seoScore"), Some(&Value::from(87)));
    }

    #[test]
    fn validate_rejects_forbidden_symbols() {
        let mut listing = ListingOutput::from_raw(raw(entries("tag", 13), entries("clay", 13))).unwrap();
        listing.tags[3] = "50% off".into();
        assert!(matches!(listing.validate(), Err(ListingError::InvalidEntry { field: "tags", .. })));
    }
}
