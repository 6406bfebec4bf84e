use crate::listing::{CsvRow, FORBIDDEN_SYMBOLS, LISTING_LIST_LEN, MAX_ENTRY_CHARS};

pub fn system_prompt() -> String {
    let symbols: String = FORBIDDEN_SYMBOLS
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(" ");

    format!(
        "You are an expert marketplace copywriter for handmade and vintage shops. \
         Respond with a single JSON object with keys \"title\" (at most 140 characters), \
         \"description\" (plain text, several paragraphs), \"tags\" (exactly {n} strings) and \
         \"materials\" (exactly {n} strings). Optionally include \"altTexts\" (array of strings) \
         and \"price\" (number). Every tag and material must be at most {max} characters and \
         must not contain any of these symbols: {symbols}",
        n = LISTING_LIST_LEN,
        max = MAX_ENTRY_CHARS,
        symbols = symbols,
    )
}

pub fn user_prompt(row: &CsvRow) -> String {
    let mut prompt = format!("Product: {}\nKeywords: {}", row.product_name.trim(), row.keywords.join(", "));
    if let Some(niche) = &row.niche {
        prompt.push_str(&format!("\nNiche: {}", niche));
    }
    if let Some(audience) = &row.audience {
        prompt.push_str(&format!("\nTarget audience: {}", audience));
    }
    if let Some(tone) = &row.tone {
        prompt.push_str(&format!("\nTone of voice: {}", tone));
    }
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_prompt_includes_optional_fields_when_present() {
        let row = CsvRow {
            product_name: " Mug ".into(),
            niche: Some("Kitchen".into()),
            audience: None,
            keywords: vec!["coffee".into(), "gift".into()],
            tone: Some("playful".into()),
        };
        let prompt = user_prompt(&row);
        assert!(prompt.starts_with("Product: Mug\nKeywords: coffee, gift"));
        assert!(prompt.contains("Niche: Kitchen"));
        assert!(prompt.contains("Tone of voice: playful"));
        assert!(!prompt.contains("audience"));
    }

    #[test]
    fn system_prompt_states_list_rules() {
        let prompt = system_prompt();
        assert!(prompt.contains("exactly 13"));
        assert!(prompt.contains("at most 20 characters"));
    }
}
