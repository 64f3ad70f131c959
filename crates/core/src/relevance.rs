use crate::inventory::{normalize_field_name, InventoryRecord};

/// Tunable scoring heuristics for [`select_relevant`].
///
/// The defaults encode the two most common staff query patterns (grape
/// variety, by-the-glass availability) and keep the context payload inside
/// the completion model's context window. Expect these to be retuned against
/// real bar traffic.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilterConfig {
    /// Query tokens shorter than this are dropped.
    pub min_token_len: usize,
    /// Upper bound on scored query tokens.
    pub max_tokens: usize,
    /// Score per token found as a substring of the record haystack.
    pub substring_score: u32,
    /// Extra score when the query and the record both mention riesling.
    pub grape_boost: u32,
    /// Extra score for records with a by-the-glass price when the query asks
    /// for one.
    pub glass_boost: u32,
    /// Maximum records returned when at least one record scored.
    pub match_cap: usize,
    /// Maximum records returned on the no-match fallback path.
    pub fallback_cap: usize,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            min_token_len: 3,
            max_tokens: 12,
            substring_score: 2,
            grape_boost: 10,
            glass_boost: 6,
            match_cap: 40,
            fallback_cap: 60,
        }
    }
}

/// Fields concatenated into the searchable haystack, in order.
const HAYSTACK_FIELDS: [&str; 7] =
    ["Name", "Winemaker", "Grapes", "Region", "Country", "Notes", "Colour"];

/// Reduces the full inventory to a bounded, query-relevant subset.
///
/// Records are scored lexically against the query and returned by descending
/// score, original order on ties. When nothing scores, the result degrades to
/// a capped slice of the inventory (restricted to glass-pourable wines when
/// the query asked for a glass) so the assistant still has facts to reason
/// over.
pub fn select_relevant(
    records: &[InventoryRecord],
    query: &str,
    config: &FilterConfig,
) -> Vec<InventoryRecord> {
    let normalized_query = normalize_field_name(query).to_lowercase();
    let tokens = tokenize(&normalized_query, config);
    let wants_glass = glass_intent(&normalized_query);
    let mentions_riesling = normalized_query.contains("riesling");

    let mut scored: Vec<(u32, &InventoryRecord)> = Vec::new();
    for record in records {
        let haystack = haystack(record);
        let mut score = 0u32;

        for token in &tokens {
            if haystack.contains(token.as_str()) {
                score += config.substring_score;
            }
        }

        if mentions_riesling
            && (record.lookup("Grapes").to_lowercase().contains("riesling")
                || record.lookup("Name").to_lowercase().contains("riesling"))
        {
            score += config.grape_boost;
        }

        if wants_glass && !record.lookup("Glass").is_empty() {
            score += config.glass_boost;
        }

        if score > 0 {
            scored.push((score, record));
        }
    }

    if scored.is_empty() {
        return fallback(records, wants_glass, config);
    }

    // Stable sort keeps original sheet order on equal scores.
    scored.sort_by(|left, right| right.0.cmp(&left.0));
    scored.into_iter().take(config.match_cap).map(|(_, record)| record.clone()).collect()
}

fn tokenize(normalized_query: &str, config: &FilterConfig) -> Vec<String> {
    normalized_query
        .split(|ch: char| !ch.is_alphanumeric())
        .filter(|token| token.chars().count() >= config.min_token_len)
        .take(config.max_tokens)
        .map(str::to_string)
        .collect()
}

fn glass_intent(normalized_query: &str) -> bool {
    normalized_query.contains("glass")
        || normalized_query.contains("glas")
        || normalized_query.contains("by the glass")
}

fn haystack(record: &InventoryRecord) -> String {
    let mut joined = String::new();
    for field in HAYSTACK_FIELDS {
        let value = record.lookup(field);
        if value.is_empty() {
            continue;
        }
        if !joined.is_empty() {
            joined.push(' ');
        }
        joined.push_str(&value.to_lowercase());
    }
    joined
}

fn fallback(
    records: &[InventoryRecord],
    wants_glass: bool,
    config: &FilterConfig,
) -> Vec<InventoryRecord> {
    if wants_glass {
        return records
            .iter()
            .filter(|record| !record.lookup("Glass").is_empty())
            .take(config.fallback_cap)
            .cloned()
            .collect();
    }

    records.iter().take(config.fallback_cap).cloned().collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{select_relevant, FilterConfig};
    use crate::inventory::InventoryRecord;

    fn wine(fields: serde_json::Value) -> InventoryRecord {
        InventoryRecord::from_value(fields).expect("fixture should be an object")
    }

    fn cellar() -> Vec<InventoryRecord> {
        vec![
            wine(json!({"Name": "Felsina Chianti", "Grapes": "Sangiovese", "Glass": ""})),
            wine(json!({"Name": "Keller Trocken", "Grapes": "Riesling", "Glass": "95,-"})),
            wine(json!({"Name": "Clos Cibonne Tradition", "Grapes": "Tibouren", "Glass": "110,-"})),
            wine(json!({"Name": "Domaine Overnoy", "Grapes": "Poulsard", "Glass": ""})),
        ]
    }

    #[test]
    fn name_token_match_selects_the_record() {
        let selected = select_relevant(&cellar(), "do you have chianti", &FilterConfig::default());
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].lookup("Name"), "Felsina Chianti");
    }

    #[test]
    fn riesling_boost_outranks_plain_token_matches() {
        let records = vec![
            wine(json!({"Name": "Riesling Fan Club", "Grapes": "Sylvaner"})),
            wine(json!({"Name": "Keller Trocken", "Grapes": "Riesling"})),
            wine(json!({"Name": "Felsina Chianti", "Grapes": "Sangiovese"})),
        ];

        let selected = select_relevant(&records, "riesling", &FilterConfig::default());

        // Both riesling records rank above everything else; the Chianti has no
        // token match at all and is excluded.
        assert_eq!(selected.len(), 2);
        assert!(selected
            .iter()
            .all(|record| record.lookup("Grapes").contains("Riesling")
                || record.lookup("Name").contains("Riesling")));
    }

    #[test]
    fn glass_intent_boosts_pourable_records() {
        let selected =
            select_relevant(&cellar(), "anything nice by the glass?", &FilterConfig::default());

        assert!(!selected.is_empty());
        assert!(selected.iter().all(|record| !record.lookup("Glass").is_empty()));
    }

    #[test]
    fn empty_query_falls_back_to_original_order() {
        let records = cellar();
        let selected = select_relevant(&records, "", &FilterConfig::default());
        assert_eq!(selected, records);
    }

    #[test]
    fn fallback_respects_the_cap() {
        let records: Vec<InventoryRecord> = (0..100)
            .map(|index| wine(json!({"Name": format!("Wine {index}")})))
            .collect();

        let selected = select_relevant(&records, "", &FilterConfig::default());
        assert_eq!(selected.len(), 60);
        assert_eq!(selected[0].lookup("Name"), "Wine 0");
        assert_eq!(selected[59].lookup("Name"), "Wine 59");
    }

    #[test]
    fn match_cap_bounds_positive_scores() {
        let records: Vec<InventoryRecord> = (0..100)
            .map(|index| wine(json!({"Name": format!("Gamay {index}")})))
            .collect();

        let selected = select_relevant(&records, "gamay", &FilterConfig::default());
        assert_eq!(selected.len(), 40);
    }

    #[test]
    fn glass_fallback_returns_only_pourable_records() {
        let selected = select_relevant(&cellar(), "glas", &FilterConfig::default());
        assert!(!selected.is_empty());
        assert!(selected.iter().all(|record| !record.lookup("Glass").is_empty()));
    }

    #[test]
    fn glass_query_with_no_pourable_wines_yields_nothing() {
        let records = vec![
            wine(json!({"Name": "Felsina Chianti", "Glass": ""})),
            wine(json!({"Name": "Domaine Overnoy"})),
        ];

        let selected = select_relevant(&records, "by the glass", &FilterConfig::default());
        assert!(selected.is_empty());
    }

    #[test]
    fn short_tokens_are_dropped() {
        // "do" and "we" are below the token length floor; only "have" survives
        // and matches nothing, so the fallback path returns everything capped.
        let records = cellar();
        let selected = select_relevant(&records, "do we have it", &FilterConfig::default());
        assert_eq!(selected.len(), records.len());
    }

    #[test]
    fn danish_letters_survive_tokenization() {
        let records = vec![
            wine(json!({"Name": "Ærlig Rød", "Grapes": "Blaufränkisch"})),
            wine(json!({"Name": "Felsina Chianti", "Grapes": "Sangiovese"})),
        ];

        let selected = select_relevant(&records, "den ærlig røde", &FilterConfig::default());
        assert_eq!(selected[0].lookup("Name"), "Ærlig Rød");
    }

    #[test]
    fn token_list_is_capped() {
        let config = FilterConfig { max_tokens: 2, ..FilterConfig::default() };
        // Only the first two long tokens score; "chianti" is beyond the cap.
        let selected = select_relevant(&cellar(), "something anything chianti", &config);
        assert_eq!(selected.len(), cellar().len());
    }

    #[test]
    fn ties_preserve_sheet_order() {
        let records = vec![
            wine(json!({"Name": "Gamay One"})),
            wine(json!({"Name": "Gamay Two"})),
            wine(json!({"Name": "Gamay Three"})),
        ];

        let selected = select_relevant(&records, "gamay", &FilterConfig::default());
        let names: Vec<String> = selected.iter().map(|record| record.lookup("Name")).collect();
        assert_eq!(names, vec!["Gamay One", "Gamay Two", "Gamay Three"]);
    }
}
