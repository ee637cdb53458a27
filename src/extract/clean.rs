//! Text cleaning and keyword heuristics

use std::collections::HashSet;

/// Collapses whitespace and drops short sentence fragments
///
/// The text is split on every `.`; fragments shorter than `min_fragment_len`
/// characters (after trimming) are discarded and the rest are re-joined with
/// `". "`. This removes menu and button labels that survive main-content
/// detection, at the cost of losing real short sentences.
pub fn clean_text(text: &str, min_fragment_len: usize) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");

    collapsed
        .split('.')
        .map(str::trim)
        .filter(|fragment| fragment.chars().count() >= min_fragment_len)
        .collect::<Vec<_>>()
        .join(". ")
}

/// Frequency-order keyword fallback used when a page has no meta keywords
///
/// Words are lowercased and stripped of surrounding punctuation. Words of
/// three characters or fewer and stop words are skipped. The result keeps
/// first-seen order, holds no duplicates and has at most `max_keywords` entries.
pub fn extract_keywords(text: &str, stop_words: &HashSet<String>, max_keywords: usize) -> Vec<String> {
    let mut keywords = Vec::new();
    let mut seen = HashSet::new();

    for word in text.split_whitespace() {
        if keywords.len() >= max_keywords {
            break;
        }

        let word = word
            .trim_matches(|c: char| !c.is_alphanumeric())
            .to_lowercase();

        if word.chars().count() <= 3 || stop_words.contains(&word) {
            continue;
        }

        if seen.insert(word.clone()) {
            keywords.push(word);
        }
    }

    keywords
}

/// Splits a `meta[name=keywords]` value into trimmed, deduplicated terms
pub fn split_meta_keywords(content: &str) -> Vec<String> {
    let mut keywords: Vec<String> = Vec::new();
    for keyword in content.split(',').map(str::trim) {
        if !keyword.is_empty() && !keywords.iter().any(|k| k == keyword) {
            keywords.push(keyword.to_string());
        }
    }
    keywords
}
