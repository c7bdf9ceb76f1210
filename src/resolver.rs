use std::collections::hash_map::Entry;
use std::collections::HashMap;

/// Returned when no token qualifies
pub const UNKNOWN_NAME: &str = "Unknown";

/// Pick the most frequent token across all region texts.
///
/// Tokens are uppercased words longer than two characters; ties go to the
/// token encountered first. Frequency alone can latch onto a repeated
/// non-brand word (a dosage unit printed on every face of the box); that
/// trade-off is accepted for predictability.
pub fn resolve(texts: &[String]) -> String {
    let combined = texts.join(" ");

    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut first_seen: Vec<String> = Vec::new();

    for word in combined.split_whitespace() {
        if word.chars().count() <= 2 {
            continue;
        }
        match counts.entry(word.to_uppercase()) {
            Entry::Occupied(mut entry) => *entry.get_mut() += 1,
            Entry::Vacant(entry) => {
                first_seen.push(entry.key().clone());
                entry.insert(1);
            }
        }
    }

    let mut best: Option<(&String, usize)> = None;
    for token in &first_seen {
        let count = counts[token];
        if best.is_none_or(|(_, best_count)| count > best_count) {
            best = Some((token, count));
        }
    }

    best.map(|(token, _)| token.clone())
        .unwrap_or_else(|| UNKNOWN_NAME.to_string())
}
