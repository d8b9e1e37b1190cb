//! Spelling suggestions based on edit distance

use std::cmp::{max, min};

/// Levenshtein distance between two strings, counted in characters
#[must_use]
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let m = a_chars.len();
    let n = b_chars.len();

    // Use the smaller string for the inner array to save space
    if m < n {
        return levenshtein_distance(b, a);
    }

    let mut previous: Vec<usize> = (0..=n).collect();

    for (i, &ca) in a_chars.iter().enumerate() {
        let mut current = vec![i + 1];

        for (j, &cb) in b_chars.iter().enumerate() {
            let cost = usize::from(ca != cb);
            current.push(min(
                min(previous[j + 1] + 1, current[j] + 1),
                previous[j] + cost,
            ));
        }

        previous = current;
    }

    previous[n]
}

/// Case-insensitive similarity in `0.0..=1.0`: `1 - distance / max(len)`
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn similarity(a: &str, b: &str) -> f64 {
    let a = a.to_lowercase();
    let b = b.to_lowercase();
    let max_len = max(a.chars().count(), b.chars().count());
    if max_len == 0 {
        return 1.0;
    }

    let distance = levenshtein_distance(&a, &b);
    1.0 - (distance as f64 / max_len as f64)
}

/// Suggest up to `limit` known names close to `unknown`
///
/// A candidate qualifies if it shares the first letter with `unknown` or its
/// similarity exceeds `threshold`. Qualifying candidates are ordered by edit
/// distance, then name.
#[must_use]
pub fn suggest<'a, I>(unknown: &str, candidates: I, limit: usize, threshold: f64) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let needle = unknown.to_lowercase();
    let first = needle.chars().next();

    let mut scored: Vec<(usize, String, &str)> = candidates
        .into_iter()
        .filter_map(|candidate| {
            let lowered = candidate.to_lowercase();
            let same_first = first.is_some() && lowered.chars().next() == first;
            if same_first || similarity(&needle, &lowered) > threshold {
                Some((levenshtein_distance(&needle, &lowered), lowered, candidate))
            } else {
                None
            }
        })
        .collect();

    // Case variants sort next to each other so dedup sees them
    scored.sort_by(|(da, la, a), (db, lb, b)| da.cmp(db).then_with(|| la.cmp(lb)).then_with(|| a.cmp(b)));
    scored.dedup_by(|(_, a, _), (_, b, _)| a == b);
    scored
        .into_iter()
        .take(limit)
        .map(|(_, _, name)| name.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levenshtein_distance() {
        assert_eq!(levenshtein_distance("kitten", "sitting"), 3);
        assert_eq!(levenshtein_distance("", "abc"), 3);
        assert_eq!(levenshtein_distance("where", "where"), 0);
    }

    #[test]
    fn test_similarity() {
        assert!((similarity("Resources", "resources") - 1.0).abs() < f64::EPSILON);
        assert!((similarity("", "") - 1.0).abs() < f64::EPSILON);
        assert!(similarity("wher", "where") > 0.6);
    }

    #[test]
    fn test_suggest_capped_and_ordered() {
        let names = [
            "Resources",
            "ResourceContainers",
            "AdvisorResources",
            "RecoveryServicesResources",
            "ResourceChanges",
        ];
        let suggestions = suggest("Resourcess", names, 3, 0.6);

        assert_eq!(suggestions.len(), 3);
        assert_eq!(suggestions[0], "Resources");
    }

    #[test]
    fn test_suggest_similarity_without_first_letter() {
        let suggestions = suggest("here", ["where", "project"], 3, 0.6);
        assert_eq!(suggestions, vec!["where".to_string()]);
    }

    #[test]
    fn test_suggest_drops_case_variants() {
        let suggestions = suggest("wherx", ["where", "Wherz", "Where"], 3, 0.6);
        assert_eq!(suggestions, vec!["Where".to_string(), "Wherz".to_string()]);
    }

    #[test]
    fn test_suggest_nothing_close() {
        assert!(suggest("zzz", ["where", "project"], 3, 0.6).is_empty());
    }
}
