//! Category canonicalization
//!
//! Raw categories are free text; the endpoint accepts a fixed set of
//! lowercase identifiers.

/// Categories accepted by the ingestion endpoint
pub const VALID_CATEGORIES: [&str; 10] = [
    "contentinjection",
    "drivebycompromise",
    "exploitpublicfacingapplication",
    "externalremoteservices",
    "hardwareadditions",
    "phishing",
    "replicationthroughremovablemedia",
    "supplychaincompromise",
    "trustedrelationship",
    "validaccounts",
];

/// Known spellings that fuzzy matching does not resolve
const OVERRIDES: [(&str, &str); 1] = [("compromisedriveby", "drivebycompromise")];

/// Minimum `weighted_ratio` score for a fuzzy match
pub const FUZZY_THRESHOLD: f64 = 80.0;

/// Lowercase and keep ASCII letters only
pub fn clean(raw: &str) -> String {
    raw.trim()
        .chars()
        .filter(char::is_ascii_alphabetic)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Canonicalize a raw category
///
/// Exact match, then override table, then the closest valid category above
/// `FUZZY_THRESHOLD`. Anything else is returned cleaned. Returns `None` when
/// nothing is left after cleaning.
pub fn normalize(raw: &str) -> Option<String> {
    let cleaned = clean(raw);
    if cleaned.is_empty() {
        return None;
    }

    if VALID_CATEGORIES.contains(&cleaned.as_str()) {
        return Some(cleaned);
    }

    if let Some((_, target)) = OVERRIDES.iter().find(|(from, _)| *from == cleaned) {
        return Some((*target).to_string());
    }

    if let Some(best) = closest(&cleaned) {
        return Some(best.to_string());
    }

    Some(cleaned)
}

fn closest(cleaned: &str) -> Option<&'static str> {
    let mut best: Option<(&'static str, f64)> = None;
    for candidate in VALID_CATEGORIES {
        let score = weighted_ratio(cleaned, candidate);
        // first candidate wins ties
        if score >= FUZZY_THRESHOLD && best.is_none_or(|(_, top)| score > top) {
            best = Some((candidate, score));
        }
    }
    best.map(|(candidate, _)| candidate)
}

/// Similarity in `[0, 100]` between two cleaned categories
///
/// Indel ratio, upgraded by the best substring alignment when one side is
/// much longer than the other: scaled by 0.9, or 0.6 once the length ratio
/// reaches 8. Inputs are single tokens, so token-based variants add nothing.
pub fn weighted_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let (short, long) = if a.len() <= b.len() { (&a, &b) } else { (&b, &a) };
    let full = indel_ratio(&a, &b);
    let len_ratio = long.len() as f64 / short.len() as f64;
    if len_ratio < 1.5 {
        return full;
    }

    let partial_scale = if len_ratio < 8.0 { 0.9 } else { 0.6 };
    full.max(partial_ratio(short, long) * partial_scale)
}

/// Best indel ratio of `short` against windows of `long`, including windows
/// that hang over either end
fn partial_ratio(short: &[char], long: &[char]) -> f64 {
    let m = short.len();
    let n = long.len();
    let full_windows = (0..=n - m).map(|i| &long[i..i + m]);
    let prefixes = (1..m).map(|k| &long[..k]);
    let suffixes = (1..m).map(|k| &long[n - k..]);

    full_windows
        .chain(prefixes)
        .chain(suffixes)
        .map(|window| indel_ratio(short, window))
        .fold(0.0, f64::max)
}

/// `100 * 2 * lcs / (len_a + len_b)`
fn indel_ratio(a: &[char], b: &[char]) -> f64 {
    let total = a.len() + b.len();
    if total == 0 {
        return 100.0;
    }
    200.0 * lcs_len(a, b) as f64 / total as f64
}

fn lcs_len(a: &[char], b: &[char]) -> usize {
    let mut row = vec![0usize; b.len() + 1];
    for &ca in a {
        let mut diagonal = 0;
        for (j, &cb) in b.iter().enumerate() {
            let above = row[j + 1];
            row[j + 1] = if ca == cb {
                diagonal + 1
            } else {
                above.max(row[j])
            };
            diagonal = above;
        }
    }
    row[b.len()]
}
