use super::title_case;

/// Ordered substring rules: the first rule whose keyword occurs in the
/// lowercased input wins. "remote" is deliberately first so "Remote (NY)"
/// resolves to Remote rather than New York.
const LOCATION_RULES: &[(&[&str], &str)] = &[
    (&["remote"], "Remote"),
    (&["bengaluru", "bangalore"], "Bangalore, India"),
    (&["san francisco", "sf"], "San Francisco, CA"),
    (&["new york", "ny"], "New York, NY"),
    (&["austin"], "Austin, TX"),
    (&["london"], "London, UK"),
    (&["berlin"], "Berlin, Germany"),
    (&["singapore"], "Singapore"),
    (&["sydney"], "Sydney, Australia"),
    (&["toronto"], "Toronto, Canada"),
];

/// Canonicalize a free-text location string. Total function: first matching
/// substring rule wins, anything unrecognized comes back title-cased, and a
/// missing value maps to "Remote".
pub fn normalize_location(raw: Option<&str>) -> String {
    let Some(raw) = raw else {
        return "Remote".to_string();
    };

    let lower = raw.to_lowercase();
    for (keywords, canonical) in LOCATION_RULES {
        if keywords.iter().any(|keyword| lower.contains(keyword)) {
            return canonical.to_string();
        }
    }

    title_case(raw)
}
