use std::collections::HashSet;

use lazy_static::lazy_static;

use super::title_case;

/// Canonical role taxonomy. Normalization maps free-text role strings onto
/// one of these by token overlap.
pub const STANDARD_ROLES: &[&str] = &[
    "Data Scientist",
    "ML Engineer",
    "Software Engineer",
    "Data Analyst",
    "Backend Developer",
    "Frontend Developer",
    "Full Stack Developer",
    "DevOps Engineer",
    "Cloud Architect",
    "AI Researcher",
    "Data Engineer",
    "Product Manager (Tech)",
    "UX Designer",
    "Cybersecurity Analyst",
    "Blockchain Developer",
    "Mobile App Developer",
    "Embedded Systems Engineer",
    "QA Automation Engineer",
    "NOC Engineer",
    "Solutions Architect",
    "Technical Support Engineer",
    "Database Administrator",
    "Systems Analyst",
    "Game Developer",
    "AR/VR Developer",
    "Big Data Engineer",
    "Scrum Master",
    "Site Reliability Engineer",
    "Computer Vision Engineer",
    "NLP Scientist",
];

lazy_static! {
    /// Taxonomy pre-tokenized in alphabetical order. Ties on overlap score
    /// resolve to the alphabetically first canonical role, which keeps the
    /// winner independent of how the taxonomy above happens to be listed.
    static ref TOKENIZED_ROLES: Vec<(&'static str, HashSet<String>)> = {
        let mut roles: Vec<&'static str> = STANDARD_ROLES.to_vec();
        roles.sort_unstable();
        roles
            .into_iter()
            .map(|role| {
                let tokens = role
                    .to_lowercase()
                    .split_whitespace()
                    .map(str::to_string)
                    .collect();
                (role, tokens)
            })
            .collect()
    };
}

/// Canonicalize a free-text role string. Total function: the canonical role
/// with the largest token overlap wins; with no overlapping tokens the input
/// comes back title-cased, and a missing value maps to "Other".
pub fn normalize_role(raw: Option<&str>) -> String {
    let Some(raw) = raw else {
        return "Other".to_string();
    };

    let role_tokens: HashSet<String> = raw
        .to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect();

    let mut best: Option<&'static str> = None;
    let mut max_score = 0usize;

    for (role, tokens) in TOKENIZED_ROLES.iter() {
        let overlap = tokens.intersection(&role_tokens).count();
        if overlap > max_score {
            max_score = overlap;
            best = Some(role);
        }
    }

    match best {
        Some(role) => role.to_string(),
        None => title_case(raw),
    }
}
