use std::collections::HashMap;

use serde::Serialize;

/// Candidate keywords per semantic field, tried in order. A source column is
/// accepted on an exact match of the canonical form first, then on substring
/// containment in either direction.
const ROLE_KEYWORDS: &[&str] = &[
    "role",
    "job role",
    "title",
    "job title",
    "position",
    "job name",
];

const SALARY_KEYWORDS: &[&str] = &[
    "salary",
    "salary_lpa",
    "compensation",
    "package",
    "pay",
    "ctc",
];

const SKILLS_KEYWORDS: &[&str] = &[
    "skills",
    "skillset",
    "technologies",
    "requirements",
    "stacks",
];

const EXPERIENCE_KEYWORDS: &[&str] = &[
    "experience",
    "exp",
    "years of experience",
    "years",
    "tenure",
];

/// Source column resolved for each semantic field. `None` means the field is
/// unmapped; everything except `role` is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DetectedColumns {
    pub role: Option<String>,
    pub salary: Option<String>,
    pub skills: Option<String>,
    pub experience: Option<String>,
}

/// Outcome of schema alignment. `MappingRequired` is a request for
/// disambiguation input from the caller, not a failure: it carries the full
/// column list plus whatever was detected so a UI can offer a mapping form.
#[derive(Debug, Clone, PartialEq)]
pub enum AlignmentOutcome {
    Resolved(DetectedColumns),
    MappingRequired {
        columns: Vec<String>,
        detected: DetectedColumns,
    },
}

/// Lowercase and strip spaces/underscores so `Job_Title`, `job title` and
/// `JobTitle` all compare equal.
fn canonical(name: &str) -> String {
    name.to_lowercase().replace(['_', ' '], "")
}

fn find_best_column(columns: &[String], keywords: &[&str]) -> Option<String> {
    // Pass 1: exact match on canonical form.
    for col in columns {
        let clean_col = canonical(col);
        for keyword in keywords {
            if clean_col == canonical(keyword) {
                return Some(col.clone());
            }
        }
    }

    // Pass 2: substring containment in either direction.
    for col in columns {
        let clean_col = canonical(col);
        for keyword in keywords {
            let clean_keyword = canonical(keyword);
            if clean_col.contains(&clean_keyword) || clean_keyword.contains(&clean_col) {
                return Some(col.clone());
            }
        }
    }

    None
}

fn resolve(
    field: &str,
    columns: &[String],
    keywords: &[&str],
    overrides: &HashMap<String, String>,
) -> Option<String> {
    // An explicit override always wins over fuzzy detection.
    if let Some(value) = overrides.get(field) {
        if !value.trim().is_empty() {
            return Some(value.clone());
        }
    }

    find_best_column(columns, keywords)
}

/// Map an arbitrary set of column names onto the canonical
/// {role, salary, skills, experience} schema.
///
/// Never fails: when the `role` column cannot be resolved the result is
/// `MappingRequired` carrying the partial detections.
pub fn align_schema(columns: &[String], overrides: &HashMap<String, String>) -> AlignmentOutcome {
    let detected = DetectedColumns {
        role: resolve("role", columns, ROLE_KEYWORDS, overrides),
        salary: resolve("salary", columns, SALARY_KEYWORDS, overrides),
        skills: resolve("skills", columns, SKILLS_KEYWORDS, overrides),
        experience: resolve("experience", columns, EXPERIENCE_KEYWORDS, overrides),
    };

    if detected.role.is_none() {
        return AlignmentOutcome::MappingRequired {
            columns: columns.to_vec(),
            detected,
        };
    }

    AlignmentOutcome::Resolved(detected)
}
