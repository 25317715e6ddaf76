use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

/// Required set per role is the top-K skills by training-corpus frequency.
const REQUIRED_SKILL_LIMIT: usize = 30;

/// Suggested when a role has no frequency data at all.
const FALLBACK_SKILLS: &[&str] = &[
    "Python",
    "SQL",
    "Communication",
    "Leadership",
    "Project Management",
];

/// One `(role, skill) → count` observation from the training corpus.
#[derive(Debug, Clone, Deserialize)]
pub struct SkillFrequency {
    pub role: String,
    pub skill: String,
    pub count: u64,
}

/// Gap report for a target role against a caller-supplied skill set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkillGapReport {
    pub match_percentage: u32,
    pub required_skills: Vec<String>,
    pub matched_skills: Vec<String>,
    pub missing_skills: Vec<String>,
}

impl SkillGapReport {
    fn empty() -> Self {
        Self {
            match_percentage: 0,
            required_skills: Vec::new(),
            matched_skills: Vec::new(),
            missing_skills: Vec::new(),
        }
    }
}

/// Precomputed per-role skill frequencies, grouped and sorted once at load
/// time; immutable at serving time.
#[derive(Debug, Clone, Default)]
pub struct SkillFrequencyTable {
    by_role: HashMap<String, Vec<(String, u64)>>,
}

impl SkillFrequencyTable {
    /// Group raw observations per role and sort by descending count, ties by
    /// skill name, so "top K" is deterministic.
    pub fn new(rows: Vec<SkillFrequency>) -> Self {
        let mut by_role: HashMap<String, Vec<(String, u64)>> = HashMap::new();
        for row in rows {
            by_role
                .entry(row.role)
                .or_default()
                .push((row.skill, row.count));
        }

        for skills in by_role.values_mut() {
            skills.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        }

        Self { by_role }
    }

    pub fn roles(&self) -> usize {
        self.by_role.len()
    }

    /// Top-K skills for a role by market frequency, or the static fallback
    /// list when the role has no data.
    pub fn role_skills(&self, role: &str) -> Vec<String> {
        match self.by_role.get(role) {
            Some(skills) => skills
                .iter()
                .take(REQUIRED_SKILL_LIMIT)
                .map(|(skill, _)| skill.clone())
                .collect(),
            None => FALLBACK_SKILLS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Compare the caller's current skills against the role's required set.
    /// A role with no frequency data yields zero match and empty lists; an
    /// empty required set defines the percentage as zero rather than
    /// dividing by it.
    pub fn recommend(&self, target_role: &str, current_skills: &[String]) -> SkillGapReport {
        let Some(skills) = self.by_role.get(target_role) else {
            return SkillGapReport::empty();
        };

        let required_skills: Vec<String> = skills
            .iter()
            .take(REQUIRED_SKILL_LIMIT)
            .map(|(skill, _)| skill.clone())
            .collect();

        let current: HashSet<&str> = current_skills.iter().map(String::as_str).collect();

        let matched_skills: Vec<String> = required_skills
            .iter()
            .filter(|skill| current.contains(skill.as_str()))
            .cloned()
            .collect();
        let missing_skills: Vec<String> = required_skills
            .iter()
            .filter(|skill| !current.contains(skill.as_str()))
            .cloned()
            .collect();

        let match_percentage = if required_skills.is_empty() {
            0
        } else {
            ((matched_skills.len() as f64 / required_skills.len() as f64) * 100.0).round() as u32
        };

        SkillGapReport {
            match_percentage,
            required_skills,
            matched_skills,
            missing_skills,
        }
    }
}
