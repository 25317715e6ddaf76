use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::PathBuf;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use thiserror::Error;

use crate::normalize::{STANDARD_ROLES, normalize_role, split_skill_list};
use crate::schema_align::{AlignmentOutcome, DetectedColumns, align_schema};

const DATASET_FILE: &str = "job_market_analytics_dataset.csv";

/// First run of digits in a free-text experience cell: "5 years", "5+",
/// "about 5".
static EXPERIENCE_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").unwrap());

const SKILL_DEMAND_LIMIT: usize = 10;

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("dataset not found")]
    NotFound,
    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse dataset: {0}")]
    Csv(#[from] csv::Error),
    #[error("dataset has no columns")]
    Empty,
}

/// An uploaded tabular dataset: a header row plus string-valued records.
/// Column semantics are unknown until the schema aligner runs.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Dataset {
    pub fn parse(bytes: &[u8]) -> Result<Self, DatasetError> {
        let mut reader = csv::Reader::from_reader(bytes);

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();
        if headers.is_empty() || headers.iter().all(String::is_empty) {
            return Err(DatasetError::Empty);
        }

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(str::to_string).collect());
        }

        Ok(Self { headers, rows })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Cell value at (row, column name); empty and whitespace-only cells read
    /// as absent, matching how blank CSV fields carry no value.
    fn cell<'a>(&'a self, row: usize, column: Option<usize>) -> Option<&'a str> {
        let value = self.rows.get(row)?.get(column?)?.trim();
        (!value.is_empty()).then_some(value)
    }
}

/// The single mutable artifact in the system: the current analytics dataset,
/// replaced wholesale on upload. Writes go to a temp file in the same
/// directory and rename over the target, so a reader racing an upload sees
/// the old file or the new one, never a torn write.
#[derive(Debug, Clone)]
pub struct DatasetStore {
    data_dir: PathBuf,
}

impl DatasetStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Result<Self, DatasetError> {
        let data_dir = data_dir.into();
        fs::create_dir_all(&data_dir).map_err(|source| DatasetError::Io {
            path: data_dir.clone(),
            source,
        })?;
        Ok(Self { data_dir })
    }

    fn dataset_path(&self) -> PathBuf {
        self.data_dir.join(DATASET_FILE)
    }

    pub fn exists(&self) -> bool {
        self.dataset_path().is_file()
    }

    /// Read and parse the current dataset from disk. Re-read per request so
    /// an upload landing between requests is picked up without coordination.
    pub fn read(&self) -> Result<Dataset, DatasetError> {
        let path = self.dataset_path();
        let bytes = fs::read(&path).map_err(|source| match source.kind() {
            std::io::ErrorKind::NotFound => DatasetError::NotFound,
            _ => DatasetError::Io { path, source },
        })?;

        Dataset::parse(&bytes)
    }

    /// Validate and atomically install a new dataset, returning its record
    /// count. An unparseable payload leaves the current dataset untouched.
    pub fn replace(&self, bytes: &[u8]) -> Result<usize, DatasetError> {
        let dataset = Dataset::parse(bytes)?;

        let tmp_path = self.data_dir.join(format!("{DATASET_FILE}.tmp"));
        fs::write(&tmp_path, bytes).map_err(|source| DatasetError::Io {
            path: tmp_path.clone(),
            source,
        })?;
        fs::rename(&tmp_path, self.dataset_path()).map_err(|source| DatasetError::Io {
            path: tmp_path,
            source,
        })?;

        tracing::info!(records = dataset.len(), "dataset replaced");
        Ok(dataset.len())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkillCount {
    pub skill: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoleSalary {
    pub title: String,
    pub salary: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExperienceSalary {
    pub level: u32,
    pub salary: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MarketFilters {
    pub roles: Vec<String>,
    pub skills: Vec<String>,
    pub experience: Vec<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MarketSummary {
    pub skill_demand: Vec<SkillCount>,
    pub job_salary: Vec<RoleSalary>,
    pub exp_salary: Vec<ExperienceSalary>,
    pub total_records: usize,
    pub filters: MarketFilters,
    pub mapping: DetectedColumns,
}

/// Analytics either succeed or come back as a disambiguation request; a
/// dataset whose role column cannot be found is not an error.
#[derive(Debug, Clone)]
pub enum MarketOutcome {
    Summary(MarketSummary),
    MappingRequired {
        columns: Vec<String>,
        detected: DetectedColumns,
    },
}

/// Salary cells are free text; anything non-numeric contributes zero rather
/// than poisoning the aggregate.
fn parse_salary(raw: Option<&str>) -> f64 {
    raw.and_then(|value| value.trim().parse::<f64>().ok())
        .filter(|value| value.is_finite())
        .unwrap_or(0.0)
}

/// "5 years", "5+", "about 5" all parse as 5; anything without digits is 0.
fn parse_experience(raw: Option<&str>) -> u32 {
    raw.and_then(|value| EXPERIENCE_PATTERN.find(value))
        .and_then(|m| m.as_str().parse::<u32>().ok())
        .unwrap_or(0)
}

/// Canonical roles present in the data come first (sorted), then everything
/// outside the taxonomy (sorted), so the filter list leads with known names.
fn order_role_filters(present: BTreeSet<String>) -> Vec<String> {
    let (standard, other): (Vec<String>, Vec<String>) = present
        .into_iter()
        .partition(|role| STANDARD_ROLES.contains(&role.as_str()));

    standard.into_iter().chain(other).collect()
}

/// Aggregate the current dataset into the dashboard summary: top skill
/// demand, mean salary per normalized role, mean salary per experience year,
/// and the distinct filter values. Optional columns degrade their own
/// aggregates only; a missing salary column just means no salary charts.
pub fn market_summary(dataset: &Dataset, overrides: &HashMap<String, String>) -> MarketOutcome {
    let detected = match align_schema(dataset.headers(), overrides) {
        AlignmentOutcome::Resolved(detected) => detected,
        AlignmentOutcome::MappingRequired { columns, detected } => {
            return MarketOutcome::MappingRequired { columns, detected };
        }
    };

    let role_col = detected.role.as_deref().and_then(|c| dataset.column_index(c));
    let salary_col = detected
        .salary
        .as_deref()
        .and_then(|c| dataset.column_index(c));
    let skills_col = detected
        .skills
        .as_deref()
        .and_then(|c| dataset.column_index(c));
    let exp_col = detected
        .experience
        .as_deref()
        .and_then(|c| dataset.column_index(c));

    let mut skill_counts: HashMap<String, u64> = HashMap::new();
    let mut salary_by_role: HashMap<String, (f64, u64)> = HashMap::new();
    let mut salary_by_exp: HashMap<u32, (f64, u64)> = HashMap::new();
    let mut roles_present: BTreeSet<String> = BTreeSet::new();
    let mut exp_present: BTreeSet<u32> = BTreeSet::new();

    for row in 0..dataset.len() {
        let role = normalize_role(dataset.cell(row, role_col));
        roles_present.insert(role.clone());

        if let Some(col) = skills_col {
            if let Some(raw) = dataset.cell(row, Some(col)) {
                for skill in split_skill_list(raw) {
                    *skill_counts.entry(skill).or_insert(0) += 1;
                }
            }
        }

        let experience = exp_col.map(|col| parse_experience(dataset.cell(row, Some(col))));
        if let Some(years) = experience {
            exp_present.insert(years);
        }

        if let Some(col) = salary_col {
            let salary = parse_salary(dataset.cell(row, Some(col)));

            let entry = salary_by_role.entry(role).or_insert((0.0, 0));
            entry.0 += salary;
            entry.1 += 1;

            if let Some(years) = experience {
                let entry = salary_by_exp.entry(years).or_insert((0.0, 0));
                entry.0 += salary;
                entry.1 += 1;
            }
        }
    }

    let unique_skills: Vec<String> = {
        let mut skills: Vec<String> = skill_counts.keys().cloned().collect();
        skills.sort_unstable();
        skills
    };

    let skill_demand = {
        let mut demand: Vec<SkillCount> = skill_counts
            .into_iter()
            .map(|(skill, count)| SkillCount { skill, count })
            .collect();
        demand.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.skill.cmp(&b.skill)));
        demand.truncate(SKILL_DEMAND_LIMIT);
        demand
    };

    let job_salary: Vec<RoleSalary> = {
        let mut entries: Vec<RoleSalary> = salary_by_role
            .into_iter()
            .map(|(title, (total, count))| RoleSalary {
                title,
                salary: total / count.max(1) as f64,
            })
            .collect();
        entries.sort_by(|a, b| a.title.cmp(&b.title));
        entries
    };

    let exp_salary: Vec<ExperienceSalary> = {
        let mut entries: Vec<ExperienceSalary> = salary_by_exp
            .into_iter()
            .map(|(level, (total, count))| ExperienceSalary {
                level,
                salary: total / count.max(1) as f64,
            })
            .collect();
        entries.sort_by_key(|entry| entry.level);
        entries
    };

    MarketOutcome::Summary(MarketSummary {
        skill_demand,
        job_salary,
        exp_salary,
        total_records: dataset.len(),
        filters: MarketFilters {
            roles: order_role_filters(roles_present),
            skills: unique_skills,
            experience: exp_present.into_iter().collect(),
        },
        mapping: detected,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
Job Title,Pay,Tech Stack,Experience
senior data scientist,24.5,Python|SQL,5 years
data scientist,18.0,\"Python, Tableau\",3+
growth hacker,not disclosed,SEO;Python,junior
";

    fn sample() -> Dataset {
        Dataset::parse(SAMPLE.as_bytes()).unwrap()
    }

    #[test]
    fn summarizes_a_fuzzy_headed_dataset() {
        let outcome = market_summary(&sample(), &HashMap::new());

        let summary = match outcome {
            MarketOutcome::Summary(summary) => summary,
            other => panic!("unexpected outcome: {other:?}"),
        };

        assert_eq!(summary.total_records, 3);
        assert_eq!(summary.mapping.role.as_deref(), Some("Job Title"));
        assert_eq!(summary.mapping.salary.as_deref(), Some("Pay"));
        assert_eq!(summary.mapping.skills.as_deref(), Some("Tech Stack"));
        assert_eq!(summary.mapping.experience.as_deref(), Some("Experience"));

        // Python appears in all three rows; every other skill once.
        assert_eq!(
            summary.skill_demand.first(),
            Some(&SkillCount {
                skill: "Python".to_string(),
                count: 3,
            })
        );

        // Two rows normalize onto Data Scientist; the unparseable salary
        // contributes zero to Growth Hacker's mean.
        let by_title: HashMap<&str, f64> = summary
            .job_salary
            .iter()
            .map(|entry| (entry.title.as_str(), entry.salary))
            .collect();
        assert_eq!(by_title["Data Scientist"], 21.25);
        assert_eq!(by_title["Growth Hacker"], 0.0);

        // "5 years" → 5, "3+" → 3, "junior" → 0.
        assert_eq!(summary.filters.experience, vec![0, 3, 5]);
    }

    #[test]
    fn canonical_roles_lead_the_role_filter_list() {
        let outcome = market_summary(&sample(), &HashMap::new());

        let MarketOutcome::Summary(summary) = outcome else {
            panic!("expected summary");
        };

        assert_eq!(
            summary.filters.roles,
            vec!["Data Scientist".to_string(), "Growth Hacker".to_string()]
        );
    }

    #[test]
    fn unresolvable_role_column_requests_mapping() {
        let dataset = Dataset::parse(b"Pay,Tech Stack\n12,Python\n").unwrap();

        let outcome = market_summary(&dataset, &HashMap::new());

        match outcome {
            MarketOutcome::MappingRequired { columns, detected } => {
                assert_eq!(columns, vec!["Pay".to_string(), "Tech Stack".to_string()]);
                assert_eq!(detected.salary.as_deref(), Some("Pay"));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn missing_salary_column_degrades_salary_aggregates_only() {
        let dataset = Dataset::parse(b"Role,Skills\nData Scientist,Python\n").unwrap();

        let MarketOutcome::Summary(summary) = market_summary(&dataset, &HashMap::new()) else {
            panic!("expected summary");
        };

        assert!(summary.job_salary.is_empty());
        assert!(summary.exp_salary.is_empty());
        assert_eq!(summary.skill_demand.len(), 1);
    }

    #[test]
    fn override_redirects_a_semantic_column() {
        let dataset =
            Dataset::parse(b"Designation,Pay\nML Engineer,30\n").unwrap();
        let overrides = HashMap::from([("role".to_string(), "Designation".to_string())]);

        let MarketOutcome::Summary(summary) = market_summary(&dataset, &overrides) else {
            panic!("expected summary");
        };

        assert_eq!(summary.mapping.role.as_deref(), Some("Designation"));
        assert_eq!(summary.filters.roles, vec!["ML Engineer".to_string()]);
    }

    #[test]
    fn store_replaces_dataset_atomically_and_rejects_bad_payloads() {
        let dir = tempfile::tempdir().unwrap();
        let store = DatasetStore::new(dir.path()).unwrap();

        assert!(matches!(store.read(), Err(DatasetError::NotFound)));

        let records = store.replace(SAMPLE.as_bytes()).unwrap();
        assert_eq!(records, 3);
        assert_eq!(store.read().unwrap().len(), 3);

        // Ragged row: parse fails, current dataset stays in place.
        let err = store.replace(b"a,b\n1,2,3\n").unwrap_err();
        assert!(matches!(err, DatasetError::Csv(_)));
        assert_eq!(store.read().unwrap(), sample());
    }

    #[test]
    fn empty_payload_is_rejected() {
        assert!(matches!(
            Dataset::parse(b""),
            Err(DatasetError::Empty)
        ));
    }
}
