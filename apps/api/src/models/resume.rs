use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use sqlx::FromRow;
use uuid::Uuid;

use crate::render::Template;

// ────────────────────────────────────────────────────────────────────────────
// Resume aggregate
// ────────────────────────────────────────────────────────────────────────────

/// A complete resume document owned by exactly one user.
///
/// Sub-entities are value objects embedded in the document and are always
/// written together with their parent. Every field tolerates absence on input;
/// mandatory fields are enforced by `resumes::validation`, not by serde.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeData {
    #[serde(default = "Uuid::nil")]
    pub id: Uuid,
    #[serde(default = "Uuid::nil")]
    pub user_id: Uuid,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub job_title: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub template: Template,
    #[serde(default)]
    pub contact: Contact,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub experience: Vec<ExperienceEntry>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub education: Vec<EducationEntry>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub skills: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub languages: Vec<LanguageEntry>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub references: Vec<ReferenceEntry>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
    /// Set when stored entries could not be read and were left out. Such a
    /// document is incomplete and must not be written back as-is.
    #[serde(skip)]
    pub degraded: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
}

impl Contact {
    pub fn is_blank(&self) -> bool {
        [&self.email, &self.phone, &self.website, &self.location]
            .iter()
            .all(|f| non_blank(f.as_deref()).is_none())
    }
}

/// `end_date: None` means the position is ongoing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperienceEntry {
    #[serde(default)]
    pub company: String,
    #[serde(default, alias = "title")]
    pub position: String,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EducationEntry {
    #[serde(default, alias = "institution")]
    pub school: String,
    #[serde(default)]
    pub degree: String,
    #[serde(default)]
    pub field: String,
    #[serde(default)]
    pub graduation_date: Option<String>,
    #[serde(default)]
    pub gpa: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Proficiency {
    Basic,
    Conversational,
    Fluent,
    Native,
}

impl Proficiency {
    pub fn label(&self) -> &'static str {
        match self {
            Proficiency::Basic => "Basic",
            Proficiency::Conversational => "Conversational",
            Proficiency::Fluent => "Fluent",
            Proficiency::Native => "Native",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageEntry {
    #[serde(default)]
    pub name: String,
    pub proficiency: Proficiency,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReferenceEntry {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub position: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl ResumeData {
    /// An empty document for `user_id` with a fresh id.
    pub fn empty(user_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            title: String::new(),
            job_title: String::new(),
            summary: String::new(),
            template: Template::default(),
            contact: Contact::default(),
            experience: vec![],
            education: vec![],
            skills: vec![],
            languages: vec![],
            references: vec![],
            created_at: now,
            updated_at: now,
            degraded: false,
        }
    }

    /// Refreshes `updated_at`. Called on every mutation before persisting.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Appends suggested skills that are not already present.
///
/// Comparison is case-insensitive on trimmed text. Order of both inputs is kept;
/// blank suggestions are dropped.
pub fn merge_skills(existing: &[String], suggested: &[String]) -> Vec<String> {
    let mut seen: std::collections::HashSet<String> =
        existing.iter().map(|s| s.trim().to_lowercase()).collect();
    let mut merged = existing.to_vec();

    for skill in suggested {
        let trimmed = skill.trim();
        if trimmed.is_empty() {
            continue;
        }
        if seen.insert(trimmed.to_lowercase()) {
            merged.push(trimmed.to_string());
        }
    }
    merged
}

/// Returns the trimmed value if it contains anything besides whitespace.
pub fn non_blank<S: AsRef<str> + ?Sized>(value: Option<&S>) -> Option<&str> {
    value.map(|v| v.as_ref().trim()).filter(|v| !v.is_empty())
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

// ────────────────────────────────────────────────────────────────────────────
// Storage row
// ────────────────────────────────────────────────────────────────────────────

/// One row of the `resumes` table. Collections live in the `body` JSONB column.
#[derive(Debug, Clone, FromRow)]
pub struct ResumeRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub job_title: String,
    pub summary: String,
    pub template: String,
    pub body: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The JSONB payload of a resume row.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResumeBody {
    #[serde(default)]
    pub contact: Contact,
    #[serde(default)]
    pub experience: Vec<ExperienceEntry>,
    #[serde(default)]
    pub education: Vec<EducationEntry>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub languages: Vec<LanguageEntry>,
    #[serde(default)]
    pub references: Vec<ReferenceEntry>,
}

impl ResumeRow {
    /// Converts a stored row into the domain document.
    ///
    /// Each body field is read on its own and unreadable entries are skipped,
    /// so one bad entry never hides the rest of the document. A row that lost
    /// entries comes back marked `degraded`.
    pub fn into_resume(self) -> ResumeData {
        let mut dropped = 0;
        let body = read_body(self.body, &mut dropped);
        if dropped > 0 {
            tracing::warn!(
                "Resume {} has {dropped} unreadable body entries, leaving them out",
                self.id
            );
        }

        ResumeData {
            id: self.id,
            user_id: self.user_id,
            title: self.title,
            job_title: self.job_title,
            summary: self.summary,
            template: Template::from_id(Some(&self.template)),
            contact: body.contact,
            experience: body.experience,
            education: body.education,
            skills: body.skills,
            languages: body.languages,
            references: body.references,
            created_at: self.created_at,
            updated_at: self.updated_at,
            degraded: dropped > 0,
        }
    }
}

fn read_body(body: Value, dropped: &mut usize) -> ResumeBody {
    let mut fields = match body {
        Value::Object(fields) => fields,
        Value::Null => Map::new(),
        _ => {
            *dropped += 1;
            Map::new()
        }
    };
    ResumeBody {
        contact: read_value(fields.remove("contact"), dropped).unwrap_or_default(),
        experience: read_list(fields.remove("experience"), dropped),
        education: read_list(fields.remove("education"), dropped),
        skills: read_list(fields.remove("skills"), dropped),
        languages: read_list(fields.remove("languages"), dropped),
        references: read_list(fields.remove("references"), dropped),
    }
}

/// Absent and null read as `None`; a value that fails to parse is counted.
fn read_value<T: DeserializeOwned>(value: Option<Value>, dropped: &mut usize) -> Option<T> {
    match value {
        None | Some(Value::Null) => None,
        Some(value) => match serde_json::from_value(value) {
            Ok(parsed) => Some(parsed),
            Err(_) => {
                *dropped += 1;
                None
            }
        },
    }
}

fn read_list<T: DeserializeOwned>(value: Option<Value>, dropped: &mut usize) -> Vec<T> {
    match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| read_value(Some(item), dropped))
            .collect(),
        Some(_) => {
            *dropped += 1;
            Vec::new()
        }
    }
}

impl From<&ResumeData> for ResumeBody {
    fn from(resume: &ResumeData) -> Self {
        ResumeBody {
            contact: resume.contact.clone(),
            experience: resume.experience.clone(),
            education: resume.education.clone(),
            skills: resume.skills.clone(),
            languages: resume.languages.clone(),
            references: resume.references.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_skills_dedups_case_insensitively() {
        let existing = vec!["Rust".to_string(), "SQL".to_string()];
        let suggested = vec![
            "rust".to_string(),
            " Kubernetes ".to_string(),
            "sql".to_string(),
            "".to_string(),
            "kubernetes".to_string(),
        ];
        let merged = merge_skills(&existing, &suggested);
        assert_eq!(merged, vec!["Rust", "SQL", "Kubernetes"]);
    }

    #[test]
    fn test_merge_skills_keeps_existing_duplicates() {
        // Existing data is never rewritten, only appended to.
        let existing = vec!["Go".to_string(), "Go".to_string()];
        let merged = merge_skills(&existing, &["Go".to_string()]);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_deserialize_tolerates_missing_and_null_fields() {
        let json = r#"{"title": "Jane Doe", "skills": null, "template": "gothic"}"#;
        let resume: ResumeData = serde_json::from_str(json).unwrap();
        assert_eq!(resume.title, "Jane Doe");
        assert!(resume.skills.is_empty());
        assert!(resume.experience.is_empty());
        assert_eq!(resume.template, Template::Professional);
    }

    #[test]
    fn test_deserialize_accepts_legacy_field_names() {
        let json = r#"{
            "experience": [{"company": "Acme", "title": "Engineer", "startDate": "2020-01-01"}],
            "education": [{"institution": "MIT", "degree": "BSc"}]
        }"#;
        let resume: ResumeData = serde_json::from_str(json).unwrap();
        assert_eq!(resume.experience[0].position, "Engineer");
        assert_eq!(resume.education[0].school, "MIT");
    }

    #[test]
    fn test_contact_blank_when_only_whitespace() {
        let contact = Contact {
            email: Some("  ".to_string()),
            phone: None,
            website: Some(String::new()),
            location: None,
        };
        assert!(contact.is_blank());
    }

    fn row(body: Value) -> ResumeRow {
        let now = Utc::now();
        ResumeRow {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            title: "T".to_string(),
            job_title: "J".to_string(),
            summary: "S".to_string(),
            template: "executive".to_string(),
            body,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_row_with_malformed_collection_keeps_other_fields() {
        let resume = row(serde_json::json!({
            "experience": "not a list",
            "skills": ["Rust"],
        }))
        .into_resume();
        assert!(resume.experience.is_empty());
        assert_eq!(resume.skills, vec!["Rust"]);
        assert_eq!(resume.template, Template::Executive);
        assert!(resume.degraded);
    }

    #[test]
    fn test_bad_entry_does_not_drop_valid_ones() {
        let resume = row(serde_json::json!({
            "experience": [{"company": "Acme", "position": "Engineer", "startDate": "2020-01-01"}],
            "skills": ["Rust"],
            "languages": [
                {"name": "French", "proficiency": "fluent"},
                {"name": "Portuguese", "proficiency": "Native"},
            ],
        }))
        .into_resume();
        assert_eq!(resume.experience.len(), 1);
        assert_eq!(resume.experience[0].company, "Acme");
        assert_eq!(resume.skills, vec!["Rust"]);
        assert_eq!(resume.languages.len(), 1);
        assert_eq!(resume.languages[0].name, "Portuguese");
        assert!(resume.degraded);
    }

    #[test]
    fn test_clean_row_is_not_degraded() {
        let resume = row(serde_json::json!({
            "contact": {"email": "jane@example.com"},
            "skills": ["Rust"],
            "references": null,
        }))
        .into_resume();
        assert_eq!(resume.contact.email.as_deref(), Some("jane@example.com"));
        assert!(resume.references.is_empty());
        assert!(!resume.degraded);
    }
}
