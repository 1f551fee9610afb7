use serde::Serialize;
use thiserror::Error;

use crate::models::resume::{non_blank, ResumeData};
use crate::render::dates::parse_date;

/// One rejected field. `field` is a JSON path such as `experience[0].company`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteKind {
    /// New documents need at least one experience, education and skill entry.
    Create,
    Update,
}

/// Checks a document before it is written. Rendering never depends on this;
/// it only keeps obviously broken documents out of storage.
pub fn validate_resume(resume: &ResumeData, kind: WriteKind) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    for (field, value) in [
        ("title", &resume.title),
        ("jobTitle", &resume.job_title),
        ("summary", &resume.summary),
    ] {
        if non_blank(Some(value)).is_none() {
            errors.push(ValidationError::new(field, "is required"));
        }
    }

    if kind == WriteKind::Create {
        if resume.experience.is_empty() {
            errors.push(ValidationError::new(
                "experience",
                "at least one experience entry is required",
            ));
        }
        if resume.education.is_empty() {
            errors.push(ValidationError::new(
                "education",
                "at least one education entry is required",
            ));
        }
        if resume.skills.iter().all(|s| non_blank(Some(s)).is_none()) {
            errors.push(ValidationError::new("skills", "at least one skill is required"));
        }
    }

    for (i, entry) in resume.experience.iter().enumerate() {
        let at = |name: &str| format!("experience[{i}].{name}");
        require(&mut errors, at("company"), &entry.company);
        require(&mut errors, at("position"), &entry.position);
        require(&mut errors, at("description"), &entry.description);
        require_date(&mut errors, at("startDate"), entry.start_date.as_deref(), true);
        require_date(&mut errors, at("endDate"), entry.end_date.as_deref(), false);
    }

    for (i, entry) in resume.education.iter().enumerate() {
        let at = |name: &str| format!("education[{i}].{name}");
        require(&mut errors, at("school"), &entry.school);
        require(&mut errors, at("degree"), &entry.degree);
        require(&mut errors, at("field"), &entry.field);
        require_date(
            &mut errors,
            at("graduationDate"),
            entry.graduation_date.as_deref(),
            true,
        );
    }

    for (i, entry) in resume.languages.iter().enumerate() {
        require(&mut errors, format!("languages[{i}].name"), &entry.name);
    }

    for (i, entry) in resume.references.iter().enumerate() {
        let at = |name: &str| format!("references[{i}].{name}");
        require(&mut errors, at("name"), &entry.name);
        require(&mut errors, at("position"), &entry.position);
        require(&mut errors, at("company"), &entry.company);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Joins errors into a single client-facing message.
pub fn describe(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ValidationError::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

fn require(errors: &mut Vec<ValidationError>, field: String, value: &str) {
    if non_blank(Some(value)).is_none() {
        errors.push(ValidationError::new(field, "is required"));
    }
}

fn require_date(
    errors: &mut Vec<ValidationError>,
    field: String,
    value: Option<&str>,
    mandatory: bool,
) {
    match non_blank(value) {
        None if mandatory => errors.push(ValidationError::new(field, "is required")),
        None => {}
        Some(raw) if parse_date(raw).is_none() => {
            errors.push(ValidationError::new(field, format!("'{raw}' is not a valid date")))
        }
        Some(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::tests::sample_resume;
    use uuid::Uuid;

    #[test]
    fn test_complete_resume_passes() {
        let mut resume = sample_resume();
        resume.experience[1].end_date = Some("2019-12".to_string());
        assert_eq!(validate_resume(&resume, WriteKind::Create), Ok(()));
    }

    #[test]
    fn test_empty_resume_reports_every_missing_part() {
        let errors = validate_resume(&ResumeData::empty(Uuid::new_v4()), WriteKind::Create)
            .unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            vec!["title", "jobTitle", "summary", "experience", "education", "skills"]
        );
    }

    #[test]
    fn test_update_allows_empty_collections() {
        let mut resume = sample_resume();
        resume.experience.clear();
        resume.education.clear();
        resume.skills.clear();
        assert_eq!(validate_resume(&resume, WriteKind::Update), Ok(()));
    }

    #[test]
    fn test_malformed_dates_are_rejected() {
        let resume = sample_resume();
        // The sample carries an unparseable end date.
        let errors = validate_resume(&resume, WriteKind::Update).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "experience[1].endDate");
        assert!(describe(&errors).contains("garbage"));
    }

    #[test]
    fn test_entry_fields_are_required() {
        let mut resume = sample_resume();
        resume.experience[1].end_date = None;
        resume.education[0].school = "  ".to_string();
        resume.experience[0].start_date = None;
        let errors = validate_resume(&resume, WriteKind::Update).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["experience[0].startDate", "education[0].school"]);
    }
}
