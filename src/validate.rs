//! Draft validation for task create and update submissions.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Serialize, Serializer};

use crate::db::parse_due_input;
use crate::fields::Priority;
use crate::task::DEFAULT_CATEGORY_ID;

pub const TITLE_REQUIRED: &str = "Title is required";
pub const DUE_DATE_REQUIRED: &str = "Due date is required";
pub const DUE_DATE_IN_PAST: &str = "Due date cannot be in the past";
pub const DUE_DATE_INVALID: &str = "Due date is not a valid date";

/// Form fields a draft carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Title,
    Description,
    DueDate,
    Priority,
    Category,
}

impl Field {
    /// The field's key in error mappings.
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Title => "title",
            Field::Description => "description",
            Field::DueDate => "dueDate",
            Field::Priority => "priority",
            Field::Category => "categoryId",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Field {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Field name to error message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<Field, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: Field, msg: impl Into<String>) {
        self.0.insert(field, msg.into());
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    /// Drop the error for a field, typically because its value changed.
    pub fn clear(&mut self, field: Field) {
        self.0.remove(&field);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        self.0.iter().map(|(f, m)| (*f, m.as_str()))
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.iter().map(|(field, msg)| format!("{field}: {msg}")).collect();
        f.write_str(&parts.join("; "))
    }
}

/// Unvalidated user input for a create or update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    /// Raw due-date text as typed.
    pub due_date: String,
    pub priority: Option<Priority>,
    pub category_id: Option<String>,
}

impl TaskDraft {
    pub fn new(title: impl Into<String>, due_date: impl Into<String>) -> Self {
        TaskDraft {
            title: title.into(),
            due_date: due_date.into(),
            ..Self::default()
        }
    }
}

/// A draft that passed validation. Only [`validate_draft`] builds one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidDraft {
    title: String,
    description: Option<String>,
    due_date: NaiveDate,
    priority: Priority,
    category_id: String,
}

impl ValidDraft {
    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn due_date(&self) -> NaiveDate {
        self.due_date
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn category_id(&self) -> &str {
        &self.category_id
    }
}

/// Check a draft against `today`.
///
/// Every failing field is reported; the draft is accepted only when none
/// fail.
pub fn validate_draft(draft: &TaskDraft, today: NaiveDate) -> Result<ValidDraft, FieldErrors> {
    let mut errors = FieldErrors::new();

    let title = draft.title.trim();
    if title.is_empty() {
        errors.insert(Field::Title, TITLE_REQUIRED);
    }

    let due_date = if draft.due_date.trim().is_empty() {
        errors.insert(Field::DueDate, DUE_DATE_REQUIRED);
        None
    } else {
        match parse_due_input(&draft.due_date, today) {
            Some(d) if d < today => {
                errors.insert(Field::DueDate, DUE_DATE_IN_PAST);
                None
            }
            Some(d) => Some(d),
            None => {
                errors.insert(Field::DueDate, DUE_DATE_INVALID);
                None
            }
        }
    };

    match due_date {
        Some(due_date) if errors.is_empty() => {
            let description = draft.description.trim();
            let category_id = draft
                .category_id
                .as_deref()
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .unwrap_or(DEFAULT_CATEGORY_ID);
            Ok(ValidDraft {
                title: title.to_string(),
                description: (!description.is_empty()).then(|| description.to_string()),
                due_date,
                priority: draft.priority.unwrap_or_default(),
                category_id: category_id.to_string(),
            })
        }
        _ => Err(errors),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 15).unwrap()
    }

    #[test]
    fn test_empty_draft_reports_both_required_fields() {
        let errors = validate_draft(&TaskDraft::new("", ""), today()).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors.get(Field::Title), Some(TITLE_REQUIRED));
        assert_eq!(errors.get(Field::DueDate), Some(DUE_DATE_REQUIRED));
    }

    #[test]
    fn test_whitespace_title_is_empty() {
        let errors = validate_draft(&TaskDraft::new("   ", "2024-06-01"), today()).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.get(Field::Title), Some(TITLE_REQUIRED));
    }

    #[test]
    fn test_past_due_date_only_error() {
        let errors = validate_draft(&TaskDraft::new("Buy milk", "2020-01-01"), today()).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.get(Field::DueDate), Some(DUE_DATE_IN_PAST));
        assert_eq!(errors.get(Field::Title), None);
    }

    #[test]
    fn test_today_is_not_past() {
        let valid = validate_draft(&TaskDraft::new("Today", "2024-05-15"), today()).unwrap();
        assert_eq!(valid.due_date(), today());
    }

    #[test]
    fn test_unparseable_due_date() {
        let errors = validate_draft(&TaskDraft::new("Soon", "whenever"), today()).unwrap_err();
        assert_eq!(errors.get(Field::DueDate), Some(DUE_DATE_INVALID));
    }

    #[test]
    fn test_out_of_range_offset_is_invalid() {
        for due in ["in 999999999d", "in 9223372036854775807w", "in 400000000m"] {
            let errors = validate_draft(&TaskDraft::new("Someday", due), today()).unwrap_err();
            assert_eq!(errors.get(Field::DueDate), Some(DUE_DATE_INVALID), "{due}");
        }
        let valid = validate_draft(&TaskDraft::new("Soon", "in 2w"), today()).unwrap();
        assert_eq!(valid.due_date(), NaiveDate::from_ymd_opt(2024, 5, 29).unwrap());
    }

    #[test]
    fn test_defaults_applied() {
        let mut draft = TaskDraft::new("  Write report  ", "tomorrow");
        draft.description = "   ".into();
        let valid = validate_draft(&draft, today()).unwrap();
        assert_eq!(valid.title(), "Write report");
        assert_eq!(valid.description(), None);
        assert_eq!(valid.priority(), Priority::Medium);
        assert_eq!(valid.category_id(), DEFAULT_CATEGORY_ID);
        assert_eq!(valid.due_date(), NaiveDate::from_ymd_opt(2024, 5, 16).unwrap());
    }

    #[test]
    fn test_errors_keyed_by_field_name() {
        let errors = validate_draft(&TaskDraft::new("", ""), today()).unwrap_err();
        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(json["title"], TITLE_REQUIRED);
        assert_eq!(json["dueDate"], DUE_DATE_REQUIRED);
    }

    #[test]
    fn test_clear_field_error() {
        let mut errors = validate_draft(&TaskDraft::new("", ""), today()).unwrap_err();
        errors.clear(Field::Title);
        assert_eq!(errors.get(Field::Title), None);
        assert_eq!(errors.len(), 1);
    }
}
