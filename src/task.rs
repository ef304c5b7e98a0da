//! Task data structure and related functionality.
//!
//! This module defines the `Task` record held by the store, the fixed set of
//! `Category` labels tasks point at, and the seed tasks used when no durable
//! blob exists yet.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::fields::*;

/// Category assigned to tasks when the caller does not pick one.
pub const DEFAULT_CATEGORY_ID: &str = "1";

/// A to-do item.
///
/// The JSON shape uses camelCase keys. Every field has a default so that
/// blobs written by older builds, or with keys missing, still load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(deserialize_with = "lenient_date")]
    pub due_date: Option<NaiveDate>,
    pub priority: Priority,
    pub status: Status,
    pub category_id: String,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for Task {
    fn default() -> Self {
        Task {
            id: String::new(),
            title: String::new(),
            description: None,
            due_date: None,
            priority: Priority::default(),
            status: Status::default(),
            category_id: DEFAULT_CATEGORY_ID.to_string(),
            created_at: DateTime::<Utc>::default(),
            completed_at: None,
            updated_at: None,
        }
    }
}

impl Task {
    pub fn is_completed(&self) -> bool {
        self.status == Status::Completed
    }

    /// The instant a due date falls due: midnight UTC at the start of that day.
    pub fn due_at(&self) -> Option<DateTime<Utc>> {
        self.due_date.map(|d| d.and_time(NaiveTime::MIN).and_utc())
    }

    /// Not completed and past its due instant as of `now`.
    /// A task due today turns overdue once that day has begun.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        !self.is_completed() && self.due_at().is_some_and(|due| due < now)
    }

    /// Restore the completion-timestamp invariant on a record read from disk.
    /// Returns true if the record had to be changed.
    pub fn repair_completion(&mut self) -> bool {
        match (self.status, self.completed_at) {
            (Status::Completed, None) => {
                self.completed_at = Some(self.updated_at.unwrap_or(self.created_at));
                true
            }
            (Status::Pending, Some(_)) => {
                self.completed_at = None;
                true
            }
            _ => false,
        }
    }
}

/// Accept `YYYY-MM-DD`, a full RFC 3339 timestamp, an empty string or null.
/// Anything unparseable becomes `None` rather than failing the whole blob.
fn lenient_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|s| {
        let s = s.trim();
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .ok()
            .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive()))
    }))
}

/// A fixed label and colour grouping tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub color: String,
}

impl Category {
    fn new(id: &str, name: &str, color: &str) -> Self {
        Category {
            id: id.to_string(),
            name: name.to_string(),
            color: color.to_string(),
        }
    }

    /// Placeholder shown for a task whose category id matches nothing.
    pub fn uncategorized() -> Self {
        Category::new("", "Uncategorized", "#94a3b8")
    }
}

/// The built-in category set.
pub fn default_categories() -> Vec<Category> {
    vec![
        Category::new("1", "Personal", "#6366f1"),
        Category::new("2", "Work", "#14b8a6"),
        Category::new("3", "Health", "#f43f5e"),
        Category::new("4", "Learning", "#f59e0b"),
    ]
}

/// Look up a category by id.
///
/// Category references are not enforced when tasks are written, so a
/// dangling id is expected and resolves to the "Uncategorized" placeholder.
pub fn resolve_category(categories: &[Category], id: &str) -> Category {
    categories
        .iter()
        .find(|c| c.id == id)
        .cloned()
        .unwrap_or_else(Category::uncategorized)
}

/// The three example tasks a fresh store starts with.
pub fn seed_tasks(now: DateTime<Utc>) -> Vec<Task> {
    let date = |y, m, d| NaiveDate::from_ymd_opt(y, m, d);
    vec![
        Task {
            id: "1".into(),
            title: "Complete project proposal".into(),
            description: Some("Finish the draft and send for review".into()),
            due_date: date(2023, 12, 25),
            priority: Priority::High,
            status: Status::Pending,
            category_id: "2".into(),
            created_at: now,
            completed_at: None,
            updated_at: None,
        },
        Task {
            id: "2".into(),
            title: "Go for a 30-minute run".into(),
            description: Some("Morning jog in the park".into()),
            due_date: date(2023, 12, 20),
            priority: Priority::Medium,
            status: Status::Completed,
            category_id: "3".into(),
            created_at: now,
            completed_at: Some(now),
            updated_at: None,
        },
        Task {
            id: "3".into(),
            title: "Buy groceries".into(),
            description: Some("Milk, eggs, bread, and vegetables".into()),
            due_date: date(2023, 12, 18),
            priority: Priority::Low,
            status: Status::Pending,
            category_id: "1".into(),
            created_at: now,
            completed_at: None,
            updated_at: None,
        },
    ]
}
