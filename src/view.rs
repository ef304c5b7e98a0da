//! Filtered, sorted display list derived from the task store.

use std::cmp::Ordering;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};

use crate::fields::Status;
use crate::task::{resolve_category, Category, Task};

/// Which tasks a view shows.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selector {
    #[default]
    All,
    Completed,
    Pending,
    Overdue,
    /// Exact match on a category id.
    Category(String),
}

impl Selector {
    pub fn matches(&self, task: &Task, now: DateTime<Utc>) -> bool {
        match self {
            Selector::All => true,
            Selector::Completed => task.status == Status::Completed,
            Selector::Pending => task.status == Status::Pending,
            Selector::Overdue => task.is_overdue(now),
            Selector::Category(id) => task.category_id == *id,
        }
    }

    /// Heading for a view, e.g. "Overdue Tasks" or "Work Tasks".
    pub fn heading(&self, categories: &[Category]) -> String {
        match self {
            Selector::All => "All Tasks".into(),
            Selector::Completed => "Completed Tasks".into(),
            Selector::Pending => "Pending Tasks".into(),
            Selector::Overdue => "Overdue Tasks".into(),
            Selector::Category(id) => format!("{} Tasks", resolve_category(categories, id).name),
        }
    }

    /// Sidebar entries: the status selectors followed by one per category.
    pub fn sidebar(categories: &[Category]) -> Vec<Selector> {
        let mut out = vec![Selector::All, Selector::Pending, Selector::Completed, Selector::Overdue];
        out.extend(categories.iter().map(|c| Selector::Category(c.id.clone())));
        out
    }
}

impl FromStr for Selector {
    type Err = Infallible;

    /// Keywords map to status selectors; anything else is a category id.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim() {
            "all" => Selector::All,
            "completed" => Selector::Completed,
            "pending" => Selector::Pending,
            "overdue" => Selector::Overdue,
            other => Selector::Category(other.to_string()),
        })
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::All => f.write_str("all"),
            Selector::Completed => f.write_str("completed"),
            Selector::Pending => f.write_str("pending"),
            Selector::Overdue => f.write_str("overdue"),
            Selector::Category(id) => f.write_str(id),
        }
    }
}

/// Display ordering: pending before completed, then earliest due date.
/// Tasks without a due date sort last within their group.
pub fn display_order(a: &Task, b: &Task) -> Ordering {
    let rank = |t: &Task| match t.status {
        Status::Pending => 0,
        Status::Completed => 1,
    };
    rank(a)
        .cmp(&rank(b))
        .then_with(|| a.due_date.unwrap_or(NaiveDate::MAX).cmp(&b.due_date.unwrap_or(NaiveDate::MAX)))
}

/// Filter `tasks` by `selector` and sort for display.
///
/// The sort is stable, so equal keys keep insertion order.
pub fn filter_and_sort<'a>(tasks: &'a [Task], selector: &Selector, now: DateTime<Utc>) -> Vec<&'a Task> {
    let mut out: Vec<&Task> = tasks.iter().filter(|t| selector.matches(t, now)).collect();
    out.sort_by(|a, b| display_order(a, b));
    out
}
