//! Durable blob storage and utility functions for task management.
//!
//! This module provides the `BlobStore` abstraction the task store persists
//! through, a file-backed and an in-memory implementation, along with
//! helpers for date parsing, formatting and table output.

use std::fs::{self, File};
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};

use crate::error::Result;
use crate::fields::*;
use crate::task::{resolve_category, Category, Task};

/// A single named entry holding the serialized task list.
pub trait BlobStore {
    /// Read the blob. `Ok(None)` means nothing has been written yet.
    fn read(&self) -> Result<Option<String>>;

    /// Replace the blob wholesale.
    fn write(&mut self, contents: &str) -> Result<()>;
}

/// Blob stored as a JSON file on disk.
#[derive(Debug, Clone)]
pub struct FileBlob {
    path: PathBuf,
}

impl FileBlob {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileBlob { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl BlobStore for FileBlob {
    fn read(&self) -> Result<Option<String>> {
        let mut buf = String::new();
        match File::open(&self.path) {
            Ok(mut f) => {
                f.read_to_string(&mut buf)?;
                Ok(Some(buf))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&mut self, contents: &str) -> Result<()> {
        // Atomic-ish write via temp + rename.
        let tmp = self.path.with_extension("json.tmp");
        let mut f = File::create(&tmp)?;
        f.write_all(contents.as_bytes())?;
        f.flush()?;
        fs::rename(tmp, &self.path)?;
        Ok(())
    }
}

/// Blob held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryBlob {
    pub contents: Option<String>,
}

impl MemoryBlob {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_contents(contents: impl Into<String>) -> Self {
        MemoryBlob {
            contents: Some(contents.into()),
        }
    }
}

impl BlobStore for MemoryBlob {
    fn read(&self) -> Result<Option<String>> {
        Ok(self.contents.clone())
    }

    fn write(&mut self, contents: &str) -> Result<()> {
        self.contents = Some(contents.to_string());
        Ok(())
    }
}

/// Serialize a task list into blob contents.
pub fn encode_tasks(tasks: &[Task]) -> Result<String> {
    Ok(serde_json::to_string_pretty(tasks)?)
}

/// Parse blob contents into a task list.
pub fn decode_tasks(contents: &str) -> Result<Vec<Task>> {
    Ok(serde_json::from_str(contents)?)
}

/// Parse human-readable due date input.
///
/// Supports:
/// - "today", "tomorrow", "yesterday"
/// - "monday", "next monday", "this friday", etc.
/// - "end of week", "end of month"
/// - "in 3d", "in 2w", "in 1m"
/// - "YYYY-MM-DD" format
pub fn parse_due_input(s: &str, today: NaiveDate) -> Option<NaiveDate> {
    let s = s.trim().to_lowercase();

    match s.as_str() {
        "today" => return Some(today),
        "tomorrow" => return today.succ_opt(),
        "yesterday" => return today.pred_opt(),
        "end of week" | "eow" => {
            let (_, end) = start_end_of_this_week(today);
            return Some(end);
        }
        "end of month" | "eom" => {
            let (year, month) = if today.month() == 12 {
                (today.year() + 1, 1)
            } else {
                (today.year(), today.month() + 1)
            };
            let first_of_next = NaiveDate::from_ymd_opt(year, month, 1)?;
            return Some(first_of_next - Duration::days(1));
        }
        _ => {}
    }

    if let Some(rest) = s.strip_prefix("in ") {
        let rest = rest.trim();
        if let Some((idx, _)) = rest.char_indices().last() {
            let (num, unit) = rest.split_at(idx);
            if let Ok(n) = num.trim().parse::<i64>() {
                // Offsets past the calendar's range are not dates.
                let offset = match unit {
                    "d" => Duration::try_days(n),
                    "w" => Duration::try_weeks(n),
                    // Approximate: 30 days per month
                    "m" => n.checked_mul(30).and_then(Duration::try_days),
                    _ => return None,
                };
                return offset.and_then(|delta| today.checked_add_signed(delta));
            }
        }
    }

    let weekdays = [
        ("monday", 0), ("tuesday", 1), ("wednesday", 2), ("thursday", 3),
        ("friday", 4), ("saturday", 5), ("sunday", 6),
        ("mon", 0), ("tue", 1), ("wed", 2), ("thu", 3),
        ("fri", 4), ("sat", 5), ("sun", 6),
    ];

    let (next_week, day_name) = match s.strip_prefix("next ") {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix("this ").unwrap_or(&s)),
    };
    if let Some(&(_, target)) = weekdays.iter().find(|(name, _)| *name == day_name) {
        let current = today.weekday().num_days_from_monday() as i64;
        let ahead = (target + 7 - current) % 7;
        let ahead = if next_week { ahead + 7 } else { ahead };
        return Some(today + Duration::days(ahead));
    }

    NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()
}

/// Calculate the start and end dates of the current ISO week (Monday to Sunday).
pub fn start_end_of_this_week(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let weekday = today.weekday().num_days_from_monday() as i64;
    let start = today - Duration::days(weekday);
    let end = start + Duration::days(6);
    (start, end)
}

/// Format a due date relative to today ("today", "tomorrow", "in 3d", "2d late").
pub fn format_due_relative(due: Option<NaiveDate>, today: NaiveDate) -> String {
    match due {
        None => "-".into(),
        Some(d) => {
            let delta = (d - today).num_days();
            if delta == 0 {
                "today".into()
            } else if delta == 1 {
                "tomorrow".into()
            } else if delta > 1 {
                format!("in {}d", delta)
            } else {
                format!("{}d late", -delta)
            }
        }
    }
}

/// Truncate a string to a maximum width, adding ellipsis if needed.
pub fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(width.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}

/// Print tasks in a formatted table.
pub fn print_table(tasks: &[&Task], categories: &[Category], now: DateTime<Utc>, today: NaiveDate) {
    println!(
        "{:<14} {:<8} {:<7} {:<11} {:<12} {}",
        "ID", "Status", "Pri", "Due", "Category", "Title"
    );
    for t in tasks {
        let category = resolve_category(categories, &t.category_id);
        let due = format_due_relative(t.due_date, today);
        let marker = if t.is_overdue(now) { " !" } else { "" };
        println!(
            "{:<14} {:<8} {:<7} {:<11} {:<12} {}{}",
            truncate(&t.id, 14),
            format_status(t.status),
            format_priority(t.priority),
            due,
            truncate(&category.name, 12),
            t.title,
            marker
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::seed_tasks;
    use chrono::Utc;
    use tempfile::TempDir;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_file_blob_missing_reads_none() {
        let dir = TempDir::new().unwrap();
        let blob = FileBlob::new(dir.path().join("tasks.json"));
        assert!(blob.read().unwrap().is_none());
    }

    #[test]
    fn test_file_blob_write_then_read() {
        let dir = TempDir::new().unwrap();
        let mut blob = FileBlob::new(dir.path().join("tasks.json"));
        blob.write("[]").unwrap();
        assert_eq!(blob.read().unwrap().as_deref(), Some("[]"));
        blob.write("[1]").unwrap();
        assert_eq!(blob.read().unwrap().as_deref(), Some("[1]"));
        assert!(!dir.path().join("tasks.json.tmp").exists());
    }

    #[test]
    fn test_encode_decode_tasks() {
        let tasks = seed_tasks(Utc::now());
        let decoded = decode_tasks(&encode_tasks(&tasks).unwrap()).unwrap();
        assert_eq!(decoded, tasks);
        assert!(decode_tasks("not json").is_err());
    }

    #[test]
    fn test_parse_due_input() {
        // 2024-05-15 is a Wednesday.
        let today = day(2024, 5, 15);
        assert_eq!(parse_due_input("today", today), Some(today));
        assert_eq!(parse_due_input("Tomorrow", today), Some(day(2024, 5, 16)));
        assert_eq!(parse_due_input("in 3d", today), Some(day(2024, 5, 18)));
        assert_eq!(parse_due_input("in 2w", today), Some(day(2024, 5, 29)));
        assert_eq!(parse_due_input("friday", today), Some(day(2024, 5, 17)));
        assert_eq!(parse_due_input("next friday", today), Some(day(2024, 5, 24)));
        assert_eq!(parse_due_input("wed", today), Some(today));
        assert_eq!(parse_due_input("eom", today), Some(day(2024, 5, 31)));
        assert_eq!(parse_due_input("eow", today), Some(day(2024, 5, 19)));
        assert_eq!(parse_due_input("2023-12-18", today), Some(day(2023, 12, 18)));
        assert_eq!(parse_due_input("someday", today), None);
        assert_eq!(parse_due_input("", today), None);
    }

    #[test]
    fn test_format_due_relative() {
        let today = day(2024, 5, 15);
        assert_eq!(format_due_relative(None, today), "-");
        assert_eq!(format_due_relative(Some(today), today), "today");
        assert_eq!(format_due_relative(Some(day(2024, 5, 16)), today), "tomorrow");
        assert_eq!(format_due_relative(Some(day(2024, 5, 20)), today), "in 5d");
        assert_eq!(format_due_relative(Some(day(2024, 5, 13)), today), "2d late");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a longer title", 6), "a lon…");
    }
}
