//! Summary counts over the full task list.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::fields::Status;
use crate::task::Task;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TaskStats {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
    pub overdue: usize,
}

impl TaskStats {
    /// Count tasks by status, and overdue tasks as of `now`.
    pub fn compute(tasks: &[Task], now: DateTime<Utc>) -> Self {
        tasks.iter().fold(TaskStats::default(), |mut s, t| {
            s.total += 1;
            match t.status {
                Status::Completed => s.completed += 1,
                Status::Pending => s.pending += 1,
            }
            if t.is_overdue(now) {
                s.overdue += 1;
            }
            s
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::seed_tasks;
    use chrono::NaiveDate;

    fn noon(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(12, 0, 0).unwrap().and_utc()
    }

    #[test]
    fn test_empty_list() {
        assert_eq!(TaskStats::compute(&[], noon(2024, 1, 1)), TaskStats::default());
    }

    #[test]
    fn test_seed_counts() {
        let tasks = seed_tasks(Utc::now());

        let s = TaskStats::compute(&tasks, noon(2023, 12, 1));
        assert_eq!((s.total, s.completed, s.pending, s.overdue), (3, 1, 2, 0));

        // Between the two pending due dates only "Buy groceries" is late.
        assert_eq!(TaskStats::compute(&tasks, noon(2023, 12, 20)).overdue, 1);

        // The completed run never counts as overdue.
        assert_eq!(TaskStats::compute(&tasks, noon(2024, 1, 1)).overdue, 2);
    }

    #[test]
    fn test_due_today_counts_once_the_day_starts() {
        let tasks = seed_tasks(Utc::now());
        // "Buy groceries" is due 2023-12-18.
        let start_of_day = NaiveDate::from_ymd_opt(2023, 12, 18).unwrap().and_hms_opt(0, 0, 0).unwrap().and_utc();
        assert_eq!(TaskStats::compute(&tasks, start_of_day).overdue, 0);
        assert_eq!(TaskStats::compute(&tasks, noon(2023, 12, 18)).overdue, 1);
    }
}
