//! The local task store.
//!
//! `TaskStore` owns the session's task list. It is seeded from a
//! [`BlobStore`] when opened and writes the whole list back after every
//! mutation, recomputing [`TaskStats`] at the same time.
//!
//! Persistence is best effort: a failed read falls back to the seed set and
//! a failed write is logged, never returned to the caller. There is no
//! conflict detection, so two sessions sharing a blob overwrite each other
//! and the last writer wins.

use tracing::{debug, error, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::db::{decode_tasks, encode_tasks, BlobStore};
use crate::error::{Result, TaskFlowError};
use crate::fields::Status;
use crate::stats::TaskStats;
use crate::task::{seed_tasks, Task};
use crate::validate::{validate_draft, TaskDraft, ValidDraft};
use crate::view::{filter_and_sort, Selector};

/// In-memory task list mirrored to a durable blob.
pub struct TaskStore<B: BlobStore, C: Clock = SystemClock> {
    tasks: Vec<Task>,
    blob: B,
    clock: C,
    stats: TaskStats,
    /// Set while the blob lags behind `tasks` after a failed write.
    dirty: bool,
}

impl<B: BlobStore> TaskStore<B, SystemClock> {
    /// Open a store on `blob` using wall-clock time.
    pub fn open(blob: B) -> Self {
        Self::open_with_clock(blob, SystemClock)
    }
}

impl<B: BlobStore, C: Clock> TaskStore<B, C> {
    /// Open a store on `blob`, reading the current task list from it.
    ///
    /// A missing, unreadable or unparseable blob yields the seed tasks,
    /// which are written back immediately.
    pub fn open_with_clock(blob: B, clock: C) -> Self {
        let loaded = match blob.read() {
            Ok(Some(contents)) => match decode_tasks(&contents) {
                Ok(tasks) => Some(tasks),
                Err(e) => {
                    warn!("Error parsing task blob, starting from seed tasks: {e}");
                    None
                }
            },
            Ok(None) => {
                info!("No task blob found, starting from seed tasks");
                None
            }
            Err(e) => {
                warn!("Error reading task blob, starting from seed tasks: {e}");
                None
            }
        };

        let mut store = TaskStore {
            tasks: Vec::new(),
            blob,
            clock,
            stats: TaskStats::default(),
            dirty: false,
        };

        match loaded {
            Some(mut tasks) => {
                for t in tasks.iter_mut() {
                    if t.repair_completion() {
                        warn!(id = %t.id, "Repaired completion timestamp on loaded task");
                    }
                }
                info!(count = tasks.len(), "Loaded tasks");
                store.tasks = tasks;
                store.refresh_stats();
            }
            None => {
                store.tasks = seed_tasks(store.clock.now());
                store.persist();
            }
        }
        store
    }

    /// Hand back the blob, retrying the write first if the last one failed.
    pub fn close(mut self) -> B {
        if self.dirty {
            self.persist();
        }
        self.blob
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == id)
    }

    /// Counts as of the last load or mutation.
    pub fn stats(&self) -> TaskStats {
        self.stats
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// The display list for `selector`, derived fresh on every call.
    pub fn view(&self, selector: &Selector) -> Vec<&Task> {
        filter_and_sort(&self.tasks, selector, self.clock.now())
    }

    /// Generate the next available task ID.
    fn next_id(&self) -> String {
        let max = self
            .tasks
            .iter()
            .filter_map(|t| t.id.parse::<u64>().ok())
            .max()
            .unwrap_or(0);
        if let Some(next) = max.checked_add(1) {
            return next.to_string();
        }
        // Counter exhausted: take the lowest free number instead.
        let mut n: u64 = 1;
        while self.get(&n.to_string()).is_some() {
            n += 1;
        }
        n.to_string()
    }

    /// Append a new pending task built from `draft`.
    pub fn create(&mut self, draft: ValidDraft) -> Task {
        let task = Task {
            id: self.next_id(),
            title: draft.title().to_string(),
            description: draft.description().map(str::to_string),
            due_date: Some(draft.due_date()),
            priority: draft.priority(),
            status: Status::Pending,
            category_id: draft.category_id().to_string(),
            created_at: self.clock.now(),
            completed_at: None,
            updated_at: None,
        };
        debug!(id = %task.id, title = %task.title, "Created task");
        self.tasks.push(task.clone());
        self.persist();
        task
    }

    /// Overwrite the editable fields of task `id`. Status is left alone.
    pub fn update(&mut self, id: &str, draft: ValidDraft) -> Result<Task> {
        let now = self.clock.now();
        let task = self.get_mut(id).ok_or_else(|| TaskFlowError::not_found(id))?;
        task.title = draft.title().to_string();
        task.description = draft.description().map(str::to_string);
        task.due_date = Some(draft.due_date());
        task.priority = draft.priority();
        task.category_id = draft.category_id().to_string();
        task.updated_at = Some(now);
        let updated = task.clone();
        debug!(id, "Updated task");
        self.persist();
        Ok(updated)
    }

    /// Flip task `id` between pending and completed.
    pub fn toggle_status(&mut self, id: &str) -> Result<Task> {
        let now = self.clock.now();
        let task = self.get_mut(id).ok_or_else(|| TaskFlowError::not_found(id))?;
        task.status = task.status.toggled();
        task.completed_at = match task.status {
            Status::Completed => Some(now),
            Status::Pending => None,
        };
        let toggled = task.clone();
        debug!(id, status = toggled.status.as_str(), "Toggled task");
        self.persist();
        Ok(toggled)
    }

    /// Remove task `id`. Returns false, and changes nothing, if it is absent.
    pub fn delete(&mut self, id: &str) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        if self.tasks.len() == before {
            debug!(id, "Delete of unknown task ignored");
            return false;
        }
        debug!(id, "Deleted task");
        self.persist();
        true
    }

    /// Validate a raw draft and apply it.
    ///
    /// With no `edit_target` the draft creates a task; otherwise it updates
    /// the target. A rejected draft returns every field error and leaves the
    /// store untouched.
    pub fn submit(&mut self, draft: &TaskDraft, edit_target: Option<&str>) -> Result<Task> {
        let valid = validate_draft(draft, self.clock.today()).map_err(TaskFlowError::Validation)?;
        match edit_target {
            Some(id) => self.update(id, valid),
            None => Ok(self.create(valid)),
        }
    }

    fn refresh_stats(&mut self) {
        self.stats = TaskStats::compute(&self.tasks, self.clock.now());
    }

    /// Write the full list to the blob and recompute stats.
    fn persist(&mut self) {
        self.refresh_stats();
        let result = encode_tasks(&self.tasks).and_then(|contents| self.blob.write(&contents));
        self.dirty = result.is_err();
        if let Err(e) = result {
            let e = TaskFlowError::Persistence(e.to_string());
            error!("Failed to save tasks: {e}");
        }
    }
}
