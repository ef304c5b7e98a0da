//! Client-side state for one hosted table.
//!
//! A slice holds the rows fetched so far, the state of the last request and
//! the row currently open for detail. Every operation goes through
//! `Loading`, then lands on `Succeeded` or `Failed` with the service's
//! message (or a default one) kept in `error`.

use tracing::{debug, error};

use super::schema::{task_fields, RemoteEntity, RemoteTask, RemoteTaskStatus, ID};
use super::{Condition, FetchOptions, RecordService};
use crate::error::{Result, TaskFlowError};
use crate::fields::{format_priority, Priority};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoadStatus {
    #[default]
    Idle,
    Loading,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone)]
pub struct RemoteSlice<T: RemoteEntity> {
    pub items: Vec<T>,
    pub status: LoadStatus,
    pub error: Option<String>,
    pub current: Option<T>,
    /// Rows from the last filtered fetch; empty when no filter is applied.
    pub filtered: Vec<T>,
}

impl<T: RemoteEntity> Default for RemoteSlice<T> {
    fn default() -> Self {
        RemoteSlice {
            items: Vec::new(),
            status: LoadStatus::Idle,
            error: None,
            current: None,
            filtered: Vec::new(),
        }
    }
}

impl<T: RemoteEntity> RemoteSlice<T> {
    pub fn new() -> Self {
        Self::default()
    }

    fn begin(&mut self) {
        self.status = LoadStatus::Loading;
        self.error = None;
    }

    fn succeed(&mut self) {
        self.status = LoadStatus::Succeeded;
    }

    /// Record a failure. Service messages win over the default.
    fn fail<R>(&mut self, err: TaskFlowError, fallback: &str) -> Result<R> {
        let message = match &err {
            TaskFlowError::Remote(msg) if !msg.is_empty() => msg.clone(),
            TaskFlowError::Remote(_) => fallback.to_string(),
            other => format!("{fallback}: {other}"),
        };
        error!(table = T::TABLE, "{message}");
        self.status = LoadStatus::Failed;
        self.error = Some(message.clone());
        Err(TaskFlowError::Remote(message))
    }

    fn required_id(item: &T) -> Result<i64> {
        item.remote_id()
            .ok_or_else(|| TaskFlowError::remote(format!("Cannot modify {} without an id", T::NOUN)))
    }

    fn decode(rows: Vec<super::Record>) -> Result<Vec<T>> {
        rows.into_iter().map(T::from_record).collect()
    }

    /// Replace `items` with every row of the table and drop any filter result.
    pub fn fetch_all(&mut self, service: &impl RecordService) -> Result<&[T]> {
        self.begin();
        let fetched = service
            .fetch_records(T::TABLE, &FetchOptions::with_fields(T::FIELDS))
            .and_then(Self::decode);
        match fetched {
            Ok(items) => {
                debug!(table = T::TABLE, count = items.len(), "Fetched rows");
                self.items = items;
                self.filtered.clear();
                self.succeed();
                Ok(&self.items)
            }
            Err(e) => self.fail(e, &format!("Failed to fetch {}s", T::NOUN)),
        }
    }

    /// Load one row into `current`.
    pub fn fetch_by_id(&mut self, service: &impl RecordService, id: i64) -> Result<&T> {
        self.begin();
        let options = FetchOptions::with_fields(T::FIELDS).and(Condition::equal(ID, id));
        let fetched = service
            .fetch_records(T::TABLE, &options)
            .and_then(Self::decode)
            .and_then(|rows| {
                rows.into_iter()
                    .next()
                    .ok_or_else(|| TaskFlowError::remote(T::NOT_FOUND))
            });
        match fetched {
            Ok(row) => {
                self.succeed();
                Ok(&*self.current.insert(row))
            }
            Err(e) => self.fail(e, &format!("Failed to fetch {}", T::NOUN)),
        }
    }

    /// Create a row and put the stored version at the front of `items`.
    pub fn create(&mut self, service: &mut impl RecordService, item: &T) -> Result<T> {
        self.begin();
        let created = item
            .writable_record()
            .and_then(|record| service.create_record(T::TABLE, record))
            .and_then(T::from_record);
        match created {
            Ok(row) => {
                debug!(table = T::TABLE, id = ?row.remote_id(), "Created row");
                self.items.insert(0, row.clone());
                self.succeed();
                Ok(row)
            }
            Err(e) => self.fail(e, &format!("Failed to create {}", T::NOUN)),
        }
    }

    /// Save `item` and swap the stored version into `items`, `filtered` and `current`.
    pub fn update(&mut self, service: &mut impl RecordService, item: &T) -> Result<T> {
        self.begin();
        let updated = Self::required_id(item).and_then(|id| {
            let record = item.writable_record()?;
            T::from_record(service.update_record(T::TABLE, id, record)?)
        });
        match updated {
            Ok(row) => {
                let id = row.remote_id();
                for slot in self.items.iter_mut().chain(self.filtered.iter_mut()) {
                    if slot.remote_id() == id {
                        *slot = row.clone();
                    }
                }
                if self.current.as_ref().is_some_and(|c| c.remote_id() == id) {
                    self.current = Some(row.clone());
                }
                debug!(table = T::TABLE, ?id, "Updated row");
                self.succeed();
                Ok(row)
            }
            Err(e) => self.fail(e, &format!("Failed to update {}", T::NOUN)),
        }
    }

    /// Delete row `id`, dropping it from `items` and clearing `current`.
    pub fn delete(&mut self, service: &mut impl RecordService, id: i64) -> Result<()> {
        self.begin();
        match service.delete_record(T::TABLE, id) {
            Ok(()) => {
                self.items.retain(|t| t.remote_id() != Some(id));
                self.filtered.retain(|t| t.remote_id() != Some(id));
                if self.current.as_ref().is_some_and(|c| c.remote_id() == Some(id)) {
                    self.current = None;
                }
                debug!(table = T::TABLE, id, "Deleted row");
                self.succeed();
                Ok(())
            }
            Err(e) => self.fail(e, &format!("Failed to delete {}", T::NOUN)),
        }
    }
}

/// Narrowing for a filtered task fetch. Empty criteria match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskCriteria {
    pub status: Option<RemoteTaskStatus>,
    pub priority: Option<Priority>,
    pub search_term: String,
}

impl TaskCriteria {
    fn options(&self) -> FetchOptions {
        let mut options = FetchOptions::with_fields(RemoteTask::FIELDS);
        if let Some(status) = self.status {
            options = options.and(Condition::equal(task_fields::STATUS, status.label()));
        }
        if let Some(priority) = self.priority {
            options = options.and(Condition::equal(task_fields::PRIORITY, format_priority(priority)));
        }
        let term = self.search_term.trim();
        if !term.is_empty() {
            options = options.and(Condition::contains(task_fields::TITLE, term));
        }
        options
    }
}

impl RemoteSlice<RemoteTask> {
    /// Fetch rows matching `criteria` into `filtered`. `items` is untouched.
    pub fn fetch_filtered(&mut self, service: &impl RecordService, criteria: &TaskCriteria) -> Result<&[RemoteTask]> {
        self.begin();
        let fetched = service
            .fetch_records(RemoteTask::TABLE, &criteria.options())
            .and_then(Self::decode);
        match fetched {
            Ok(rows) => {
                debug!(count = rows.len(), ?criteria, "Fetched filtered tasks");
                self.filtered = rows;
                self.succeed();
                Ok(&self.filtered)
            }
            Err(e) => self.fail(e, "Failed to fetch filtered tasks"),
        }
    }

    /// The filtered rows if a filter result is held, otherwise every row.
    pub fn visible(&self) -> &[RemoteTask] {
        if self.filtered.is_empty() {
            &self.items
        } else {
            &self.filtered
        }
    }

    pub fn clear_filter(&mut self) {
        self.filtered.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::schema::{ProjectStatus, RemoteProject};
    use crate::remote::InMemoryRecordService;

    fn remote_task(title: &str, status: RemoteTaskStatus, priority: Priority) -> RemoteTask {
        RemoteTask {
            id: None,
            name: title.to_string(),
            local_id: None,
            title: title.to_string(),
            description: None,
            status,
            priority,
            due_date: None,
            assignee: None,
            tags: vec!["Backend".to_string()],
            category: None,
            created_on: None,
            modified_on: None,
        }
    }

    fn loaded() -> (InMemoryRecordService, RemoteSlice<RemoteTask>) {
        let mut svc = InMemoryRecordService::new();
        let mut slice = RemoteSlice::new();
        slice
            .create(&mut svc, &remote_task("Design schema", RemoteTaskStatus::Completed, Priority::High))
            .unwrap();
        slice
            .create(&mut svc, &remote_task("Write API docs", RemoteTaskStatus::Todo, Priority::Low))
            .unwrap();
        slice
            .create(&mut svc, &remote_task("Review API", RemoteTaskStatus::InProgress, Priority::High))
            .unwrap();
        (svc, slice)
    }

    fn titles(rows: &[RemoteTask]) -> Vec<&str> {
        rows.iter().map(|t| t.title.as_str()).collect()
    }

    #[test]
    fn test_create_prepends_and_fetch_all() {
        let (svc, mut slice) = loaded();
        assert_eq!(titles(&slice.items), ["Review API", "Write API docs", "Design schema"]);
        assert_eq!(slice.status, LoadStatus::Succeeded);

        slice.items.clear();
        let fetched = slice.fetch_all(&svc).unwrap();
        assert_eq!(fetched.len(), 3);
        assert!(fetched.iter().all(|t| t.id.is_some() && t.created_on.is_some()));
        assert_eq!(fetched[0].tags, ["Backend"]);
    }

    #[test]
    fn test_fetch_by_id_and_not_found() {
        let (svc, mut slice) = loaded();
        let id = slice.items[1].id.unwrap();
        assert_eq!(slice.fetch_by_id(&svc, id).unwrap().title, "Write API docs");
        assert_eq!(slice.current.as_ref().map(|t| t.title.as_str()), Some("Write API docs"));

        let err = slice.fetch_by_id(&svc, 404).unwrap_err();
        assert_eq!(err.to_string(), "Task not found");
        assert_eq!(slice.status, LoadStatus::Failed);
        assert_eq!(slice.error.as_deref(), Some("Task not found"));

        let mut svc = svc;
        svc.fail_with(Some(""));
        slice.fetch_by_id(&svc, id).unwrap_err();
        assert_eq!(slice.error.as_deref(), Some("Failed to fetch task"));
        slice.delete(&mut svc, id).unwrap_err();
        assert_eq!(slice.error.as_deref(), Some("Failed to delete task"));
    }

    #[test]
    fn test_update_replaces_item_and_current() {
        let (mut svc, mut slice) = loaded();
        let id = slice.items[0].id.unwrap();
        slice.fetch_by_id(&svc, id).unwrap();

        let mut edited = slice.items[0].clone();
        edited.status = RemoteTaskStatus::Completed;
        slice.update(&mut svc, &edited).unwrap();

        assert_eq!(slice.items[0].status, RemoteTaskStatus::Completed);
        assert_eq!(slice.current.as_ref().unwrap().status, RemoteTaskStatus::Completed);
        assert_eq!(slice.items.len(), 3);
    }

    #[test]
    fn test_update_without_id_fails() {
        let (mut svc, mut slice) = loaded();
        let unsaved = remote_task("Draft", RemoteTaskStatus::Todo, Priority::Medium);
        assert!(slice.update(&mut svc, &unsaved).is_err());
        assert_eq!(slice.status, LoadStatus::Failed);
    }

    #[test]
    fn test_delete_removes_and_clears_current() {
        let (mut svc, mut slice) = loaded();
        let id = slice.items[2].id.unwrap();
        slice.fetch_by_id(&svc, id).unwrap();
        slice.delete(&mut svc, id).unwrap();
        assert_eq!(slice.items.len(), 2);
        assert!(slice.current.is_none());
        assert!(slice.delete(&mut svc, id).is_err());
    }

    #[test]
    fn test_filtered_fetch_and_fallback() {
        let (svc, mut slice) = loaded();
        assert_eq!(slice.visible().len(), 3);

        let criteria = TaskCriteria {
            priority: Some(Priority::High),
            search_term: "api".to_string(),
            ..TaskCriteria::default()
        };
        slice.fetch_filtered(&svc, &criteria).unwrap();
        assert_eq!(titles(slice.visible()), ["Review API"]);
        assert_eq!(slice.items.len(), 3);

        let criteria = TaskCriteria {
            status: Some(RemoteTaskStatus::Completed),
            ..TaskCriteria::default()
        };
        slice.fetch_filtered(&svc, &criteria).unwrap();
        assert_eq!(titles(slice.visible()), ["Design schema"]);

        slice.clear_filter();
        assert_eq!(slice.visible().len(), 3);
    }

    #[test]
    fn test_update_reaches_filtered_rows() {
        let (mut svc, mut slice) = loaded();
        let criteria = TaskCriteria {
            search_term: "docs".to_string(),
            ..TaskCriteria::default()
        };
        slice.fetch_filtered(&svc, &criteria).unwrap();

        let mut renamed = slice.visible()[0].clone();
        renamed.title = "Publish API docs".to_string();
        slice.update(&mut svc, &renamed).unwrap();

        assert_eq!(titles(slice.visible()), ["Publish API docs"]);
        assert_eq!(slice.items[1].title, "Publish API docs");
    }

    #[test]
    fn test_fetch_all_drops_filter_result() {
        let (svc, mut slice) = loaded();
        let criteria = TaskCriteria {
            status: Some(RemoteTaskStatus::Todo),
            ..TaskCriteria::default()
        };
        slice.fetch_filtered(&svc, &criteria).unwrap();
        assert_eq!(slice.visible().len(), 1);

        slice.fetch_all(&svc).unwrap();
        assert!(slice.filtered.is_empty());
        assert_eq!(slice.visible().len(), 3);
    }

    #[test]
    fn test_service_failure_sets_error() {
        let (mut svc, mut slice) = loaded();
        svc.fail_with(Some("Network unreachable"));
        let err = slice.fetch_all(&svc).unwrap_err();
        assert_eq!(err.to_string(), "Network unreachable");
        assert_eq!(slice.status, LoadStatus::Failed);
        assert_eq!(slice.items.len(), 3);

        svc.fail_with(Some(""));
        slice.fetch_all(&svc).unwrap_err();
        assert_eq!(slice.error.as_deref(), Some("Failed to fetch tasks"));

        svc.fail_with(None);
        slice.fetch_all(&svc).unwrap();
        assert_eq!(slice.status, LoadStatus::Succeeded);
        assert!(slice.error.is_none());
    }

    #[test]
    fn test_project_slice() {
        let mut svc = InMemoryRecordService::new();
        let mut slice: RemoteSlice<RemoteProject> = RemoteSlice::new();
        let created = slice.create(&mut svc, &RemoteProject::new("Website relaunch")).unwrap();
        let id = created.id.unwrap();

        let mut held = created.clone();
        held.status = ProjectStatus::OnHold;
        slice.update(&mut svc, &held).unwrap();
        assert_eq!(slice.fetch_by_id(&svc, id).unwrap().status, ProjectStatus::OnHold);

        assert_eq!(slice.fetch_by_id(&svc, id + 1).unwrap_err().to_string(), "Project not found");
        slice.delete(&mut svc, id).unwrap();
        assert!(slice.fetch_all(&svc).unwrap().is_empty());
    }
}
