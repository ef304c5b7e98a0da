use chrono::{Duration, NaiveDate};
use tempfile::TempDir;

use taskflow::clock::{Clock, FixedClock};
use taskflow::db::{BlobStore, FileBlob};
use taskflow::fields::{Priority, Status};
use taskflow::remote::schema::{RemoteEntity, RemoteTask};
use taskflow::remote::{InMemoryRecordService, LoadStatus, RemoteSlice};
use taskflow::validate::{Field, TaskDraft, DUE_DATE_IN_PAST, DUE_DATE_REQUIRED, TITLE_REQUIRED};
use taskflow::view::Selector;
use taskflow::{TaskFlowError, TaskStore};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 10).unwrap()
}

fn open(dir: &TempDir) -> TaskStore<FileBlob, FixedClock> {
    TaskStore::open_with_clock(FileBlob::new(dir.path().join("tasks.json")), FixedClock::on(today()))
}

#[test]
fn fresh_file_is_seeded_and_persisted() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir);
    assert_eq!(store.tasks().len(), 3);
    assert!(dir.path().join("tasks.json").exists());

    let reopened = open(&dir);
    assert_eq!(reopened.tasks(), store.tasks());
}

#[test]
fn create_then_toggle_moves_counts() {
    let dir = TempDir::new().unwrap();
    let mut store = open(&dir);
    let before = store.stats();

    let tomorrow = (today() + Duration::days(1)).format("%Y-%m-%d").to_string();
    let draft = TaskDraft {
        priority: Some(Priority::High),
        category_id: Some("2".into()),
        ..TaskDraft::new("Test", tomorrow)
    };
    let created = store.submit(&draft, None).unwrap();
    assert_eq!(created.status, Status::Pending);
    assert_eq!(created.created_at, store.clock().now());
    assert!(created.completed_at.is_none());

    let after_create = store.stats();
    assert_eq!(after_create.total, before.total + 1);
    assert_eq!(after_create.pending, before.pending + 1);

    let toggled = store.toggle_status(&created.id).unwrap();
    assert_eq!(toggled.status, Status::Completed);
    assert!(toggled.completed_at.is_some());

    let after_toggle = store.stats();
    assert_eq!(after_toggle.completed, after_create.completed + 1);
    assert_eq!(after_toggle.pending, after_create.pending - 1);

    // Everything survives a reopen.
    let blob = store.close();
    assert!(blob.read().unwrap().unwrap().contains("\"completedAt\""));
    let reopened = open(&dir);
    let persisted = reopened.get(&created.id).unwrap();
    assert_eq!(persisted.status, Status::Completed);
    assert_eq!(persisted.category_id, "2");
}

#[test]
fn rejected_drafts_do_not_mutate() {
    let dir = TempDir::new().unwrap();
    let mut store = open(&dir);
    let snapshot = store.tasks().to_vec();

    let err = store.submit(&TaskDraft::new("", ""), None).unwrap_err();
    let errors = err.field_errors().unwrap();
    assert_eq!(errors.len(), 2);
    assert_eq!(errors.get(Field::Title), Some(TITLE_REQUIRED));
    assert_eq!(errors.get(Field::DueDate), Some(DUE_DATE_REQUIRED));

    let err = store.submit(&TaskDraft::new("Buy milk", "2020-01-01"), None).unwrap_err();
    let errors = err.field_errors().unwrap();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors.get(Field::DueDate), Some(DUE_DATE_IN_PAST));

    assert_eq!(store.tasks(), snapshot.as_slice());
}

#[test]
fn delete_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let mut store = open(&dir);
    assert!(store.delete("1"));
    let after_first = store.tasks().to_vec();
    assert!(!store.delete("1"));
    assert_eq!(store.tasks(), after_first.as_slice());
    assert!(matches!(store.toggle_status("1"), Err(TaskFlowError::NotFound(_))));
}

#[test]
fn overdue_view_uses_clock_time() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir);
    // Both pending seed tasks are due in December 2023.
    let ids: Vec<_> = store.view(&Selector::Overdue).iter().map(|t| t.id.clone()).collect();
    assert_eq!(ids, ["3", "1"]);
    assert_eq!(store.stats().overdue, 2);
}

#[test]
fn corrupt_file_falls_back_to_seed() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("tasks.json"), "{ not json").unwrap();
    let store = open(&dir);
    assert_eq!(store.tasks().len(), 3);
    let contents = std::fs::read_to_string(dir.path().join("tasks.json")).unwrap();
    assert!(contents.trim_start().starts_with('['));
}

#[test]
fn local_tasks_mirror_to_remote_table() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir);
    let mut service = InMemoryRecordService::new();
    let mut slice: RemoteSlice<RemoteTask> = RemoteSlice::new();

    for task in store.tasks() {
        slice.create(&mut service, &RemoteTask::from_task(task)).unwrap();
    }
    slice.fetch_all(&service).unwrap();
    assert_eq!(slice.status, LoadStatus::Succeeded);
    assert_eq!(slice.items.len(), 3);

    let mut pulled: Vec<_> = slice.items.iter().map(RemoteTask::to_task).collect();
    pulled.sort_by(|a, b| a.id.cmp(&b.id));
    for (local, remote) in store.tasks().iter().zip(&pulled) {
        assert_eq!(local.id, remote.id);
        assert_eq!(local.title, remote.title);
        assert_eq!(local.status, remote.status);
        assert_eq!(local.due_date, remote.due_date);
        assert_eq!(local.category_id, remote.category_id);
    }
    assert!(slice.items.iter().all(|t| t.remote_id().is_some()));
}
