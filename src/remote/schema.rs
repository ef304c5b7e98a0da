//! Hosted table names, field names and typed rows.

use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::Record;
use crate::error::{Result, TaskFlowError};
use crate::fields::{Priority, Status};
use crate::task::{Task, DEFAULT_CATEGORY_ID};

pub const TASK_TABLE: &str = "task5";
pub const PROJECT_TABLE: &str = "project1";

// System fields present on every hosted table.
pub const ID: &str = "Id";
pub const NAME: &str = "Name";
pub const TAGS: &str = "Tags";
pub const CREATED_ON: &str = "CreatedOn";
pub const MODIFIED_ON: &str = "ModifiedOn";
pub const CREATED_BY: &str = "CreatedBy";
pub const OWNER: &str = "Owner";

/// Fields the service assigns; never sent on create or update.
pub const SYSTEM_FIELDS: &[&str] = &[ID, CREATED_ON, MODIFIED_ON, CREATED_BY, OWNER];

pub mod task_fields {
    pub const LOCAL_ID: &str = "id";
    pub const TITLE: &str = "title";
    pub const DESCRIPTION: &str = "description";
    pub const STATUS: &str = "status";
    pub const PRIORITY: &str = "priority";
    pub const DUE_DATE: &str = "due_date";
    pub const ASSIGNEE: &str = "assignee";
    pub const TAGS: &str = "tags";
}

pub mod project_fields {
    pub const DESCRIPTION: &str = "description";
    pub const STATUS: &str = "status";
    pub const START_DATE: &str = "start_date";
    pub const END_DATE: &str = "end_date";
}

/// A typed row of a hosted table.
pub trait RemoteEntity: Serialize + DeserializeOwned + Clone {
    const TABLE: &'static str;
    /// Projection requested on every fetch.
    const FIELDS: &'static [&'static str];
    /// Singular noun used in error messages.
    const NOUN: &'static str;
    /// Message when a fetch by id returns nothing.
    const NOT_FOUND: &'static str;

    fn remote_id(&self) -> Option<i64>;

    fn from_record(record: Record) -> Result<Self> {
        Ok(serde_json::from_value(Value::Object(record))?)
    }

    /// The row without service-assigned fields, ready to send.
    fn writable_record(&self) -> Result<Record> {
        match serde_json::to_value(self)? {
            Value::Object(mut map) => {
                for f in SYSTEM_FIELDS {
                    map.remove(*f);
                }
                Ok(map)
            }
            other => Err(TaskFlowError::remote(format!("{} row serialized as {other}", Self::NOUN))),
        }
    }
}

/// Hosted task status picklist.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemoteTaskStatus {
    #[default]
    Todo,
    #[serde(rename = "In Progress")]
    InProgress,
    Completed,
}

impl RemoteTaskStatus {
    pub fn label(&self) -> &'static str {
        match self {
            RemoteTaskStatus::Todo => "Todo",
            RemoteTaskStatus::InProgress => "In Progress",
            RemoteTaskStatus::Completed => "Completed",
        }
    }
}

impl From<Status> for RemoteTaskStatus {
    fn from(s: Status) -> Self {
        match s {
            Status::Pending => RemoteTaskStatus::Todo,
            Status::Completed => RemoteTaskStatus::Completed,
        }
    }
}

impl From<RemoteTaskStatus> for Status {
    fn from(s: RemoteTaskStatus) -> Self {
        match s {
            RemoteTaskStatus::Completed => Status::Completed,
            RemoteTaskStatus::Todo | RemoteTaskStatus::InProgress => Status::Pending,
        }
    }
}

/// The hosted picklist spells priorities "Low", "Medium", "High".
mod priority_label {
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::fields::{format_priority, parse_priority, Priority};

    pub fn serialize<S: Serializer>(p: &Priority, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(format_priority(*p))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Priority, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        Ok(raw.as_deref().and_then(parse_priority).unwrap_or_default())
    }
}

/// A row of the hosted task table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteTask {
    #[serde(rename = "Id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(rename = "Name", default)]
    pub name: String,
    /// The local store's identifier, kept in the table's free-text `id` column.
    #[serde(rename = "id", default, skip_serializing_if = "Option::is_none")]
    pub local_id: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: RemoteTaskStatus,
    #[serde(default, with = "priority_label")]
    pub priority: Priority,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Generic tag column; carries the local category id.
    #[serde(rename = "Tags", default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(rename = "CreatedOn", default, skip_serializing_if = "Option::is_none")]
    pub created_on: Option<DateTime<Utc>>,
    #[serde(rename = "ModifiedOn", default, skip_serializing_if = "Option::is_none")]
    pub modified_on: Option<DateTime<Utc>>,
}

impl RemoteTask {
    /// Build a row from a local task. `Name` mirrors the title for display.
    pub fn from_task(task: &Task) -> Self {
        RemoteTask {
            id: None,
            name: task.title.clone(),
            local_id: Some(task.id.clone()),
            title: task.title.clone(),
            description: task.description.clone(),
            status: task.status.into(),
            priority: task.priority,
            due_date: task.due_date,
            assignee: None,
            tags: Vec::new(),
            category: Some(task.category_id.clone()),
            created_on: Some(task.created_at),
            modified_on: task.updated_at,
        }
    }

    /// Convert back to a local task.
    ///
    /// The hosted table has no completion timestamp, so a completed row is
    /// stamped with its modification (or creation) time.
    pub fn to_task(&self) -> Task {
        let status: Status = self.status.into();
        let created_at = self.created_on.unwrap_or_default();
        Task {
            id: self
                .local_id
                .clone()
                .or_else(|| self.id.map(|id| id.to_string()))
                .unwrap_or_default(),
            title: self.title.clone(),
            description: self.description.clone(),
            due_date: self.due_date,
            priority: self.priority,
            status,
            category_id: self.category.clone().unwrap_or_else(|| DEFAULT_CATEGORY_ID.to_string()),
            created_at,
            completed_at: (status == Status::Completed).then(|| self.modified_on.unwrap_or(created_at)),
            updated_at: self.modified_on,
        }
    }
}

impl RemoteEntity for RemoteTask {
    const TABLE: &'static str = TASK_TABLE;
    const FIELDS: &'static [&'static str] = &[
        ID,
        NAME,
        task_fields::LOCAL_ID,
        task_fields::TITLE,
        task_fields::DESCRIPTION,
        task_fields::STATUS,
        task_fields::PRIORITY,
        task_fields::DUE_DATE,
        task_fields::ASSIGNEE,
        task_fields::TAGS,
        TAGS,
        CREATED_ON,
        MODIFIED_ON,
        CREATED_BY,
        OWNER,
    ];
    const NOUN: &'static str = "task";
    const NOT_FOUND: &'static str = "Task not found";

    fn remote_id(&self) -> Option<i64> {
        self.id
    }
}

/// Hosted project status picklist.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectStatus {
    #[default]
    Active,
    Completed,
    #[serde(rename = "On Hold")]
    OnHold,
}

/// A row of the hosted project table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteProject {
    #[serde(rename = "Id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(rename = "Name", default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: ProjectStatus,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(rename = "CreatedOn", default, skip_serializing_if = "Option::is_none")]
    pub created_on: Option<DateTime<Utc>>,
    #[serde(rename = "ModifiedOn", default, skip_serializing_if = "Option::is_none")]
    pub modified_on: Option<DateTime<Utc>>,
}

impl RemoteProject {
    pub fn new(name: impl Into<String>) -> Self {
        RemoteProject {
            id: None,
            name: name.into(),
            description: None,
            status: ProjectStatus::default(),
            start_date: None,
            end_date: None,
            created_on: None,
            modified_on: None,
        }
    }
}

impl RemoteEntity for RemoteProject {
    const TABLE: &'static str = PROJECT_TABLE;
    const FIELDS: &'static [&'static str] = &[
        ID,
        NAME,
        project_fields::DESCRIPTION,
        project_fields::STATUS,
        project_fields::START_DATE,
        project_fields::END_DATE,
        CREATED_ON,
        MODIFIED_ON,
        CREATED_BY,
        OWNER,
    ];
    const NOUN: &'static str = "project";
    const NOT_FOUND: &'static str = "Project not found";

    fn remote_id(&self) -> Option<i64> {
        self.id
    }
}
