//! Boundary to the hosted record service.
//!
//! The hosted backend stores tasks and projects in tables keyed by a
//! server-assigned numeric `Id`. TaskFlow only talks to it through the
//! [`RecordService`] trait: a fetch with projection, filter, ordering and
//! paging, plus create, update and delete. Failures come back as
//! [`TaskFlowError::Remote`] carrying the service's message; nothing here
//! retries.

pub mod memory;
pub mod schema;
pub mod slice;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;

pub use memory::InMemoryRecordService;
pub use slice::{LoadStatus, RemoteSlice, TaskCriteria};

/// An untyped row as the service sends and receives it.
pub type Record = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

impl OrderBy {
    pub fn asc(field: &str) -> Self {
        OrderBy {
            field: field.to_string(),
            direction: Direction::Asc,
        }
    }

    pub fn desc(field: &str) -> Self {
        OrderBy {
            field: field.to_string(),
            direction: Direction::Desc,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    Equal,
    /// Case-insensitive substring match on text fields.
    Contains,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub field: String,
    pub operator: Operator,
    pub value: Value,
}

impl Condition {
    pub fn equal(field: &str, value: impl Into<Value>) -> Self {
        Condition {
            field: field.to_string(),
            operator: Operator::Equal,
            value: value.into(),
        }
    }

    pub fn contains(field: &str, value: impl Into<Value>) -> Self {
        Condition {
            field: field.to_string(),
            operator: Operator::Contains,
            value: value.into(),
        }
    }
}

/// Conditions that must all hold.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub conditions: Vec<Condition>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagingInfo {
    pub limit: usize,
    pub offset: usize,
}

impl Default for PagingInfo {
    fn default() -> Self {
        PagingInfo { limit: 50, offset: 0 }
    }
}

/// Parameters for a fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchOptions {
    /// Fields to return. Empty means every field.
    pub fields: Vec<String>,
    pub filter: Option<Filter>,
    pub order_by: Vec<OrderBy>,
    pub paging: PagingInfo,
}

impl Default for FetchOptions {
    fn default() -> Self {
        FetchOptions {
            fields: Vec::new(),
            filter: None,
            order_by: vec![OrderBy::desc(schema::CREATED_ON)],
            paging: PagingInfo::default(),
        }
    }
}

impl FetchOptions {
    pub fn with_fields(fields: &[&str]) -> Self {
        FetchOptions {
            fields: fields.iter().map(|f| f.to_string()).collect(),
            ..Self::default()
        }
    }

    /// Add a condition, creating the filter if needed.
    pub fn and(mut self, condition: Condition) -> Self {
        self.filter.get_or_insert_with(Filter::default).conditions.push(condition);
        self
    }
}

/// CRUD against hosted tables.
pub trait RecordService {
    fn fetch_records(&self, table: &str, options: &FetchOptions) -> Result<Vec<Record>>;

    /// Insert `record` and return it as stored, with its assigned `Id`.
    fn create_record(&mut self, table: &str, record: Record) -> Result<Record>;

    /// Merge `record` into row `id` and return the stored row.
    fn update_record(&mut self, table: &str, id: i64, record: Record) -> Result<Record>;

    fn delete_record(&mut self, table: &str, id: i64) -> Result<()>;
}
