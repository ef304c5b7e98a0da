//! In-process record service.
//!
//! Behaves like the hosted backend closely enough to run the remote slices
//! offline: numeric ids, system timestamps, filters, ordering, paging and
//! projection. An injected failure makes every call return that message.

use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::{SecondsFormat, Utc};
use serde_json::Value;
use tracing::debug;

use super::schema::{self, CREATED_ON, ID, MODIFIED_ON};
use super::{Condition, Direction, FetchOptions, Operator, OrderBy, Record, RecordService};
use crate::error::{Result, TaskFlowError};

#[derive(Debug, Default)]
pub struct InMemoryRecordService {
    tables: HashMap<String, Vec<Record>>,
    next_id: i64,
    failure: Option<String>,
}

impl InMemoryRecordService {
    /// A service with the task and project tables, both empty.
    pub fn new() -> Self {
        let mut svc = InMemoryRecordService {
            next_id: 1,
            ..Default::default()
        };
        svc.add_table(schema::TASK_TABLE);
        svc.add_table(schema::PROJECT_TABLE);
        svc
    }

    pub fn add_table(&mut self, table: &str) {
        self.tables.entry(table.to_string()).or_default();
    }

    /// Make every following call fail with `message`, or clear with `None`.
    pub fn fail_with(&mut self, message: Option<&str>) {
        self.failure = message.map(str::to_string);
    }

    pub fn len(&self, table: &str) -> usize {
        self.tables.get(table).map_or(0, Vec::len)
    }

    pub fn is_empty(&self, table: &str) -> bool {
        self.len(table) == 0
    }

    fn check(&self) -> Result<()> {
        match &self.failure {
            Some(msg) => Err(TaskFlowError::remote(msg.clone())),
            None => Ok(()),
        }
    }

    fn rows(&self, table: &str) -> Result<&Vec<Record>> {
        self.tables
            .get(table)
            .ok_or_else(|| TaskFlowError::remote(format!("Table '{table}' not found")))
    }

    fn rows_mut(&mut self, table: &str) -> Result<&mut Vec<Record>> {
        self.tables
            .get_mut(table)
            .ok_or_else(|| TaskFlowError::remote(format!("Table '{table}' not found")))
    }
}

fn timestamp() -> Value {
    Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true))
}

fn row_id(row: &Record) -> Option<i64> {
    row.get(ID).and_then(Value::as_i64)
}

fn holds(row: &Record, cond: &Condition) -> bool {
    let actual = row.get(&cond.field).unwrap_or(&Value::Null);
    match cond.operator {
        Operator::Equal => *actual == cond.value,
        Operator::Contains => match (actual.as_str(), cond.value.as_str()) {
            (Some(hay), Some(needle)) => hay.to_lowercase().contains(&needle.to_lowercase()),
            _ => false,
        },
    }
}

/// Null sorts before everything, then numbers, then text.
fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::Number(_), _) => Ordering::Less,
        (_, Value::Number(_)) => Ordering::Greater,
        _ => a.to_string().cmp(&b.to_string()),
    }
}

fn compare_rows(a: &Record, b: &Record, order_by: &[OrderBy]) -> Ordering {
    for key in order_by {
        let ord = compare_values(
            a.get(&key.field).unwrap_or(&Value::Null),
            b.get(&key.field).unwrap_or(&Value::Null),
        );
        let ord = match key.direction {
            Direction::Asc => ord,
            Direction::Desc => ord.reverse(),
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

fn project(row: &Record, fields: &[String]) -> Record {
    if fields.is_empty() {
        return row.clone();
    }
    fields
        .iter()
        .filter_map(|f| row.get(f).map(|v| (f.clone(), v.clone())))
        .collect()
}

impl RecordService for InMemoryRecordService {
    fn fetch_records(&self, table: &str, options: &FetchOptions) -> Result<Vec<Record>> {
        self.check()?;
        let conditions = options.filter.as_ref().map(|f| f.conditions.as_slice()).unwrap_or(&[]);
        let mut matched: Vec<&Record> = self
            .rows(table)?
            .iter()
            .filter(|row| conditions.iter().all(|c| holds(row, c)))
            .collect();
        // Id breaks ties so equal timestamps still list newest first.
        matched.sort_by(|a, b| {
            compare_rows(a, b, &options.order_by).then_with(|| row_id(b).cmp(&row_id(a)))
        });
        let out: Vec<Record> = matched
            .into_iter()
            .skip(options.paging.offset)
            .take(options.paging.limit)
            .map(|row| project(row, &options.fields))
            .collect();
        debug!(table, count = out.len(), "Fetched records");
        Ok(out)
    }

    fn create_record(&mut self, table: &str, mut record: Record) -> Result<Record> {
        self.check()?;
        let id = self.next_id;
        let now = timestamp();
        record.insert(ID.to_string(), Value::from(id));
        record.insert(CREATED_ON.to_string(), now.clone());
        record.insert(MODIFIED_ON.to_string(), now);
        self.rows_mut(table)?.push(record.clone());
        self.next_id += 1;
        debug!(table, id, "Created record");
        Ok(record)
    }

    fn update_record(&mut self, table: &str, id: i64, record: Record) -> Result<Record> {
        self.check()?;
        let row = self
            .rows_mut(table)?
            .iter_mut()
            .find(|row| row_id(row) == Some(id))
            .ok_or_else(|| TaskFlowError::remote(format!("Record {id} not found in {table}")))?;
        for (k, v) in record {
            if schema::SYSTEM_FIELDS.contains(&k.as_str()) {
                continue;
            }
            row.insert(k, v);
        }
        row.insert(MODIFIED_ON.to_string(), timestamp());
        debug!(table, id, "Updated record");
        Ok(row.clone())
    }

    fn delete_record(&mut self, table: &str, id: i64) -> Result<()> {
        self.check()?;
        let rows = self.rows_mut(table)?;
        let before = rows.len();
        rows.retain(|row| row_id(row) != Some(id));
        if rows.len() == before {
            return Err(TaskFlowError::remote(format!("Record {id} not found in {table}")));
        }
        debug!(table, id, "Deleted record");
        Ok(())
    }
}
