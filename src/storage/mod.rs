//! Row storage collaborator.
//!
//! # Data Flow
//! ```text
//! handler
//!     → Storage trait (create / put / get_by_query)
//!     → MemoryStore (in-process) or a real row store behind the same seam
//! ```
//!
//! # Design Decisions
//! - Rows are flat JSON objects; the gateway core never interprets them
//! - `get_by_query` matches on equality of every key in the query row,
//!   returning either a count or the full rows
//! - `create` refuses duplicate key values; `put` upserts

use std::sync::RwLock;

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

/// A stored row: a flat JSON object.
pub type Row = Map<String, Value>;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("row already exists for key {0}")]
    AlreadyExists(String),

    #[error("row is missing key field `{0}`")]
    MissingKeyField(String),
}

/// What `get_by_query` should return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryMode {
    /// Only the number of matching rows.
    Count,
    /// The matching rows with all fields.
    AllFields,
}

#[derive(Debug, Clone, PartialEq)]
pub enum QueryResult {
    Count(usize),
    Rows(Vec<Row>),
}

impl QueryResult {
    pub fn count(&self) -> usize {
        match self {
            QueryResult::Count(n) => *n,
            QueryResult::Rows(rows) => rows.len(),
        }
    }

    pub fn into_rows(self) -> Vec<Row> {
        match self {
            QueryResult::Rows(rows) => rows,
            QueryResult::Count(_) => Vec::new(),
        }
    }
}

/// Seam to the row store backing the handlers.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Insert a new row; duplicate key values are an error.
    async fn create(&self, row: Row) -> Result<(), StorageError>;

    /// Insert or replace the row with the same key values.
    async fn put(&self, row: Row) -> Result<(), StorageError>;

    /// Return rows whose fields equal every key in `keys`.
    async fn get_by_query(&self, keys: &Row, mode: QueryMode) -> Result<QueryResult, StorageError>;
}

/// In-process table used by the binary and the tests.
pub struct MemoryStore {
    /// Field names forming the row identity for `create`/`put`.
    key_fields: Vec<String>,
    rows: RwLock<Vec<Row>>,
}

impl MemoryStore {
    pub fn new<I, S>(key_fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            key_fields: key_fields.into_iter().map(Into::into).collect(),
            rows: RwLock::new(Vec::new()),
        }
    }

    fn key_of(&self, row: &Row) -> Result<Vec<Value>, StorageError> {
        self.key_fields
            .iter()
            .map(|field| {
                row.get(field)
                    .cloned()
                    .ok_or_else(|| StorageError::MissingKeyField(field.clone()))
            })
            .collect()
    }

    fn matches(keys: &Row, row: &Row) -> bool {
        keys.iter().all(|(field, expected)| row.get(field) == Some(expected))
    }
}

#[async_trait]
impl Storage for MemoryStore {
    async fn create(&self, row: Row) -> Result<(), StorageError> {
        let key = self.key_of(&row)?;
        let mut rows = self.rows.write().expect("storage lock poisoned");
        for existing in rows.iter() {
            if self.key_of(existing)? == key {
                return Err(StorageError::AlreadyExists(format!("{key:?}")));
            }
        }
        rows.push(row);
        Ok(())
    }

    async fn put(&self, row: Row) -> Result<(), StorageError> {
        let key = self.key_of(&row)?;
        let mut rows = self.rows.write().expect("storage lock poisoned");
        for existing in rows.iter_mut() {
            if self.key_of(existing)? == key {
                *existing = row;
                return Ok(());
            }
        }
        rows.push(row);
        Ok(())
    }

    async fn get_by_query(&self, keys: &Row, mode: QueryMode) -> Result<QueryResult, StorageError> {
        let rows = self.rows.read().expect("storage lock poisoned");
        let matching = rows.iter().filter(|row| Self::matches(keys, row));
        Ok(match mode {
            QueryMode::Count => QueryResult::Count(matching.count()),
            QueryMode::AllFields => QueryResult::Rows(matching.cloned().collect()),
        })
    }
}
