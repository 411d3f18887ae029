//! Record trait and supporting types
//!
//! Any type persisted by [`crate::Store`] implements [`Record`], giving the
//! store an id, a last-modified timestamp, a collection name (the JSONL file
//! and index table this type lives in), and the subset of its fields that
//! should be queryable without deserializing every record.

use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Current time in Unix milliseconds.
pub fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// A value indexed for a record, used for equality filtering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexValue {
    String(String),
    Number(i64),
    Bool(bool),
}

impl IndexValue {
    /// Render as the text representation stored in the index table.
    pub fn as_text(&self) -> String {
        match self {
            IndexValue::String(s) => s.clone(),
            IndexValue::Number(n) => n.to_string(),
            IndexValue::Bool(b) => b.to_string(),
        }
    }
}

impl std::fmt::Display for IndexValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_text())
    }
}

/// Comparison operator for a [`Filter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Ne,
}

/// An equality/inequality filter over one indexed field.
#[derive(Debug, Clone)]
pub struct Filter {
    pub field: String,
    pub op: FilterOp,
    pub value: IndexValue,
}

impl Filter {
    fn matches(&self, candidate: Option<&IndexValue>) -> bool {
        match self.op {
            FilterOp::Eq => candidate == Some(&self.value),
            FilterOp::Ne => candidate != Some(&self.value),
        }
    }
}

/// Apply a set of filters (AND semantics) against a record's indexed fields.
pub fn filters_match(filters: &[Filter], indexed: &HashMap<String, IndexValue>) -> bool {
    filters.iter().all(|f| f.matches(indexed.get(&f.field)))
}

/// Trait implemented by every type persisted through [`crate::Store`].
///
/// `collection_name` determines the JSONL file (`<collection>.jsonl`) and the
/// index table partition a record lives in; it must be stable for the type's
/// lifetime since changing it orphans existing data.
pub trait Record: Serialize + for<'de> Deserialize<'de> + Clone + Send + Sync + 'static {
    /// Stable identifier, unique within the collection.
    fn id(&self) -> &str;

    /// Last-modified timestamp (Unix milliseconds), used for last-write-wins
    /// resolution when replaying the JSONL log.
    fn updated_at(&self) -> i64;

    /// Name of the JSONL file / index partition this type is stored under.
    fn collection_name() -> &'static str
    where
        Self: Sized;

    /// Fields to mirror into the index table for cheap filtered `list` calls.
    fn indexed_fields(&self) -> HashMap<String, IndexValue>;
}
