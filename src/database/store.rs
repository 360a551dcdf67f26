//! Collection-scoped document store abstraction.
//!
//! Documents are JSON objects addressed by `(collection, id)`. Backends
//! implement [`DocumentStore`]; typed access goes through
//! [`Repository`](crate::database::repository::Repository).

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde_json::Value;

use crate::database::manager::DatabaseError;

/// Comparison operators accepted by filter queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "==",
            Operator::Ne => "!=",
            Operator::Lt => "<",
            Operator::Le => "<=",
            Operator::Gt => ">",
            Operator::Ge => ">=",
        }
    }

    /// Apply the operator to a stored field value. Ordering comparisons only
    /// hold between two numbers, two strings or two booleans.
    pub fn matches(&self, stored: &Value, expected: &Value) -> bool {
        match self {
            Operator::Eq => json_eq(stored, expected),
            Operator::Ne => !json_eq(stored, expected),
            Operator::Lt => compare(stored, expected) == Some(Ordering::Less),
            Operator::Le => matches!(compare(stored, expected), Some(Ordering::Less | Ordering::Equal)),
            Operator::Gt => compare(stored, expected) == Some(Ordering::Greater),
            Operator::Ge => matches!(compare(stored, expected), Some(Ordering::Greater | Ordering::Equal)),
        }
    }
}

impl FromStr for Operator {
    type Err = DatabaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "==" => Ok(Operator::Eq),
            "!=" => Ok(Operator::Ne),
            "<" => Ok(Operator::Lt),
            "<=" => Ok(Operator::Le),
            ">" => Ok(Operator::Gt),
            ">=" => Ok(Operator::Ge),
            other => Err(DatabaseError::InvalidInput(format!("unsupported operator: {}", other))),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single `field <op> value` condition on a top-level document field.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub op: Operator,
    pub value: Value,
}

impl Filter {
    pub fn new(field: impl Into<String>, op: Operator, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, Operator::Eq, value)
    }

    /// A missing field never matches.
    pub fn matches(&self, document: &Value) -> bool {
        document
            .get(&self.field)
            .map(|stored| self.op.matches(stored, &self.value))
            .unwrap_or(false)
    }
}

/// True when the document satisfies every filter.
pub fn matches_all(document: &Value, filters: &[Filter]) -> bool {
    filters.iter().all(|f| f.matches(document))
}

/// Human-readable rendering of a uniqueness key, e.g. `users with username == "ada"`.
pub fn describe_key(collection: &str, key: &[Filter]) -> String {
    let parts: Vec<String> = key
        .iter()
        .map(|f| format!("{} {} {}", f.field, f.op, f.value))
        .collect();
    format!("{} with {}", collection, parts.join(" and "))
}

fn json_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

/// Backend contract for the external document database.
///
/// Every call is a single attempt; errors are surfaced to the caller.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// All documents of a collection, in backend iteration order.
    async fn get_all(&self, collection: &str) -> Result<Vec<Value>, DatabaseError>;

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, DatabaseError>;

    /// Documents matching every filter.
    async fn query(&self, collection: &str, filters: &[Filter]) -> Result<Vec<Value>, DatabaseError>;

    /// Upsert: replaces the whole document at `id`.
    async fn set(&self, collection: &str, id: &str, data: Value) -> Result<(), DatabaseError>;

    /// Atomically insert a document that must not exist yet.
    ///
    /// Fails with `AlreadyExists` when `id` is taken, or when `unique` is
    /// non-empty and some document already matches all of it.
    async fn create(
        &self,
        collection: &str,
        id: &str,
        data: Value,
        unique: &[Filter],
    ) -> Result<(), DatabaseError>;

    /// Fails with `NotFound` when there is nothing to delete.
    async fn delete(&self, collection: &str, id: &str) -> Result<(), DatabaseError>;

    async fn health_check(&self) -> Result<(), DatabaseError>;
}
