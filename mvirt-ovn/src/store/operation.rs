//! Low-level store operations.
//!
//! Operations are plain data: building one never touches the store. Every
//! operation addresses its row by UUID, so a rename between resolution and
//! commit cannot redirect it to another row.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::model::Model;

use super::Table;
use super::value::{Row, Value};

/// Direction of a column mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mutator {
    /// Replace the column value. Only valid for scalar columns.
    Assign,
    /// Add members to a set, or absent keys to a map.
    Insert,
    /// Remove members from a set, or matching entries from a map.
    Delete,
}

impl std::fmt::Display for Mutator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mutator::Assign => write!(f, "assign"),
            Mutator::Insert => write!(f, "insert"),
            Mutator::Delete => write!(f, "delete"),
        }
    }
}

/// One column change within a mutate operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mutation {
    pub column: String,
    pub mutator: Mutator,
    pub value: Value,
}

impl Mutation {
    pub fn new(column: &str, mutator: Mutator, value: Value) -> Self {
        Self {
            column: column.to_string(),
            mutator,
            value,
        }
    }

    /// Replace a scalar column.
    pub fn assign(column: &str, value: impl Into<Value>) -> Self {
        Self::new(column, Mutator::Assign, value.into())
    }

    /// Insert or delete set members. Returns `None` for an empty member list
    /// so the intent drops out of the operation instead of sending a no-op.
    pub fn members(column: &str, members: &[String], mutator: Mutator) -> Option<Self> {
        if members.is_empty() {
            return None;
        }
        Some(Self::new(
            column,
            mutator,
            Value::set(members.iter().cloned()),
        ))
    }

    /// Insert or delete map entries. Empty maps yield `None`.
    pub fn entries(
        column: &str,
        entries: &BTreeMap<String, String>,
        mutator: Mutator,
    ) -> Option<Self> {
        if entries.is_empty() {
            return None;
        }
        Some(Self::new(column, mutator, Value::Map(entries.clone())))
    }
}

/// A single operation inside a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    Insert {
        table: Table,
        row: Row,
    },
    Mutate {
        table: Table,
        uuid: String,
        mutations: Vec<Mutation>,
    },
    Delete {
        table: Table,
        uuid: String,
    },
}

impl Operation {
    /// Insert `model` as a new row under its own UUID.
    pub fn create<M: Model>(model: &M) -> Self {
        Operation::Insert {
            table: M::TABLE,
            row: model.to_row(),
        }
    }

    /// Mutate the row backing `model`.
    pub fn mutate<M: Model>(model: &M, mutations: Vec<Mutation>) -> Self {
        Operation::Mutate {
            table: M::TABLE,
            uuid: model.uuid().to_string(),
            mutations,
        }
    }

    /// Delete the row backing `model`.
    pub fn delete<M: Model>(model: &M) -> Self {
        Operation::Delete {
            table: M::TABLE,
            uuid: model.uuid().to_string(),
        }
    }

    pub fn table(&self) -> Table {
        match self {
            Operation::Insert { table, .. }
            | Operation::Mutate { table, .. }
            | Operation::Delete { table, .. } => *table,
        }
    }

    /// UUID of the row this operation addresses.
    pub fn uuid(&self) -> &str {
        match self {
            Operation::Insert { row, .. } => &row.uuid,
            Operation::Mutate { uuid, .. } | Operation::Delete { uuid, .. } => uuid,
        }
    }
}

/// Result of one applied operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationResult {
    /// Rows matched by a mutate or delete; 1 for a successful insert.
    pub count: usize,
    /// UUID of the inserted row, if any.
    pub uuid: Option<String>,
}
