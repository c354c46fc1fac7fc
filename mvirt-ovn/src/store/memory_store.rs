//! MemoryStore implementation - an in-process northbound database.
//!
//! Applies transactions with the same semantics the replicated database
//! uses: all-or-nothing commits, rows addressed by UUID, set and map
//! mutations merged server-side. The committed tables double as the
//! mirrored cache served by [`Store::select`].

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, RwLock};

use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::{debug, trace};

use super::error::{Result, StoreError};
use super::event::Event;
use super::operation::{Mutation, Mutator, Operation, OperationResult};
use super::traits::{Store, Table};
use super::value::{Row, Value};

type Tables = HashMap<Table, BTreeMap<String, Row>>;

/// In-memory store with broadcast change events.
pub struct MemoryStore {
    tables: RwLock<Tables>,
    events: broadcast::Sender<Event>,
    transactions: AtomicU64,
    fail_next: Mutex<Option<String>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(256);
        Self {
            tables: RwLock::new(HashMap::new()),
            events,
            transactions: AtomicU64::new(0),
            fail_next: Mutex::new(None),
        }
    }

    /// Subscribe to row change events.
    ///
    /// Events are only sent for committed transactions.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }

    /// Number of committed transactions so far.
    pub fn transaction_count(&self) -> u64 {
        self.transactions.load(Ordering::SeqCst)
    }

    /// Make the next transaction fail with `reason` without applying anything.
    pub fn fail_next_transaction(&self, reason: impl Into<String>) -> Result<()> {
        let mut fail_next = self.fail_next.lock().map_err(poisoned)?;
        *fail_next = Some(reason.into());
        Ok(())
    }

    /// Fetch a committed row by UUID.
    pub fn get_row(&self, table: Table, uuid: &str) -> Result<Option<Row>> {
        let tables = self.tables.read().map_err(poisoned)?;
        Ok(tables.get(&table).and_then(|rows| rows.get(uuid)).cloned())
    }

    /// Number of committed rows in `table`.
    pub fn row_count(&self, table: Table) -> Result<usize> {
        let tables = self.tables.read().map_err(poisoned)?;
        Ok(tables.get(&table).map_or(0, BTreeMap::len))
    }
}

fn poisoned<T>(_: std::sync::PoisonError<T>) -> StoreError {
    StoreError::Internal("store lock poisoned".into())
}

#[async_trait]
impl Store for MemoryStore {
    fn select(&self, table: Table, filter: &dyn Fn(&Row) -> bool) -> Result<Vec<Row>> {
        let tables = self.tables.read().map_err(poisoned)?;
        Ok(tables
            .get(&table)
            .map(|rows| rows.values().filter(|row| filter(row)).cloned().collect())
            .unwrap_or_default())
    }

    async fn transact(&self, ops: Vec<Operation>) -> Result<Vec<OperationResult>> {
        if let Some(reason) = self.fail_next.lock().map_err(poisoned)?.take() {
            return Err(StoreError::Internal(reason));
        }

        let op_count = ops.len();
        let (results, events) = {
            let mut tables = self.tables.write().map_err(poisoned)?;
            let mut staged = tables.clone();
            let mut events = Vec::new();
            let mut results = Vec::with_capacity(ops.len());

            for op in ops {
                results.push(apply(&mut staged, op, &mut events)?);
            }

            *tables = staged;
            (results, events)
        };

        let txn = self.transactions.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(txn, ops = op_count, events = events.len(), "transaction committed");

        for event in events {
            trace!(txn, table = %event.table(), uuid = event.uuid(), "row changed");
            // No subscribers is fine
            let _ = self.events.send(event);
        }

        Ok(results)
    }
}

fn apply(tables: &mut Tables, op: Operation, events: &mut Vec<Event>) -> Result<OperationResult> {
    match op {
        Operation::Insert { table, row } => {
            if row.uuid.is_empty() {
                return Err(StoreError::Constraint {
                    table,
                    column: "_uuid".into(),
                    reason: "insert without uuid".into(),
                });
            }
            let rows = tables.entry(table).or_default();
            if rows.contains_key(&row.uuid) {
                return Err(StoreError::Conflict(format!(
                    "{} row {} already exists",
                    table, row.uuid
                )));
            }
            let uuid = row.uuid.clone();
            rows.insert(uuid.clone(), row.clone());
            events.push(Event::RowInserted { table, row });
            Ok(OperationResult {
                count: 1,
                uuid: Some(uuid),
            })
        }
        Operation::Mutate {
            table,
            uuid,
            mutations,
        } => {
            // A vanished row matches nothing, exactly like a where-by-uuid clause
            let Some(row) = tables.get_mut(&table).and_then(|rows| rows.get_mut(&uuid)) else {
                return Ok(OperationResult {
                    count: 0,
                    uuid: None,
                });
            };
            let old = row.clone();
            for mutation in &mutations {
                apply_mutation(table, row, mutation)?;
            }
            events.push(Event::RowUpdated {
                table,
                old,
                new: row.clone(),
            });
            Ok(OperationResult {
                count: 1,
                uuid: None,
            })
        }
        Operation::Delete { table, uuid } => {
            let removed = tables.get_mut(&table).and_then(|rows| rows.remove(&uuid));
            let count = usize::from(removed.is_some());
            if let Some(row) = removed {
                events.push(Event::RowDeleted { table, row });
            }
            Ok(OperationResult { count, uuid: None })
        }
    }
}

fn apply_mutation(table: Table, row: &mut Row, mutation: &Mutation) -> Result<()> {
    if mutation.mutator == Mutator::Assign {
        row.set(&mutation.column, mutation.value.clone());
        return Ok(());
    }

    let current = row
        .columns
        .entry(mutation.column.clone())
        .or_insert_with(|| match mutation.value {
            Value::Map(_) => Value::Map(BTreeMap::new()),
            _ => Value::Set(BTreeSet::new()),
        });

    match (current, &mutation.value, mutation.mutator) {
        (Value::Set(current), Value::Set(members), Mutator::Insert) => {
            current.extend(members.iter().cloned());
        }
        (Value::Set(current), Value::Set(members), Mutator::Delete) => {
            current.retain(|member| !members.contains(member));
        }
        (Value::Map(current), Value::Map(entries), Mutator::Insert) => {
            for (key, value) in entries {
                current
                    .entry(key.clone())
                    .or_insert_with(|| value.clone());
            }
        }
        (Value::Map(current), Value::Map(entries), Mutator::Delete) => {
            current.retain(|key, value| entries.get(key) != Some(value));
        }
        (Value::Map(current), Value::Set(keys), Mutator::Delete) => {
            current.retain(|key, _| !keys.contains(key));
        }
        (current, value, mutator) => {
            return Err(StoreError::Constraint {
                table,
                column: mutation.column.clone(),
                reason: format!(
                    "cannot {} {} into {}",
                    mutator,
                    value.type_name(),
                    current.type_name()
                ),
            });
        }
    }

    Ok(())
}
