//! Events emitted by committed transactions.

use super::Table;
use super::value::Row;

/// Row-level change notifications.
///
/// These events are dispatched via broadcast channels to subscribers after a
/// transaction commits. A failed transaction emits nothing.
#[derive(Debug, Clone)]
pub enum Event {
    /// A row was inserted.
    RowInserted { table: Table, row: Row },
    /// A row was mutated.
    RowUpdated { table: Table, old: Row, new: Row },
    /// A row was deleted.
    RowDeleted { table: Table, row: Row },
}

impl Event {
    /// Get the table this event belongs to.
    pub fn table(&self) -> Table {
        match self {
            Event::RowInserted { table, .. }
            | Event::RowUpdated { table, .. }
            | Event::RowDeleted { table, .. } => *table,
        }
    }

    /// Get the UUID of the affected row.
    pub fn uuid(&self) -> &str {
        match self {
            Event::RowInserted { row, .. } => &row.uuid,
            Event::RowUpdated { new, .. } => &new.uuid,
            Event::RowDeleted { row, .. } => &row.uuid,
        }
    }
}
