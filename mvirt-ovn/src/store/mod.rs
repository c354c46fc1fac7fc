//! Store abstraction for the northbound database.
//!
//! This module provides the narrow capability the object layer consumes from
//! a replicated schema database: a cache query per table and an atomic
//! multi-operation transaction.
//!
//! # Architecture
//!
//! ```text
//! OvnClient → Arc<dyn Store>
//!                  ↓
//!            store.select(table, filter)       // Reads against the local mirror (µs)
//!            store.transact(ops).await         // Writes, one round trip (ms)
//! ```
//!
//! Operations are built as plain data ([`Operation::create`],
//! [`Operation::mutate`], [`Operation::delete`]) and only reach the store
//! through `transact`.
//!
//! # Usage
//!
//! ```ignore
//! use mvirt_ovn::store::{MemoryStore, Operation, Store};
//!
//! let store = Arc::new(MemoryStore::new());
//! store.transact(vec![Operation::create(&switch)]).await?;
//! let rows = store.select(Table::LogicalSwitch, &|_| true)?;
//! ```

mod error;
mod event;
mod memory_store;
mod operation;
mod traits;
mod value;

pub use error::{Result, StoreError};
pub use event::Event;
pub use memory_store::MemoryStore;
pub use operation::{Mutation, Mutator, Operation, OperationResult};
pub use traits::{Store, Table};
pub use value::{Column, Row, Value};
