//! Transactional object layer for the OVN northbound database.
//!
//! Callers state which logical entities should exist and how they relate;
//! [`OvnClient`] resolves names against the store's cached view, builds the
//! minimal set of insert/mutate/delete operations and submits them as one
//! labeled transaction. Creates and deletes are idempotent so reconciliation
//! loops can repeat any step.

pub mod client;
pub mod config;
pub mod error;
pub mod model;
pub mod store;

pub use client::{
    AclParent, MutationFn, OvnClient, build_mutate_ops, generate_mac, ip_addr_with_mask,
};
pub use config::{ClientConfig, ConfigError};
pub use error::{ErrorKind, OvnError, Result};
pub use store::{Event, MemoryStore, Mutation, Mutator, Operation, Store, StoreError, Table};
