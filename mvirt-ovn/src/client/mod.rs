//! The transactional object layer.
//!
//! Every public operation on [`OvnClient`] is one resolve-build-submit unit:
//! lookups run against the store's cached view, operations are built as
//! plain data, and the result is submitted as a single transaction. Nothing
//! spans calls, so composite workflows rely on each step being idempotent.

use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::config::ClientConfig;
use crate::error::{OvnError, Result};
use crate::store::{Operation, Store, StoreError};

mod acl;
mod address_set;
mod dhcp_options;
mod gateway_chassis;
mod lifecycle;
mod load_balancer;
mod logical_router;
mod logical_router_port;
mod logical_switch;
mod logical_switch_port;
mod mixed;
mod mutate;
mod nat;
mod port_group;
mod resolve;
mod router_policy;
mod static_route;

pub use acl::AclParent;
pub use mixed::{generate_mac, ip_addr_with_mask};
pub use mutate::{MutationFn, build_mutate_ops};

/// Client for the northbound object layer.
///
/// Cheap to clone; all clones share one store handle.
#[derive(Clone)]
pub struct OvnClient {
    store: Arc<dyn Store>,
    config: Arc<ClientConfig>,
}

impl OvnClient {
    pub fn new(store: Arc<dyn Store>, config: ClientConfig) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    /// Submit `ops` as one transaction labeled `label`.
    ///
    /// An empty operation list succeeds without contacting the store. No
    /// retries are attempted; the caller's reconciliation loop owns that.
    pub async fn transact(&self, label: &str, ops: Vec<Operation>) -> Result<()> {
        if ops.is_empty() {
            return Ok(());
        }

        let op_count = ops.len();
        debug!(label, ops = op_count, "submitting transaction");
        for op in &ops {
            trace!(label, table = %op.table(), uuid = op.uuid(), "operation");
        }

        let timeout = self.config.transact_timeout();
        let result = match tokio::time::timeout(timeout, self.store.transact(ops)).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::Timeout(timeout.as_secs())),
        };

        result.map(|_| ()).map_err(|source| {
            warn!(label, ops = op_count, error = %source, "transaction failed");
            OvnError::Transaction {
                label: label.to_string(),
                source,
            }
        })
    }

    /// The vendor tag map stamped on rows this client creates.
    pub(crate) fn vendor_ids(&self) -> std::collections::BTreeMap<String, String> {
        std::collections::BTreeMap::from([(
            crate::model::VENDOR_KEY.to_string(),
            self.config.vendor.clone(),
        )])
    }

    /// True when `external_ids` carries this client's vendor tag.
    pub(crate) fn is_own(&self, external_ids: &std::collections::BTreeMap<String, String>) -> bool {
        external_ids
            .get(crate::model::VENDOR_KEY)
            .is_some_and(|vendor| *vendor == self.config.vendor)
    }
}

/// Generate a fresh client-side row UUID.
pub(crate) fn new_uuid() -> String {
    uuid::Uuid::new_v4().to_string()
}
