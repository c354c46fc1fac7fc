//! Load balancer operations.

use std::collections::BTreeMap;

use crate::error::{OvnError, Result, ResultExt};
use crate::model::LoadBalancer;
use crate::store::{Mutation, Mutator, Operation};

use super::{MutationFn, OvnClient, new_uuid};

impl OvnClient {
    /// Create a load balancer unless one with the same name exists.
    pub async fn create_load_balancer(
        &self,
        lb_name: &str,
        protocol: &str,
        selection_fields: Option<&str>,
    ) -> Result<()> {
        let lb = LoadBalancer {
            uuid: new_uuid(),
            name: lb_name.to_string(),
            protocol: Some(protocol.to_string()),
            selection_fields: selection_fields
                .filter(|f| !f.is_empty())
                .map(|f| vec![f.to_string()])
                .unwrap_or_default(),
            external_ids: self.vendor_ids(),
            ..Default::default()
        };

        self.create_if_absent("lb-add", lb).await.map(|_| ())
    }

    /// Delete several load balancers in one transaction.
    ///
    /// Switches and routers still referencing them are not touched; detach
    /// first with [`OvnClient::logical_switch_update_load_balancers`].
    pub async fn delete_load_balancers(&self, lb_names: &[&str]) -> Result<()> {
        self.delete_many::<LoadBalancer>("lb-del", lb_names).await
    }

    pub fn get_load_balancer(
        &self,
        lb_name: &str,
        ignore_not_found: bool,
    ) -> Result<Option<LoadBalancer>> {
        self.get_by_name(lb_name, ignore_not_found)
    }

    pub fn load_balancer_exists(&self, lb_name: &str) -> Result<bool> {
        self.exists::<LoadBalancer>(lb_name)
    }

    /// List all load balancers.
    pub fn list_load_balancers(&self) -> Result<Vec<LoadBalancer>> {
        self.where_cache(|_: &LoadBalancer| true)
    }

    /// Insert or delete VIP entries on a load balancer.
    ///
    /// An empty VIP map is rejected: the caller asked for a change and gave
    /// nothing to change.
    pub async fn load_balancer_update_vips(
        &self,
        lb_name: &str,
        vips: &BTreeMap<String, String>,
        mutator: Mutator,
    ) -> Result<()> {
        if vips.is_empty() {
            return Err(OvnError::InvalidArgument(format!(
                "vips to {} on load balancer {} cannot be empty",
                mutator, lb_name
            )));
        }

        let mutation = |_: &LoadBalancer| Mutation::entries("vips", vips, mutator);
        let ops = self
            .load_balancer_op(lb_name, &[&mutation])
            .context_with(|| {
                format!("generate operations for update load balancer {} vips {:?}", lb_name, vips)
            })?;

        self.transact("update-lb-vips", ops)
            .await
            .context_with(|| format!("update vips {:?} for load balancer {}", vips, lb_name))
    }

    /// Mutate operations for the load balancer named `lb_name`.
    pub fn load_balancer_op(
        &self,
        lb_name: &str,
        intents: &[MutationFn<'_, LoadBalancer>],
    ) -> Result<Vec<Operation>> {
        self.entity_op(lb_name, intents)
    }

    /// Delete operation for the load balancer named `lb_name`, if present.
    pub fn delete_load_balancer_op(&self, lb_name: &str) -> Result<Vec<Operation>> {
        self.delete_op::<LoadBalancer>(lb_name)
    }

    /// UUIDs of the named load balancers that still exist.
    pub(crate) fn load_balancer_uuids(&self, lb_names: &[&str]) -> Result<Vec<String>> {
        self.resolve_uuids::<LoadBalancer>(lb_names)
    }
}

impl LoadBalancer {
    /// Whether a VIP is configured, regardless of its backends.
    pub fn has_vip(&self, vip: &str) -> bool {
        self.vips.contains_key(vip)
    }
}
