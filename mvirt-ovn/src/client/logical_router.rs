//! Logical router operations.

use std::collections::BTreeMap;

use tracing::info;

use crate::error::{Result, ResultExt};
use crate::model::{
    GatewayChassis, LogicalRouter, LogicalRouterPolicy, LogicalRouterPort,
    LogicalRouterStaticRoute, Nat,
};
use crate::store::{Mutation, Mutator, Operation};

use super::lifecycle::delete_ops;
use super::{MutationFn, OvnClient, new_uuid};

impl OvnClient {
    /// Create a router with only the vendor tag set.
    pub async fn create_logical_router(&self, lr_name: &str) -> Result<()> {
        let lr = LogicalRouter {
            uuid: new_uuid(),
            name: lr_name.to_string(),
            external_ids: self.vendor_ids(),
            ..Default::default()
        };

        self.create_if_absent("lr-add", lr).await.map(|_| ())
    }

    /// Merge `options` into the router's options.
    pub async fn update_logical_router_options(
        &self,
        lr_name: &str,
        options: &BTreeMap<String, String>,
    ) -> Result<()> {
        if options.is_empty() {
            return Ok(());
        }

        let mutation = |lr: &LogicalRouter| {
            let mut merged = lr.options.clone();
            merged.extend(options.iter().map(|(k, v)| (k.clone(), v.clone())));
            (merged != lr.options).then(|| Mutation::assign("options", merged))
        };
        let ops = self
            .logical_router_op(lr_name, &[&mutation])
            .context_with(|| {
                format!("generate operations for updating logical router {} options", lr_name)
            })?;

        self.transact("lr-update", ops)
            .await
            .context_with(|| format!("update logical router {} options {:?}", lr_name, options))
    }

    /// Delete a router and everything it contains: ports (with their gateway
    /// chassis), NAT rules, policies and static routes.
    pub async fn delete_logical_router(&self, lr_name: &str) -> Result<()> {
        let Some(lr) = self
            .get_logical_router(lr_name, true)
            .context_with(|| {
                format!("get logical router {} when generate delete operations", lr_name)
            })?
        else {
            return Ok(());
        };

        let ports = self.where_cache(|lrp: &LogicalRouterPort| lr.ports.contains(&lrp.uuid))?;
        let chassis = self.where_cache(|gc: &GatewayChassis| {
            ports.iter().any(|lrp| lrp.gateway_chassis.contains(&gc.uuid))
        })?;
        let nats = self.where_cache(|nat: &Nat| lr.nat.contains(&nat.uuid))?;
        let policies = self.where_cache(|p: &LogicalRouterPolicy| lr.policies.contains(&p.uuid))?;
        let routes = self
            .where_cache(|r: &LogicalRouterStaticRoute| lr.static_routes.contains(&r.uuid))?;

        let mut ops = vec![Operation::delete(&lr)];
        ops.extend(delete_ops(&ports));
        ops.extend(delete_ops(&chassis));
        ops.extend(delete_ops(&nats));
        ops.extend(delete_ops(&policies));
        ops.extend(delete_ops(&routes));

        self.transact("lr-del", ops)
            .await
            .context_with(|| format!("delete logical router {}", lr_name))?;

        info!(name = lr_name, ports = ports.len(), "deleted logical router");
        Ok(())
    }

    pub fn get_logical_router(
        &self,
        lr_name: &str,
        ignore_not_found: bool,
    ) -> Result<Option<LogicalRouter>> {
        self.get_by_name(lr_name, ignore_not_found)
    }

    pub fn logical_router_exists(&self, lr_name: &str) -> Result<bool> {
        self.exists::<LogicalRouter>(lr_name)
    }

    /// List routers, optionally only those tagged with this client's vendor.
    pub fn list_logical_router(&self, vendor_filter: bool) -> Result<Vec<LogicalRouter>> {
        self.where_cache(|lr: &LogicalRouter| !vendor_filter || self.is_own(&lr.external_ids))
    }

    /// Operations adding a port UUID to, or removing it from, a router.
    pub fn logical_router_update_port_op(
        &self,
        lr_name: &str,
        lrp_uuid: &str,
        mutator: Mutator,
    ) -> Result<Vec<Operation>> {
        if lrp_uuid.is_empty() {
            return Ok(Vec::new());
        }

        self.update_members_op::<LogicalRouter>(lr_name, "ports", &[lrp_uuid.to_string()], mutator)
    }

    pub fn logical_router_update_policy_op(
        &self,
        lr_name: &str,
        policy_uuids: &[String],
        mutator: Mutator,
    ) -> Result<Vec<Operation>> {
        self.update_members_op::<LogicalRouter>(lr_name, "policies", policy_uuids, mutator)
    }

    pub fn logical_router_update_nat_op(
        &self,
        lr_name: &str,
        nat_uuids: &[String],
        mutator: Mutator,
    ) -> Result<Vec<Operation>> {
        self.update_members_op::<LogicalRouter>(lr_name, "nat", nat_uuids, mutator)
    }

    pub fn logical_router_update_static_route_op(
        &self,
        lr_name: &str,
        route_uuids: &[String],
        mutator: Mutator,
    ) -> Result<Vec<Operation>> {
        self.update_members_op::<LogicalRouter>(lr_name, "static_routes", route_uuids, mutator)
    }

    /// Attach or detach several load balancers in one transaction. Missing
    /// load balancers are skipped.
    pub async fn logical_router_update_load_balancers(
        &self,
        lr_name: &str,
        mutator: Mutator,
        lb_names: &[&str],
    ) -> Result<()> {
        self.update_children::<LogicalRouter, crate::model::LoadBalancer>(
            "lr-lb-update",
            lr_name,
            "load_balancer",
            mutator,
            lb_names,
        )
        .await
    }

    /// Mutate operations for the router named `lr_name`, which must exist.
    pub fn logical_router_op(
        &self,
        lr_name: &str,
        intents: &[MutationFn<'_, LogicalRouter>],
    ) -> Result<Vec<Operation>> {
        self.entity_op(lr_name, intents)
    }
}
