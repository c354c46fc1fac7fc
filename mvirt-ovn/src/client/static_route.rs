//! Logical router static route operations.

use std::collections::BTreeMap;

use crate::error::{Result, ResultExt};
use crate::model::{LogicalRouter, LogicalRouterStaticRoute, Model, external_ids_match};
use crate::store::{Mutator, Operation};

use super::lifecycle::{delete_ops, detach_ops};
use super::{OvnClient, new_uuid};

/// Route policy applied when the column is unset.
const DEFAULT_ROUTE_POLICY: &str = "dst-ip";

impl LogicalRouterStaticRoute {
    /// The effective routing policy.
    pub fn effective_policy(&self) -> &str {
        self.policy.as_deref().unwrap_or(DEFAULT_ROUTE_POLICY)
    }

    fn is(&self, route_table: &str, policy: Option<&str>, ip_prefix: &str, nexthop: &str) -> bool {
        self.route_table == route_table
            && self.effective_policy() == policy.unwrap_or(DEFAULT_ROUTE_POLICY)
            && self.ip_prefix == ip_prefix
            && self.nexthop == nexthop
    }
}

impl OvnClient {
    /// Add a static route to `lr_name` unless an identical one exists.
    pub async fn add_logical_router_static_route(
        &self,
        lr_name: &str,
        route_table: &str,
        policy: Option<&str>,
        ip_prefix: &str,
        nexthop: &str,
        external_ids: &BTreeMap<String, String>,
    ) -> Result<()> {
        self.require::<LogicalRouter>(lr_name)?;
        if self
            .get_logical_router_static_route(
                lr_name,
                route_table,
                policy,
                ip_prefix,
                nexthop,
                true,
            )?
            .is_some()
        {
            return Ok(());
        }

        let mut ids = self.vendor_ids();
        ids.extend(external_ids.iter().map(|(k, v)| (k.clone(), v.clone())));

        let route = LogicalRouterStaticRoute {
            uuid: new_uuid(),
            policy: policy.map(String::from),
            ip_prefix: ip_prefix.to_string(),
            nexthop: nexthop.to_string(),
            route_table: route_table.to_string(),
            external_ids: ids,
        };

        let mut ops = vec![Operation::create(&route)];
        ops.extend(self.logical_router_update_static_route_op(
            lr_name,
            &[route.uuid.clone()],
            Mutator::Insert,
        )?);

        self.transact("lr-route-add", ops)
            .await
            .context_with(|| {
                format!(
                    "add static route {} via {} to logical router {}",
                    ip_prefix, nexthop, lr_name
                )
            })
    }

    /// Delete one static route. Missing routes and routers are a no-op.
    pub async fn delete_logical_router_static_route(
        &self,
        lr_name: &str,
        route_table: &str,
        policy: Option<&str>,
        ip_prefix: &str,
        nexthop: &str,
    ) -> Result<()> {
        let Some(lr) = self.get_logical_router(lr_name, true)? else {
            return Ok(());
        };
        let Some(route) = self.get_logical_router_static_route(
            lr_name,
            route_table,
            policy,
            ip_prefix,
            nexthop,
            true,
        )?
        else {
            return Ok(());
        };

        let mut ops = detach_ops(
            std::slice::from_ref(&lr),
            "static_routes",
            &[route.uuid().to_string()],
        )?;
        ops.push(Operation::delete(&route));

        self.transact("lr-route-del", ops)
            .await
            .context_with(|| {
                format!(
                    "delete static route {} via {} from logical router {}",
                    ip_prefix, nexthop, lr_name
                )
            })
    }

    /// Delete every static route of `lr_name`, which must exist.
    pub async fn clear_logical_router_static_route(&self, lr_name: &str) -> Result<()> {
        let lr = self.require::<LogicalRouter>(lr_name)?;
        let routes = self
            .where_cache(|r: &LogicalRouterStaticRoute| lr.static_routes.contains(&r.uuid))?;
        if routes.is_empty() {
            return Ok(());
        }

        let uuids: Vec<String> = routes.iter().map(|r| r.uuid().to_string()).collect();
        let mut ops = detach_ops(std::slice::from_ref(&lr), "static_routes", &uuids)?;
        ops.extend(delete_ops(&routes));

        self.transact("lr-route-clear", ops)
            .await
            .context_with(|| format!("clear static routes of logical router {}", lr_name))
    }

    /// Resolve one static route of `lr_name`. An unset policy means
    /// `dst-ip`. With `ignore_not_found` a missing router also yields `None`.
    pub fn get_logical_router_static_route(
        &self,
        lr_name: &str,
        route_table: &str,
        policy: Option<&str>,
        ip_prefix: &str,
        nexthop: &str,
        ignore_not_found: bool,
    ) -> Result<Option<LogicalRouterStaticRoute>> {
        let Some(lr) = self.get_logical_router(lr_name, ignore_not_found)? else {
            return Ok(None);
        };

        let what = format!(
            "{} table {:?} {} {} via {}",
            lr_name,
            route_table,
            policy.unwrap_or(DEFAULT_ROUTE_POLICY),
            ip_prefix,
            nexthop
        );
        self.resolve(
            &what,
            |r: &LogicalRouterStaticRoute| {
                lr.static_routes.contains(&r.uuid) && r.is(route_table, policy, ip_prefix, nexthop)
            },
            ignore_not_found,
        )
    }

    /// List the static routes of `lr_name` carrying every tag in
    /// `external_ids`. A missing router has no routes.
    pub fn list_logical_router_static_routes(
        &self,
        lr_name: &str,
        external_ids: &BTreeMap<String, String>,
    ) -> Result<Vec<LogicalRouterStaticRoute>> {
        let Some(lr) = self.get_logical_router(lr_name, true)? else {
            return Ok(Vec::new());
        };

        self.where_cache(|r: &LogicalRouterStaticRoute| {
            lr.static_routes.contains(&r.uuid) && external_ids_match(&r.external_ids, external_ids)
        })
    }
}
