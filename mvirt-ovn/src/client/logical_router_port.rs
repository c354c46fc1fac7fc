//! Logical router port operations.

use std::collections::BTreeMap;

use crate::error::{OvnError, Result, ResultExt};
use crate::model::{GatewayChassis, LogicalRouter, LogicalRouterPort};
use crate::store::{Mutation, Mutator, Operation};

use super::lifecycle::{delete_ops, detach_ops};
use super::{OvnClient, generate_mac, new_uuid};

/// Router advertisement settings used when enabling RA without explicit
/// configuration.
const DEFAULT_RA_CONFIGS: [(&str, &str); 4] = [
    ("address_mode", "dhcpv6_stateful"),
    ("max_interval", "30"),
    ("min_interval", "5"),
    ("send_periodic", "true"),
];

impl OvnClient {
    /// Create a router port and attach it to `lr_name` in one transaction.
    /// An existing port of that name is left alone.
    pub async fn create_logical_router_port(
        &self,
        lr_name: &str,
        lrp_name: &str,
        mac: &str,
        networks: &[&str],
    ) -> Result<()> {
        if self.logical_router_port_exists(lrp_name)? {
            return Ok(());
        }

        let lrp = LogicalRouterPort {
            uuid: new_uuid(),
            name: lrp_name.to_string(),
            mac: mac.to_string(),
            networks: networks.iter().map(|n| n.to_string()).collect(),
            external_ids: self.vendor_ids(),
            ..Default::default()
        };

        let ops = self
            .create_logical_router_port_op(lr_name, &lrp)
            .context_with(|| {
                format!("generate operations for creating logical router port {}", lrp_name)
            })?;

        self.transact("lrp-add", ops)
            .await
            .context_with(|| {
                format!("create logical router port {} on router {}", lrp_name, lr_name)
            })
    }

    /// Operations creating `lrp` and attaching it to the router, which must
    /// exist.
    pub fn create_logical_router_port_op(
        &self,
        lr_name: &str,
        lrp: &LogicalRouterPort,
    ) -> Result<Vec<Operation>> {
        let mut ops = vec![Operation::create(lrp)];
        ops.extend(self.logical_router_update_port_op(lr_name, &lrp.uuid, Mutator::Insert)?);
        Ok(ops)
    }

    /// Create the local half of a router-to-router link.
    ///
    /// The port is named `<local>-<remote>` and peers with
    /// `<remote>-<local>`. If it already exists only its networks are
    /// refreshed.
    pub async fn create_peer_router_port(
        &self,
        local_router: &str,
        remote_router: &str,
        local_router_port_ip: &str,
    ) -> Result<()> {
        let lrp_name = format!("{}-{}", local_router, remote_router);
        let peer_name = format!("{}-{}", remote_router, local_router);
        let networks: Vec<&str> = local_router_port_ip
            .split(',')
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .collect();

        if self.logical_router_port_exists(&lrp_name)? {
            return self.update_logical_router_port_networks(&lrp_name, &networks).await;
        }

        let lrp = LogicalRouterPort {
            uuid: new_uuid(),
            name: lrp_name.clone(),
            mac: generate_mac(),
            networks: networks.iter().map(|n| n.to_string()).collect(),
            peer: Some(peer_name),
            external_ids: self.vendor_ids(),
            ..Default::default()
        };

        let ops = self
            .create_logical_router_port_op(local_router, &lrp)
            .context_with(|| {
                format!("generate operations for creating peer router port {}", lrp_name)
            })?;

        self.transact("lrp-add", ops)
            .await
            .context_with(|| {
                format!("create peer router port {} for router {}", lrp_name, local_router)
            })
    }

    /// Replace the port's networks. Unchanged networks submit nothing.
    pub async fn update_logical_router_port_networks(
        &self,
        lrp_name: &str,
        networks: &[&str],
    ) -> Result<()> {
        let mut networks: Vec<String> = networks.iter().map(|n| n.to_string()).collect();
        networks.sort();
        networks.dedup();

        let mutation = |lrp: &LogicalRouterPort| {
            (lrp.networks != networks).then(|| Mutation::assign("networks", networks.clone()))
        };
        let ops = self
            .entity_op::<LogicalRouterPort>(lrp_name, &[&mutation])
            .context_with(|| {
                format!(
                    "generate operations for updating logical router port {} networks",
                    lrp_name
                )
            })?;

        self.transact("lrp-update", ops)
            .await
            .context_with(|| {
                format!("update logical router port {} networks {:?}", lrp_name, networks)
            })
    }

    /// Enable or disable IPv6 router advertisements on a port.
    ///
    /// `ra_configs` is a comma separated `key=value` list; an empty list uses
    /// the default stateful DHCPv6 configuration.
    pub async fn update_logical_router_port_ra(
        &self,
        lrp_name: &str,
        ra_configs: &str,
        enable: bool,
    ) -> Result<()> {
        let configs = if enable {
            parse_ra_configs(ra_configs)?
        } else {
            BTreeMap::new()
        };

        let mutation = |lrp: &LogicalRouterPort| {
            (lrp.ipv6_ra_configs != configs)
                .then(|| Mutation::assign("ipv6_ra_configs", configs.clone()))
        };
        let ops = self
            .entity_op::<LogicalRouterPort>(lrp_name, &[&mutation])
            .context_with(|| {
                format!("generate operations for updating logical router port {} ra", lrp_name)
            })?;

        self.transact("lrp-update", ops)
            .await
            .context_with(|| format!("update logical router port {} ipv6 ra configs", lrp_name))
    }

    /// Detach the port from its routers and delete it together with its
    /// gateway chassis, in one transaction. A missing port is a no-op.
    pub async fn delete_logical_router_port(&self, lrp_name: &str) -> Result<()> {
        let ops = self.delete_logical_router_port_op(lrp_name)?;

        self.transact("lrp-del", ops)
            .await
            .context_with(|| format!("delete logical router port {}", lrp_name))
    }

    pub fn get_logical_router_port(
        &self,
        lrp_name: &str,
        ignore_not_found: bool,
    ) -> Result<Option<LogicalRouterPort>> {
        self.get_by_name(lrp_name, ignore_not_found)
    }

    pub fn logical_router_port_exists(&self, lrp_name: &str) -> Result<bool> {
        self.exists::<LogicalRouterPort>(lrp_name)
    }

    pub(crate) fn delete_logical_router_port_op(&self, lrp_name: &str) -> Result<Vec<Operation>> {
        let Some(lrp) = self
            .get_logical_router_port(lrp_name, true)
            .context_with(|| {
                format!("get logical router port {} when generate delete operations", lrp_name)
            })?
        else {
            return Ok(Vec::new());
        };

        let owners = self.where_cache(|lr: &LogicalRouter| lr.ports.contains(&lrp.uuid))?;
        let chassis = self
            .where_cache(|gc: &GatewayChassis| lrp.gateway_chassis.contains(&gc.uuid))?;

        let mut ops = detach_ops(&owners, "ports", std::slice::from_ref(&lrp.uuid))?;
        ops.push(Operation::delete(&lrp));
        ops.extend(delete_ops(&chassis));
        Ok(ops)
    }
}

fn parse_ra_configs(ra_configs: &str) -> Result<BTreeMap<String, String>> {
    let ra_configs = ra_configs.trim();
    if ra_configs.is_empty() {
        return Ok(DEFAULT_RA_CONFIGS
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect());
    }

    ra_configs
        .split(',')
        .map(|kv| match kv.split_once('=') {
            Some((key, value)) if !key.trim().is_empty() => {
                Ok((key.trim().to_string(), value.trim().to_string()))
            }
            _ => Err(OvnError::InvalidArgument(format!("invalid ipv6 ra config {:?}", kv))),
        })
        .collect()
}
