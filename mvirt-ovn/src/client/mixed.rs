//! Operations spanning switches and routers, plus addressing helpers.

use std::collections::BTreeMap;
use std::net::IpAddr;

use ipnet::IpNet;
use tracing::info;

use crate::error::{OvnError, Result, ResultExt};
use crate::model::{LogicalRouterPort, LogicalSwitchPort};

use super::{OvnClient, new_uuid};

/// Join each gateway with the prefix length of the matching CIDR.
///
/// Both arguments may be dual-stack comma separated lists, e.g.
/// `("10.16.0.1,fd00::1", "10.16.0.0/16,fd00::/64")` yields
/// `"10.16.0.1/16,fd00::1/64"`.
pub fn ip_addr_with_mask(gateway: &str, cidr_block: &str) -> Result<String> {
    let gateways: Vec<&str> = gateway.split(',').map(str::trim).collect();
    let cidrs: Vec<&str> = cidr_block.split(',').map(str::trim).collect();

    if gateways.len() != cidrs.len() {
        return Err(OvnError::InvalidArgument(format!(
            "gateway {} does not match cidr block {}",
            gateway, cidr_block
        )));
    }

    let mut networks = Vec::with_capacity(cidrs.len());
    for (gw, cidr) in gateways.iter().zip(&cidrs) {
        let net: IpNet = cidr
            .parse()
            .map_err(|e| OvnError::InvalidArgument(format!("invalid cidr {}: {}", cidr, e)))?;
        let addr: IpAddr = gw
            .parse()
            .map_err(|e| OvnError::InvalidArgument(format!("invalid gateway {}: {}", gw, e)))?;

        if !net.contains(&addr) {
            return Err(OvnError::InvalidArgument(format!(
                "gateway {} is not in cidr {}",
                addr, net
            )));
        }

        networks.push(format!("{}/{}", addr, net.prefix_len()));
    }

    Ok(networks.join(","))
}

/// Random locally administered MAC in the `52:54:00` range.
pub fn generate_mac() -> String {
    let bytes = uuid::Uuid::new_v4().into_bytes();
    format!("52:54:00:{:02x}:{:02x}:{:02x}", bytes[0], bytes[1], bytes[2])
}

impl OvnClient {
    /// Link switch `ls_name` and router `lr_name` with a router-type switch
    /// port `<ls>-<lr>` and a router port `<lr>-<ls>`, in one transaction.
    ///
    /// Either half that already exists is left alone; both parents must
    /// exist.
    pub async fn create_router_port(
        &self,
        ls_name: &str,
        lr_name: &str,
        networks: &str,
        mac: &str,
    ) -> Result<()> {
        let lsp_name = format!("{}-{}", ls_name, lr_name);
        let lrp_name = format!("{}-{}", lr_name, ls_name);

        let mut ops = Vec::new();

        if !self.logical_switch_port_exists(&lsp_name)? {
            let lsp = LogicalSwitchPort {
                uuid: new_uuid(),
                name: lsp_name.clone(),
                port_type: "router".to_string(),
                addresses: vec!["router".to_string()],
                options: BTreeMap::from([("router-port".to_string(), lrp_name.clone())]),
                external_ids: self.vendor_ids(),
                ..Default::default()
            };
            ops.extend(self.create_logical_switch_port_op(ls_name, &lsp)?);
        }

        if !self.logical_router_port_exists(&lrp_name)? {
            let lrp = LogicalRouterPort {
                uuid: new_uuid(),
                name: lrp_name.clone(),
                mac: mac.to_string(),
                networks: networks
                    .split(',')
                    .map(str::trim)
                    .filter(|n| !n.is_empty())
                    .map(String::from)
                    .collect(),
                external_ids: self.vendor_ids(),
                ..Default::default()
            };
            ops.extend(self.create_logical_router_port_op(lr_name, &lrp)?);
        }

        if ops.is_empty() {
            return Ok(());
        }

        self.transact("lrp-lsp-add", ops)
            .await
            .context_with(|| format!("create router type port {} and {}", lsp_name, lrp_name))?;

        info!(switch = ls_name, router = lr_name, "linked logical switch to router");
        Ok(())
    }

    /// Delete both halves of a switch/router link in one transaction.
    /// Missing halves are skipped.
    pub async fn remove_router_type_port(&self, lsp_name: &str, lrp_name: &str) -> Result<()> {
        let mut ops = self.delete_logical_switch_port_op(lsp_name)?;
        ops.extend(self.delete_logical_router_port_op(lrp_name)?);

        self.transact("lrp-lsp-del", ops)
            .await
            .context_with(|| format!("remove router type port {} and {}", lsp_name, lrp_name))
    }

    /// Build an external gateway switch attached to `provider` and link it
    /// to router `lr_name` scheduled on `chassises`.
    ///
    /// `ip` is the router side address with prefix length. Each step is
    /// idempotent so a failed run can simply be repeated.
    pub async fn create_gateway_logical_switch(
        &self,
        ls_name: &str,
        lr_name: &str,
        provider: &str,
        ip: &str,
        mac: &str,
        chassises: &[&str],
    ) -> Result<()> {
        let localnet_name = localnet_port_name(ls_name);
        let lrp_name = format!("{}-{}", lr_name, ls_name);

        self.create_bare_logical_switch(ls_name)
            .await
            .context_with(|| format!("create logical switch {}", ls_name))?;

        if !self.logical_switch_port_exists(&localnet_name)? {
            let lsp = LogicalSwitchPort {
                uuid: new_uuid(),
                name: localnet_name.clone(),
                port_type: "localnet".to_string(),
                addresses: vec!["unknown".to_string()],
                options: BTreeMap::from([("network_name".to_string(), provider.to_string())]),
                external_ids: self.vendor_ids(),
                ..Default::default()
            };
            let ops = self.create_logical_switch_port_op(ls_name, &lsp)?;
            self.transact("lsp-add", ops)
                .await
                .context_with(|| format!("create localnet port {}", localnet_name))?;
        }

        self.create_router_port(ls_name, lr_name, ip, mac).await?;

        self.create_gateway_chassises(&lrp_name, chassises)
            .await
            .context_with(|| {
                format!(
                    "create gateway chassis {:?} for logical router port {}",
                    chassises, lrp_name
                )
            })
    }

    /// Create the configured cluster router and link the node switch
    /// `ls_name` to it on the configured node switch CIDR.
    pub async fn init_cluster_topology(&self, ls_name: &str, gateway: &str) -> Result<()> {
        let lr_name = &self.config().cluster_router;
        let cidr = &self.config().node_switch_cidr;

        self.create_logical_router(lr_name)
            .await
            .context_with(|| format!("create cluster router {}", lr_name))?;
        self.create_logical_switch(ls_name, lr_name, cidr, gateway, true)
            .await
            .context_with(|| format!("create node switch {} on {}", ls_name, cidr))
    }

    /// Tear down a gateway switch created by
    /// [`OvnClient::create_gateway_logical_switch`].
    pub async fn delete_logical_gateway_switch(&self, ls_name: &str, lr_name: &str) -> Result<()> {
        let lsp_name = format!("{}-{}", ls_name, lr_name);
        let lrp_name = format!("{}-{}", lr_name, ls_name);

        self.remove_router_type_port(&lsp_name, &lrp_name).await?;
        self.delete_logical_switch(ls_name).await
    }
}

fn localnet_port_name(ls_name: &str) -> String {
    format!("localnet.{}", ls_name)
}
