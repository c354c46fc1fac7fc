//! Logical switch port operations.

use std::collections::BTreeMap;

use tracing::info;

use crate::error::{Result, ResultExt};
use crate::model::{LogicalSwitch, LogicalSwitchPort, PortGroup, external_ids_match};
use crate::store::{Mutation, Mutator, Operation};

use super::lifecycle::detach_ops;
use super::{OvnClient, new_uuid};

impl OvnClient {
    /// Create a VIF port addressed `"<mac> <ip>"` and attach it to `ls_name`
    /// in one transaction. An existing port of that name is left alone.
    pub async fn create_bare_logical_switch_port(
        &self,
        ls_name: &str,
        lsp_name: &str,
        ip: &str,
        mac: &str,
    ) -> Result<()> {
        if self.logical_switch_port_exists(lsp_name)? {
            return Ok(());
        }

        let address = [mac, ip]
            .iter()
            .filter(|s| !s.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join(" ");

        let mut external_ids = self.vendor_ids();
        external_ids.insert(crate::model::LOGICAL_SWITCH_KEY.to_string(), ls_name.to_string());

        let lsp = LogicalSwitchPort {
            uuid: new_uuid(),
            name: lsp_name.to_string(),
            addresses: vec![address],
            external_ids,
            ..Default::default()
        };

        let ops = self
            .create_logical_switch_port_op(ls_name, &lsp)
            .context_with(|| {
                format!("generate operations for creating logical switch port {}", lsp_name)
            })?;

        self.transact("lsp-add", ops)
            .await
            .context_with(|| format!("create logical switch port {}", lsp_name))?;

        info!(switch = ls_name, port = lsp_name, uuid = %lsp.uuid, "created logical switch port");
        Ok(())
    }

    /// Operations creating `lsp` and attaching it to the switch, which must
    /// exist.
    pub fn create_logical_switch_port_op(
        &self,
        ls_name: &str,
        lsp: &LogicalSwitchPort,
    ) -> Result<Vec<Operation>> {
        let mut ops = vec![Operation::create(lsp)];
        ops.extend(self.logical_switch_update_port_op(ls_name, &lsp.uuid, Mutator::Insert)?);
        Ok(ops)
    }

    /// Enable or disable port security.
    ///
    /// When enabled the port only accepts traffic from `mac` and `ips`;
    /// disabling clears the column.
    pub async fn set_logical_switch_port_security(
        &self,
        lsp_name: &str,
        enabled: bool,
        mac: &str,
        ips: &[&str],
    ) -> Result<()> {
        let port_security = if enabled {
            let mut entry = vec![mac];
            entry.extend(ips.iter().copied().filter(|ip| !ip.is_empty()));
            vec![entry.join(" ")]
        } else {
            Vec::new()
        };

        let mutation = |lsp: &LogicalSwitchPort| {
            (lsp.port_security != port_security)
                .then(|| Mutation::assign("port_security", port_security.clone()))
        };
        let ops = self
            .entity_op::<LogicalSwitchPort>(lsp_name, &[&mutation])
            .context_with(|| {
                format!("generate operations for logical switch port {} security", lsp_name)
            })?;

        self.transact("lsp-update", ops)
            .await
            .context_with(|| format!("set logical switch port {} security", lsp_name))
    }

    /// Merge `external_ids` into the port's tags, overwriting values of
    /// existing keys.
    pub async fn set_logical_switch_port_external_ids(
        &self,
        lsp_name: &str,
        external_ids: &BTreeMap<String, String>,
    ) -> Result<()> {
        if external_ids.is_empty() {
            return Ok(());
        }

        let mutation = |lsp: &LogicalSwitchPort| {
            let mut merged = lsp.external_ids.clone();
            merged.extend(external_ids.iter().map(|(k, v)| (k.clone(), v.clone())));
            (merged != lsp.external_ids).then(|| Mutation::assign("external_ids", merged))
        };
        let ops = self
            .entity_op::<LogicalSwitchPort>(lsp_name, &[&mutation])
            .context_with(|| {
                format!("generate operations for logical switch port {} external ids", lsp_name)
            })?;

        self.transact("lsp-update", ops)
            .await
            .context_with(|| {
                format!("set logical switch port {} external ids {:?}", lsp_name, external_ids)
            })
    }

    /// Detach the port from every switch referencing it and delete it, in one
    /// transaction. A missing port is a no-op.
    pub async fn delete_logical_switch_port(&self, lsp_name: &str) -> Result<()> {
        let ops = self.delete_logical_switch_port_op(lsp_name)?;

        self.transact("lsp-del", ops)
            .await
            .context_with(|| format!("delete logical switch port {}", lsp_name))
    }

    pub fn get_logical_switch_port(
        &self,
        lsp_name: &str,
        ignore_not_found: bool,
    ) -> Result<Option<LogicalSwitchPort>> {
        self.get_by_name(lsp_name, ignore_not_found)
    }

    pub fn logical_switch_port_exists(&self, lsp_name: &str) -> Result<bool> {
        self.exists::<LogicalSwitchPort>(lsp_name)
    }

    /// List ports, optionally restricted to this client's vendor and to ports
    /// carrying every tag in `external_ids`.
    pub fn list_logical_switch_ports(
        &self,
        vendor_filter: bool,
        external_ids: &BTreeMap<String, String>,
    ) -> Result<Vec<LogicalSwitchPort>> {
        self.where_cache(|lsp: &LogicalSwitchPort| {
            (!vendor_filter || self.is_own(&lsp.external_ids))
                && external_ids_match(&lsp.external_ids, external_ids)
        })
    }

    pub(crate) fn delete_logical_switch_port_op(&self, lsp_name: &str) -> Result<Vec<Operation>> {
        let Some(lsp) = self
            .get_logical_switch_port(lsp_name, true)
            .context_with(|| {
                format!("get logical switch port {} when generate delete operations", lsp_name)
            })?
        else {
            return Ok(Vec::new());
        };

        let owners = self.where_cache(|ls: &LogicalSwitch| ls.ports.contains(&lsp.uuid))?;
        let uuids = std::slice::from_ref(&lsp.uuid);
        let mut ops = detach_ops(&owners, "ports", uuids)?;
        ops.extend(self.port_group_detach_ports_op(uuids)?);
        ops.push(Operation::delete(&lsp));
        Ok(ops)
    }

    /// Operations removing the given port UUIDs from every port group that
    /// holds one of them.
    pub(crate) fn port_group_detach_ports_op(
        &self,
        lsp_uuids: &[String],
    ) -> Result<Vec<Operation>> {
        let groups = self.where_cache(|pg: &PortGroup| {
            pg.ports.iter().any(|uuid| lsp_uuids.contains(uuid))
        })?;
        detach_ops(&groups, "ports", lsp_uuids)
    }
}
