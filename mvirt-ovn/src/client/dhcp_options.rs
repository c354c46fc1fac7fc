//! DHCP options operations.
//!
//! A DHCP options row belongs to one switch and one IP family, recorded in
//! its external ids; it is not referenced from the switch itself.

use std::collections::BTreeMap;

use tracing::info;

use crate::error::{OvnError, Result, ResultExt};
use crate::model::{DhcpOptions, LOGICAL_SWITCH_KEY, Model, PROTOCOL_KEY, external_ids_match};
use crate::store::{Mutation, Operation};

use super::build_mutate_ops;
use super::lifecycle::delete_ops;
use super::{OvnClient, new_uuid};

pub const PROTOCOL_IPV4: &str = "IPv4";
pub const PROTOCOL_IPV6: &str = "IPv6";

fn check_protocol(protocol: &str) -> Result<()> {
    if protocol == PROTOCOL_IPV4 || protocol == PROTOCOL_IPV6 {
        Ok(())
    } else {
        Err(OvnError::InvalidArgument(format!(
            "dhcp options protocol must be {} or {}, got {:?}",
            PROTOCOL_IPV4, PROTOCOL_IPV6, protocol
        )))
    }
}

impl OvnClient {
    /// Create or update the DHCP options of switch `ls_name` for one IP
    /// family, returning the row UUID.
    pub async fn update_dhcp_options(
        &self,
        ls_name: &str,
        cidr: &str,
        protocol: &str,
        options: &BTreeMap<String, String>,
    ) -> Result<String> {
        check_protocol(protocol)?;
        cidr.parse::<ipnet::IpNet>()
            .map_err(|e| OvnError::InvalidArgument(format!("invalid dhcp cidr {}: {}", cidr, e)))?;

        if let Some(existing) = self.get_dhcp_options(ls_name, protocol, true)? {
            let set_cidr =
                |d: &DhcpOptions| (d.cidr != cidr).then(|| Mutation::assign("cidr", cidr));
            let set_options = |d: &DhcpOptions| {
                (d.options != *options).then(|| Mutation::assign("options", options.clone()))
            };
            let ops = build_mutate_ops(Some(&existing), &[&set_cidr, &set_options])?;

            self.transact("dhcp-options-update", ops)
                .await
                .context_with(|| {
                    format!("update {} dhcp options of logical switch {}", protocol, ls_name)
                })?;
            return Ok(existing.uuid().to_string());
        }

        let mut external_ids = self.vendor_ids();
        external_ids.insert(LOGICAL_SWITCH_KEY.to_string(), ls_name.to_string());
        external_ids.insert(PROTOCOL_KEY.to_string(), protocol.to_string());

        let dhcp = DhcpOptions {
            uuid: new_uuid(),
            cidr: cidr.to_string(),
            options: options.clone(),
            external_ids,
        };

        self.transact("dhcp-options-add", vec![Operation::create(&dhcp)])
            .await
            .context_with(|| {
                format!("create {} dhcp options of logical switch {}", protocol, ls_name)
            })?;

        info!(switch = ls_name, protocol, uuid = %dhcp.uuid, "created dhcp options");
        Ok(dhcp.uuid)
    }

    /// Delete the DHCP options of a switch, for one family or all of them.
    pub async fn delete_dhcp_options(&self, ls_name: &str, protocol: Option<&str>) -> Result<()> {
        let mut filter = BTreeMap::from([(LOGICAL_SWITCH_KEY.to_string(), ls_name.to_string())]);
        if let Some(protocol) = protocol {
            check_protocol(protocol)?;
            filter.insert(PROTOCOL_KEY.to_string(), protocol.to_string());
        }

        let rows = self.list_dhcp_options(false, &filter)?;
        self.transact("dhcp-options-del", delete_ops(&rows))
            .await
            .context_with(|| format!("delete dhcp options of logical switch {}", ls_name))
    }

    /// Delete DHCP options rows by UUID. Unknown UUIDs are skipped.
    pub async fn delete_dhcp_options_by_uuids(&self, uuids: &[String]) -> Result<()> {
        if uuids.is_empty() {
            return Ok(());
        }

        let rows = self.where_cache(|d: &DhcpOptions| uuids.contains(&d.uuid))?;
        self.transact("dhcp-options-del", delete_ops(&rows))
            .await
            .context_with(|| format!("delete dhcp options {:?}", uuids))
    }

    /// Resolve the DHCP options of switch `ls_name` for one IP family.
    pub fn get_dhcp_options(
        &self,
        ls_name: &str,
        protocol: &str,
        ignore_not_found: bool,
    ) -> Result<Option<DhcpOptions>> {
        check_protocol(protocol)?;

        let what = format!("{} {}", ls_name, protocol);
        self.resolve(
            &what,
            |d: &DhcpOptions| {
                d.external_ids.get(LOGICAL_SWITCH_KEY).map(String::as_str) == Some(ls_name)
                    && d.external_ids.get(PROTOCOL_KEY).map(String::as_str) == Some(protocol)
            },
            ignore_not_found,
        )
    }

    /// List DHCP options rows, optionally only this vendor's, carrying every
    /// tag in `external_ids`.
    pub fn list_dhcp_options(
        &self,
        vendor_filter: bool,
        external_ids: &BTreeMap<String, String>,
    ) -> Result<Vec<DhcpOptions>> {
        self.where_cache(|d: &DhcpOptions| {
            (!vendor_filter || self.is_own(&d.external_ids))
                && external_ids_match(&d.external_ids, external_ids)
        })
    }
}
