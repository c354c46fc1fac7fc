//! NAT rule operations.
//!
//! NAT rules are contained by a router's `nat` set; lookups are always
//! scoped to that set.

use crate::error::{OvnError, Result, ResultExt};
use crate::model::{LogicalRouter, Model, Nat};
use crate::store::{Mutation, Mutator, Operation};

use super::build_mutate_ops;
use super::lifecycle::{delete_ops, detach_ops};
use super::{OvnClient, new_uuid};

pub const NAT_TYPE_SNAT: &str = "snat";
pub const NAT_TYPE_DNAT: &str = "dnat";
pub const NAT_TYPE_DNAT_AND_SNAT: &str = "dnat_and_snat";

impl OvnClient {
    /// Add a NAT rule to `lr_name` unless an equivalent one exists.
    pub async fn add_nat(
        &self,
        lr_name: &str,
        nat_type: &str,
        external_ip: &str,
        logical_ip: &str,
        logical_port: Option<&str>,
        external_mac: Option<&str>,
    ) -> Result<()> {
        if ![NAT_TYPE_SNAT, NAT_TYPE_DNAT, NAT_TYPE_DNAT_AND_SNAT].contains(&nat_type) {
            return Err(OvnError::InvalidArgument(format!("invalid nat type {:?}", nat_type)));
        }
        if external_ip.is_empty() || logical_ip.is_empty() {
            return Err(OvnError::InvalidArgument(format!(
                "{} rule on router {} needs both external and logical ip",
                nat_type, lr_name
            )));
        }

        self.require::<LogicalRouter>(lr_name)?;
        if self.get_nat(lr_name, nat_type, external_ip, logical_ip, true)?.is_some() {
            return Ok(());
        }

        let nat = Nat {
            uuid: new_uuid(),
            nat_type: nat_type.to_string(),
            external_ip: external_ip.to_string(),
            logical_ip: logical_ip.to_string(),
            logical_port: logical_port.filter(|p| !p.is_empty()).map(String::from),
            external_mac: external_mac.filter(|m| !m.is_empty()).map(String::from),
            external_ids: self.vendor_ids(),
        };

        let mut ops = vec![Operation::create(&nat)];
        ops.extend(
            self.logical_router_update_nat_op(lr_name, &[nat.uuid.clone()], Mutator::Insert)
                .context_with(|| {
                    format!("generate operations for logical router {} add nat", lr_name)
                })?,
        );

        self.transact("nat-add", ops)
            .await
            .context_with(|| {
                format!(
                    "add {} nat {} -> {} to logical router {}",
                    nat_type, logical_ip, external_ip, lr_name
                )
            })
    }

    /// Ensure the SNAT rule for `logical_ip` translates to `external_ip`.
    pub async fn update_snat(
        &self,
        lr_name: &str,
        external_ip: &str,
        logical_ip: &str,
    ) -> Result<()> {
        let Some(nat) = self.get_nat(lr_name, NAT_TYPE_SNAT, "", logical_ip, true)? else {
            return self
                .add_nat(lr_name, NAT_TYPE_SNAT, external_ip, logical_ip, None, None)
                .await;
        };

        let mutation = |nat: &Nat| {
            (nat.external_ip != external_ip).then(|| Mutation::assign("external_ip", external_ip))
        };
        let ops = build_mutate_ops(Some(&nat), &[&mutation])?;

        self.transact("nat-update", ops)
            .await
            .context_with(|| {
                format!(
                    "update snat {} -> {} on logical router {}",
                    logical_ip, external_ip, lr_name
                )
            })
    }

    /// Ensure the DNAT_AND_SNAT rule for `external_ip` maps to `logical_ip`,
    /// optionally distributed through `logical_port` with `external_mac`.
    pub async fn update_dnat_and_snat(
        &self,
        lr_name: &str,
        external_ip: &str,
        logical_ip: &str,
        logical_port: Option<&str>,
        external_mac: Option<&str>,
    ) -> Result<()> {
        let Some(nat) = self.get_nat(lr_name, NAT_TYPE_DNAT_AND_SNAT, external_ip, "", true)? else {
            return self
                .add_nat(
                    lr_name,
                    NAT_TYPE_DNAT_AND_SNAT,
                    external_ip,
                    logical_ip,
                    logical_port,
                    external_mac,
                )
                .await;
        };

        let logical_port = logical_port.filter(|p| !p.is_empty()).map(String::from);
        let external_mac = external_mac.filter(|m| !m.is_empty()).map(String::from);

        let set_logical_ip = |nat: &Nat| {
            (nat.logical_ip != logical_ip).then(|| Mutation::assign("logical_ip", logical_ip))
        };
        let set_logical_port = |nat: &Nat| {
            (nat.logical_port != logical_port)
                .then(|| Mutation::assign("logical_port", logical_port.clone()))
        };
        let set_external_mac = |nat: &Nat| {
            (nat.external_mac != external_mac)
                .then(|| Mutation::assign("external_mac", external_mac.clone()))
        };
        let ops = build_mutate_ops(
            Some(&nat),
            &[&set_logical_ip, &set_logical_port, &set_external_mac],
        )?;

        self.transact("nat-update", ops).await.context_with(|| {
            format!(
                "update dnat_and_snat {} -> {} on logical router {}",
                external_ip, logical_ip, lr_name
            )
        })
    }

    /// Delete the router's NAT rules, optionally narrowed by type and
    /// logical IP. A missing router is a no-op.
    pub async fn delete_nats(
        &self,
        lr_name: &str,
        nat_type: Option<&str>,
        logical_ip: Option<&str>,
    ) -> Result<()> {
        let Some(lr) = self.get_logical_router(lr_name, true)? else {
            return Ok(());
        };

        let nats = self.where_cache(|nat: &Nat| {
            lr.nat.contains(&nat.uuid)
                && nat_type.is_none_or(|t| nat.nat_type == t)
                && logical_ip.is_none_or(|ip| nat.logical_ip == ip)
        })?;
        if nats.is_empty() {
            return Ok(());
        }

        let uuids: Vec<String> = nats.iter().map(|nat| nat.uuid().to_string()).collect();
        let mut ops = detach_ops(std::slice::from_ref(&lr), "nat", &uuids)?;
        ops.extend(delete_ops(&nats));

        self.transact("nat-del", ops)
            .await
            .context_with(|| format!("delete nats from logical router {}", lr_name))
    }

    /// Resolve a NAT rule of `lr_name` by type and IPs. An empty IP matches
    /// any value.
    ///
    /// With `ignore_not_found` a missing router also yields `None`.
    pub fn get_nat(
        &self,
        lr_name: &str,
        nat_type: &str,
        external_ip: &str,
        logical_ip: &str,
        ignore_not_found: bool,
    ) -> Result<Option<Nat>> {
        let Some(lr) = self.get_logical_router(lr_name, ignore_not_found)? else {
            return Ok(None);
        };

        let what = format!("{} {} {} {}", lr_name, nat_type, external_ip, logical_ip);
        self.resolve(
            &what,
            |nat: &Nat| {
                lr.nat.contains(&nat.uuid)
                    && nat.nat_type == nat_type
                    && (external_ip.is_empty() || nat.external_ip == external_ip)
                    && (logical_ip.is_empty() || nat.logical_ip == logical_ip)
            },
            ignore_not_found,
        )
    }

    /// Routers holding a NAT rule, for callers cleaning up by rule.
    pub fn nat_owners(&self, nat: &Nat) -> Result<Vec<LogicalRouter>> {
        self.where_cache(|lr: &LogicalRouter| lr.nat.contains(&nat.uuid))
    }
}
