//! Logical router policy operations.

use std::collections::BTreeMap;

use crate::error::{OvnError, Result, ResultExt};
use crate::model::{LogicalRouter, LogicalRouterPolicy, Model};
use crate::store::{Mutator, Operation};

use super::lifecycle::{delete_ops, detach_ops};
use super::{OvnClient, new_uuid};

impl OvnClient {
    /// Add a policy to `lr_name` unless one with the same priority and match
    /// exists.
    pub async fn add_logical_router_policy(
        &self,
        lr_name: &str,
        priority: i64,
        match_expr: &str,
        action: &str,
        nexthops: &[&str],
        external_ids: &BTreeMap<String, String>,
    ) -> Result<()> {
        if action == "reroute" && nexthops.is_empty() {
            return Err(OvnError::InvalidArgument(format!(
                "reroute policy {:?} on router {} needs a nexthop",
                match_expr, lr_name
            )));
        }

        self.require::<LogicalRouter>(lr_name)?;
        if self
            .get_logical_router_policy(lr_name, priority, match_expr, true)?
            .is_some()
        {
            return Ok(());
        }

        let mut ids = self.vendor_ids();
        ids.extend(external_ids.iter().map(|(k, v)| (k.clone(), v.clone())));

        let policy = LogicalRouterPolicy {
            uuid: new_uuid(),
            priority,
            match_expr: match_expr.to_string(),
            action: action.to_string(),
            nexthops: nexthops.iter().map(|n| n.to_string()).collect(),
            external_ids: ids,
        };

        let mut ops = vec![Operation::create(&policy)];
        ops.extend(self.logical_router_update_policy_op(
            lr_name,
            &[policy.uuid.clone()],
            Mutator::Insert,
        )?);

        self.transact("lr-policy-add", ops)
            .await
            .context_with(|| {
                format!("add policy {} {:?} to logical router {}", priority, match_expr, lr_name)
            })
    }

    /// Delete the policy with `priority` and `match_expr`. Missing policies
    /// and routers are a no-op.
    pub async fn delete_logical_router_policy(
        &self,
        lr_name: &str,
        priority: i64,
        match_expr: &str,
    ) -> Result<()> {
        let Some(lr) = self.get_logical_router(lr_name, true)? else {
            return Ok(());
        };
        let Some(policy) =
            self.get_logical_router_policy(lr_name, priority, match_expr, true)?
        else {
            return Ok(());
        };

        let mut ops = detach_ops(
            std::slice::from_ref(&lr),
            "policies",
            &[policy.uuid().to_string()],
        )?;
        ops.push(Operation::delete(&policy));

        self.transact("lr-policy-del", ops)
            .await
            .context_with(|| {
                format!(
                    "delete policy {} {:?} from logical router {}",
                    priority, match_expr, lr_name
                )
            })
    }

    /// Delete every policy of `lr_name`, which must exist.
    pub async fn clear_logical_router_policy(&self, lr_name: &str) -> Result<()> {
        let lr = self.require::<LogicalRouter>(lr_name)?;
        let policies = self.where_cache(|p: &LogicalRouterPolicy| lr.policies.contains(&p.uuid))?;
        if policies.is_empty() {
            return Ok(());
        }

        let uuids: Vec<String> = policies.iter().map(|p| p.uuid().to_string()).collect();
        let mut ops = detach_ops(std::slice::from_ref(&lr), "policies", &uuids)?;
        ops.extend(delete_ops(&policies));

        self.transact("lr-policy-clear", ops)
            .await
            .context_with(|| format!("clear policies of logical router {}", lr_name))
    }

    /// Resolve a policy of `lr_name` by priority and match. With
    /// `ignore_not_found` a missing router also yields `None`.
    pub fn get_logical_router_policy(
        &self,
        lr_name: &str,
        priority: i64,
        match_expr: &str,
        ignore_not_found: bool,
    ) -> Result<Option<LogicalRouterPolicy>> {
        let Some(lr) = self.get_logical_router(lr_name, ignore_not_found)? else {
            return Ok(None);
        };

        let what = format!("{} {} {}", lr_name, priority, match_expr);
        self.resolve(
            &what,
            |p: &LogicalRouterPolicy| {
                lr.policies.contains(&p.uuid)
                    && p.priority == priority
                    && p.match_expr == match_expr
            },
            ignore_not_found,
        )
    }
}
