//! Port group operations.

use std::collections::BTreeMap;

use tracing::info;

use crate::error::{Result, ResultExt};
use crate::model::{Acl, LogicalSwitchPort, PortGroup, external_ids_match};
use crate::store::{Mutator, Operation};

use super::lifecycle::delete_ops;
use super::{MutationFn, OvnClient, new_uuid};

impl OvnClient {
    /// Create a port group tagged with `external_ids` plus the vendor tag.
    pub async fn create_port_group(
        &self,
        pg_name: &str,
        external_ids: &BTreeMap<String, String>,
    ) -> Result<()> {
        let mut ids = self.vendor_ids();
        ids.extend(external_ids.iter().map(|(k, v)| (k.clone(), v.clone())));

        let pg = PortGroup {
            uuid: new_uuid(),
            name: pg_name.to_string(),
            external_ids: ids,
            ..Default::default()
        };

        self.create_if_absent("pg-add", pg).await.map(|_| ())
    }

    /// Add or remove switch ports. Ports that no longer exist are skipped;
    /// the group must exist.
    pub async fn port_group_update_ports(
        &self,
        pg_name: &str,
        mutator: Mutator,
        lsp_names: &[&str],
    ) -> Result<()> {
        self.update_children::<PortGroup, LogicalSwitchPort>(
            "pg-ports-update",
            pg_name,
            "ports",
            mutator,
            lsp_names,
        )
        .await
    }

    /// Delete a port group and the ACLs it contains. Missing groups are a
    /// no-op.
    pub async fn delete_port_group(&self, pg_name: &str) -> Result<()> {
        let Some(pg) = self
            .get_port_group(pg_name, true)
            .context_with(|| format!("get port group {} when generate delete operations", pg_name))?
        else {
            return Ok(());
        };

        let acls = self.where_cache(|acl: &Acl| pg.acls.contains(&acl.uuid))?;
        let mut ops = vec![Operation::delete(&pg)];
        ops.extend(delete_ops(&acls));

        self.transact("pg-del", ops)
            .await
            .context_with(|| format!("delete port group {}", pg_name))?;

        info!(name = pg_name, acls = acls.len(), "deleted port group");
        Ok(())
    }

    pub fn get_port_group(
        &self,
        pg_name: &str,
        ignore_not_found: bool,
    ) -> Result<Option<PortGroup>> {
        self.get_by_name(pg_name, ignore_not_found)
    }

    pub fn port_group_exists(&self, pg_name: &str) -> Result<bool> {
        self.exists::<PortGroup>(pg_name)
    }

    /// List port groups carrying every tag in `external_ids`.
    pub fn list_port_groups(
        &self,
        external_ids: &BTreeMap<String, String>,
    ) -> Result<Vec<PortGroup>> {
        self.where_cache(|pg: &PortGroup| external_ids_match(&pg.external_ids, external_ids))
    }

    /// Operations adding ACLs to, or removing them from, a port group.
    pub fn port_group_update_acl_op(
        &self,
        pg_name: &str,
        acl_uuids: &[String],
        mutator: Mutator,
    ) -> Result<Vec<Operation>> {
        self.update_members_op::<PortGroup>(pg_name, "acls", acl_uuids, mutator)
    }

    /// Mutate operations for the port group named `pg_name`, which must exist.
    pub fn port_group_op(
        &self,
        pg_name: &str,
        intents: &[MutationFn<'_, PortGroup>],
    ) -> Result<Vec<Operation>> {
        self.entity_op(pg_name, intents)
    }
}
