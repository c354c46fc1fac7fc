//! Logical switch operations.

use tracing::info;

use crate::error::{Result, ResultExt};
use crate::model::{Acl, LoadBalancer, LogicalRouterPort, LogicalSwitch, LogicalSwitchPort, Model};
use crate::store::{Mutation, Mutator, Operation};

use super::lifecycle::delete_ops;
use super::{MutationFn, OvnClient, generate_mac, ip_addr_with_mask, new_uuid};

impl OvnClient {
    /// Ensure switch `ls_name` exists and its link to router `lr_name` matches
    /// `need_router`.
    ///
    /// When the switch already exists only the router port networks are
    /// refreshed. With `need_router` the switch/router port pair is created,
    /// otherwise it is removed.
    pub async fn create_logical_switch(
        &self,
        ls_name: &str,
        lr_name: &str,
        cidr_block: &str,
        gateway: &str,
        need_router: bool,
    ) -> Result<()> {
        let lsp_name = format!("{}-{}", ls_name, lr_name);
        let lrp_name = format!("{}-{}", lr_name, ls_name);

        let networks = ip_addr_with_mask(gateway, cidr_block)?;

        if self.logical_switch_exists(ls_name)? {
            if self.logical_router_port_exists(&lrp_name)? {
                let networks: Vec<&str> = networks.split(',').collect();
                self.update_logical_router_port_networks(&lrp_name, &networks)
                    .await
                    .context_with(|| format!("update logical router port {}", lrp_name))?;
            }
        } else {
            self.create_bare_logical_switch(ls_name)
                .await
                .context_with(|| format!("create logical switch {}", ls_name))?;
        }

        if need_router {
            self.create_router_port(ls_name, lr_name, &networks, &generate_mac())
                .await
                .context_with(|| format!("create router type port {} and {}", lsp_name, lrp_name))
        } else {
            self.remove_router_type_port(&lsp_name, &lrp_name)
                .await
                .context_with(|| format!("remove router type port {} and {}", lsp_name, lrp_name))
        }
    }

    /// Create a switch with only the vendor tag set.
    pub async fn create_bare_logical_switch(&self, ls_name: &str) -> Result<()> {
        let ls = LogicalSwitch {
            uuid: new_uuid(),
            name: ls_name.to_string(),
            external_ids: self.vendor_ids(),
            ..Default::default()
        };

        self.create_if_absent("ls-add", ls).await.map(|_| ())
    }

    /// Attach an existing port to a switch. Both must exist.
    pub async fn logical_switch_add_port(&self, ls_name: &str, lsp_name: &str) -> Result<()> {
        self.logical_switch_edit_port("lsp-add", ls_name, lsp_name, Mutator::Insert)
            .await
    }

    /// Detach a port from a switch without deleting it. Both must exist.
    pub async fn logical_switch_del_port(&self, ls_name: &str, lsp_name: &str) -> Result<()> {
        self.logical_switch_edit_port("lsp-del", ls_name, lsp_name, Mutator::Delete)
            .await
    }

    async fn logical_switch_edit_port(
        &self,
        label: &str,
        ls_name: &str,
        lsp_name: &str,
        mutator: Mutator,
    ) -> Result<()> {
        let lsp = self
            .require::<LogicalSwitchPort>(lsp_name)
            .context_with(|| {
                format!("get logical switch port {} when logical switch {} port", lsp_name, mutator)
            })?;

        let ops = self
            .logical_switch_update_port_op(ls_name, &lsp.uuid, mutator)
            .context_with(|| {
                format!(
                    "generate operations for logical switch {} {} port {}",
                    ls_name, mutator, lsp_name
                )
            })?;

        self.transact(label, ops)
            .await
            .context_with(|| format!("{} port {} on logical switch {}", mutator, lsp_name, ls_name))
    }

    /// Attach or detach several load balancers in one transaction.
    ///
    /// Load balancers that no longer exist are skipped; the switch must exist
    /// unless every load balancer is gone.
    pub async fn logical_switch_update_load_balancers(
        &self,
        ls_name: &str,
        mutator: Mutator,
        lb_names: &[&str],
    ) -> Result<()> {
        if lb_names.is_empty() {
            return Ok(());
        }

        let lb_uuids = self.load_balancer_uuids(lb_names)?;
        let ops = self
            .logical_switch_update_load_balancer_op(ls_name, &lb_uuids, mutator)
            .context_with(|| {
                format!(
                    "generate operations for logical switch {} update lbs {:?}",
                    ls_name, lb_names
                )
            })?;

        self.transact("ls-lb-update", ops)
            .await
            .context_with(|| format!("logical switch {} update lbs {:?}", ls_name, lb_names))
    }

    /// Delete a switch together with the ports and ACLs it contains.
    ///
    /// Load balancers are shared and only lose the switch's reference.
    pub async fn delete_logical_switch(&self, ls_name: &str) -> Result<()> {
        let ops = self.delete_logical_switch_op(ls_name)?;
        if ops.is_empty() {
            return Ok(());
        }

        self.transact("ls-del", ops)
            .await
            .context_with(|| format!("delete logical switch {}", ls_name))?;

        info!(name = ls_name, "deleted logical switch");
        Ok(())
    }

    pub fn get_logical_switch(
        &self,
        ls_name: &str,
        ignore_not_found: bool,
    ) -> Result<Option<LogicalSwitch>> {
        self.get_by_name(ls_name, ignore_not_found)
    }

    pub fn logical_switch_exists(&self, ls_name: &str) -> Result<bool> {
        self.exists::<LogicalSwitch>(ls_name)
    }

    /// List switches, optionally only those tagged with this client's vendor.
    pub fn list_logical_switch(&self, vendor_filter: bool) -> Result<Vec<LogicalSwitch>> {
        self.where_cache(|ls: &LogicalSwitch| !vendor_filter || self.is_own(&ls.external_ids))
    }

    /// Operations adding a port UUID to, or removing it from, a switch.
    pub fn logical_switch_update_port_op(
        &self,
        ls_name: &str,
        lsp_uuid: &str,
        mutator: Mutator,
    ) -> Result<Vec<Operation>> {
        if lsp_uuid.is_empty() {
            return Ok(Vec::new());
        }

        self.update_members_op::<LogicalSwitch>(ls_name, "ports", &[lsp_uuid.to_string()], mutator)
    }

    /// Operations adding load balancers to, or removing them from, a switch.
    pub fn logical_switch_update_load_balancer_op(
        &self,
        ls_name: &str,
        lb_uuids: &[String],
        mutator: Mutator,
    ) -> Result<Vec<Operation>> {
        self.update_members_op::<LogicalSwitch>(ls_name, "load_balancer", lb_uuids, mutator)
    }

    /// Operations adding ACLs to, or removing them from, a switch.
    pub fn logical_switch_update_acl_op(
        &self,
        ls_name: &str,
        acl_uuids: &[String],
        mutator: Mutator,
    ) -> Result<Vec<Operation>> {
        self.update_members_op::<LogicalSwitch>(ls_name, "acls", acl_uuids, mutator)
    }

    /// Mutate operations for the switch named `ls_name`, which must exist.
    pub fn logical_switch_op(
        &self,
        ls_name: &str,
        intents: &[MutationFn<'_, LogicalSwitch>],
    ) -> Result<Vec<Operation>> {
        self.entity_op(ls_name, intents)
    }

    fn delete_logical_switch_op(&self, ls_name: &str) -> Result<Vec<Operation>> {
        let Some(ls) = self
            .get_logical_switch(ls_name, true)
            .context_with(|| {
                format!("get logical switch {} when generate delete operations", ls_name)
            })?
        else {
            return Ok(Vec::new());
        };

        let ports = self.where_cache(|lsp: &LogicalSwitchPort| ls.ports.contains(&lsp.uuid))?;
        let acls = self.where_cache(|acl: &Acl| ls.acls.contains(&acl.uuid))?;

        let port_uuids: Vec<String> = ports.iter().map(|lsp| lsp.uuid.clone()).collect();
        let mut ops = self.port_group_detach_ports_op(&port_uuids)?;
        ops.push(Operation::delete(&ls));
        ops.extend(delete_ops(&ports));
        ops.extend(delete_ops(&acls));
        Ok(ops)
    }
}

impl LogicalSwitch {
    /// Whether the switch references the given load balancer.
    pub fn has_load_balancer(&self, lb: &LoadBalancer) -> bool {
        self.load_balancer.iter().any(|uuid| uuid == lb.uuid())
    }

    /// Whether the switch is linked to a router through `lrp`.
    pub fn is_linked_to(&self, ports: &[LogicalSwitchPort], lrp: &LogicalRouterPort) -> bool {
        ports.iter().any(|lsp| {
            self.ports.contains(&lsp.uuid)
                && lsp.port_type == "router"
                && lsp.options.get("router-port") == Some(&lrp.name)
        })
    }

    /// Rename intent usable with [`OvnClient::logical_switch_op`].
    pub fn rename(name: &str) -> impl Fn(&LogicalSwitch) -> Option<Mutation> + '_ {
        move |ls: &LogicalSwitch| (ls.name != name).then(|| Mutation::assign("name", name))
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing;
    use super::*;
    use crate::error::ErrorKind;
    use crate::model::LogicalRouter;
    use crate::store::Table;

    #[tokio::test]
    async fn test_create_bare_logical_switch_twice() {
        let (client, store) = testing::client();

        client.create_bare_logical_switch("sw1").await.unwrap();
        client.create_bare_logical_switch("sw1").await.unwrap();

        assert_eq!(store.transaction_count(), 1);
        let switches = client.list_logical_switch(true).unwrap();
        assert_eq!(switches.len(), 1);
        assert_eq!(switches[0].name, "sw1");
    }

    #[tokio::test]
    async fn test_list_logical_switch_vendor_filter() {
        let (client, store) = testing::client();
        client.create_bare_logical_switch("ours").await.unwrap();
        let foreign = LogicalSwitch {
            uuid: new_uuid(),
            name: "theirs".into(),
            ..Default::default()
        };
        crate::store::Store::transact(store.as_ref(), vec![Operation::create(&foreign)])
            .await
            .unwrap();

        assert_eq!(client.list_logical_switch(false).unwrap().len(), 2);
        let own = client.list_logical_switch(true).unwrap();
        assert_eq!(own.len(), 1);
        assert_eq!(own[0].name, "ours");
    }

    #[tokio::test]
    async fn test_add_and_del_port() {
        let (client, _store) = testing::client();
        client.create_bare_logical_switch("sw1").await.unwrap();
        client
            .create_bare_logical_switch_port("sw1", "vm1", "10.0.0.5", "52:54:00:00:00:01")
            .await
            .unwrap();
        let lsp = client.get_logical_switch_port("vm1", false).unwrap().unwrap();

        client.logical_switch_del_port("sw1", "vm1").await.unwrap();
        let ls = client.get_logical_switch("sw1", false).unwrap().unwrap();
        assert!(ls.ports.is_empty());
        assert!(client.logical_switch_port_exists("vm1").unwrap());

        client.logical_switch_add_port("sw1", "vm1").await.unwrap();
        let ls = client.get_logical_switch("sw1", false).unwrap().unwrap();
        assert_eq!(ls.ports, vec![lsp.uuid]);
    }

    #[tokio::test]
    async fn test_add_port_requires_port() {
        let (client, _store) = testing::client();
        client.create_bare_logical_switch("sw1").await.unwrap();

        let err = client.logical_switch_add_port("sw1", "ghost").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_update_load_balancers_skips_missing() {
        let (client, store) = testing::client();
        client.create_bare_logical_switch("sw1").await.unwrap();
        client.create_load_balancer("lb1", "tcp", None).await.unwrap();
        let lb1 = client.get_load_balancer("lb1", false).unwrap().unwrap();

        client
            .logical_switch_update_load_balancers("sw1", Mutator::Insert, &["lb1", "gone"])
            .await
            .unwrap();
        let ls = client.get_logical_switch("sw1", false).unwrap().unwrap();
        assert!(ls.has_load_balancer(&lb1));
        assert_eq!(ls.load_balancer.len(), 1);

        // Nothing resolvable means nothing submitted
        let before = store.transaction_count();
        client
            .logical_switch_update_load_balancers("sw1", Mutator::Delete, &["gone"])
            .await
            .unwrap();
        assert_eq!(store.transaction_count(), before);
    }

    #[tokio::test]
    async fn test_update_load_balancers_requires_switch() {
        let (client, _store) = testing::client();
        client.create_load_balancer("lb1", "tcp", None).await.unwrap();

        let err = client
            .logical_switch_update_load_balancers("sw1", Mutator::Insert, &["lb1"])
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_delete_logical_switch_removes_contained_ports() {
        let (client, store) = testing::client();
        client.create_bare_logical_switch("sw1").await.unwrap();
        client
            .create_bare_logical_switch_port("sw1", "vm1", "10.0.0.5", "52:54:00:00:00:01")
            .await
            .unwrap();
        client.create_load_balancer("lb1", "tcp", None).await.unwrap();
        client
            .logical_switch_update_load_balancers("sw1", Mutator::Insert, &["lb1"])
            .await
            .unwrap();
        client.create_port_group("web", &Default::default()).await.unwrap();
        client
            .port_group_update_ports("web", Mutator::Insert, &["vm1"])
            .await
            .unwrap();

        client.delete_logical_switch("sw1").await.unwrap();
        client.delete_logical_switch("sw1").await.unwrap();

        assert_eq!(store.row_count(Table::LogicalSwitch).unwrap(), 0);
        assert_eq!(store.row_count(Table::LogicalSwitchPort).unwrap(), 0);
        assert!(client.load_balancer_exists("lb1").unwrap());
        let pg = client.get_port_group("web", false).unwrap().unwrap();
        assert!(pg.ports.is_empty());
    }

    #[tokio::test]
    async fn test_create_logical_switch_with_router() {
        let (client, _store) = testing::client();
        client.create_logical_router("ovn-cluster").await.unwrap();

        client
            .create_logical_switch("sw1", "ovn-cluster", "10.16.0.0/16", "10.16.0.1", true)
            .await
            .unwrap();

        let ls = client.get_logical_switch("sw1", false).unwrap().unwrap();
        let lsp = client.get_logical_switch_port("sw1-ovn-cluster", false).unwrap().unwrap();
        let lrp = client.get_logical_router_port("ovn-cluster-sw1", false).unwrap().unwrap();
        let lr: LogicalRouter = client.get_logical_router("ovn-cluster", false).unwrap().unwrap();
        assert!(ls.is_linked_to(&[lsp], &lrp));
        assert_eq!(lrp.networks, vec!["10.16.0.1/16"]);
        assert_eq!(lr.ports, vec![lrp.uuid.clone()]);

        // Re-running with a new gateway refreshes the router port in place
        client
            .create_logical_switch("sw1", "ovn-cluster", "10.16.0.0/16", "10.16.0.254", true)
            .await
            .unwrap();
        let lrp = client.get_logical_router_port("ovn-cluster-sw1", false).unwrap().unwrap();
        assert_eq!(lrp.networks, vec!["10.16.0.254/16"]);
    }

    #[tokio::test]
    async fn test_create_logical_switch_without_router_removes_link() {
        let (client, store) = testing::client();
        client.create_logical_router("ovn-cluster").await.unwrap();
        client
            .create_logical_switch("sw1", "ovn-cluster", "10.16.0.0/16", "10.16.0.1", true)
            .await
            .unwrap();

        client
            .create_logical_switch("sw1", "ovn-cluster", "10.16.0.0/16", "10.16.0.1", false)
            .await
            .unwrap();

        let ls = client.get_logical_switch("sw1", false).unwrap().unwrap();
        assert!(ls.ports.is_empty());
        assert_eq!(store.row_count(Table::LogicalRouterPort).unwrap(), 0);
        let lr = client.get_logical_router("ovn-cluster", false).unwrap().unwrap();
        assert!(lr.ports.is_empty());
    }

    #[tokio::test]
    async fn test_logical_switch_op_rename() {
        let (client, _store) = testing::client();
        client.create_bare_logical_switch("sw1").await.unwrap();

        let rename = LogicalSwitch::rename("sw2");
        let ops = client.logical_switch_op("sw1", &[&rename]).unwrap();
        client.transact("ls-update", ops).await.unwrap();

        assert!(!client.logical_switch_exists("sw1").unwrap());
        assert!(client.logical_switch_exists("sw2").unwrap());

        let rename = LogicalSwitch::rename("sw2");
        assert!(client.logical_switch_op("sw2", &[&rename]).unwrap().is_empty());
    }
}
