//! ACL operations.
//!
//! ACLs are contained by a port group or a switch and have no usable name.
//! They are identified by a `parent` tag plus direction, priority and match.

use std::collections::BTreeMap;

use crate::error::{Result, ResultExt};
use crate::model::{Acl, LogicalSwitch, Model, PARENT_KEY, PortGroup, external_ids_match};
use crate::store::{Mutator, Operation};

use super::lifecycle::{delete_ops, detach_ops};
use super::{OvnClient, new_uuid};

/// Kind of row owning a set of ACLs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AclParent {
    PortGroup,
    LogicalSwitch,
}

impl std::fmt::Display for AclParent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AclParent::PortGroup => f.write_str("port group"),
            AclParent::LogicalSwitch => f.write_str("logical switch"),
        }
    }
}

impl OvnClient {
    /// Build an ACL owned by `parent`. Nothing is written.
    pub fn new_acl(
        &self,
        parent: &str,
        direction: &str,
        priority: i64,
        match_expr: &str,
        action: &str,
    ) -> Acl {
        let mut external_ids = self.vendor_ids();
        external_ids.insert(PARENT_KEY.to_string(), parent.to_string());

        Acl {
            uuid: new_uuid(),
            direction: direction.to_string(),
            priority,
            match_expr: match_expr.to_string(),
            action: action.to_string(),
            external_ids,
            ..Default::default()
        }
    }

    /// Create `acls` and attach them to `parent` in one transaction.
    ///
    /// ACLs equivalent to an existing one (same parent, direction, priority
    /// and match) are skipped. The parent must exist.
    pub async fn create_acls(
        &self,
        parent: &str,
        parent_kind: AclParent,
        acls: Vec<Acl>,
    ) -> Result<()> {
        let mut ops = Vec::with_capacity(acls.len() + 1);
        let mut uuids: Vec<String> = Vec::with_capacity(acls.len());
        let mut seen = Vec::with_capacity(acls.len());

        for mut acl in acls {
            let key = (acl.direction.clone(), acl.priority, acl.match_expr.clone());
            if seen.contains(&key) {
                continue;
            }
            if self
                .get_acl(parent, &acl.direction, acl.priority, &acl.match_expr, true)?
                .is_some()
            {
                continue;
            }
            seen.push(key);

            acl.external_ids.insert(PARENT_KEY.to_string(), parent.to_string());
            ops.push(Operation::create(&acl));
            uuids.push(acl.uuid().to_string());
        }

        if uuids.is_empty() {
            return Ok(());
        }

        let attach = match parent_kind {
            AclParent::PortGroup => self.port_group_update_acl_op(parent, &uuids, Mutator::Insert),
            AclParent::LogicalSwitch => {
                self.logical_switch_update_acl_op(parent, &uuids, Mutator::Insert)
            }
        }
        .context_with(|| format!("generate operations for {} {} add acls", parent_kind, parent))?;
        ops.extend(attach);

        self.transact("acl-add", ops)
            .await
            .context_with(|| format!("add acls to {} {}", parent_kind, parent))
    }

    /// Delete the ACLs of `parent`, optionally only those in `direction`,
    /// detaching them in the same transaction.
    pub async fn delete_acls(
        &self,
        parent: &str,
        parent_kind: AclParent,
        direction: Option<&str>,
    ) -> Result<()> {
        let filter = BTreeMap::from([(PARENT_KEY.to_string(), parent.to_string())]);
        let acls = self.list_acls(direction, &filter)?;
        if acls.is_empty() {
            return Ok(());
        }

        let uuids: Vec<String> = acls.iter().map(|acl| acl.uuid().to_string()).collect();
        let mut ops = match parent_kind {
            AclParent::PortGroup => {
                let owners = self.where_cache(|pg: &PortGroup| pg.name == parent)?;
                detach_ops(&owners, "acls", &uuids)?
            }
            AclParent::LogicalSwitch => {
                let owners = self.where_cache(|ls: &LogicalSwitch| ls.name == parent)?;
                detach_ops(&owners, "acls", &uuids)?
            }
        };
        ops.extend(delete_ops(&acls));

        self.transact("acl-del", ops)
            .await
            .context_with(|| format!("delete acls from {} {}", parent_kind, parent))
    }

    /// Resolve the ACL of `parent` with the given direction, priority and
    /// match.
    pub fn get_acl(
        &self,
        parent: &str,
        direction: &str,
        priority: i64,
        match_expr: &str,
        ignore_not_found: bool,
    ) -> Result<Option<Acl>> {
        let what = format!("{} {} {} {}", parent, direction, priority, match_expr);
        self.resolve(
            &what,
            |acl: &Acl| {
                acl.external_ids.get(PARENT_KEY).map(String::as_str) == Some(parent)
                    && acl.direction == direction
                    && acl.priority == priority
                    && acl.match_expr == match_expr
            },
            ignore_not_found,
        )
    }

    /// List ACLs carrying every tag in `external_ids`, optionally restricted
    /// to one direction.
    pub fn list_acls(
        &self,
        direction: Option<&str>,
        external_ids: &BTreeMap<String, String>,
    ) -> Result<Vec<Acl>> {
        self.where_cache(|acl: &Acl| {
            direction.is_none_or(|d| acl.direction == d)
                && external_ids_match(&acl.external_ids, external_ids)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing;
    use super::*;
    use crate::error::ErrorKind;
    use crate::store::Table;

    #[tokio::test]
    async fn test_create_acls_on_port_group() {
        let (client, store) = testing::client();
        client.create_port_group("web", &BTreeMap::new()).await.unwrap();

        let acls = vec![
            client.new_acl("web", "to-lport", 1000, "tcp.dst == 80", "allow-related"),
            client.new_acl("web", "to-lport", 1000, "tcp.dst == 80", "allow-related"),
            client.new_acl("web", "from-lport", 900, "ip4", "allow-related"),
        ];
        client.create_acls("web", AclParent::PortGroup, acls).await.unwrap();

        let pg = client.get_port_group("web", false).unwrap().unwrap();
        assert_eq!(pg.acls.len(), 2);
        assert_eq!(store.row_count(Table::Acl).unwrap(), 2);

        // Equivalent ACLs are not created again
        let before = store.transaction_count();
        let again = vec![client.new_acl("web", "to-lport", 1000, "tcp.dst == 80", "drop")];
        client.create_acls("web", AclParent::PortGroup, again).await.unwrap();
        assert_eq!(store.transaction_count(), before);

        let acl = client
            .get_acl("web", "to-lport", 1000, "tcp.dst == 80", false)
            .unwrap()
            .unwrap();
        assert_eq!(acl.action, "allow-related");
    }

    #[tokio::test]
    async fn test_create_acls_retags_foreign_parent() {
        let (client, store) = testing::client();
        client.create_port_group("web", &BTreeMap::new()).await.unwrap();

        for _ in 0..2 {
            let acl = client.new_acl("db", "to-lport", 1000, "tcp.dst == 5432", "drop");
            client.create_acls("web", AclParent::PortGroup, vec![acl]).await.unwrap();
        }

        assert_eq!(store.row_count(Table::Acl).unwrap(), 1);
        let acl = client
            .get_acl("web", "to-lport", 1000, "tcp.dst == 5432", false)
            .unwrap()
            .unwrap();
        assert_eq!(acl.external_ids.get(PARENT_KEY).map(String::as_str), Some("web"));
    }

    #[tokio::test]
    async fn test_create_acls_requires_parent() {
        let (client, store) = testing::client();
        let acl = client.new_acl("sw1", "to-lport", 1000, "ip4", "drop");

        let err = client
            .create_acls("sw1", AclParent::LogicalSwitch, vec![acl])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(store.row_count(Table::Acl).unwrap(), 0);
    }

    #[tokio::test]
    async fn test_delete_acls_by_direction() {
        let (client, store) = testing::client();
        client.create_bare_logical_switch("sw1").await.unwrap();
        let acls = vec![
            client.new_acl("sw1", "to-lport", 1000, "ip4", "drop"),
            client.new_acl("sw1", "from-lport", 1000, "ip4", "drop"),
        ];
        client.create_acls("sw1", AclParent::LogicalSwitch, acls).await.unwrap();

        client
            .delete_acls("sw1", AclParent::LogicalSwitch, Some("to-lport"))
            .await
            .unwrap();

        let ls = client.get_logical_switch("sw1", false).unwrap().unwrap();
        assert_eq!(ls.acls.len(), 1);
        let left = client.list_acls(None, &BTreeMap::new()).unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].direction, "from-lport");

        client.delete_acls("sw1", AclParent::LogicalSwitch, None).await.unwrap();
        let before = store.transaction_count();
        client.delete_acls("sw1", AclParent::LogicalSwitch, None).await.unwrap();
        assert_eq!(store.transaction_count(), before);
        assert!(client.get_logical_switch("sw1", false).unwrap().unwrap().acls.is_empty());
    }
}
