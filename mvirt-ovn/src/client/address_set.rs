//! Address set operations.
//!
//! Address sets are shared: ACL matches refer to them by name, so deleting
//! one never touches the ACLs using it.

use std::collections::BTreeMap;

use crate::error::{OvnError, Result, ResultExt};
use crate::model::{AddressSet, external_ids_match};
use crate::store::{Mutation, Operation};

use super::lifecycle::delete_ops;
use super::{OvnClient, new_uuid};

impl OvnClient {
    /// Create an address set tagged with `external_ids` plus the vendor tag.
    pub async fn create_address_set(
        &self,
        as_name: &str,
        external_ids: &BTreeMap<String, String>,
    ) -> Result<()> {
        let mut ids = self.vendor_ids();
        ids.extend(external_ids.iter().map(|(k, v)| (k.clone(), v.clone())));

        let set = AddressSet {
            uuid: new_uuid(),
            name: as_name.to_string(),
            external_ids: ids,
            ..Default::default()
        };

        self.create_if_absent("as-add", set).await.map(|_| ())
    }

    /// Replace the addresses of an existing set.
    pub async fn address_set_update_address(
        &self,
        as_name: &str,
        addresses: &[&str],
    ) -> Result<()> {
        let mut addresses: Vec<String> = addresses
            .iter()
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty())
            .collect();
        addresses.sort();
        addresses.dedup();

        let mutation = |set: &AddressSet| {
            (set.addresses != addresses).then(|| Mutation::assign("addresses", addresses.clone()))
        };
        let ops = self
            .entity_op::<AddressSet>(as_name, &[&mutation])
            .context_with(|| format!("generate operations for updating address set {}", as_name))?;

        self.transact("as-update", ops)
            .await
            .context_with(|| format!("set address set {} addresses {:?}", as_name, addresses))
    }

    pub async fn delete_address_set(&self, as_name: &str) -> Result<()> {
        self.delete_by_name::<AddressSet>("as-del", as_name).await
    }

    /// Delete every address set carrying all tags in `external_ids`, in one
    /// transaction.
    ///
    /// An empty filter would match every set and is rejected.
    pub async fn delete_address_sets(&self, external_ids: &BTreeMap<String, String>) -> Result<()> {
        if external_ids.is_empty() {
            return Err(OvnError::InvalidArgument(
                "refusing to delete address sets without an external ids filter".to_string(),
            ));
        }

        let sets = self.list_address_sets(external_ids)?;
        self.transact("as-del", delete_ops(&sets))
            .await
            .context_with(|| format!("delete address sets with external ids {:?}", external_ids))
    }

    /// List address sets carrying every tag in `external_ids`.
    pub fn list_address_sets(
        &self,
        external_ids: &BTreeMap<String, String>,
    ) -> Result<Vec<AddressSet>> {
        self.where_cache(|set: &AddressSet| external_ids_match(&set.external_ids, external_ids))
    }

    pub fn get_address_set(
        &self,
        as_name: &str,
        ignore_not_found: bool,
    ) -> Result<Option<AddressSet>> {
        self.get_by_name(as_name, ignore_not_found)
    }

    /// Delete operation for the address set named `as_name`, if present.
    pub fn delete_address_set_op(&self, as_name: &str) -> Result<Vec<Operation>> {
        self.delete_op::<AddressSet>(as_name)
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing;
    use super::*;
    use crate::error::ErrorKind;

    fn tags(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn test_update_addresses() {
        let (client, store) = testing::client();
        client.create_address_set("web.allow.v4", &BTreeMap::new()).await.unwrap();

        client
            .address_set_update_address("web.allow.v4", &["10.0.0.2", "10.0.0.1", "10.0.0.2"])
            .await
            .unwrap();
        let set = client.get_address_set("web.allow.v4", false).unwrap().unwrap();
        assert_eq!(set.addresses, vec!["10.0.0.1", "10.0.0.2"]);

        let before = store.transaction_count();
        client
            .address_set_update_address("web.allow.v4", &["10.0.0.1", "10.0.0.2"])
            .await
            .unwrap();
        assert_eq!(store.transaction_count(), before);

        client.address_set_update_address("web.allow.v4", &[]).await.unwrap();
        let set = client.get_address_set("web.allow.v4", false).unwrap().unwrap();
        assert!(set.addresses.is_empty());
    }

    #[tokio::test]
    async fn test_update_missing_address_set() {
        let (client, _store) = testing::client();
        let err = client
            .address_set_update_address("gone", &["10.0.0.1"])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_delete_address_sets_by_tag() {
        let (client, store) = testing::client();
        client.create_address_set("a", &tags(&[("sg", "web")])).await.unwrap();
        client.create_address_set("b", &tags(&[("sg", "web")])).await.unwrap();
        client.create_address_set("c", &tags(&[("sg", "db")])).await.unwrap();
        let before = store.transaction_count();

        client.delete_address_sets(&tags(&[("sg", "web")])).await.unwrap();

        assert_eq!(store.transaction_count(), before + 1);
        let left = client.list_address_sets(&BTreeMap::new()).unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].name, "c");

        let err = client.delete_address_sets(&BTreeMap::new()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        client.delete_address_set("c").await.unwrap();
        client.delete_address_set("c").await.unwrap();
        assert!(client.get_address_set("c", true).unwrap().is_none());
    }
}
