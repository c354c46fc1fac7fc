//! Gateway chassis operations.

use crate::error::{Result, ResultExt};
use crate::model::{GatewayChassis, LogicalRouterPort, Model};
use crate::store::{Mutation, Mutator, Operation};

use super::lifecycle::detach_ops;
use super::{OvnClient, new_uuid};

/// Priority of the first chassis; later chassis get descending priorities.
const MAX_GATEWAY_CHASSIS_PRIORITY: i64 = 100;

impl OvnClient {
    /// Schedule router port `lrp_name` on `chassises`, in failover order.
    ///
    /// Each binding is named `<lrp>-<chassis>`. Existing bindings are kept;
    /// new ones are created and attached in one transaction.
    pub async fn create_gateway_chassises(&self, lrp_name: &str, chassises: &[&str]) -> Result<()> {
        if chassises.is_empty() {
            return Ok(());
        }

        let mut ops = Vec::new();
        let mut uuids = Vec::new();
        for (i, chassis) in chassises.iter().enumerate() {
            let name = gateway_chassis_name(lrp_name, chassis);
            if self.exists::<GatewayChassis>(&name)? {
                continue;
            }

            let gc = GatewayChassis {
                uuid: new_uuid(),
                name,
                chassis_name: chassis.to_string(),
                priority: MAX_GATEWAY_CHASSIS_PRIORITY - i as i64,
                external_ids: self.vendor_ids(),
            };
            ops.push(Operation::create(&gc));
            uuids.push(gc.uuid);
        }

        if uuids.is_empty() {
            return Ok(());
        }

        let attach =
            |_: &LogicalRouterPort| Mutation::members("gateway_chassis", &uuids, Mutator::Insert);
        ops.extend(
            self.entity_op::<LogicalRouterPort>(lrp_name, &[&attach])
                .context_with(|| {
                    format!(
                        "generate operations for logical router port {} add gateway chassis",
                        lrp_name
                    )
                })?,
        );

        self.transact("gateway-chassis-add", ops)
            .await
            .context_with(|| {
                format!(
                    "create gateway chassis {:?} for logical router port {}",
                    chassises, lrp_name
                )
            })
    }

    /// Unschedule router port `lrp_name` from `chassises`, detaching and
    /// deleting the bindings in one transaction. Missing bindings are skipped.
    pub async fn delete_gateway_chassises(&self, lrp_name: &str, chassises: &[&str]) -> Result<()> {
        let names: Vec<String> = chassises
            .iter()
            .map(|chassis| gateway_chassis_name(lrp_name, chassis))
            .collect();

        let mut bindings = Vec::with_capacity(names.len());
        for name in &names {
            if let Some(gc) = self.get_by_name::<GatewayChassis>(name, true)? {
                bindings.push(gc);
            }
        }
        if bindings.is_empty() {
            return Ok(());
        }

        let uuids: Vec<String> = bindings.iter().map(|gc| gc.uuid().to_string()).collect();
        let owners = self.where_cache(|lrp: &LogicalRouterPort| {
            lrp.gateway_chassis.iter().any(|uuid| uuids.contains(uuid))
        })?;

        let mut ops = detach_ops(&owners, "gateway_chassis", &uuids)?;
        ops.extend(bindings.iter().map(Operation::delete));

        self.transact("gateway-chassis-del", ops)
            .await
            .context_with(|| {
                format!(
                    "delete gateway chassis {:?} from logical router port {}",
                    chassises, lrp_name
                )
            })
    }
}

fn gateway_chassis_name(lrp_name: &str, chassis: &str) -> String {
    format!("{}-{}", lrp_name, chassis)
}

#[cfg(test)]
mod tests {
    use super::super::testing;
    use super::*;
    use crate::store::Table;

    async fn router_port(client: &OvnClient) {
        client.create_logical_router("lr1").await.unwrap();
        client
            .create_logical_router_port("lr1", "lr1-ext", "52:54:00:00:00:01", &["172.16.0.1/24"])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_create_gateway_chassises_priorities() {
        let (client, _store) = testing::client();
        router_port(&client).await;

        client
            .create_gateway_chassises("lr1-ext", &["node1", "node2", "node3"])
            .await
            .unwrap();

        let gcs = client.where_cache(|_: &GatewayChassis| true).unwrap();
        let priority = |name: &str| gcs.iter().find(|gc| gc.name == name).map(|gc| gc.priority);
        assert_eq!(priority("lr1-ext-node1"), Some(100));
        assert_eq!(priority("lr1-ext-node3"), Some(98));

        let lrp = client.get_logical_router_port("lr1-ext", false).unwrap().unwrap();
        assert_eq!(lrp.gateway_chassis.len(), 3);
    }

    #[tokio::test]
    async fn test_create_gateway_chassises_skips_existing() {
        let (client, store) = testing::client();
        router_port(&client).await;
        client.create_gateway_chassises("lr1-ext", &["node1"]).await.unwrap();

        client
            .create_gateway_chassises("lr1-ext", &["node1", "node2"])
            .await
            .unwrap();

        assert_eq!(store.row_count(Table::GatewayChassis).unwrap(), 2);
        let lrp = client.get_logical_router_port("lr1-ext", false).unwrap().unwrap();
        assert_eq!(lrp.gateway_chassis.len(), 2);
    }

    #[tokio::test]
    async fn test_create_gateway_chassises_requires_port() {
        let (client, store) = testing::client();

        let err = client
            .create_gateway_chassises("lr1-ext", &["node1"])
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(store.row_count(Table::GatewayChassis).unwrap(), 0);
    }

    #[tokio::test]
    async fn test_delete_gateway_chassises() {
        let (client, store) = testing::client();
        router_port(&client).await;
        client
            .create_gateway_chassises("lr1-ext", &["node1", "node2"])
            .await
            .unwrap();

        client
            .delete_gateway_chassises("lr1-ext", &["node1", "node9"])
            .await
            .unwrap();

        let lrp = client.get_logical_router_port("lr1-ext", false).unwrap().unwrap();
        assert_eq!(lrp.gateway_chassis.len(), 1);
        assert_eq!(store.row_count(Table::GatewayChassis).unwrap(), 1);
        assert!(client.exists::<GatewayChassis>("lr1-ext-node2").unwrap());
    }
}
