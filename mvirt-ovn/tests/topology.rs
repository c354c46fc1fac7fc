//! Integration tests for the northbound object layer.
//!
//! These drive `OvnClient` against the in-memory store the way a
//! reconciliation loop would: repeated, partially failing and concurrent.

mod common;

use common::{TestCluster, map};
use mvirt_ovn::model::{LoadBalancer, LogicalSwitch};
use mvirt_ovn::store::{Event, Store, Table};
use mvirt_ovn::{ClientConfig, ErrorKind, Mutator, Operation};

async fn insert_switch(cluster: &TestCluster, name: &str) -> String {
    let ls = LogicalSwitch {
        uuid: uuid::Uuid::new_v4().to_string(),
        name: name.to_string(),
        ..Default::default()
    };
    cluster.store.transact(vec![Operation::create(&ls)]).await.unwrap();
    ls.uuid
}

// =============================================================================
// Idempotent lifecycle
// =============================================================================

#[tokio::test]
async fn test_create_twice_writes_once() {
    let cluster = TestCluster::new();

    cluster.client.create_bare_logical_switch("sw1").await.unwrap();
    let after_first = cluster.transactions();
    cluster.client.create_bare_logical_switch("sw1").await.unwrap();

    assert_eq!(cluster.transactions(), after_first);
    assert_eq!(cluster.store.row_count(Table::LogicalSwitch).unwrap(), 1);
}

#[tokio::test]
async fn test_delete_missing_writes_nothing() {
    let cluster = TestCluster::new();

    cluster.client.delete_logical_switch("nope").await.unwrap();
    cluster.client.delete_load_balancers(&["nope"]).await.unwrap();
    cluster.client.delete_load_balancers(&[]).await.unwrap();
    cluster.client.delete_logical_switch_port("nope").await.unwrap();

    assert_eq!(cluster.transactions(), 0);
}

// =============================================================================
// Ambiguity
// =============================================================================

#[tokio::test]
async fn test_duplicate_names_are_ambiguous() {
    let cluster = TestCluster::new();
    insert_switch(&cluster, "X").await;
    insert_switch(&cluster, "X").await;

    for ignore_not_found in [true, false] {
        let err = cluster
            .client
            .get_logical_switch("X", ignore_not_found)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Ambiguous);
    }

    // Neither create nor delete picks one of them
    let err = cluster.client.create_bare_logical_switch("X").await.unwrap_err();
    assert!(err.is_ambiguous());
    let err = cluster.client.delete_logical_switch("X").await.unwrap_err();
    assert!(err.is_ambiguous());
    assert_eq!(cluster.store.row_count(Table::LogicalSwitch).unwrap(), 2);
}

// =============================================================================
// Batch atomicity
// =============================================================================

#[tokio::test]
async fn test_delete_many_skips_missing_in_one_transaction() {
    let cluster = TestCluster::new();
    cluster.client.create_load_balancer("A", "tcp", None).await.unwrap();
    cluster.client.create_load_balancer("C", "tcp", None).await.unwrap();
    let before = cluster.transactions();

    cluster.client.delete_load_balancers(&["A", "B", "C"]).await.unwrap();

    assert_eq!(cluster.transactions(), before + 1);
    assert!(cluster.client.list_load_balancers().unwrap().is_empty());
}

#[tokio::test]
async fn test_delete_many_failure_applies_nothing() {
    let cluster = TestCluster::new();
    cluster.client.create_load_balancer("A", "tcp", None).await.unwrap();
    cluster.client.create_load_balancer("C", "tcp", None).await.unwrap();
    cluster.store.fail_next_transaction("connection reset").unwrap();

    let err = cluster
        .client
        .delete_load_balancers(&["A", "B", "C"])
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Transaction);
    let message = err.to_string();
    assert!(message.contains("lb-del"), "{}", message);
    assert!(message.contains("\"A\""), "{}", message);
    assert!(message.contains("\"C\""), "{}", message);
    assert!(cluster.client.load_balancer_exists("A").unwrap());
    assert!(cluster.client.load_balancer_exists("C").unwrap());
}

#[tokio::test]
async fn test_failed_create_names_target_and_label() {
    let cluster = TestCluster::new();
    cluster.store.fail_next_transaction("connection reset").unwrap();

    let err = cluster
        .client
        .create_bare_logical_switch("sw1")
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Transaction);
    let message = err.to_string();
    assert!(message.contains("sw1"), "{}", message);
    assert!(message.contains("ls-add"), "{}", message);
    assert!(!cluster.client.logical_switch_exists("sw1").unwrap());

    // The failure is one-shot, so a retry converges
    cluster.client.create_bare_logical_switch("sw1").await.unwrap();
    assert!(cluster.client.logical_switch_exists("sw1").unwrap());
}

// =============================================================================
// Relationship composition
// =============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_attach_and_detach_commute() {
    let cluster = TestCluster::new();
    cluster.client.create_bare_logical_switch("S").await.unwrap();
    for lb in ["L0", "L1", "L2"] {
        cluster.client.create_load_balancer(lb, "tcp", None).await.unwrap();
    }
    cluster
        .client
        .logical_switch_update_load_balancers("S", Mutator::Insert, &["L0", "L2"])
        .await
        .unwrap();

    let attach = {
        let client = cluster.client.clone();
        tokio::spawn(async move {
            client
                .logical_switch_update_load_balancers("S", Mutator::Insert, &["L1"])
                .await
        })
    };
    let detach = {
        let client = cluster.client.clone();
        tokio::spawn(async move {
            client
                .logical_switch_update_load_balancers("S", Mutator::Delete, &["L2"])
                .await
        })
    };
    let (attached, detached) = tokio::join!(attach, detach);
    attached.unwrap().unwrap();
    detached.unwrap().unwrap();

    let uuid_of = |name: &str| {
        cluster
            .client
            .get_load_balancer(name, false)
            .unwrap()
            .unwrap()
            .uuid
    };
    let mut expected = vec![uuid_of("L0"), uuid_of("L1")];
    expected.sort();
    let ls = cluster.client.get_logical_switch("S", false).unwrap().unwrap();
    assert_eq!(ls.load_balancer, expected);
}

#[tokio::test]
async fn test_composer_tolerates_deleted_child() {
    let cluster = TestCluster::new();
    cluster.client.create_bare_logical_switch("sw1").await.unwrap();
    for port in ["P1", "P2"] {
        cluster
            .client
            .create_bare_logical_switch_port("sw1", port, "", "")
            .await
            .unwrap();
    }
    cluster.client.create_port_group("pg", &map(&[])).await.unwrap();
    cluster.client.delete_logical_switch_port("P2").await.unwrap();

    cluster
        .client
        .port_group_update_ports("pg", Mutator::Insert, &["P1", "P2"])
        .await
        .unwrap();

    let p1 = cluster.client.get_logical_switch_port("P1", false).unwrap().unwrap();
    let pg = cluster.client.get_port_group("pg", false).unwrap().unwrap();
    assert_eq!(pg.ports, vec![p1.uuid]);
}

#[tokio::test]
async fn test_deleted_port_leaves_no_port_group_reference() {
    let cluster = TestCluster::new();
    cluster.client.create_bare_logical_switch("sw1").await.unwrap();
    cluster
        .client
        .create_bare_logical_switch_port("sw1", "P1", "", "")
        .await
        .unwrap();
    cluster.client.create_port_group("pg", &map(&[])).await.unwrap();
    cluster
        .client
        .port_group_update_ports("pg", Mutator::Insert, &["P1"])
        .await
        .unwrap();

    cluster.client.delete_logical_switch_port("P1").await.unwrap();
    // Detaching by name is a no-op once the port is gone
    cluster
        .client
        .port_group_update_ports("pg", Mutator::Delete, &["P1"])
        .await
        .unwrap();

    let pg = cluster.client.get_port_group("pg", false).unwrap().unwrap();
    assert!(pg.ports.is_empty(), "stale ports: {:?}", pg.ports);
    assert_eq!(cluster.store.row_count(Table::LogicalSwitchPort).unwrap(), 0);
}

#[tokio::test]
async fn test_composer_requires_parent() {
    let cluster = TestCluster::new();
    cluster.client.create_load_balancer("lb1", "tcp", None).await.unwrap();

    let err = cluster
        .client
        .logical_switch_update_load_balancers("missing", Mutator::Insert, &["lb1"])
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

// =============================================================================
// End to end
// =============================================================================

async fn switch_with_load_balancer(cluster: &TestCluster) -> LoadBalancer {
    let client = &cluster.client;
    client.create_bare_logical_switch("sw1").await.unwrap();
    client.create_load_balancer("lb1", "tcp", None).await.unwrap();
    client
        .load_balancer_update_vips(
            "lb1",
            &map(&[("10.0.0.1:80", "192.168.1.10:8080")]),
            Mutator::Insert,
        )
        .await
        .unwrap();
    client
        .logical_switch_update_load_balancers("sw1", Mutator::Insert, &["lb1"])
        .await
        .unwrap();

    let switches = client.list_logical_switch(true).unwrap();
    let sw1: Vec<_> = switches.iter().filter(|ls| ls.name == "sw1").collect();
    assert_eq!(sw1.len(), 1);

    let lb = client.get_load_balancer("lb1", false).unwrap().unwrap();
    assert_eq!(sw1[0].load_balancer, vec![lb.uuid.clone()]);
    assert_eq!(
        lb.vips.get("10.0.0.1:80").map(String::as_str),
        Some("192.168.1.10:8080")
    );
    lb
}

#[tokio::test]
async fn test_end_to_end_bare_delete_leaves_stale_reference() {
    let cluster = TestCluster::new();
    let lb = switch_with_load_balancer(&cluster).await;

    cluster.client.delete_load_balancers(&["lb1"]).await.unwrap();

    assert!(!cluster.client.load_balancer_exists("lb1").unwrap());
    let ls = cluster.client.get_logical_switch("sw1", false).unwrap().unwrap();
    assert_eq!(ls.load_balancer, vec![lb.uuid]);
}

#[tokio::test]
async fn test_end_to_end_detach_then_delete_is_clean() {
    let cluster = TestCluster::new();
    switch_with_load_balancer(&cluster).await;

    cluster
        .client
        .logical_switch_update_load_balancers("sw1", Mutator::Delete, &["lb1"])
        .await
        .unwrap();
    cluster.client.delete_load_balancers(&["lb1"]).await.unwrap();

    let ls = cluster.client.get_logical_switch("sw1", false).unwrap().unwrap();
    assert!(ls.load_balancer.is_empty());
    assert_eq!(cluster.store.row_count(Table::LoadBalancer).unwrap(), 0);
}

// =============================================================================
// Events and configuration
// =============================================================================

#[tokio::test]
async fn test_committed_changes_are_broadcast() {
    let cluster = TestCluster::new();
    let mut events = cluster.store.subscribe();

    cluster.client.create_bare_logical_switch("sw1").await.unwrap();
    cluster.client.create_load_balancer("lb1", "tcp", None).await.unwrap();
    cluster
        .client
        .logical_switch_update_load_balancers("sw1", Mutator::Insert, &["lb1"])
        .await
        .unwrap();

    let mut seen = Vec::new();
    while let Ok(event) = events.try_recv() {
        seen.push(event);
    }
    assert_eq!(seen.len(), 3);
    assert!(matches!(&seen[0], Event::RowInserted { table: Table::LogicalSwitch, .. }));
    assert!(matches!(&seen[2], Event::RowUpdated { table: Table::LogicalSwitch, .. }));
}

#[tokio::test]
async fn test_cluster_topology_from_config() {
    let config = ClientConfig::from_json(
        r#"{"vendor": "acme", "cluster_router": "lr-main", "node_switch_cidr": "100.65.0.0/16"}"#,
    )
    .unwrap();
    let cluster = TestCluster::with_config(config);

    cluster
        .client
        .init_cluster_topology("join", "100.65.0.1")
        .await
        .unwrap();
    cluster
        .client
        .init_cluster_topology("join", "100.65.0.1")
        .await
        .unwrap();

    let switches = cluster.client.list_logical_switch(true).unwrap();
    assert_eq!(switches.len(), 1);
    assert_eq!(switches[0].external_ids.get("vendor").map(String::as_str), Some("acme"));

    let lrp = cluster
        .client
        .get_logical_router_port("lr-main-join", false)
        .unwrap()
        .unwrap();
    assert_eq!(lrp.networks, vec!["100.65.0.1/16"]);
    let lr = cluster.client.get_logical_router("lr-main", false).unwrap().unwrap();
    assert_eq!(lr.ports, vec![lrp.uuid]);
}
