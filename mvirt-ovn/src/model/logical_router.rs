//! Logical router and the tables a router owns.

use std::collections::BTreeMap;

use super::{named, nb_table};

nb_table! {
    /// An L3 router.
    pub struct LogicalRouter in LogicalRouter references [
        "ports",
        "nat",
        "policies",
        "static_routes",
        "load_balancer",
    ] {
        pub name: String => "name",
        pub ports: Vec<String> => "ports",
        pub nat: Vec<String> => "nat",
        pub policies: Vec<String> => "policies",
        pub static_routes: Vec<String> => "static_routes",
        pub load_balancer: Vec<String> => "load_balancer",
        pub options: BTreeMap<String, String> => "options",
        pub external_ids: BTreeMap<String, String> => "external_ids",
    }
}

nb_table! {
    /// A router port. Owned by exactly one router's `ports` set.
    pub struct LogicalRouterPort in LogicalRouterPort references ["gateway_chassis"] {
        pub name: String => "name",
        pub mac: String => "mac",
        /// Addresses with prefix length, e.g. `10.0.0.1/24`.
        pub networks: Vec<String> => "networks",
        /// Name of the peer router port for router-to-router links.
        pub peer: Option<String> => "peer",
        pub gateway_chassis: Vec<String> => "gateway_chassis",
        pub ipv6_ra_configs: BTreeMap<String, String> => "ipv6_ra_configs",
        pub options: BTreeMap<String, String> => "options",
        pub external_ids: BTreeMap<String, String> => "external_ids",
    }
}

nb_table! {
    /// Binds a router port to a chassis with a failover priority.
    pub struct GatewayChassis in GatewayChassis references [] {
        pub name: String => "name",
        pub chassis_name: String => "chassis_name",
        pub priority: i64 => "priority",
        pub external_ids: BTreeMap<String, String> => "external_ids",
    }
}

nb_table! {
    pub struct Nat in Nat references [] {
        /// `snat`, `dnat` or `dnat_and_snat`.
        pub nat_type: String => "type",
        pub external_ip: String => "external_ip",
        pub logical_ip: String => "logical_ip",
        pub logical_port: Option<String> => "logical_port",
        pub external_mac: Option<String> => "external_mac",
        pub external_ids: BTreeMap<String, String> => "external_ids",
    }
}

nb_table! {
    pub struct LogicalRouterPolicy in LogicalRouterPolicy references [] {
        pub priority: i64 => "priority",
        pub match_expr: String => "match",
        /// `allow`, `drop` or `reroute`.
        pub action: String => "action",
        pub nexthops: Vec<String> => "nexthops",
        pub external_ids: BTreeMap<String, String> => "external_ids",
    }
}

nb_table! {
    pub struct LogicalRouterStaticRoute in LogicalRouterStaticRoute references [] {
        /// `dst-ip` (default when unset) or `src-ip`.
        pub policy: Option<String> => "policy",
        pub ip_prefix: String => "ip_prefix",
        pub nexthop: String => "nexthop",
        pub route_table: String => "route_table",
        pub external_ids: BTreeMap<String, String> => "external_ids",
    }
}

named!(LogicalRouter, LogicalRouterPort, GatewayChassis);
