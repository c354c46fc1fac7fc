//! Logical switch and logical switch port tables.

use std::collections::BTreeMap;

use super::{named, nb_table};

nb_table! {
    /// An L2 broadcast domain.
    pub struct LogicalSwitch in LogicalSwitch references ["ports", "load_balancer", "acls"] {
        pub name: String => "name",
        pub ports: Vec<String> => "ports",
        pub load_balancer: Vec<String> => "load_balancer",
        pub acls: Vec<String> => "acls",
        pub other_config: BTreeMap<String, String> => "other_config",
        pub external_ids: BTreeMap<String, String> => "external_ids",
    }
}

nb_table! {
    /// A port on a logical switch. Owned by exactly one switch's `ports` set.
    pub struct LogicalSwitchPort in LogicalSwitchPort references [] {
        pub name: String => "name",
        /// Empty for VIF ports, `router` for the switch side of a router link.
        pub port_type: String => "type",
        pub addresses: Vec<String> => "addresses",
        pub port_security: Vec<String> => "port_security",
        pub options: BTreeMap<String, String> => "options",
        pub external_ids: BTreeMap<String, String> => "external_ids",
    }
}

named!(LogicalSwitch, LogicalSwitchPort);
