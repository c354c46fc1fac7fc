use std::collections::BTreeMap;

use super::{named, nb_table};

nb_table! {
    /// A named group of switch ports, typically one per security group.
    pub struct PortGroup in PortGroup references ["ports", "acls"] {
        pub name: String => "name",
        pub ports: Vec<String> => "ports",
        pub acls: Vec<String> => "acls",
        pub external_ids: BTreeMap<String, String> => "external_ids",
    }
}

named!(PortGroup);
