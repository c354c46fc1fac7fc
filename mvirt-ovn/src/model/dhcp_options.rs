use std::collections::BTreeMap;

use super::nb_table;

nb_table! {
    /// DHCP options for one subnet of one switch, keyed by external ids.
    pub struct DhcpOptions in DhcpOptions references [] {
        pub cidr: String => "cidr",
        pub options: BTreeMap<String, String> => "options",
        pub external_ids: BTreeMap<String, String> => "external_ids",
    }
}
