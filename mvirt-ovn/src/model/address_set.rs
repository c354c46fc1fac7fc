use std::collections::BTreeMap;

use super::{named, nb_table};

nb_table! {
    /// A named set of addresses referenced from ACL matches as `$name`.
    pub struct AddressSet in AddressSet references [] {
        pub name: String => "name",
        pub addresses: Vec<String> => "addresses",
        pub external_ids: BTreeMap<String, String> => "external_ids",
    }
}

named!(AddressSet);
