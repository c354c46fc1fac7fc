use std::collections::BTreeMap;

use super::{named, nb_table};

nb_table! {
    /// A load balancer shared by any number of switches and routers.
    pub struct LoadBalancer in LoadBalancer references [] {
        pub name: String => "name",
        /// `tcp`, `udp` or `sctp`.
        pub protocol: Option<String> => "protocol",
        /// VIP (`ip:port`) to comma-separated backends.
        pub vips: BTreeMap<String, String> => "vips",
        pub selection_fields: Vec<String> => "selection_fields",
        pub external_ids: BTreeMap<String, String> => "external_ids",
    }
}

named!(LoadBalancer);
