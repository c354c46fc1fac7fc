use std::collections::BTreeMap;

use super::nb_table;

nb_table! {
    /// An access control entry attached to a port group or switch.
    ///
    /// ACLs have no usable name; they are identified by their parent tag,
    /// direction, priority and match.
    pub struct Acl in Acl references [] {
        pub name: Option<String> => "name",
        /// `from-lport` or `to-lport`.
        pub direction: String => "direction",
        pub priority: i64 => "priority",
        pub match_expr: String => "match",
        /// `allow`, `allow-related`, `drop` or `reject`.
        pub action: String => "action",
        pub log: bool => "log",
        pub external_ids: BTreeMap<String, String> => "external_ids",
    }
}
