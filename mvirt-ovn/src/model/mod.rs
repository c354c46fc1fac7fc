//! Typed northbound models.
//!
//! Each table gets a plain struct plus a [`Model`] impl mapping it to a
//! schema-less [`Row`]. Relationship columns (sets of UUIDs pointing at other
//! rows) are declared per table so the mutation builder can refuse to
//! overwrite them wholesale.

use crate::store::{Row, StoreError, Table};

mod acl;
mod address_set;
mod dhcp_options;
mod load_balancer;
mod logical_router;
mod logical_switch;
mod port_group;

pub use acl::Acl;
pub use address_set::AddressSet;
pub use dhcp_options::DhcpOptions;
pub use load_balancer::LoadBalancer;
pub use logical_router::{
    GatewayChassis, LogicalRouter, LogicalRouterPolicy, LogicalRouterPort,
    LogicalRouterStaticRoute, Nat,
};
pub use logical_switch::{LogicalSwitch, LogicalSwitchPort};
pub use port_group::PortGroup;

/// External-id key marking which system owns a row.
pub const VENDOR_KEY: &str = "vendor";
/// External-id key naming the switch a DHCP options row belongs to.
pub const LOGICAL_SWITCH_KEY: &str = "logical_switch";
/// External-id key naming the parent (port group or switch) of an ACL.
pub const PARENT_KEY: &str = "parent";
/// External-id key naming the IP family of a DHCP options row.
pub const PROTOCOL_KEY: &str = "protocol";

/// A typed row of one northbound table.
pub trait Model: Clone + Send + Sync + 'static {
    /// Table the model is stored in.
    const TABLE: Table;
    /// Every column the model writes.
    const COLUMNS: &'static [&'static str];
    /// Columns holding UUID references to other rows.
    const REFERENCES: &'static [&'static str];

    fn uuid(&self) -> &str;
    fn to_row(&self) -> Row;
    fn from_row(row: &Row) -> Result<Self, StoreError>;
}

/// A model carrying a human-readable (non-unique) name.
pub trait Named: Model {
    fn name(&self) -> &str;
}

/// Declare a northbound table struct and its [`Model`] impl.
macro_rules! nb_table {
    (
        $(#[$meta:meta])*
        pub struct $name:ident in $table:ident references [$($reference:literal),* $(,)?] {
            $(
                $(#[$field_meta:meta])*
                pub $field:ident: $ty:ty => $column:literal,
            )*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
        pub struct $name {
            pub uuid: String,
            $(
                $(#[$field_meta])*
                pub $field: $ty,
            )*
        }

        impl $crate::model::Model for $name {
            const TABLE: $crate::store::Table = $crate::store::Table::$table;
            const COLUMNS: &'static [&'static str] = &[$($column),*];
            const REFERENCES: &'static [&'static str] = &[$($reference),*];

            fn uuid(&self) -> &str {
                &self.uuid
            }

            fn to_row(&self) -> $crate::store::Row {
                let mut row = $crate::store::Row::new(self.uuid.clone());
                $(
                    row.set($column, $crate::store::Column::encode(&self.$field));
                )*
                row
            }

            fn from_row(row: &$crate::store::Row) -> Result<Self, $crate::store::StoreError> {
                Ok(Self {
                    uuid: row.uuid.clone(),
                    $(
                        $field: $crate::store::Column::decode(row.get($column)).map_err(|reason| {
                            $crate::store::StoreError::Schema {
                                table: $crate::store::Table::$table,
                                column: $column.to_string(),
                                reason,
                            }
                        })?,
                    )*
                })
            }
        }
    };
}

pub(crate) use nb_table;

/// Implement [`Named`] for models whose `name` column is a plain string.
macro_rules! named {
    ($($name:ident),* $(,)?) => {
        $(
            impl $crate::model::Named for $name {
                fn name(&self) -> &str {
                    &self.name
                }
            }
        )*
    };
}

pub(crate) use named;

/// True when every `(key, value)` in `filter` is present in `external_ids`.
/// An empty value in `filter` only requires the key to exist.
pub fn external_ids_match(
    external_ids: &std::collections::BTreeMap<String, String>,
    filter: &std::collections::BTreeMap<String, String>,
) -> bool {
    filter.iter().all(|(key, value)| match external_ids.get(key) {
        Some(actual) => value.is_empty() || actual == value,
        None => false,
    })
}
