//! Store trait definitions.
//!
//! The trait abstracts away the database client, allowing the object layer
//! to work against any backend exposing a cache query and a transaction.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::error::Result;
use super::operation::{Operation, OperationResult};
use super::value::Row;

/// Northbound tables managed by this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Table {
    LogicalSwitch,
    LogicalSwitchPort,
    LogicalRouter,
    LogicalRouterPort,
    GatewayChassis,
    LoadBalancer,
    Acl,
    Nat,
    LogicalRouterPolicy,
    LogicalRouterStaticRoute,
    PortGroup,
    AddressSet,
    DhcpOptions,
}

impl Table {
    /// Schema name of the table.
    pub fn as_str(&self) -> &'static str {
        match self {
            Table::LogicalSwitch => "Logical_Switch",
            Table::LogicalSwitchPort => "Logical_Switch_Port",
            Table::LogicalRouter => "Logical_Router",
            Table::LogicalRouterPort => "Logical_Router_Port",
            Table::GatewayChassis => "Gateway_Chassis",
            Table::LoadBalancer => "Load_Balancer",
            Table::Acl => "ACL",
            Table::Nat => "NAT",
            Table::LogicalRouterPolicy => "Logical_Router_Policy",
            Table::LogicalRouterStaticRoute => "Logical_Router_Static_Route",
            Table::PortGroup => "Port_Group",
            Table::AddressSet => "Address_Set",
            Table::DhcpOptions => "DHCP_Options",
        }
    }

    /// Human-facing kind name used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Table::LogicalSwitch => "logical switch",
            Table::LogicalSwitchPort => "logical switch port",
            Table::LogicalRouter => "logical router",
            Table::LogicalRouterPort => "logical router port",
            Table::GatewayChassis => "gateway chassis",
            Table::LoadBalancer => "load balancer",
            Table::Acl => "acl",
            Table::Nat => "nat",
            Table::LogicalRouterPolicy => "logical router policy",
            Table::LogicalRouterStaticRoute => "logical router static route",
            Table::PortGroup => "port group",
            Table::AddressSet => "address set",
            Table::DhcpOptions => "dhcp options",
        }
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Capability consumed from the replicated database client.
///
/// Implementations must be internally synchronized: one instance is shared
/// by every caller, and the object layer adds no locking of its own. Reads
/// are served from a locally mirrored cache and may lag behind writes.
#[async_trait]
pub trait Store: Send + Sync {
    /// Return the cached rows of `table` accepted by `filter`.
    ///
    /// Never blocks on the network.
    fn select(&self, table: Table, filter: &dyn Fn(&Row) -> bool) -> Result<Vec<Row>>;

    /// Apply `ops` atomically: either all operations commit or none do.
    async fn transact(&self, ops: Vec<Operation>) -> Result<Vec<OperationResult>>;
}
