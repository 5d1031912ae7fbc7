//! Cross-node address aggregation
//!
//! Merges the addresses advertised by all nodes into one deduplicated,
//! family-partitioned, deterministically ordered result. The ordering
//! makes repeated cycles produce identical diagnostic output and
//! idempotent store calls.

use crate::address::{Address, AddressFamily, parse_address_list};
use crate::traits::NodeAddresses;
use std::collections::HashSet;
use tracing::{debug, info};

/// The converged desired address state for one cycle
///
/// Each partition is deduplicated by textual form and sorted ascending
/// lexicographically by textual form. Both partitions being empty is a
/// valid result and signals "no addresses of this family exist".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregatedAddresses {
    v4: Vec<Address>,
    v6: Vec<Address>,
}

impl AggregatedAddresses {
    /// The sorted IPv4 partition
    pub fn v4(&self) -> &[Address] {
        &self.v4
    }

    /// The sorted IPv6 partition
    pub fn v6(&self) -> &[Address] {
        &self.v6
    }

    /// The sorted partition for one family
    pub fn for_family(&self, family: AddressFamily) -> &[Address] {
        match family {
            AddressFamily::V4 => &self.v4,
            AddressFamily::V6 => &self.v6,
        }
    }

    /// Total number of addresses across both families
    pub fn len(&self) -> usize {
        self.v4.len() + self.v6.len()
    }

    /// Whether both families are empty
    pub fn is_empty(&self) -> bool {
        self.v4.is_empty() && self.v6.is_empty()
    }
}

/// Aggregate the addresses advertised by all nodes under one annotation key
///
/// Nodes with an absent or empty annotation contribute nothing. Duplicate
/// textual forms survive once; the first occurrence wins for diagnostic
/// attribution, but the surviving set does not depend on node order.
/// Never fails.
pub fn aggregate(nodes: &[NodeAddresses], annotation_key: &str) -> AggregatedAddresses {
    let mut seen: HashSet<String> = HashSet::new();
    let mut v4 = Vec::new();
    let mut v6 = Vec::new();

    for node in nodes {
        let raw = match node.annotation(annotation_key) {
            Some(value) if !value.trim().is_empty() => value,
            _ => {
                debug!(node = %node.name, "node has no external IP annotation");
                continue;
            }
        };

        info!(node = %node.name, addresses = raw, "found external IPs for node");

        for address in parse_address_list(raw) {
            if seen.insert(address.text().to_string()) {
                match address.family() {
                    AddressFamily::V4 => v4.push(address),
                    AddressFamily::V6 => v6.push(address),
                }
            } else {
                debug!(node = %node.name, address = address.text(), "skipping duplicate address");
            }
        }
    }

    v4.sort_by(|a, b| a.text().cmp(b.text()));
    v6.sort_by(|a, b| a.text().cmp(b.text()));

    AggregatedAddresses { v4, v6 }
}
