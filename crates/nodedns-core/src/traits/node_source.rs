// # Node Source Trait
//
// Defines the interface for enumerating cluster nodes and their
// annotations.
//
// ## Implementations
//
// - Kubernetes API (in-cluster or kubeconfig): `nodedns-source-kube` crate
//
// ## Usage
//
// ```rust,ignore
// use nodedns_core::NodeSource;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let source = /* NodeSource implementation */;
//
//     for node in source.list_nodes().await? {
//         println!("{}: {:?}", node.name, node.annotations);
//     }
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use std::collections::BTreeMap;

/// A node's identity plus its annotation mapping
///
/// Obtained fresh each cycle; never retained across cycles. The name is
/// used for diagnostics only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeAddresses {
    /// Node name (diagnostics only)
    pub name: String,
    /// Annotation key → value mapping
    pub annotations: BTreeMap<String, String>,
}

impl NodeAddresses {
    /// Create a new node annotation set
    pub fn new(name: impl Into<String>, annotations: BTreeMap<String, String>) -> Self {
        Self {
            name: name.into(),
            annotations,
        }
    }

    /// Look up one annotation value by key
    pub fn annotation(&self, key: &str) -> Option<&str> {
        self.annotations.get(key).map(String::as_str)
    }
}

/// Trait for node source implementations
///
/// A node source is an observer of cluster state: it lists current nodes
/// and exposes their annotations. It makes no decisions about which
/// annotations matter or what DNS state should look like.
///
/// # Thread Safety
///
/// Implementations must be thread-safe and usable across async tasks.
///
/// # Constraints
///
/// - One listing per call; no caching across calls (cycles are stateless)
/// - No retry logic (recovery is owned by the sync cycle schedule)
/// - No DNS access (use [`RecordStore`](crate::RecordStore))
#[async_trait]
pub trait NodeSource: Send + Sync {
    /// List the current nodes with their annotations
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<NodeAddresses>)`: The current node set (possibly empty)
    /// - `Err(Error)`: If the node listing failed
    async fn list_nodes(&self) -> Result<Vec<NodeAddresses>, crate::Error>;
}
