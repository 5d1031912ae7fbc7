// # Kubernetes Node Source
//
// This crate provides a Kubernetes-backed node source for the sync
// system.
//
// ## Behavior
//
// - Lists Node objects via the cluster API and maps each to its name and
//   annotation mapping; annotation interpretation belongs to the core.
// - Client construction follows kube's standard resolution: in-cluster
//   configuration first, kubeconfig fallback.
// - A forbidden node listing maps to an error naming the RBAC grant the
//   service account is missing, so the failure is actionable.
//
// ## Constraints
//
// - One listing per call; no watch, no cache (cycles are stateless)
// - No retry logic (recovery is owned by the cycle schedule)

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Node;
use kube::api::ListParams;
use kube::{Api, Client};
use nodedns_core::traits::{NodeAddresses, NodeSource};
use nodedns_core::{Error, Result};
use std::collections::BTreeMap;
use tracing::debug;

/// RBAC hint appended to forbidden-listing errors
const RBAC_HINT: &str = "the service account needs a ClusterRole granting \
    get/list/watch on nodes (apiGroups: [\"\"], resources: [\"nodes\"])";

/// Kubernetes-backed node source
pub struct KubeNodeSource {
    nodes: Api<Node>,
}

impl KubeNodeSource {
    /// Create a node source from an existing client
    pub fn new(client: Client) -> Self {
        Self {
            nodes: Api::all(client),
        }
    }

    /// Create a node source with kube's default client resolution
    ///
    /// Tries in-cluster configuration first and falls back to the local
    /// kubeconfig, matching how the daemon runs both inside and outside
    /// a cluster.
    pub async fn try_default() -> Result<Self> {
        let client = Client::try_default()
            .await
            .map_err(|e| Error::node_source(format!("failed to create Kubernetes client: {e}")))?;
        Ok(Self::new(client))
    }

    /// Verify node access without fetching the full node set
    ///
    /// Used as a startup probe so permission problems surface before the
    /// first sync cycle rather than inside it.
    pub async fn probe(&self) -> Result<()> {
        self.nodes
            .list(&ListParams::default().limit(1))
            .await
            .map_err(map_kube_error)?;
        Ok(())
    }
}

#[async_trait]
impl NodeSource for KubeNodeSource {
    async fn list_nodes(&self) -> Result<Vec<NodeAddresses>> {
        let nodes = self
            .nodes
            .list(&ListParams::default())
            .await
            .map_err(map_kube_error)?;

        let mut result = Vec::with_capacity(nodes.items.len());
        for node in nodes {
            let name = node.metadata.name.unwrap_or_default();
            if name.is_empty() {
                // Unnamed objects cannot be attributed in diagnostics.
                debug!("skipping node without a name");
                continue;
            }

            let annotations: BTreeMap<String, String> =
                node.metadata.annotations.unwrap_or_default();
            result.push(NodeAddresses::new(name, annotations));
        }

        debug!(count = result.len(), "listed cluster nodes");
        Ok(result)
    }
}

/// Map a kube API error to a core error, attaching an RBAC hint when the
/// listing was forbidden
fn map_kube_error(err: kube::Error) -> Error {
    if let kube::Error::Api(response) = &err {
        if response.code == 403 {
            return Error::node_source(format!(
                "failed to list nodes due to insufficient permissions: {err}; {RBAC_HINT}"
            ));
        }
    }
    Error::node_source(format!("failed to list nodes: {err}"))
}
