// # nodedns-core
//
// Core library for the node-annotation DNS sync system.
//
// ## Architecture Overview
//
// This library keeps authoritative DNS address records converged with the
// external IP addresses advertised on cluster node annotations:
//
// - **NodeSource**: Trait for listing nodes and their annotations
// - **RecordStore**: Trait for upserting/deleting DNS record sets
// - **address**: Parsing and family classification of annotation tokens
// - **aggregate**: Cross-node merge, dedup, and deterministic ordering
// - **reconcile**: Per-family upsert/delete planning against the store
// - **SyncEngine**: Fixed-interval cycle scheduler tying it all together
//
// ## Design Principles
//
// 1. **Stateless cycles**: Every cycle recomputes desired state from the
//    current node list; the DNS store is the sole source of truth.
// 2. **Family independence**: A and AAAA records are reconciled
//    independently; a failure in one never blocks the other.
// 3. **No retries**: One attempt per cycle; recovery is delegated to the
//    next scheduled cycle.
// 4. **Library-First**: A single cycle is a first-class operation
//    (`SyncEngine::run_once`), not an infinite-loop artifact.

pub mod address;
pub mod aggregate;
pub mod config;
pub mod engine;
pub mod error;
pub mod reconcile;
pub mod traits;

// Re-export core types for convenience
pub use address::{Address, AddressFamily, parse_address_list};
pub use aggregate::{AggregatedAddresses, aggregate};
pub use config::SyncConfig;
pub use engine::SyncEngine;
pub use error::{Error, Result};
pub use reconcile::{CycleOutcome, FamilyOutcome, Reconciler, ensure_fqdn};
pub use traits::{DeleteOutcome, NodeAddresses, NodeSource, RecordStore};
