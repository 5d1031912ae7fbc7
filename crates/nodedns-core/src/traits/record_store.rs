// # Record Store Trait
//
// Defines the interface for upserting and deleting authoritative DNS
// record sets.
//
// ## Implementations
//
// - PowerDNS authoritative API: `nodedns-store-powerdns` crate
//
// ## Constraints
//
// Record stores are thin API adapters with strict limitations:
//
// - Perform one API call per invocation; no retry or backoff logic
//   (recovery is owned by the cycle schedule)
// - No caching of record state (the store itself is the source of truth)
// - No scheduling decisions and no background tasks
//
// Both operations must be idempotent: repeated identical upserts or
// deletes produce the same store end-state.

use crate::address::AddressFamily;
use async_trait::async_trait;

/// Outcome of a record set deletion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The record set existed and was removed
    Deleted,
    /// The record set did not exist; already converged
    NotFound,
}

/// Trait for DNS record store implementations
///
/// Zone and record names are passed fully qualified (trailing dot); the
/// reconciler normalizes them before any call.
///
/// # Thread Safety
///
/// Implementations must be thread-safe and usable across async tasks.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Create or replace the address record set for one family
    ///
    /// The given address set atomically replaces the record's previous
    /// value set from the caller's perspective; this is never a
    /// per-address append.
    ///
    /// # Parameters
    ///
    /// - `zone`: Fully-qualified zone name
    /// - `record`: Fully-qualified record name
    /// - `family`: Address family (selects A or AAAA)
    /// - `ttl`: Record TTL in seconds
    /// - `addresses`: The full, ordered set of textual addresses
    async fn upsert(
        &self,
        zone: &str,
        record: &str,
        family: AddressFamily,
        ttl: u32,
        addresses: &[String],
    ) -> Result<(), crate::Error>;

    /// Delete the address record set for one family
    ///
    /// A missing record set is not an error; implementations report it as
    /// [`DeleteOutcome::NotFound`] so callers can treat it as a no-op.
    async fn delete(
        &self,
        zone: &str,
        record: &str,
        family: AddressFamily,
    ) -> Result<DeleteOutcome, crate::Error>;

    /// Verify that a zone exists and the store is reachable
    ///
    /// Used as a startup probe; a missing zone or unreachable store is a
    /// fatal startup condition for the daemon.
    async fn verify_zone(&self, zone: &str) -> Result<(), crate::Error>;
}
