//! Record reconciliation
//!
//! Compares the aggregated desired address state against the DNS store
//! and issues the minimal upsert/delete calls, one action per address
//! family per cycle. The two families are reconciled independently: a
//! failure in one is reported but never blocks the other.

use crate::address::{Address, AddressFamily};
use crate::aggregate::AggregatedAddresses;
use crate::error::Error;
use crate::traits::{DeleteOutcome, RecordStore};
use std::fmt;
use tracing::{info, warn};

/// Ensure a zone or record name is fully qualified
///
/// Appends a single trailing dot if absent. Idempotent: applying it to an
/// already-qualified name is a no-op.
pub fn ensure_fqdn(name: &str) -> String {
    if name.ends_with('.') {
        name.to_string()
    } else {
        format!("{name}.")
    }
}

/// Outcome of reconciling one address family
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FamilyOutcome {
    /// The record set was upserted with this many addresses
    Upserted(usize),
    /// The record set was deleted
    Deleted,
    /// The record set was already absent; nothing to do
    AlreadyAbsent,
    /// The store call failed; the other family was still attempted
    Failed(String),
}

impl FamilyOutcome {
    /// Whether this family failed to reconcile
    pub fn is_failure(&self) -> bool {
        matches!(self, FamilyOutcome::Failed(_))
    }
}

impl fmt::Display for FamilyOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FamilyOutcome::Upserted(count) => write!(f, "upserted {count} address(es)"),
            FamilyOutcome::Deleted => write!(f, "deleted record"),
            FamilyOutcome::AlreadyAbsent => write!(f, "record already absent"),
            FamilyOutcome::Failed(message) => write!(f, "failed: {message}"),
        }
    }
}

/// Result of one reconciliation pass across both families
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleOutcome {
    /// Outcome for the A record set
    pub v4: FamilyOutcome,
    /// Outcome for the AAAA record set
    pub v6: FamilyOutcome,
}

impl CycleOutcome {
    /// Whether both families converged
    pub fn is_converged(&self) -> bool {
        !self.v4.is_failure() && !self.v6.is_failure()
    }

    /// Convert per-family failures into a partial-cycle error, if any
    pub fn into_result(self) -> Result<CycleOutcome, Error> {
        let mut failures = Vec::new();
        if let FamilyOutcome::Failed(message) = &self.v4 {
            failures.push(format!("A: {message}"));
        }
        if let FamilyOutcome::Failed(message) = &self.v6 {
            failures.push(format!("AAAA: {message}"));
        }

        if failures.is_empty() {
            Ok(self)
        } else {
            Err(Error::partial_cycle(failures.join("; ")))
        }
    }
}

/// Drives the record store to convergence for one record name
///
/// Holds the normalized zone, record name, and TTL; stateless otherwise.
/// Performs no retries: each cycle is one attempt and recovery belongs to
/// the next scheduled cycle.
#[derive(Debug, Clone)]
pub struct Reconciler {
    zone: String,
    record: String,
    ttl: u32,
}

impl Reconciler {
    /// Create a reconciler, normalizing zone and record to FQDN form
    pub fn new(zone: &str, record: &str, ttl: u32) -> Self {
        Self {
            zone: ensure_fqdn(zone),
            record: ensure_fqdn(record),
            ttl,
        }
    }

    /// The normalized zone name
    pub fn zone(&self) -> &str {
        &self.zone
    }

    /// The normalized record name
    pub fn record(&self) -> &str {
        &self.record
    }

    /// Reconcile both address families against the store
    ///
    /// Issues exactly one store action per family: an upsert carrying the
    /// full sorted address set when the family has addresses, a delete
    /// otherwise. Never short-circuits between families.
    pub async fn reconcile(
        &self,
        store: &dyn RecordStore,
        addresses: &AggregatedAddresses,
    ) -> CycleOutcome {
        let v4 = self
            .reconcile_family(store, AddressFamily::V4, addresses.v4())
            .await;
        let v6 = self
            .reconcile_family(store, AddressFamily::V6, addresses.v6())
            .await;

        CycleOutcome { v4, v6 }
    }

    async fn reconcile_family(
        &self,
        store: &dyn RecordStore,
        family: AddressFamily,
        addresses: &[Address],
    ) -> FamilyOutcome {
        let record_type = family.record_type();

        if addresses.is_empty() {
            info!(
                record = %self.record,
                record_type,
                "no {} addresses found, deleting {} record",
                family,
                record_type
            );

            return match store.delete(&self.zone, &self.record, family).await {
                Ok(DeleteOutcome::Deleted) => {
                    info!(record = %self.record, record_type, "deleted record");
                    FamilyOutcome::Deleted
                }
                Ok(DeleteOutcome::NotFound) => {
                    info!(
                        record = %self.record,
                        record_type,
                        "record does not exist (already deleted)"
                    );
                    FamilyOutcome::AlreadyAbsent
                }
                Err(e) if e.is_not_found() => {
                    info!(
                        record = %self.record,
                        record_type,
                        "record does not exist (already deleted)"
                    );
                    FamilyOutcome::AlreadyAbsent
                }
                Err(e) => {
                    warn!(record = %self.record, record_type, error = %e, "failed to delete record");
                    FamilyOutcome::Failed(e.to_string())
                }
            };
        }

        info!(
            record = %self.record,
            record_type,
            count = addresses.len(),
            "updating {} record",
            record_type
        );

        let contents: Vec<String> = addresses.iter().map(|a| a.text().to_string()).collect();

        match store
            .upsert(&self.zone, &self.record, family, self.ttl, &contents)
            .await
        {
            Ok(()) => {
                info!(record = %self.record, record_type, "successfully updated record");
                FamilyOutcome::Upserted(contents.len())
            }
            Err(e) => {
                warn!(record = %self.record, record_type, error = %e, "failed to update record");
                FamilyOutcome::Failed(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_fqdn_appends_exactly_one_dot() {
        assert_eq!(ensure_fqdn("cluster.example.com"), "cluster.example.com.");
        assert_eq!(ensure_fqdn("example.com."), "example.com.");
    }

    #[test]
    fn ensure_fqdn_is_idempotent() {
        let once = ensure_fqdn("cluster.example.com");
        assert_eq!(ensure_fqdn(&once), once);
    }

    #[test]
    fn reconciler_normalizes_names_at_construction() {
        let reconciler = Reconciler::new("example.com", "cluster.example.com", 300);
        assert_eq!(reconciler.zone(), "example.com.");
        assert_eq!(reconciler.record(), "cluster.example.com.");
    }

    #[test]
    fn cycle_outcome_surfaces_partial_failure() {
        let outcome = CycleOutcome {
            v4: FamilyOutcome::Failed("boom".to_string()),
            v6: FamilyOutcome::Deleted,
        };
        assert!(!outcome.is_converged());

        let err = outcome.into_result().unwrap_err();
        assert!(err.to_string().contains("A: boom"));
    }

    #[test]
    fn converged_cycle_outcome_is_ok() {
        let outcome = CycleOutcome {
            v4: FamilyOutcome::Upserted(2),
            v6: FamilyOutcome::AlreadyAbsent,
        };
        assert!(outcome.is_converged());
        assert!(outcome.into_result().is_ok());
    }
}
