//! Test doubles and common utilities for contract tests
//!
//! This module provides minimal collaborator doubles that record calls
//! without implementing real functionality.

#![allow(dead_code)]

use nodedns_core::address::AddressFamily;
use nodedns_core::config::{DEFAULT_EXTERNAL_IP_ANNOTATION, SyncConfig};
use nodedns_core::error::{Error, Result};
use nodedns_core::traits::{DeleteOutcome, NodeAddresses, NodeSource, RecordStore};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Build a node annotation set carrying the default external-IP key
pub fn node(name: &str, annotation: Option<&str>) -> NodeAddresses {
    let mut annotations = BTreeMap::new();
    if let Some(value) = annotation {
        annotations.insert(
            DEFAULT_EXTERNAL_IP_ANNOTATION.to_string(),
            value.to_string(),
        );
    }
    NodeAddresses::new(name, annotations)
}

/// A minimal SyncConfig for engine tests
pub fn test_config() -> SyncConfig {
    SyncConfig::new("example.com", "cluster.example.com").with_interval_secs(1)
}

/// A node source serving a fixed node list
pub struct MockNodeSource {
    nodes: Arc<Mutex<Vec<NodeAddresses>>>,
    fail: bool,
    list_call_count: Arc<AtomicUsize>,
}

impl MockNodeSource {
    pub fn new(nodes: Vec<NodeAddresses>) -> Self {
        Self {
            nodes: Arc::new(Mutex::new(nodes)),
            fail: false,
            list_call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A node source whose listing always fails
    pub fn failing() -> Self {
        Self {
            nodes: Arc::new(Mutex::new(Vec::new())),
            fail: true,
            list_call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Get the number of times list_nodes() was called
    pub fn list_call_count(&self) -> usize {
        self.list_call_count.load(Ordering::SeqCst)
    }

    /// Replace the served node list (for multi-cycle tests)
    pub fn set_nodes(&self, nodes: Vec<NodeAddresses>) {
        *self.nodes.lock().unwrap() = nodes;
    }

    /// Create a handle that shares state with an existing source
    pub fn sharing_state_with(other: &Self) -> Self {
        Self {
            nodes: Arc::clone(&other.nodes),
            fail: other.fail,
            list_call_count: Arc::clone(&other.list_call_count),
        }
    }
}

#[async_trait::async_trait]
impl NodeSource for MockNodeSource {
    async fn list_nodes(&self) -> Result<Vec<NodeAddresses>> {
        self.list_call_count.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(Error::node_source("node listing failed"));
        }
        Ok(self.nodes.lock().unwrap().clone())
    }
}

/// One recorded upsert call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpsertCall {
    pub zone: String,
    pub record: String,
    pub record_type: String,
    pub ttl: u32,
    pub addresses: Vec<String>,
}

/// One recorded delete call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteCall {
    pub zone: String,
    pub record: String,
    pub record_type: String,
}

/// A record store that records calls and can fail on demand
pub struct MockRecordStore {
    upserts: Arc<Mutex<Vec<UpsertCall>>>,
    deletes: Arc<Mutex<Vec<DeleteCall>>>,
    /// Upserts for this family fail with a store error
    fail_upsert_family: Option<AddressFamily>,
    /// Deletes for this family fail with a store error
    fail_delete_family: Option<AddressFamily>,
    /// When true, deletes report the record set as already absent
    delete_reports_absent: bool,
}

impl MockRecordStore {
    pub fn new() -> Self {
        Self {
            upserts: Arc::new(Mutex::new(Vec::new())),
            deletes: Arc::new(Mutex::new(Vec::new())),
            fail_upsert_family: None,
            fail_delete_family: None,
            delete_reports_absent: false,
        }
    }

    /// Fail upserts for one family
    pub fn failing_upsert_for(mut self, family: AddressFamily) -> Self {
        self.fail_upsert_family = Some(family);
        self
    }

    /// Fail deletes for one family
    pub fn failing_delete_for(mut self, family: AddressFamily) -> Self {
        self.fail_delete_family = Some(family);
        self
    }

    /// Report all deletes as "record set already absent"
    pub fn with_absent_records(mut self) -> Self {
        self.delete_reports_absent = true;
        self
    }

    /// Get the recorded upsert calls
    pub fn upserts(&self) -> Vec<UpsertCall> {
        self.upserts.lock().unwrap().clone()
    }

    /// Get the recorded delete calls
    pub fn deletes(&self) -> Vec<DeleteCall> {
        self.deletes.lock().unwrap().clone()
    }

    /// Create a handle that shares recorded calls with an existing store
    pub fn sharing_state_with(other: &Self) -> Self {
        Self {
            upserts: Arc::clone(&other.upserts),
            deletes: Arc::clone(&other.deletes),
            fail_upsert_family: other.fail_upsert_family,
            fail_delete_family: other.fail_delete_family,
            delete_reports_absent: other.delete_reports_absent,
        }
    }
}

#[async_trait::async_trait]
impl RecordStore for MockRecordStore {
    async fn upsert(
        &self,
        zone: &str,
        record: &str,
        family: AddressFamily,
        ttl: u32,
        addresses: &[String],
    ) -> Result<()> {
        self.upserts.lock().unwrap().push(UpsertCall {
            zone: zone.to_string(),
            record: record.to_string(),
            record_type: family.record_type().to_string(),
            ttl,
            addresses: addresses.to_vec(),
        });

        if self.fail_upsert_family == Some(family) {
            return Err(Error::store("mock", format!("{family} upsert failed")));
        }
        Ok(())
    }

    async fn delete(
        &self,
        zone: &str,
        record: &str,
        family: AddressFamily,
    ) -> Result<DeleteOutcome> {
        self.deletes.lock().unwrap().push(DeleteCall {
            zone: zone.to_string(),
            record: record.to_string(),
            record_type: family.record_type().to_string(),
        });

        if self.fail_delete_family == Some(family) {
            return Err(Error::store("mock", format!("{family} delete failed")));
        }
        if self.delete_reports_absent {
            return Ok(DeleteOutcome::NotFound);
        }
        Ok(DeleteOutcome::Deleted)
    }

    async fn verify_zone(&self, _zone: &str) -> Result<()> {
        Ok(())
    }
}
