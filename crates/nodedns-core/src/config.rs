//! Configuration types for the sync system
//!
//! This module defines the configuration consumed by the sync engine.
//! Loading from the environment is the daemon's job; validation lives
//! here so every construction path goes through the same checks.

use serde::{Deserialize, Serialize};

/// Default annotation key carrying a node's external IPs
pub const DEFAULT_EXTERNAL_IP_ANNOTATION: &str = "k3s.io/external-ip";

/// Default record TTL in seconds
pub const DEFAULT_TTL_SECS: u32 = 300;

/// Default sync interval in seconds
pub const DEFAULT_SYNC_INTERVAL_SECS: u64 = 30;

/// Sync engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Target DNS zone (FQDN-normalized by the reconciler)
    pub zone: String,

    /// Target record name within the zone (FQDN-normalized by the reconciler)
    pub record: String,

    /// Record TTL in seconds
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u32,

    /// Interval between sync cycles in seconds
    #[serde(default = "default_sync_interval_secs")]
    pub interval_secs: u64,

    /// Annotation key to read external IPs from
    #[serde(default = "default_annotation_key")]
    pub annotation_key: String,

    /// Capacity of the engine event channel
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl SyncConfig {
    /// Create a configuration for one zone/record pair with defaults
    pub fn new(zone: impl Into<String>, record: impl Into<String>) -> Self {
        Self {
            zone: zone.into(),
            record: record.into(),
            ttl_secs: default_ttl_secs(),
            interval_secs: default_sync_interval_secs(),
            annotation_key: default_annotation_key(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }

    /// Set the record TTL in seconds
    pub fn with_ttl_secs(mut self, ttl_secs: u32) -> Self {
        self.ttl_secs = ttl_secs;
        self
    }

    /// Set the sync interval in seconds
    pub fn with_interval_secs(mut self, interval_secs: u64) -> Self {
        self.interval_secs = interval_secs;
        self
    }

    /// Set the annotation key to read external IPs from
    pub fn with_annotation_key(mut self, key: impl Into<String>) -> Self {
        self.annotation_key = key.into();
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.zone.is_empty() {
            return Err(crate::Error::config("DNS zone cannot be empty"));
        }
        if self.record.is_empty() {
            return Err(crate::Error::config("DNS record name cannot be empty"));
        }
        if self.annotation_key.is_empty() {
            return Err(crate::Error::config("annotation key cannot be empty"));
        }
        if self.ttl_secs == 0 {
            return Err(crate::Error::config("record TTL must be > 0"));
        }
        if self.interval_secs == 0 {
            return Err(crate::Error::config("sync interval must be > 0"));
        }
        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config("event channel capacity must be > 0"));
        }
        Ok(())
    }
}

fn default_ttl_secs() -> u32 {
    DEFAULT_TTL_SECS
}

fn default_sync_interval_secs() -> u64 {
    DEFAULT_SYNC_INTERVAL_SECS
}

fn default_annotation_key() -> String {
    DEFAULT_EXTERNAL_IP_ANNOTATION.to_string()
}

fn default_event_channel_capacity() -> usize {
    64
}
