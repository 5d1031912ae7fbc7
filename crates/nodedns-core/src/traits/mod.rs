//! Core traits for the sync system
//!
//! This module defines the abstract interfaces for the two external
//! collaborators every cycle talks to:
//!
//! - [`NodeSource`]: List cluster nodes and their annotations
//! - [`RecordStore`]: Upsert and delete authoritative DNS record sets

pub mod node_source;
pub mod record_store;

pub use node_source::{NodeAddresses, NodeSource};
pub use record_store::{DeleteOutcome, RecordStore};
