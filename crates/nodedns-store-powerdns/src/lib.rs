// # PowerDNS Record Store
//
// This crate provides a record store backed by the PowerDNS
// authoritative HTTP API.
//
// ## Behavior
//
// - One `PATCH /api/v1/servers/{vhost}/zones/{zone}` call per operation,
//   carrying a single rrset with `changetype` REPLACE (upsert) or DELETE
// - An upsert replaces the record's whole content set; never a
//   per-address append
// - A delete of a missing record set reports `DeleteOutcome::NotFound`
//   instead of failing
// - NO retry or backoff logic (owned by the sync cycle schedule)
// - NO caching of record state (the store is the source of truth)
//
// ## Security
//
// - The API key is sent via the `X-API-Key` header and never logged;
//   the Debug implementation redacts it
//
// ## API Reference
//
// - PowerDNS Authoritative API: https://doc.powerdns.com/authoritative/http-api/
// - Patch zone rrsets: PATCH `/api/v1/servers/:server_id/zones/:zone_id`
// - List servers: GET `/api/v1/servers`
// - Get zone: GET `/api/v1/servers/:server_id/zones/:zone_id`

use async_trait::async_trait;
use nodedns_core::address::AddressFamily;
use nodedns_core::traits::{DeleteOutcome, RecordStore};
use nodedns_core::{Error, Result};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

/// Store name used in error reporting
const STORE_NAME: &str = "powerdns";

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Default PowerDNS virtual host
const DEFAULT_VHOST: &str = "localhost";

/// PowerDNS-backed record store
///
/// # Security
///
/// The Debug implementation intentionally does NOT expose the API key.
pub struct PowerDnsStore {
    /// API base URL, without a trailing slash
    base_url: String,

    /// PowerDNS API key; never log this value
    api_key: String,

    /// Virtual host (server id) within the PowerDNS instance
    vhost: String,

    /// HTTP client for API requests
    client: reqwest::Client,
}

impl std::fmt::Debug for PowerDnsStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PowerDnsStore")
            .field("base_url", &self.base_url)
            .field("api_key", &"<REDACTED>")
            .field("vhost", &self.vhost)
            .finish()
    }
}

/// One rrset entry in a zone PATCH payload
#[derive(Debug, Serialize)]
struct Rrset {
    name: String,
    #[serde(rename = "type")]
    record_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    ttl: Option<u32>,
    changetype: String,
    records: Vec<RecordValue>,
}

/// One record value within an rrset
#[derive(Debug, Serialize)]
struct RecordValue {
    content: String,
    disabled: bool,
}

/// Zone PATCH payload
#[derive(Debug, Serialize)]
struct RrsetPatch {
    rrsets: Vec<Rrset>,
}

impl RrsetPatch {
    /// Payload replacing a record's whole content set
    fn replace(record: &str, family: AddressFamily, ttl: u32, addresses: &[String]) -> Self {
        Self {
            rrsets: vec![Rrset {
                name: record.to_string(),
                record_type: family.record_type().to_string(),
                ttl: Some(ttl),
                changetype: "REPLACE".to_string(),
                records: addresses
                    .iter()
                    .map(|content| RecordValue {
                        content: content.clone(),
                        disabled: false,
                    })
                    .collect(),
            }],
        }
    }

    /// Payload deleting a record set
    fn delete(record: &str, family: AddressFamily) -> Self {
        Self {
            rrsets: vec![Rrset {
                name: record.to_string(),
                record_type: family.record_type().to_string(),
                ttl: None,
                changetype: "DELETE".to_string(),
                records: Vec::new(),
            }],
        }
    }
}

impl PowerDnsStore {
    /// Create a new PowerDNS store
    ///
    /// # Parameters
    ///
    /// - `base_url`: API base URL (e.g., "http://powerdns:8081")
    /// - `api_key`: PowerDNS API key; must be non-empty
    /// - `vhost`: Virtual host, defaulting to "localhost"
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        vhost: Option<String>,
    ) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(Error::config("PowerDNS API key cannot be empty"));
        }

        let base_url = base_url.into();
        let base_url = base_url.trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(Error::config("PowerDNS URL cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::http(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url,
            api_key,
            vhost: vhost.unwrap_or_else(|| DEFAULT_VHOST.to_string()),
            client,
        })
    }

    fn servers_url(&self) -> String {
        format!("{}/api/v1/servers", self.base_url)
    }

    fn zone_url(&self, zone: &str) -> String {
        format!("{}/api/v1/servers/{}/zones/{}", self.base_url, self.vhost, zone)
    }

    /// Verify the API is reachable and the key is accepted
    ///
    /// Returns the number of configured servers. Used as a startup probe.
    pub async fn check_connectivity(&self) -> Result<usize> {
        let response = self
            .client
            .get(self.servers_url())
            .header("X-API-Key", &self.api_key)
            .send()
            .await
            .map_err(|e| Error::http(format!("PowerDNS request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = read_body(response).await;
            return Err(api_error(status, &body, "listing PowerDNS servers"));
        }

        let servers: Value = response
            .json()
            .await
            .map_err(|e| Error::store(STORE_NAME, format!("failed to parse response: {e}")))?;
        let count = servers.as_array().map(Vec::len).unwrap_or(0);

        debug!(count, "connected to PowerDNS API");
        Ok(count)
    }

    /// Send one rrset PATCH for a zone and return the response
    async fn patch_zone(&self, zone: &str, payload: &RrsetPatch) -> Result<reqwest::Response> {
        self.client
            .patch(self.zone_url(zone))
            .header("X-API-Key", &self.api_key)
            .json(payload)
            .send()
            .await
            .map_err(|e| Error::http(format!("PowerDNS request failed: {e}")))
    }
}

#[async_trait]
impl RecordStore for PowerDnsStore {
    async fn upsert(
        &self,
        zone: &str,
        record: &str,
        family: AddressFamily,
        ttl: u32,
        addresses: &[String],
    ) -> Result<()> {
        debug!(
            zone,
            record,
            record_type = family.record_type(),
            count = addresses.len(),
            "replacing record set"
        );

        let payload = RrsetPatch::replace(record, family, ttl, addresses);
        let response = self.patch_zone(zone, &payload).await?;

        let status = response.status();
        if !status.is_success() {
            let body = read_body(response).await;
            return Err(api_error(
                status,
                &body,
                &format!("updating {} record {record}", family.record_type()),
            ));
        }

        Ok(())
    }

    async fn delete(
        &self,
        zone: &str,
        record: &str,
        family: AddressFamily,
    ) -> Result<DeleteOutcome> {
        debug!(
            zone,
            record,
            record_type = family.record_type(),
            "deleting record set"
        );

        let payload = RrsetPatch::delete(record, family);
        let response = self.patch_zone(zone, &payload).await?;

        let status = response.status();
        if status.is_success() {
            return Ok(DeleteOutcome::Deleted);
        }

        let body = read_body(response).await;
        // PowerDNS reports a missing zone/record as 404 (or a 422 whose
        // body names the missing object, depending on version).
        if status.as_u16() == 404 || body.to_lowercase().contains("not found") {
            return Ok(DeleteOutcome::NotFound);
        }

        Err(api_error(
            status,
            &body,
            &format!("deleting {} record {record}", family.record_type()),
        ))
    }

    async fn verify_zone(&self, zone: &str) -> Result<()> {
        let response = self
            .client
            .get(self.zone_url(zone))
            .header("X-API-Key", &self.api_key)
            .send()
            .await
            .map_err(|e| Error::http(format!("PowerDNS request failed: {e}")))?;

        let status = response.status();
        if status.as_u16() == 404 {
            return Err(Error::not_found(format!("DNS zone not found: {zone}")));
        }
        if !status.is_success() {
            let body = read_body(response).await;
            return Err(api_error(status, &body, &format!("verifying zone {zone}")));
        }

        info!(zone, "verified DNS zone");
        Ok(())
    }
}

/// Read a response body for error reporting, tolerating read failures
async fn read_body(response: reqwest::Response) -> String {
    response
        .text()
        .await
        .unwrap_or_else(|_| "unable to read error response".to_string())
}

/// Map an HTTP status to a store error
fn api_error(status: reqwest::StatusCode, body: &str, what: &str) -> Error {
    match status.as_u16() {
        401 | 403 => Error::auth(format!(
            "PowerDNS rejected the API key or lacks permission while {what} (status {status})"
        )),
        404 => Error::not_found(format!("{what}: not found")),
        500..=599 => Error::store(
            STORE_NAME,
            format!("PowerDNS server error (transient) while {what}: {status} - {body}"),
        ),
        _ => Error::store(STORE_NAME, format!("{what} failed: {status} - {body}")),
    }
}
