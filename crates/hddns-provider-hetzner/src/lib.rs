// # Hetzner DNS Provider
//
// This crate provides the Hetzner DNS provider implementation for the hddns system.
//
// - ✅ Makes exactly one HTTP request per operation
// - ✅ Full error propagation (callers own retries)
// - ✅ HTTP timeout configured (30 seconds)
// - ✅ Specific error handling for HTTP status codes (401/403, 404, 422, 429, 5xx)
// - ✅ Dry-run mode for safe testing
// - ❌ NO retry logic
// - ❌ NO caching of zone or record IDs
//
// ## Security Requirements
//
// - API token NEVER appears in logs
// - Provider MUST fail fast if token is empty
//
// ## API Reference
//
// - Hetzner DNS API: https://dns.hetzner.com/api-docs
// - List Zones: GET `/zones`
// - List Records: GET `/records?zone_id=...`
// - Update Record: PUT `/records/:record_id`

use async_trait::async_trait;
use hddns_core::config::ApiToken;
use hddns_core::traits::dns_provider::{select_record, select_zone};
use hddns_core::traits::{DnsProvider, Record, RecordUpdate, UpdatedRecord, Zone};
use hddns_core::{Error, RecordType, Result};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

pub use hddns_core::config::DEFAULT_API_URL;

/// Header carrying the API token
const AUTH_HEADER: &str = "Auth-API-Token";

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct ZonesResponse {
    zones: Vec<Zone>,
    /// Pagination metadata; every zone is expected on the first page
    #[serde(default)]
    meta: Value,
}

#[derive(Debug, Deserialize)]
struct RecordsResponse {
    #[serde(default)]
    records: Vec<Record>,
}

#[derive(Debug, Deserialize)]
struct RecordResponse {
    record: Record,
}

/// Hetzner DNS provider
///
/// # Dry-Run Mode
///
/// When `dry_run` is true, the provider will:
/// - Perform all GET requests (zone lookup, record lookup)
/// - Log the intended PUT payload
/// - **NOT** actually modify DNS records
pub struct HetznerProvider {
    /// Hetzner DNS API token
    /// ⚠️ NEVER log this value
    api_token: ApiToken,

    /// API base URL, without trailing slash
    base_url: String,

    /// HTTP client for API requests
    client: reqwest::Client,

    /// Dry-run mode: if true, perform GET requests but skip PUT updates
    dry_run: bool,
}

// Custom Debug implementation that hides the API token
impl std::fmt::Debug for HetznerProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HetznerProvider")
            .field("api_token", &"<REDACTED>")
            .field("base_url", &self.base_url)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl HetznerProvider {
    /// Create a new Hetzner provider
    ///
    /// # Parameters
    ///
    /// - `api_token`: Hetzner DNS API token
    /// - `base_url`: API base URL (usually [`DEFAULT_API_URL`])
    /// - `dry_run`: If true, perform GET requests but skip PUT updates
    pub fn new(api_token: ApiToken, base_url: impl Into<String>, dry_run: bool) -> Result<Self> {
        if api_token.is_empty() {
            return Err(Error::config("Hetzner API token cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_token,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
            dry_run,
        })
    }

    /// Create a provider against the public Hetzner API (live mode)
    pub fn new_live(api_token: ApiToken) -> Result<Self> {
        Self::new(api_token, DEFAULT_API_URL, false)
    }

    /// Whether PUT requests are skipped
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Send a request and return the body text of a successful response
    async fn send(&self, operation: &str, request: reqwest::RequestBuilder) -> Result<String> {
        let response = request
            .header(AUTH_HEADER, self.api_token.expose())
            .send()
            .await
            .map_err(|e| Error::provider(operation, format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(status_error(operation, status, &error_text));
        }

        response
            .text()
            .await
            .map_err(|e| Error::provider(operation, format!("Failed to read response: {}", e)))
    }

    /// Send a request and decode the JSON body
    async fn get_json<T: DeserializeOwned>(
        &self,
        operation: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<T> {
        let body = self.send(operation, request).await?;
        decode(operation, &body)
    }

    /// List every zone visible to the token
    ///
    /// # API Call
    ///
    /// ```http
    /// GET /zones
    /// Auth-API-Token: <token>
    /// ```
    pub async fn list_zones(&self) -> Result<Vec<Zone>> {
        let url = format!("{}/zones", self.base_url);
        let response: ZonesResponse = self
            .get_json("resolve_zone", self.client.get(&url))
            .await?;

        if let Some((page, last_page)) = unsearched_pages(&response.meta) {
            tracing::warn!(
                "Zone listing spans {} pages, only page {} is searched",
                last_page,
                page
            );
        }

        Ok(response.zones)
    }

    /// List every record in a zone
    ///
    /// # API Call
    ///
    /// ```http
    /// GET /records?zone_id=<zone_id>
    /// Auth-API-Token: <token>
    /// ```
    pub async fn list_records(&self, zone_id: &str) -> Result<Vec<Record>> {
        let url = format!("{}/records", self.base_url);
        let response: RecordsResponse = self
            .get_json(
                "resolve_record",
                self.client.get(&url).query(&[("zone_id", zone_id)]),
            )
            .await?;
        Ok(response.records)
    }
}

#[async_trait]
impl DnsProvider for HetznerProvider {
    async fn resolve_zone(&self, zone_name: &str) -> Result<String> {
        tracing::debug!("Looking up zone ID for: {}", zone_name);
        let zone = select_zone(self.list_zones().await?, zone_name)?;
        tracing::debug!("Found zone ID: {}", zone.id);
        Ok(zone.id)
    }

    async fn find_record(
        &self,
        zone_id: &str,
        record_name: &str,
        record_type: RecordType,
    ) -> Result<Record> {
        tracing::debug!("Looking up record: {} (type: {})", record_name, record_type);
        let record = select_record(self.list_records(zone_id).await?, record_name, record_type)?;
        tracing::debug!("Found record ID: {}", record.id);
        Ok(record)
    }

    /// Replace a record's value, TTL, type and name
    ///
    /// # API Call
    ///
    /// ```http
    /// PUT /records/:record_id
    /// Auth-API-Token: <token>
    /// { "value": "...", "ttl": 86400, "type": "A", "name": "...", "zone_id": "..." }
    /// ```
    async fn update_record(
        &self,
        zone_id: &str,
        record_id: &str,
        update: &RecordUpdate,
    ) -> Result<UpdatedRecord> {
        let url = format!("{}/records/{}", self.base_url, record_id);
        let payload = serde_json::json!({
            "value": update.value,
            "ttl": update.ttl,
            "type": update.record_type.as_str(),
            "name": update.name,
            "zone_id": zone_id,
        });

        tracing::info!(
            "{} Hetzner DNS record: {} {} -> {} [mode: {}]",
            if self.dry_run { "Would update" } else { "Updating" },
            update.name,
            update.record_type,
            update.value,
            if self.dry_run { "DRY-RUN" } else { "LIVE" }
        );

        if self.dry_run {
            tracing::info!("[DRY-RUN] Would send PUT request to {} with payload: {}", url, payload);
            return Ok(UpdatedRecord {
                name: update.name.clone(),
                value: update.value.clone(),
                modified: None,
                raw_body: payload.to_string(),
            });
        }

        let body = self
            .send("update_record", self.client.put(&url).json(&payload))
            .await?;
        // The write already succeeded; an undecodable confirmation only
        // loses the echoed fields, never the raw body.
        match decode::<RecordResponse>("update_record", &body) {
            Ok(response) => {
                tracing::info!(
                    "DNS record updated successfully: {} -> {}",
                    response.record.name,
                    response.record.value
                );
                Ok(UpdatedRecord {
                    name: response.record.name,
                    value: response.record.value,
                    modified: response.record.modified,
                    raw_body: body,
                })
            }
            Err(e) => {
                tracing::warn!("DNS record updated, but the confirmation could not be read: {}", e);
                Ok(UpdatedRecord {
                    name: update.name.clone(),
                    value: update.value.clone(),
                    modified: None,
                    raw_body: body,
                })
            }
        }
    }

    fn provider_name(&self) -> &'static str {
        "hetzner"
    }
}

/// `(page, last_page)` when the listing metadata reports pages after this one
fn unsearched_pages(meta: &Value) -> Option<(u64, u64)> {
    let pagination = &meta["pagination"];
    let page = pagination["page"].as_u64()?;
    let last_page = pagination["last_page"].as_u64()?;
    (last_page > page).then_some((page, last_page))
}

fn decode<T: DeserializeOwned>(operation: &str, body: &str) -> Result<T> {
    serde_json::from_str(body)
        .map_err(|e| Error::provider(operation, format!("Failed to parse response: {}", e)))
}

/// Map a non-2xx status to a provider error
fn status_error(operation: &str, status: reqwest::StatusCode, error_text: &str) -> Error {
    let message = match status.as_u16() {
        401 | 403 => format!(
            "Authentication failed: Invalid API token or insufficient permissions. Status: {}",
            status
        ),
        404 => format!("Resource not found: {} - {}", status, error_text),
        422 => format!("Rejected by Hetzner (unprocessable entity): {} - {}", status, error_text),
        429 => format!("Rate limit exceeded. Please retry later. Status: {}", status),
        500..=599 => format!("Hetzner server error (transient): {} - {}", status, error_text),
        _ => format!("Unexpected response: {} - {}", status, error_text),
    };
    Error::provider(operation, message)
}
