// # DNS Provider Trait
//
// Defines the interface for the zone/record DNS API.
//
// ## Implementations
//
// - Hetzner DNS: `hddns-provider-hetzner` crate
//
// ## Usage
//
// ```rust,ignore
// use hddns_core::{DnsProvider, RecordType};
// use hddns_core::traits::RecordUpdate;
//
// #[tokio::main]
// async fn main() -> hddns_core::Result<()> {
//     let provider = /* DnsProvider implementation */;
//
//     let zone_id = provider.resolve_zone("example.com").await?;
//     let record_id = provider.resolve_record(&zone_id, "home", RecordType::A).await?;
//     provider.update_record(&zone_id, &record_id, &RecordUpdate {
//         name: "home".to_string(),
//         value: "192.0.2.1".to_string(),
//         record_type: RecordType::A,
//         ttl: 86400,
//     }).await?;
//
//     Ok(())
// }
// ```

use crate::config::RecordType;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A DNS zone as listed by the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    /// Provider-assigned zone ID
    pub id: String,
    /// Zone name (e.g., "example.com")
    pub name: String,
}

/// A DNS record as listed by the provider
///
/// `record_type` is kept as the provider's string so that zones holding
/// types outside [`RecordType`] can still be listed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub record_type: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub zone_id: String,
    #[serde(default)]
    pub created: Option<String>,
    /// Provider-reported last modification time (opaque)
    #[serde(default)]
    pub modified: Option<String>,
}

impl Record {
    /// Whether this record matches the (name, type) lookup key
    pub fn matches(&self, name: &str, record_type: RecordType) -> bool {
        self.name == name && self.record_type == record_type.as_str()
    }
}

/// Full replacement of a record's mutable fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordUpdate {
    pub name: String,
    pub value: String,
    pub record_type: RecordType,
    pub ttl: u32,
}

/// The provider's canonical view of a record after an update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdatedRecord {
    pub name: String,
    pub value: String,
    pub modified: Option<String>,
    /// Response body exactly as the provider sent it
    pub raw_body: String,
}

/// Trait for DNS provider implementations
///
/// # Trust Level: Untrusted
///
/// ## Allowed Capabilities
/// - ✅ Perform HTTP/HTTPS API calls to their endpoints only
/// - ✅ Parse provider-specific responses
/// - ✅ Return success or failure (callers own the retry policy)
///
/// ## Forbidden Capabilities
/// - ❌ Implement retry logic or backoff
/// - ❌ Cache zone or record IDs between calls
/// - ❌ Decide whether an update is needed
///
/// Each operation makes exactly one outbound HTTP call.
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// Resolve a zone name to its ID
    ///
    /// Lists every zone visible to the token and picks the one whose name
    /// equals `zone_name` exactly (case-sensitive).
    ///
    /// # Returns
    ///
    /// - `Ok(String)`: The zone ID
    /// - `Err(Error::NotFound)`: No zone has that name
    /// - `Err(Error::Provider)`: Transport or decoding failure
    async fn resolve_zone(&self, zone_name: &str) -> Result<String, crate::Error>;

    /// Find the single record in a zone matching (name, type)
    ///
    /// # Returns
    ///
    /// - `Ok(Record)`: The one matching record
    /// - `Err(Error::NotFound)`: Zero records match
    /// - `Err(Error::AmbiguousMatch)`: Two or more records match
    /// - `Err(Error::Provider)`: Transport or decoding failure
    async fn find_record(
        &self,
        zone_id: &str,
        record_name: &str,
        record_type: RecordType,
    ) -> Result<Record, crate::Error>;

    /// Resolve (zone ID, record name, record type) to a record ID
    async fn resolve_record(
        &self,
        zone_id: &str,
        record_name: &str,
        record_type: RecordType,
    ) -> Result<String, crate::Error> {
        Ok(self.find_record(zone_id, record_name, record_type).await?.id)
    }

    /// Replace the record's name, value, type and TTL
    ///
    /// The provider requires all fields on every update; this is not a
    /// partial patch.
    async fn update_record(
        &self,
        zone_id: &str,
        record_id: &str,
        update: &RecordUpdate,
    ) -> Result<UpdatedRecord, crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}

/// Pick the single record matching (name, type) out of a zone listing
///
/// Shared by provider implementations so that zero and multiple matches
/// are reported the same way everywhere.
pub fn select_record(
    records: Vec<Record>,
    record_name: &str,
    record_type: RecordType,
) -> Result<Record, crate::Error> {
    let mut matching: Vec<Record> = records
        .into_iter()
        .filter(|r| r.matches(record_name, record_type))
        .collect();

    match matching.len() {
        0 => Err(crate::Error::not_found(format!(
            "no record named {} with type {}",
            record_name, record_type
        ))),
        1 => Ok(matching.remove(0)),
        count => Err(crate::Error::ambiguous(record_name, record_type.as_str(), count)),
    }
}

/// Pick the zone named exactly `zone_name` out of a zone listing
pub fn select_zone(zones: Vec<Zone>, zone_name: &str) -> Result<Zone, crate::Error> {
    zones
        .into_iter()
        .find(|z| z.name == zone_name)
        .ok_or_else(|| crate::Error::not_found(format!("no zone named {}", zone_name)))
}
