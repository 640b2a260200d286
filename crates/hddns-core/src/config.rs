//! Configuration types for the DDNS system
//!
//! Both run modes read a YAML file. The one-shot mode describes a single
//! change to apply ([`ApplyConfig`]); the daemon mode describes the record to
//! keep pointed at the public IP ([`DaemonConfig`]).

use crate::error::{Error, Result};
use crate::planner::DesiredChange;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Hetzner DNS API base URL
pub const DEFAULT_API_URL: &str = "https://dns.hetzner.com/api/v1";

/// Service answering with the caller's public IP as plain text
pub const DEFAULT_IP_SERVICE_URL: &str = "https://checkip.amazonaws.com";

/// TTL sent by the one-shot mode unless configured
pub const APPLY_DEFAULT_TTL: u32 = 86400;

/// TTL sent by the daemon mode unless configured
pub const DAEMON_DEFAULT_TTL: u32 = 43200;

/// DNS record types accepted by the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum RecordType {
    A,
    Aaaa,
    Ns,
    Mx,
    Cname,
    Rp,
    Txt,
    Soa,
    Hinfo,
    Srv,
    Dane,
    Tlsa,
    Ds,
    Caa,
}

impl RecordType {
    /// Every accepted record type
    pub const ALL: [RecordType; 14] = [
        RecordType::A,
        RecordType::Aaaa,
        RecordType::Ns,
        RecordType::Mx,
        RecordType::Cname,
        RecordType::Rp,
        RecordType::Txt,
        RecordType::Soa,
        RecordType::Hinfo,
        RecordType::Srv,
        RecordType::Dane,
        RecordType::Tlsa,
        RecordType::Ds,
        RecordType::Caa,
    ];

    /// Canonical spelling used on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::Aaaa => "AAAA",
            RecordType::Ns => "NS",
            RecordType::Mx => "MX",
            RecordType::Cname => "CNAME",
            RecordType::Rp => "RP",
            RecordType::Txt => "TXT",
            RecordType::Soa => "SOA",
            RecordType::Hinfo => "HINFO",
            RecordType::Srv => "SRV",
            RecordType::Dane => "DANE",
            RecordType::Tlsa => "TLSA",
            RecordType::Ds => "DS",
            RecordType::Caa => "CAA",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordType {
    type Err = Error;

    /// Case-sensitive: "aaaa" is rejected.
    fn from_str(s: &str) -> Result<Self> {
        RecordType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| Error::invalid_record_type(s))
    }
}

impl TryFrom<String> for RecordType {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<RecordType> for String {
    fn from(value: RecordType) -> Self {
        value.as_str().to_string()
    }
}

/// Whether `record_type` names one of the accepted record types
pub fn is_valid_record_type(record_type: &str) -> bool {
    record_type.parse::<RecordType>().is_ok()
}

/// Hetzner DNS API token
///
/// The Debug implementation intentionally does NOT expose the token.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApiToken(String);

impl ApiToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token, for the `Auth-API-Token` header only
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for ApiToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<REDACTED>")
    }
}

/// One-shot configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplyConfig {
    /// Hetzner DNS API token
    pub token: ApiToken,

    /// Zone holding the record (e.g., "example.com")
    pub zone_name: String,

    /// Current name of the record (e.g., "home")
    pub record_name: String,

    /// Current type of the record
    pub record_type: RecordType,

    /// What to change
    #[serde(default)]
    pub change_record: ChangeRecordConfig,

    /// TTL to send with the update
    #[serde(default = "default_apply_ttl")]
    pub ttl: u32,

    /// DNS API base URL
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Public IP service URL
    #[serde(default = "default_ip_service_url")]
    pub ip_service_url: String,
}

impl ApplyConfig {
    /// Read, parse and validate a YAML configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        load_yaml(path.as_ref())
            .and_then(|config: Self| config.validate().map(|_| config))
    }

    /// Parse and validate YAML text
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        validate_target(&self.token, &self.zone_name, &self.record_name)?;
        validate_ttl(self.ttl)?;
        validate_url("api_url", &self.api_url)?;
        validate_url("ip_service_url", &self.ip_service_url)?;
        self.desired_change()?;
        Ok(())
    }

    /// The change plan described by `change_record`
    pub fn desired_change(&self) -> Result<DesiredChange> {
        DesiredChange::try_from(&self.change_record)
    }
}

/// Flag-shaped change description as written in the YAML file
///
/// Converted into a [`DesiredChange`] before use.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChangeRecordConfig {
    pub change_name: bool,
    pub new_name: String,
    pub change_type: bool,
    pub new_type: String,
    pub change_value: bool,
    pub change_value_to_wanip: bool,
    pub new_value: String,
}

/// Daemon configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Hetzner DNS API token
    pub token: ApiToken,

    /// Zone holding the record
    pub zone_name: String,

    /// Name of the record to keep in sync
    pub record_name: String,

    /// Poll interval in minutes
    pub minutes: u64,

    /// Type of the record to keep in sync
    #[serde(default = "default_daemon_record_type")]
    pub record_type: RecordType,

    /// TTL to send with each update
    #[serde(default = "default_daemon_ttl")]
    pub ttl: u32,

    /// DNS API base URL
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Public IP service URL
    #[serde(default = "default_ip_service_url")]
    pub ip_service_url: String,
}

impl DaemonConfig {
    /// Read, parse and validate a YAML configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        load_yaml(path.as_ref())
            .and_then(|config: Self| config.validate().map(|_| config))
    }

    /// Parse and validate YAML text
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        validate_target(&self.token, &self.zone_name, &self.record_name)?;
        if self.minutes == 0 {
            return Err(Error::config("minutes must be > 0"));
        }
        validate_ttl(self.ttl)?;
        validate_url("api_url", &self.api_url)?;
        validate_url("ip_service_url", &self.ip_service_url)?;
        Ok(())
    }

    /// Poll interval
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.minutes.saturating_mul(60))
    }
}

fn load_yaml<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        Error::config(format!("Failed to read {}: {}", path.display(), e))
    })?;
    Ok(serde_yaml::from_str(&text)?)
}

fn validate_target(token: &ApiToken, zone_name: &str, record_name: &str) -> Result<()> {
    if token.is_empty() {
        return Err(Error::config("token cannot be empty"));
    }
    if zone_name.trim().is_empty() {
        return Err(Error::config("zone_name cannot be empty"));
    }
    if record_name.trim().is_empty() {
        return Err(Error::config("record_name cannot be empty"));
    }
    Ok(())
}

fn validate_ttl(ttl: u32) -> Result<()> {
    if ttl == 0 {
        return Err(Error::config("ttl must be > 0"));
    }
    Ok(())
}

fn validate_url(field: &str, url: &str) -> Result<()> {
    if !url.starts_with("https://") && !url.starts_with("http://") {
        return Err(Error::config(format!(
            "{} must use HTTP or HTTPS scheme. Got: {}",
            field, url
        )));
    }
    Ok(())
}

fn default_apply_ttl() -> u32 {
    APPLY_DEFAULT_TTL
}

fn default_daemon_ttl() -> u32 {
    DAEMON_DEFAULT_TTL
}

fn default_daemon_record_type() -> RecordType {
    RecordType::A
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_ip_service_url() -> String {
    DEFAULT_IP_SERVICE_URL.to_string()
}
