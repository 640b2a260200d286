//! One-shot reconciliation
//!
//! Resolve → plan → update, once. Split in two steps so that callers can
//! show the planned change before it is written.

use crate::config::{ApplyConfig, RecordType};
use crate::error::Result;
use crate::planner::{self, DesiredChange, PlannedRecord};
use crate::traits::{DnsProvider, IpSource, Record, RecordUpdate, UpdatedRecord};
use std::fmt;
use tracing::{debug, info};

/// Applies a single configured change to one record
pub struct OneShotRunner {
    ip_source: Box<dyn IpSource>,
    provider: Box<dyn DnsProvider>,
    zone_name: String,
    record_name: String,
    record_type: RecordType,
    change: DesiredChange,
    ttl: u32,
}

impl OneShotRunner {
    /// Create a runner from a validated configuration
    ///
    /// Fails on configuration errors (including invalid record types)
    /// before any network call is made.
    pub fn new(
        ip_source: Box<dyn IpSource>,
        provider: Box<dyn DnsProvider>,
        config: &ApplyConfig,
    ) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            ip_source,
            provider,
            zone_name: config.zone_name.clone(),
            record_name: config.record_name.clone(),
            record_type: config.record_type,
            change: config.desired_change()?,
            ttl: config.ttl,
        })
    }

    /// Resolve the record and plan the change without writing anything
    pub async fn prepare(&self) -> Result<PreparedChange> {
        let zone_id = self.provider.resolve_zone(&self.zone_name).await?;
        debug!("Zone {} resolved to {}", self.zone_name, zone_id);

        let current = self
            .provider
            .find_record(&zone_id, &self.record_name, self.record_type)
            .await?;
        debug!("Record {} ({}) resolved to {}", self.record_name, self.record_type, current.id);

        let public_ip = if self.change.needs_public_ip() {
            let ip = self.ip_source.current().await?;
            debug!("Public IP from {}: {}", self.ip_source.source_name(), ip);
            Some(ip)
        } else {
            None
        };

        let planned = planner::plan(&current, self.record_type, &self.change, public_ip.as_deref())?;

        Ok(PreparedChange {
            zone_name: self.zone_name.clone(),
            zone_id,
            current_type: self.record_type,
            current,
            planned,
            ttl: self.ttl,
        })
    }

    /// Write a prepared change
    pub async fn execute(&self, prepared: &PreparedChange) -> Result<UpdatedRecord> {
        let update = RecordUpdate {
            name: prepared.planned.name.clone(),
            value: prepared.planned.value.clone(),
            record_type: prepared.planned.record_type,
            ttl: prepared.ttl,
        };

        let updated = self
            .provider
            .update_record(&prepared.zone_id, &prepared.current.id, &update)
            .await?;

        info!("Updated record name={} value={} modified={}",
              updated.name, updated.value, updated.modified.as_deref().unwrap_or("-"));

        Ok(updated)
    }

    /// Prepare and execute in one go
    pub async fn run(&self) -> Result<UpdatedRecord> {
        let prepared = self.prepare().await?;
        info!("{}", prepared.planned);
        self.execute(&prepared).await
    }
}

/// A resolved and planned change, ready to be written
#[derive(Debug, Clone)]
pub struct PreparedChange {
    pub zone_name: String,
    pub zone_id: String,
    /// The record as it is now
    pub current: Record,
    pub current_type: RecordType,
    /// The record as it will be written
    pub planned: PlannedRecord,
    pub ttl: u32,
}

impl PreparedChange {
    /// Whether writing the plan would change nothing
    pub fn is_noop(&self) -> bool {
        self.current.name == self.planned.name
            && self.current_type == self.planned.record_type
            && self.current.value == self.planned.value
    }
}

impl fmt::Display for PreparedChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Loaded config changing:")?;
        writeln!(f, "In zone {}", self.zone_name)?;
        writeln!(f, "From record name: {} to {}", self.current.name, self.planned.name)?;
        writeln!(f, "From record type: {} to {}", self.current_type, self.planned.record_type)?;
        write!(f, "From record value: {} to {}", self.current.value, self.planned.value)
    }
}
