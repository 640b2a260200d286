//! Test doubles and common utilities for contract tests
//!
//! Scripted IP source and recording provider, both cloneable so that a test
//! can keep a handle while the engine owns the boxed copy.

#![allow(dead_code)]

use hddns_core::error::{Error, Result};
use hddns_core::traits::dns_provider::{select_record, select_zone};
use hddns_core::traits::{DnsProvider, IpSource, Record, RecordUpdate, UpdatedRecord, Zone};
use hddns_core::{RecordType, SyncSettings};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// An IpSource answering from a script, then failing forever
#[derive(Clone)]
pub struct ScriptedIpSource {
    script: Arc<Mutex<VecDeque<Option<String>>>>,
    call_count: Arc<AtomicUsize>,
}

impl ScriptedIpSource {
    /// Each `Some(ip)` is a successful lookup, each `None` a failure
    pub fn new<I, S>(script: I) -> Self
    where
        I: IntoIterator<Item = Option<S>>,
        S: Into<String>,
    {
        Self {
            script: Arc::new(Mutex::new(
                script.into_iter().map(|s| s.map(Into::into)).collect(),
            )),
            call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Successful lookups only
    pub fn answering<I, S>(ips: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(ips.into_iter().map(Some))
    }

    /// Get the number of times current() was called
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl IpSource for ScriptedIpSource {
    async fn current(&self) -> Result<String> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        match self.script.lock().unwrap().pop_front() {
            Some(Some(ip)) => Ok(ip),
            Some(None) => Err(Error::network("scripted failure")),
            None => Err(Error::network("script exhausted")),
        }
    }

    fn source_name(&self) -> &'static str {
        "scripted"
    }
}

/// A DnsProvider over an in-memory zone listing that records every update
#[derive(Clone)]
pub struct RecordingProvider {
    zones: Vec<Zone>,
    records: Vec<Record>,
    fail_updates: bool,
    call_count: Arc<AtomicUsize>,
    updates: Arc<Mutex<Vec<(String, String, RecordUpdate)>>>,
}

impl RecordingProvider {
    pub fn new(zones: Vec<Zone>, records: Vec<Record>) -> Self {
        Self {
            zones,
            records,
            fail_updates: false,
            call_count: Arc::new(AtomicUsize::new(0)),
            updates: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Zone "example.com" (z1) holding "home" A 1.2.3.4 (r1) and "home" AAAA (r2)
    pub fn with_home_record() -> Self {
        Self::new(
            vec![zone("z0", "example.org"), zone("z1", "example.com")],
            vec![
                record("r1", "home", "A", "1.2.3.4"),
                record("r2", "home", "AAAA", "2001:db8::1"),
                record("r3", "www", "CNAME", "home"),
            ],
        )
    }

    /// Make every update_record() call fail
    pub fn failing_updates(mut self) -> Self {
        self.fail_updates = true;
        self
    }

    /// Number of provider calls of any kind
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// (zone_id, record_id, update) for every update_record() call
    pub fn updates(&self) -> Vec<(String, String, RecordUpdate)> {
        self.updates.lock().unwrap().clone()
    }

    /// Values written, in order
    pub fn updated_values(&self) -> Vec<String> {
        self.updates().into_iter().map(|(_, _, u)| u.value).collect()
    }
}

#[async_trait::async_trait]
impl DnsProvider for RecordingProvider {
    async fn resolve_zone(&self, zone_name: &str) -> Result<String> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        Ok(select_zone(self.zones.clone(), zone_name)?.id)
    }

    async fn find_record(
        &self,
        zone_id: &str,
        record_name: &str,
        record_type: RecordType,
    ) -> Result<Record> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        let in_zone = self
            .records
            .iter()
            .filter(|r| r.zone_id == zone_id)
            .cloned()
            .collect();
        select_record(in_zone, record_name, record_type)
    }

    async fn update_record(
        &self,
        zone_id: &str,
        record_id: &str,
        update: &RecordUpdate,
    ) -> Result<UpdatedRecord> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        if self.fail_updates {
            return Err(Error::provider("update_record", "HTTP 500"));
        }

        self.updates.lock().unwrap().push((
            zone_id.to_string(),
            record_id.to_string(),
            update.clone(),
        ));

        Ok(UpdatedRecord {
            name: update.name.clone(),
            value: update.value.clone(),
            modified: Some("2024-06-01 12:00:00 +0000 UTC".to_string()),
            raw_body: format!(r#"{{"record":{{"id":"{}"}}}}"#, record_id),
        })
    }

    fn provider_name(&self) -> &'static str {
        "recording"
    }
}

pub fn zone(id: &str, name: &str) -> Zone {
    Zone {
        id: id.to_string(),
        name: name.to_string(),
    }
}

pub fn record(id: &str, name: &str, record_type: &str, value: &str) -> Record {
    Record {
        id: id.to_string(),
        name: name.to_string(),
        record_type: record_type.to_string(),
        value: value.to_string(),
        zone_id: "z1".to_string(),
        created: None,
        modified: None,
    }
}

/// Settings for "home" A in "example.com", polling every 5 minutes
pub fn home_settings() -> SyncSettings {
    SyncSettings::new("example.com", "home", Duration::from_secs(5 * 60))
}
