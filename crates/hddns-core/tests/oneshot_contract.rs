//! Contract Test: One-Shot Reconciliation
//!
//! Constraints verified:
//! - Resolve → plan → update issues exactly one write
//! - The public IP is only looked up when the change asks for it
//! - Values not being changed are preserved, not blanked
//! - Invalid record types are rejected before any provider call

mod common;

use common::*;
use hddns_core::config::ChangeRecordConfig;
use hddns_core::{ApplyConfig, Error, OneShotRunner, RecordType};

fn apply_config(change_record: &str) -> ApplyConfig {
    let yaml = format!(
        "token: test-token\nzone_name: example.com\nrecord_name: home\nrecord_type: A\nchange_record:\n{}",
        change_record
    );
    ApplyConfig::from_yaml_str(&yaml).expect("valid config")
}

#[tokio::test]
async fn wan_ip_change_writes_discovered_ip() {
    let ip_source = ScriptedIpSource::answering(["5.6.7.8"]);
    let provider = RecordingProvider::with_home_record();
    let config = apply_config("  change_value: true\n  change_value_to_wanip: true\n");

    let runner = OneShotRunner::new(Box::new(ip_source.clone()), Box::new(provider.clone()), &config)
        .expect("runner construction succeeds");

    let prepared = runner.prepare().await.unwrap();
    assert_eq!(prepared.current.value, "1.2.3.4");
    assert_eq!(prepared.planned.value, "5.6.7.8");
    assert!(provider.updates().is_empty(), "prepare must not write");

    let updated = runner.execute(&prepared).await.unwrap();
    assert_eq!(updated.value, "5.6.7.8");

    let updates = provider.updates();
    assert_eq!(updates.len(), 1);
    let (zone_id, record_id, update) = &updates[0];
    assert_eq!(zone_id, "z1");
    assert_eq!(record_id, "r1");
    assert_eq!(update.name, "home");
    assert_eq!(update.record_type, RecordType::A);
    assert_eq!(update.value, "5.6.7.8");
    assert_eq!(update.ttl, 86400);
    assert_eq!(ip_source.call_count(), 1);
}

#[tokio::test]
async fn unchanged_value_is_preserved() {
    let ip_source = ScriptedIpSource::answering(["5.6.7.8"]);
    let provider = RecordingProvider::with_home_record();
    let config = apply_config("  change_name: true\n  new_name: office\n");

    let runner = OneShotRunner::new(Box::new(ip_source.clone()), Box::new(provider.clone()), &config)
        .unwrap();
    runner.run().await.unwrap();

    let updates = provider.updates();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].2.name, "office");
    assert_eq!(updates[0].2.value, "1.2.3.4");
    assert_eq!(ip_source.call_count(), 0, "no IP lookup for a rename");
}

#[tokio::test]
async fn literal_value_and_type_change() {
    let ip_source = ScriptedIpSource::answering(Vec::<String>::new());
    let provider = RecordingProvider::with_home_record();
    let config = apply_config(
        "  change_type: true\n  new_type: TXT\n  change_value: true\n  new_value: hello\n",
    );

    let runner = OneShotRunner::new(Box::new(ip_source.clone()), Box::new(provider.clone()), &config)
        .unwrap();
    let prepared = runner.prepare().await.unwrap();

    let summary = prepared.to_string();
    assert!(summary.contains("From record type: A to TXT"));
    assert!(summary.contains("From record value: 1.2.3.4 to hello"));

    runner.execute(&prepared).await.unwrap();
    let update = &provider.updates()[0].2;
    assert_eq!(update.record_type, RecordType::Txt);
    assert_eq!(update.value, "hello");
}

#[tokio::test]
async fn invalid_new_type_rejected_before_any_call() {
    let ip_source = ScriptedIpSource::answering(["5.6.7.8"]);
    let provider = RecordingProvider::with_home_record();
    let mut config = apply_config("  change_value: true\n  new_value: hello\n");
    config.change_record = ChangeRecordConfig {
        change_type: true,
        new_type: "aaaa".to_string(),
        ..config.change_record.clone()
    };

    let result = OneShotRunner::new(Box::new(ip_source.clone()), Box::new(provider.clone()), &config);

    assert!(matches!(result, Err(Error::InvalidRecordType(_))));
    assert_eq!(provider.call_count(), 0);
    assert_eq!(ip_source.call_count(), 0);
}

#[tokio::test]
async fn missing_record_fails_without_write() {
    let ip_source = ScriptedIpSource::answering(["5.6.7.8"]);
    let provider = RecordingProvider::with_home_record();
    let mut config = apply_config("  change_value: true\n  change_value_to_wanip: true\n");
    config.record_name = "garage".to_string();

    let runner = OneShotRunner::new(Box::new(ip_source.clone()), Box::new(provider.clone()), &config)
        .unwrap();
    let result = runner.run().await;

    assert!(matches!(result, Err(Error::NotFound(_))));
    assert!(provider.updates().is_empty());
}

#[tokio::test]
async fn ip_lookup_failure_is_not_retried() {
    let ip_source = ScriptedIpSource::new([None::<&str>, Some("5.6.7.8")]);
    let provider = RecordingProvider::with_home_record();
    let config = apply_config("  change_value: true\n  change_value_to_wanip: true\n");

    let runner = OneShotRunner::new(Box::new(ip_source.clone()), Box::new(provider.clone()), &config)
        .unwrap();
    let result = runner.run().await;

    assert!(matches!(result, Err(Error::Network(_))));
    assert_eq!(ip_source.call_count(), 1);
    assert!(provider.updates().is_empty());
}
