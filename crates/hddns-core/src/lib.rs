// # hddns-core
//
// Core library for keeping one Hetzner DNS record in sync with either the
// machine's public IP or an explicitly configured value.
//
// ## Architecture Overview
//
// - **IpSource**: Trait for discovering the current public IP
// - **DnsProvider**: Trait for resolving zone/record IDs and updating records
// - **planner**: Computes the target (name, type, value) of a one-shot change
// - **OneShotRunner**: Resolve → plan → update, once
// - **SyncEngine**: Resolve once, then poll the public IP forever and push changes
//
// ## Design Principles
//
// 1. **Downward data flow**: runners call planners and traits, never the reverse
// 2. **No hidden retries**: providers and IP sources return every failure;
//    the only retry is the engine's single bounded IP lookup retry
// 3. **Library-First**: the `hddnsd` binary is a thin layer over this crate

pub mod traits;
pub mod engine;
pub mod planner;
pub mod config;
pub mod error;

// Re-export core types for convenience
pub use traits::{IpSource, DnsProvider};
pub use engine::{SyncEngine, SyncSettings, EngineEvent, OneShotRunner, PreparedChange};
pub use planner::{DesiredChange, PlannedRecord, ValueChange};
pub use config::{ApplyConfig, DaemonConfig, RecordType, is_valid_record_type};
pub use error::{Error, Result};
