//! Core DDNS engine
//!
//! The SyncEngine keeps one record pointed at the public IP:
//! - Resolving zone and record IDs once at startup
//! - Polling the IpSource on a fixed interval
//! - Updating the record via DnsProvider only when the IP changed
//!
//! ## Architecture
//!
//! ```text
//!                    ┌──────────────┐
//!                    │  SyncEngine  │
//!                    └──────────────┘
//!                            │
//!         ┌──────────────────┼──────────────────┐
//!         │                  │                  │
//!         ▼                  ▼                  ▼
//! ┌─────────────┐   ┌──────────────┐   ┌─────────────┐
//! │  IpSource   │   │ DnsProvider  │   │   Events    │
//! │  (poll)     │   │ (resolve,    │   │  (notify)   │
//! └─────────────┘   │  update)     │   └─────────────┘
//!                   └──────────────┘
//! ```
//!
//! ## States
//!
//! 1. `Resolving` (once): zone name → zone ID, (record name, type) → record ID.
//!    Any failure is fatal.
//! 2. `Polling` (forever): look up the IP (one retry after `retry_backoff`,
//!    then fatal), update if it differs from the last observed IP (fatal on
//!    failure), sleep `interval`.

mod oneshot;

pub use oneshot::{OneShotRunner, PreparedChange};

use crate::config::{DaemonConfig, RecordType};
use crate::error::Result;
use crate::traits::{DnsProvider, IpSource, RecordUpdate};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot as oneshot_channel};
use tracing::{debug, error, info, warn};

#[cfg(unix)]
use tokio::signal::unix::{Signal, SignalKind, signal};

/// Delay before the single retry of a failed IP lookup
pub const IP_RETRY_BACKOFF: Duration = Duration::from_secs(10 * 60);

/// Default capacity of the engine event channel
const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 100;

/// Events emitted by the SyncEngine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Zone and record IDs resolved
    Resolved {
        zone_id: String,
        record_id: String,
    },

    /// Public IP looked up
    IpObserved {
        ip: String,
    },

    /// IP lookup failed
    IpLookupFailed {
        attempt: usize,
        error: String,
    },

    /// DNS update skipped (IP unchanged since last poll)
    UpdateSkipped {
        current_ip: String,
    },

    /// DNS update succeeded
    UpdateSucceeded {
        name: String,
        value: String,
        modified: Option<String>,
    },

    /// Engine stopped
    Stopped {
        reason: String,
    },
}

/// Settings of the sync loop
#[derive(Debug, Clone)]
pub struct SyncSettings {
    pub zone_name: String,
    pub record_name: String,
    pub record_type: RecordType,
    pub ttl: u32,

    /// Sleep between polls
    pub interval: Duration,

    /// Sleep before retrying a failed IP lookup
    pub retry_backoff: Duration,

    /// Comparison baseline for the first poll
    ///
    /// Empty by default, so the first successful lookup always updates.
    pub initial_ip: String,

    /// Capacity of the event channel; full channels drop events
    pub event_channel_capacity: usize,
}

impl SyncSettings {
    pub fn new(
        zone_name: impl Into<String>,
        record_name: impl Into<String>,
        interval: Duration,
    ) -> Self {
        Self {
            zone_name: zone_name.into(),
            record_name: record_name.into(),
            record_type: RecordType::A,
            ttl: crate::config::DAEMON_DEFAULT_TTL,
            interval,
            retry_backoff: IP_RETRY_BACKOFF,
            initial_ip: String::new(),
            event_channel_capacity: DEFAULT_EVENT_CHANNEL_CAPACITY,
        }
    }

    /// Set the comparison baseline for the first poll
    pub fn with_initial_ip(mut self, ip: impl Into<String>) -> Self {
        self.initial_ip = ip.into();
        self
    }
}

impl From<&DaemonConfig> for SyncSettings {
    fn from(config: &DaemonConfig) -> Self {
        Self {
            record_type: config.record_type,
            ttl: config.ttl,
            ..Self::new(
                config.zone_name.clone(),
                config.record_name.clone(),
                config.interval(),
            )
        }
    }
}

/// Zone and record IDs the loop writes to
#[derive(Debug, Clone)]
struct ResolvedTarget {
    zone_id: String,
    record_id: String,
}

/// Where shutdown requests come from
enum Shutdown {
    /// SIGINT / SIGTERM
    Signal(SignalListener),
    /// Test-controlled channel; `None` once the sender is gone
    Channel(Option<oneshot_channel::Receiver<()>>),
}

impl Shutdown {
    /// Completes when shutdown is requested, never otherwise
    async fn requested(&mut self) {
        match self {
            Shutdown::Signal(listener) => listener.recv().await,
            Shutdown::Channel(slot) => {
                if let Some(rx) = slot
                    && rx.await.is_ok()
                {
                    return;
                }
                *slot = None;
                std::future::pending::<()>().await
            }
        }
    }
}

/// Signal handlers installed once for the whole run
///
/// Signals delivered while a lookup or update is in flight stay queued
/// until the next sleep polls the listener.
#[cfg(unix)]
struct SignalListener {
    sigint: Signal,
    sigterm: Signal,
}

#[cfg(unix)]
impl SignalListener {
    fn install() -> Result<Self> {
        Ok(Self {
            sigint: signal(SignalKind::interrupt())?,
            sigterm: signal(SignalKind::terminate())?,
        })
    }

    async fn recv(&mut self) {
        tokio::select! {
            Some(()) = self.sigint.recv() => info!("Received SIGINT"),
            Some(()) = self.sigterm.recv() => info!("Received SIGTERM"),
            else => std::future::pending::<()>().await,
        }
    }
}

/// Ctrl-C listener for non-Unix platforms
#[cfg(not(unix))]
struct SignalListener {
    ctrl_c: tokio::signal::windows::CtrlC,
}

#[cfg(not(unix))]
impl SignalListener {
    fn install() -> Result<Self> {
        Ok(Self {
            ctrl_c: tokio::signal::windows::ctrl_c()?,
        })
    }

    async fn recv(&mut self) {
        if self.ctrl_c.recv().await.is_some() {
            info!("Received Ctrl-C");
            return;
        }
        std::future::pending::<()>().await
    }
}

/// Sleep for `duration`; returns `true` if shutdown was requested instead
async fn pause(duration: Duration, shutdown: &mut Shutdown) -> bool {
    tokio::select! {
        _ = tokio::time::sleep(duration) => false,
        _ = shutdown.requested() => true,
    }
}

/// Daemon-mode sync engine
///
/// ## Lifecycle
///
/// 1. Create with [`SyncEngine::new()`]
/// 2. Start with [`SyncEngine::run()`]
/// 3. Runs until a fatal error or a shutdown signal
///
/// ## Threading
///
/// Every step is awaited in sequence on a single task. The only state
/// carried between polls is the last observed IP.
pub struct SyncEngine {
    /// IP source polled every interval
    ip_source: Box<dyn IpSource>,

    /// DNS provider for resolving and updating
    provider: Box<dyn DnsProvider>,

    settings: SyncSettings,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<EngineEvent>,
}

impl SyncEngine {
    /// Create a new sync engine
    ///
    /// # Returns
    ///
    /// A tuple of (engine, event_receiver) where event_receiver yields engine events
    pub fn new(
        ip_source: Box<dyn IpSource>,
        provider: Box<dyn DnsProvider>,
        settings: SyncSettings,
    ) -> (Self, mpsc::Receiver<EngineEvent>) {
        let (tx, rx) = mpsc::channel(settings.event_channel_capacity.max(1));

        let engine = Self {
            ip_source,
            provider,
            settings,
            event_tx: tx,
        };

        (engine, rx)
    }

    /// Run the engine until SIGINT/SIGTERM or a fatal error
    ///
    /// The signal handlers are installed before the first request, so a
    /// signal arriving mid-request stops the engine at the next sleep.
    ///
    /// # Returns
    ///
    /// - `Ok(())`: Clean shutdown
    /// - `Err(Error)`: Fatal error (signal setup, resolution, second IP
    ///   lookup failure, update)
    pub async fn run(&self) -> Result<()> {
        let listener = SignalListener::install().inspect_err(|e| {
            error!("Failed to install signal handlers: {}", e);
        })?;
        self.run_internal(Shutdown::Signal(listener)).await
    }

    /// Run the engine with a controlled shutdown signal
    ///
    /// **TESTING ONLY**: production code should use `run()`, which stops on
    /// SIGINT/SIGTERM. Dropping the sender without sending does not stop the engine.
    pub async fn run_with_shutdown(
        &self,
        shutdown_rx: oneshot_channel::Receiver<()>,
    ) -> Result<()> {
        self.run_internal(Shutdown::Channel(Some(shutdown_rx))).await
    }

    async fn run_internal(&self, mut shutdown: Shutdown) -> Result<()> {
        let target = match self.resolve().await {
            Ok(target) => target,
            Err(e) => {
                error!("Failed to resolve {} in zone {}: {}",
                       self.settings.record_name, self.settings.zone_name, e);
                self.emit_event(EngineEvent::Stopped { reason: e.to_string() });
                return Err(e);
            }
        };

        let mut last_known_ip = self.settings.initial_ip.clone();

        loop {
            let current_ip = match self.lookup_ip_with_retry(&mut shutdown).await {
                Ok(Some(ip)) => ip,
                Ok(None) => {
                    self.stopped_by_signal();
                    return Ok(());
                }
                Err(e) => {
                    self.emit_event(EngineEvent::Stopped { reason: e.to_string() });
                    return Err(e);
                }
            };

            if current_ip != last_known_ip {
                if let Err(e) = self.push_update(&target, &current_ip).await {
                    error!("Failed to update {}: {}", self.settings.record_name, e);
                    self.emit_event(EngineEvent::Stopped { reason: e.to_string() });
                    return Err(e);
                }
            } else {
                info!("IP unchanged ({}), skipping update", current_ip);
                self.emit_event(EngineEvent::UpdateSkipped {
                    current_ip: current_ip.clone(),
                });
            }

            last_known_ip = current_ip;

            if pause(self.settings.interval, &mut shutdown).await {
                self.stopped_by_signal();
                return Ok(());
            }
        }
    }

    /// Resolve zone and record IDs (the `Resolving` state)
    async fn resolve(&self) -> Result<ResolvedTarget> {
        let zone_id = self.provider.resolve_zone(&self.settings.zone_name).await?;
        debug!("Zone {} resolved to {}", self.settings.zone_name, zone_id);

        let record_id = self
            .provider
            .resolve_record(&zone_id, &self.settings.record_name, self.settings.record_type)
            .await?;
        debug!("Record {} ({}) resolved to {}",
               self.settings.record_name, self.settings.record_type, record_id);

        info!("Syncing {} ({}) in zone {} via {} and {}",
              self.settings.record_name, self.settings.record_type, self.settings.zone_name,
              self.ip_source.source_name(), self.provider.provider_name());

        self.emit_event(EngineEvent::Resolved {
            zone_id: zone_id.clone(),
            record_id: record_id.clone(),
        });

        Ok(ResolvedTarget { zone_id, record_id })
    }

    /// Look up the public IP, retrying exactly once after `retry_backoff`
    ///
    /// Returns `Ok(None)` if shutdown was requested during the backoff.
    async fn lookup_ip_with_retry(&self, shutdown: &mut Shutdown) -> Result<Option<String>> {
        match self.ip_source.current().await {
            Ok(ip) => return Ok(Some(self.observed(ip))),
            Err(e) => {
                warn!("IP lookup failed, retrying in {:?}: {}", self.settings.retry_backoff, e);
                self.emit_event(EngineEvent::IpLookupFailed {
                    attempt: 1,
                    error: e.to_string(),
                });
            }
        }

        if pause(self.settings.retry_backoff, shutdown).await {
            return Ok(None);
        }

        match self.ip_source.current().await {
            Ok(ip) => Ok(Some(self.observed(ip))),
            Err(e) => {
                error!("IP lookup failed again, giving up: {}", e);
                self.emit_event(EngineEvent::IpLookupFailed {
                    attempt: 2,
                    error: e.to_string(),
                });
                Err(e)
            }
        }
    }

    fn observed(&self, ip: String) -> String {
        debug!("Public IP: {}", ip);
        self.emit_event(EngineEvent::IpObserved { ip: ip.clone() });
        ip
    }

    /// Write `new_ip` to the record, keeping name and type
    async fn push_update(&self, target: &ResolvedTarget, new_ip: &str) -> Result<()> {
        info!("IP changed, updating {} -> {}", self.settings.record_name, new_ip);

        let update = RecordUpdate {
            name: self.settings.record_name.clone(),
            value: new_ip.to_string(),
            record_type: self.settings.record_type,
            ttl: self.settings.ttl,
        };

        let updated = self
            .provider
            .update_record(&target.zone_id, &target.record_id, &update)
            .await?;

        info!("Updated record name={} value={} modified={}",
              updated.name, updated.value, updated.modified.as_deref().unwrap_or("-"));

        self.emit_event(EngineEvent::UpdateSucceeded {
            name: updated.name,
            value: updated.value,
            modified: updated.modified,
        });

        Ok(())
    }

    fn stopped_by_signal(&self) {
        info!("Shutdown signal received");
        self.emit_event(EngineEvent::Stopped {
            reason: "Shutdown signal".to_string(),
        });
    }

    /// Emit an engine event
    fn emit_event(&self, event: EngineEvent) {
        // Full channel: drop the event rather than block the loop
        if self.event_tx.try_send(event).is_err() {
            warn!("Event channel full, dropping event. Consider increasing event_channel_capacity.");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_from_daemon_config() {
        let config = DaemonConfig::from_yaml_str(
            "token: t0ken\nzone_name: example.com\nrecord_name: home\nminutes: 15\nrecord_type: AAAA\n",
        )
        .unwrap();

        let settings = SyncSettings::from(&config);
        assert_eq!(settings.zone_name, "example.com");
        assert_eq!(settings.record_name, "home");
        assert_eq!(settings.record_type, RecordType::Aaaa);
        assert_eq!(settings.ttl, crate::config::DAEMON_DEFAULT_TTL);
        assert_eq!(settings.interval, Duration::from_secs(900));
        assert_eq!(settings.retry_backoff, IP_RETRY_BACKOFF);
        assert_eq!(settings.initial_ip, "");
    }

    #[test]
    fn events_can_be_cloned_and_compared() {
        let event = EngineEvent::IpObserved {
            ip: "192.0.2.1".to_string(),
        };
        assert_eq!(event.clone(), event);
    }
}
