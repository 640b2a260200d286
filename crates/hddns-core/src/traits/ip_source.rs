// # IP Source Trait
//
// Defines the interface for discovering the caller's public IP.
//
// ## Implementations
//
// - HTTP echo service: `hddns-ip-http` crate
//
// ## Usage
//
// ```rust,ignore
// use hddns_core::IpSource;
//
// #[tokio::main]
// async fn main() -> hddns_core::Result<()> {
//     let source = /* IpSource implementation */;
//     let current_ip = source.current().await?;
//     println!("public IP: {}", current_ip);
//     Ok(())
// }
// ```

use async_trait::async_trait;

/// Trait for public IP discovery
///
/// The returned value is opaque text as reported by the source. It is not
/// parsed or validated; whatever the source answers flows into the record
/// update unchanged.
///
/// Implementations make one lookup per call and never retry. The only retry
/// policy in the system belongs to `SyncEngine`.
#[async_trait]
pub trait IpSource: Send + Sync {
    /// Get the current public IP
    ///
    /// # Returns
    ///
    /// - `Ok(String)`: The public IP, trailing newline stripped
    /// - `Err(Error::Network)`: Transport failure or empty/unreadable body
    async fn current(&self) -> Result<String, crate::Error>;

    /// Name of the source (for logging/debugging)
    fn source_name(&self) -> &'static str;
}
