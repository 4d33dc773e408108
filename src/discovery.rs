//! LAN discovery of SoundTouch devices over mDNS/DNS-SD
//!
//! Devices announce `_soundtouch._tcp.local.` with their control port in the
//! SRV record. [`SoundTouchDiscovery::discover`] browses for a fixed window
//! and returns one entry per host. With verification on, each new
//! announcement is connected to in the background while browsing continues.

use crate::device::{ConnectOptions, SoundTouchDevice};
use crate::error::Result;
use mdns_sd::{ServiceDaemon, ServiceEvent, ServiceInfo};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::Instant;

/// Service type SoundTouch devices announce
pub const SERVICE_TYPE: &str = "_soundtouch._tcp.local.";
/// Default browse window
pub const DEFAULT_DISCOVERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Options for [`SoundTouchDiscovery::discover`]
#[derive(Debug, Clone)]
pub struct DiscoveryOptions {
    pub service_type: String,
    /// Browse window; verification is bounded by it too
    pub timeout: Duration,
    /// Connect to each device found and record the handle
    pub verify: bool,
    /// Options used when verifying; the announced port replaces `control_port`
    pub connect_options: ConnectOptions,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            service_type: SERVICE_TYPE.to_string(),
            timeout: DEFAULT_DISCOVERY_TIMEOUT,
            verify: false,
            connect_options: ConnectOptions::default(),
        }
    }
}

impl DiscoveryOptions {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_verify(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }

    pub fn with_connect_options(mut self, options: ConnectOptions) -> Self {
        self.connect_options = options;
        self
    }
}

/// A device seen on the network
#[derive(Debug, Clone, Serialize)]
pub struct DiscoveredDevice {
    pub name: String,
    pub host: String,
    pub port: u16,
    /// Full mDNS instance name
    pub service_name: String,
    /// Connected handle, when verification succeeded
    #[serde(skip)]
    pub device: Option<Arc<SoundTouchDevice>>,
    /// Why verification failed
    pub error: Option<String>,
}

impl DiscoveredDevice {
    /// Unverified record for an announcement.
    ///
    /// The name is the TXT `name` property when present, otherwise the first
    /// label of the instance name.
    pub fn new(
        service_name: &str,
        host: impl Into<String>,
        port: u16,
        txt_name: Option<&str>,
    ) -> Self {
        let name = txt_name
            .filter(|n| !n.is_empty())
            .map(str::to_owned)
            .unwrap_or_else(|| instance_label(service_name).to_owned());
        Self {
            name,
            host: host.into(),
            port,
            service_name: service_name.to_owned(),
            device: None,
            error: None,
        }
    }

    fn from_service(info: &ServiceInfo) -> Option<Self> {
        let host = info.get_addresses().iter().find_map(|addr| match addr {
            IpAddr::V4(v4) => Some(v4.to_string()),
            IpAddr::V6(_) => None,
        })?;
        Some(Self::new(
            info.get_fullname(),
            host,
            info.get_port(),
            info.get_property_val_str("name"),
        ))
    }

    /// Registry key; a device is identified by its host
    pub fn key(&self) -> String {
        self.host.clone()
    }

    pub fn is_verified(&self) -> bool {
        self.device.is_some()
    }
}

/// First dot-separated label of an mDNS instance name
fn instance_label(service_name: &str) -> &str {
    service_name.split('.').next().unwrap_or(service_name)
}

/// Discovered devices keyed by host
#[derive(Debug, Default)]
pub struct DeviceRegistry {
    devices: BTreeMap<String, DiscoveredDevice>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or overwrite an entry; returns true when the key was new
    pub fn insert(&mut self, device: DiscoveredDevice) -> bool {
        self.devices.insert(device.key(), device).is_none()
    }

    pub fn get(&self, key: &str) -> Option<&DiscoveredDevice> {
        self.devices.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut DiscoveredDevice> {
        self.devices.get_mut(key)
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn into_devices(self) -> Vec<DiscoveredDevice> {
        self.devices.into_values().collect()
    }
}

/// Parallel connection attempts against discovered devices
pub struct Verifier {
    options: ConnectOptions,
    pending: HashSet<String>,
    tasks: JoinSet<(String, Result<SoundTouchDevice>)>,
}

impl Verifier {
    pub fn new(options: ConnectOptions) -> Self {
        Self {
            options,
            pending: HashSet::new(),
            tasks: JoinSet::new(),
        }
    }

    /// Start verifying `device` unless its key is already being verified
    pub fn spawn(&mut self, device: &DiscoveredDevice) {
        let key = device.key();
        if !self.pending.insert(key.clone()) {
            return;
        }
        let host = device.host.clone();
        let options = self.options.clone().with_port(device.port);
        tracing::debug!("Verifying discovered device at {}", key);
        self.tasks.spawn(async move {
            let result = SoundTouchDevice::connect_with(host, options).await;
            (key, result)
        });
    }

    /// Apply verification results to `registry` until every attempt is done or `deadline` passes.
    ///
    /// Attempts still running at the deadline are aborted and marked as timed out.
    pub async fn finish(mut self, registry: &mut DeviceRegistry, deadline: Instant) {
        loop {
            match tokio::time::timeout_at(deadline, self.tasks.join_next()).await {
                Ok(Some(Ok((key, result)))) => {
                    self.pending.remove(&key);
                    let Some(entry) = registry.get_mut(&key) else {
                        continue;
                    };
                    match result {
                        Ok(device) => {
                            tracing::info!("Verified '{}' at {}", device.device_name(), key);
                            entry.device = Some(Arc::new(device));
                            entry.error = None;
                        }
                        Err(e) => {
                            tracing::warn!("Could not verify device at {}: {}", key, e);
                            entry.error = Some(e.to_string());
                        }
                    }
                }
                Ok(Some(Err(e))) => tracing::error!("Verification task failed: {}", e),
                Ok(None) => break,
                Err(_) => {
                    self.tasks.abort_all();
                    for key in self.pending.drain() {
                        tracing::warn!(
                            "Verification of {} did not finish before the discovery deadline",
                            key
                        );
                        if let Some(entry) = registry.get_mut(&key) {
                            entry.error = Some("verification timed out".to_string());
                        }
                    }
                    break;
                }
            }
        }
    }
}

/// mDNS scanner for SoundTouch devices
///
/// # Example
///
/// ```no_run
/// use soundtouch_api::{DiscoveryOptions, SoundTouchDiscovery};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let options = DiscoveryOptions::default().with_verify(true);
///     for found in SoundTouchDiscovery::discover(&options).await? {
///         println!("{} at {}:{}", found.name, found.host, found.port);
///     }
///     Ok(())
/// }
/// ```
#[derive(Debug, Default)]
pub struct SoundTouchDiscovery;

impl SoundTouchDiscovery {
    /// Browse for `options.timeout` and return every device seen.
    ///
    /// Repeated announcements for the same host produce one entry.
    /// When verifying, a device that could not be connected to is returned
    /// with its `error` set. The call returns at the deadline even if some
    /// verifications are still in flight.
    pub async fn discover(options: &DiscoveryOptions) -> Result<Vec<DiscoveredDevice>> {
        let deadline = Instant::now() + options.timeout;
        tracing::info!(
            "Browsing for {} for {:?}",
            options.service_type,
            options.timeout
        );

        let daemon = ServiceDaemon::new()?;
        let receiver = daemon.browse(&options.service_type)?;

        let mut registry = DeviceRegistry::new();
        let mut verifier = options.verify.then(|| {
            let mut connect = options.connect_options.clone();
            connect.connect_timeout = connect.connect_timeout.min(options.timeout);
            Verifier::new(connect)
        });

        loop {
            let event = match tokio::time::timeout_at(deadline, receiver.recv_async()).await {
                Ok(Ok(event)) => event,
                Ok(Err(e)) => {
                    tracing::warn!("mDNS browse channel closed: {}", e);
                    break;
                }
                Err(_) => break,
            };

            match event {
                ServiceEvent::ServiceResolved(info) => {
                    let Some(found) = DiscoveredDevice::from_service(&info) else {
                        tracing::debug!("Ignoring {} without an IPv4 address", info.get_fullname());
                        continue;
                    };
                    if let Some(verifier) = verifier.as_mut() {
                        verifier.spawn(&found);
                    }
                    let key = found.key();
                    let name = found.name.clone();
                    if registry.insert(found) {
                        tracing::info!("Discovered '{}' at {}", name, key);
                    } else {
                        tracing::debug!("Updated '{}' at {}", name, key);
                    }
                }
                other => tracing::debug!("mDNS event: {:?}", other),
            }
        }

        if let Err(e) = daemon.stop_browse(&options.service_type) {
            tracing::debug!("Failed to stop mDNS browse: {}", e);
        }
        if let Err(e) = daemon.shutdown() {
            tracing::debug!("Failed to shut down mDNS daemon: {}", e);
        }

        if let Some(verifier) = verifier {
            verifier.finish(&mut registry, deadline).await;
        }

        tracing::info!("Discovery finished with {} device(s)", registry.len());
        Ok(registry.into_devices())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_from_instance_label() {
        let service = "Living Room._soundtouch._tcp.local.";
        let found = DiscoveredDevice::new(service, "192.168.1.131", 8090, None);
        assert_eq!(found.name, "Living Room");
        assert_eq!(found.key(), "192.168.1.131");
        assert!(!found.is_verified());

        let service = "AAA._soundtouch._tcp.local.";
        let named = DiscoveredDevice::new(service, "192.168.1.131", 8090, Some("Kitchen"));
        assert_eq!(named.name, "Kitchen");
    }

    #[test]
    fn test_registry_overwrites_duplicates() {
        let mut registry = DeviceRegistry::new();
        let found = |name: &str, host: &str, port: u16| {
            DiscoveredDevice::new(&format!("{}._soundtouch._tcp.local.", name), host, port, None)
        };
        assert!(registry.insert(found("A", "10.0.0.2", 8090)));
        assert!(!registry.insert(found("B", "10.0.0.2", 8090)));
        assert!(registry.insert(found("C", "10.0.0.3", 8090)));
        // a re-announcement on another port still replaces the host's entry
        assert!(!registry.insert(found("D", "10.0.0.3", 8091)));

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get("10.0.0.2").map(|d| d.name.as_str()), Some("B"));
        assert_eq!(registry.get("10.0.0.3").map(|d| d.port), Some(8091));
    }

    #[test]
    fn test_serialize_skips_device_handle() {
        let mut found = DiscoveredDevice::new("A._soundtouch._tcp.local.", "10.0.0.2", 8090, None);
        found.error = Some("refused".to_string());
        let json = serde_json::to_value(&found).unwrap();
        assert_eq!(json["name"], "A");
        assert_eq!(json["error"], "refused");
        assert!(json.get("device").is_none());
    }

    #[tokio::test]
    async fn test_unreachable_device_gets_error_marker() {
        let mut registry = DeviceRegistry::new();
        // port 1 on loopback refuses connections
        let found = DiscoveredDevice::new("A._soundtouch._tcp.local.", "127.0.0.1", 1, None);

        let mut verifier =
            Verifier::new(ConnectOptions::default().with_connect_timeout(Duration::from_secs(2)));
        verifier.spawn(&found);
        verifier.spawn(&found);
        registry.insert(found);

        verifier.finish(&mut registry, Instant::now() + Duration::from_secs(3)).await;
        let entry = registry.get("127.0.0.1").unwrap();
        assert!(entry.device.is_none());
        assert!(entry.error.is_some());
    }
}
