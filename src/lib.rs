//! Rust library for controlling and observing Bose SoundTouch speakers
//!
//! A SoundTouch device exposes an HTTP control surface (port 8090) that
//! speaks XML, and a WebSocket notification surface (port 8080) that pushes
//! XML events. This library provides an async API over both:
//!
//! - Device connection with capability probing (`/info`, `/supportedURLs`)
//! - Typed accessors with a per-client configuration cache
//! - Volume, bass, balance, tone and name settings
//! - Key presses, media controls, source and preset selection
//! - Notification playback (beep, text-to-speech, HTTP URLs)
//! - Multi-room zones and stereo pairs
//! - Snapshot and restore of playback state
//! - Event listeners over the notification WebSocket
//! - LAN discovery over mDNS
//!
//! # Quick Start
//!
//! ```no_run
//! use soundtouch_api::{SoundTouchClient, SoundTouchDevice};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let device = SoundTouchDevice::connect("192.168.1.131").await?;
//!     println!("Connected to {}", device);
//!
//!     let client = SoundTouchClient::new(Arc::new(device));
//!     let volume = client.get_volume(true).await?;
//!     println!("Volume is {}", volume.actual);
//!
//!     client.set_volume_level(volume.actual + 5).await?;
//!
//!     let now_playing = client.get_now_playing_status(true).await?;
//!     println!("Playing from {:?}", now_playing.source);
//!     Ok(())
//! }
//! ```
//!
//! # Discovery
//!
//! ```no_run
//! use soundtouch_api::{DiscoveryOptions, SoundTouchDiscovery};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let found = SoundTouchDiscovery::discover(&DiscoveryOptions::default()).await?;
//!     for device in found {
//!         println!("{} at {}:{}", device.name, device.host, device.port);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! The library is organized into several layers:
//!
//! - **Device**: connection handshake, capability set and URL building
//! - **Client**: request pipeline with the capability gate, cache and operations
//! - **Zone / Snapshot**: orchestration flows built on the client
//! - **Listener**: WebSocket notification worker and handler registry
//! - **Discovery**: mDNS browsing with optional parallel verification
//! - **Endpoint / Models / XML**: endpoint catalog, value types and XML codec

mod cache;
mod client;
mod device;
mod discovery;
mod endpoint;
mod error;
mod listener;
mod message;
pub mod models;
mod snapshot;
mod xml;
mod zone;

#[cfg(test)]
mod test_fixtures;

// Public exports
pub use cache::ConfigurationCache;
pub use client::{
    SoundTouchClient, DEFAULT_REBOOT_PORT, DEFAULT_SELECT_DELAY, DEFAULT_SOURCE_DELAY,
    DEFAULT_TTS_URL, MAX_SETTLE_DELAY,
};
pub use device::{
    ConnectOptions, SoundTouchDevice, DEFAULT_CONNECT_TIMEOUT, DEFAULT_CONTROL_PORT,
    DEFAULT_NOTIFICATION_PORT, DEFAULT_USER_AGENT,
};
pub use discovery::{
    DeviceRegistry, DiscoveredDevice, DiscoveryOptions, SoundTouchDiscovery, Verifier,
    DEFAULT_DISCOVERY_TIMEOUT, SERVICE_TYPE,
};
pub use endpoint::{catalog, lookup, nodes, request_endpoints, Endpoint, EndpointKind, Visibility};
pub use error::{Result, SoundTouchError, NOT_CAPABLE_STATUS};
pub use listener::{
    coerce_ping_interval, spawn_supervisor, split_frame, Handler, ListenerId, ListenerRegistry,
    NotificationEvent, SoundTouchWebSocket, PING_PAYLOAD, PING_TIMEOUT, SUBPROTOCOL,
    WEBSOCKET_CLOSE, WEBSOCKET_ERROR, WEBSOCKET_OPEN, WEBSOCKET_PING, WEBSOCKET_PONG, WILDCARD,
};
pub use message::{check_for_errors, ErrorEnvelope, SoundTouchMessage};
pub use models::*;
pub use snapshot::{SnapshotStore, RESTORE_SOURCE_DELAY};
pub use xml::{FromXml, RequestBody, ToXml, XmlElement};
pub use zone::{DEFAULT_REMOVE_ZONE_DELAY, DEFAULT_ZONE_DELAY};
