use crate::message::ErrorEnvelope;
use thiserror::Error;

/// Result type for SoundTouch operations
pub type Result<T> = std::result::Result<T, SoundTouchError>;

/// HTTP-equivalent status reported for calls rejected by the capability gate.
pub const NOT_CAPABLE_STATUS: u16 = 400;

/// Errors that can occur when interacting with SoundTouch devices
#[derive(Error, Debug)]
pub enum SoundTouchError {
    /// Caller-supplied value failed a local precondition
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Host is not a dotted-quad IPv4 address
    #[error("Invalid host '{0}': expected a dotted-quad IPv4 address")]
    InvalidHost(String),

    /// The `info` request failed while connecting to a device
    #[error("Device information could not be retrieved from {host}: {detail}")]
    DeviceInfoUnavailable {
        /// Host that was contacted
        host: String,
        /// Status or parse failure description
        detail: String,
    },

    /// The `supportedURLs` request failed while connecting to a device
    #[error("Device capabilities could not be retrieved from {host}: {detail}")]
    DeviceCapabilityUnavailable {
        /// Host that was contacted
        host: String,
        /// Status or parse failure description
        detail: String,
    },

    /// The addressed endpoint is not advertised by the device
    #[error("Device '{device}' is not capable of processing '{endpoint}'")]
    NotCapable {
        /// Endpoint name that was rejected
        endpoint: String,
        /// Friendly name of the device
        device: String,
    },

    /// Device returned an error envelope
    #[error("Device error: {0}")]
    Device(ErrorEnvelope),

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// WebSocket transport error on the notification surface
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// Multicast service discovery error
    #[error("Discovery error: {0}")]
    Discovery(#[from] mdns_sd::Error),

    /// Response body was not well-formed XML
    #[error("XML error: {0}")]
    Xml(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Response was well-formed but not what the operation expected
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Operation timed out
    #[error("Timeout")]
    Timeout,

    /// Connection was closed unexpectedly
    #[error("Connection closed")]
    ConnectionClosed,
}

impl SoundTouchError {
    /// Status code associated with the error, when there is one.
    ///
    /// Capability-gate rejections report [`NOT_CAPABLE_STATUS`]; device errors
    /// report the code carried by the error envelope.
    pub fn status_code(&self) -> Option<i32> {
        match self {
            SoundTouchError::NotCapable { .. } => Some(i32::from(NOT_CAPABLE_STATUS)),
            SoundTouchError::Device(envelope) => Some(envelope.code),
            SoundTouchError::Http(e) => e.status().map(|s| i32::from(s.as_u16())),
            _ => None,
        }
    }

    /// Returns the device error envelope, if this is a device error.
    pub fn envelope(&self) -> Option<&ErrorEnvelope> {
        match self {
            SoundTouchError::Device(envelope) => Some(envelope),
            _ => None,
        }
    }
}

impl From<roxmltree::Error> for SoundTouchError {
    fn from(e: roxmltree::Error) -> Self {
        SoundTouchError::Xml(e.to_string())
    }
}
