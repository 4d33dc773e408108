//! Devices and clients built without network I/O, for unit tests

use crate::client::SoundTouchClient;
use crate::device::{SoundTouchDevice, DEFAULT_CONNECT_TIMEOUT, DEFAULT_CONTROL_PORT};
use crate::models::{Information, SupportedUrls};
use std::sync::Arc;

/// Device `AAA` at 127.0.0.1:8090 advertising the given endpoint names
pub(crate) fn device(urls: &[&str]) -> SoundTouchDevice {
    let information = Information {
        device_id: "AAA".to_string(),
        device_name: "Living Room".to_string(),
        device_type: Some("SoundTouch 10".to_string()),
        ..Default::default()
    };
    let supported = SupportedUrls {
        device_id: Some("AAA".to_string()),
        urls: urls.iter().map(|u| u.to_string()).collect(),
    };
    SoundTouchDevice::from_documents(
        "127.0.0.1".to_string(),
        DEFAULT_CONTROL_PORT,
        DEFAULT_CONNECT_TIMEOUT,
        information,
        &supported,
        reqwest::Client::new(),
    )
}

pub(crate) fn client(urls: &[&str]) -> SoundTouchClient {
    SoundTouchClient::new(Arc::new(device(urls)))
}
