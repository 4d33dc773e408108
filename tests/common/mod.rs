#![allow(dead_code, clippy::unwrap_used)]

use soundtouch_api::{ConnectOptions, SoundTouchClient, SoundTouchDevice};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

pub const INFO: &str = r#"<info deviceID="AAA"><name>Living Room</name><type>SoundTouch 10</type><components><component><componentCategory>SCM</componentCategory><softwareVersion>27.0.6</softwareVersion><serialNumber>I6332527703739342000020</serialNumber></component></components></info>"#;

pub fn supported_urls(names: &[&str]) -> String {
    let urls: String = names
        .iter()
        .map(|n| format!(r#"<URL location="/{}" />"#, n))
        .collect();
    format!(r#"<supportedURLs deviceID="AAA">{}</supportedURLs>"#, urls)
}

pub fn xml(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.to_owned(), "text/xml")
}

pub fn status(endpoint: &str) -> ResponseTemplate {
    xml(&format!("<status>/{}</status>", endpoint))
}

/// Route library logs through the test harness; `RUST_LOG` picks the level
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Mock device advertising `urls`, plus a connected client for it
pub async fn setup(urls: &[&str]) -> (MockServer, SoundTouchClient) {
    init_tracing();
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/info"))
        .respond_with(xml(INFO))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/supportedURLs"))
        .respond_with(xml(&supported_urls(urls)))
        .mount(&server)
        .await;

    let device = connect(&server).await;
    (server, SoundTouchClient::new(Arc::new(device)))
}

pub async fn connect(server: &MockServer) -> SoundTouchDevice {
    let options = ConnectOptions::default().with_port(server.address().port());
    SoundTouchDevice::connect_with("127.0.0.1", options)
        .await
        .unwrap()
}

/// Requests received after the connect-time requests, as `(method, path, body)`
pub async fn device_requests(server: &MockServer) -> Vec<(String, String, String)> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| !matches!(r.url.path(), "/info" | "/supportedURLs"))
        .map(summary)
        .collect()
}

fn summary(request: &Request) -> (String, String, String) {
    (
        request.method.to_string(),
        request.url.path().to_owned(),
        String::from_utf8_lossy(&request.body).into_owned(),
    )
}
