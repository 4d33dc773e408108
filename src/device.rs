use crate::endpoint::{self, nodes, Endpoint};
use crate::error::{Result, SoundTouchError};
use crate::models::{Information, SupportedUrls};
use crate::xml::{FromXml, XmlElement};
use std::collections::BTreeSet;
use std::fmt;
use std::net::Ipv4Addr;
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

/// Default HTTP control surface port
pub const DEFAULT_CONTROL_PORT: u16 = 8090;
/// Default WebSocket notification surface port
pub const DEFAULT_NOTIFICATION_PORT: u16 = 8080;
/// Default TCP connect timeout for control requests
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
/// User agent sent with every control request
pub const DEFAULT_USER_AGENT: &str = "BoseSoundTouchApi/1.0.0";

/// Options for [`SoundTouchDevice::connect_with`]
#[derive(Debug, Clone)]
pub struct ConnectOptions {
    pub control_port: u16,
    pub connect_timeout: Duration,
    pub user_agent: String,
    /// HTTP client to share across devices; one is built per device when `None`
    pub http_client: Option<reqwest::Client>,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            control_port: DEFAULT_CONTROL_PORT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            http_client: None,
        }
    }
}

impl ConnectOptions {
    pub fn with_port(mut self, control_port: u16) -> Self {
        self.control_port = control_port;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http_client = Some(client);
        self
    }
}

/// A connected SoundTouch device
///
/// Created once by probing the device's `info` and `supportedURLs` endpoints,
/// then immutable apart from the friendly name, which is updated when the
/// device is renamed through a [`SoundTouchClient`](crate::SoundTouchClient).
///
/// # Example
///
/// ```no_run
/// use soundtouch_api::SoundTouchDevice;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let device = SoundTouchDevice::connect("192.168.1.131").await?;
///     println!("{} ({})", device.device_name(), device.device_id());
///     println!("supports {} endpoints", device.supported_endpoints().count());
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct SoundTouchDevice {
    host: String,
    port: u16,
    connect_timeout: Duration,
    information: Information,
    device_name: RwLock<String>,
    supported: BTreeSet<&'static str>,
    unknown_urls: Vec<String>,
    unsupported_urls: Vec<String>,
    http: reqwest::Client,
}

impl SoundTouchDevice {
    /// Connect with default options (port 8090, 30s connect timeout)
    pub async fn connect(host: impl Into<String>) -> Result<Self> {
        Self::connect_with(host, ConnectOptions::default()).await
    }

    /// Connect to the device at `host`, probing `info` and `supportedURLs`.
    ///
    /// The host must be a dotted-quad IPv4 address; anything else fails with
    /// [`SoundTouchError::InvalidHost`] before any network I/O.
    pub async fn connect_with(host: impl Into<String>, options: ConnectOptions) -> Result<Self> {
        let host = host.into();
        validate_host(&host)?;

        let http = match options.http_client {
            Some(client) => client,
            None => reqwest::Client::builder()
                .connect_timeout(options.connect_timeout)
                .user_agent(options.user_agent.as_str())
                .build()?,
        };

        let base = format!("http://{}:{}", host, options.control_port);
        tracing::info!("Connecting to SoundTouch device at {}", base);

        let info_doc = fetch_document(&http, &base, nodes::INFO).await?;
        let information = info_doc
            .and_then(|xml| Information::from_xml(&xml).map_err(|e| e.to_string()))
            .map_err(|detail| SoundTouchError::DeviceInfoUnavailable {
                host: host.clone(),
                detail,
            })?;

        let urls_doc = fetch_document(&http, &base, nodes::SUPPORTED_URLS).await?;
        let supported_urls = urls_doc
            .and_then(|xml| SupportedUrls::from_xml(&xml).map_err(|e| e.to_string()))
            .map_err(|detail| SoundTouchError::DeviceCapabilityUnavailable {
                host: host.clone(),
                detail,
            })?;

        let device = Self::from_documents(
            host,
            options.control_port,
            options.connect_timeout,
            information,
            &supported_urls,
            http,
        );

        tracing::info!(
            "Connected to '{}' ({}): {} supported, {} unsupported, {} unknown endpoints",
            device.device_name(),
            device.device_id(),
            device.supported.len(),
            device.unsupported_urls.len(),
            device.unknown_urls.len()
        );

        Ok(device)
    }

    /// Build a device from already-fetched `info` and `supportedURLs` documents
    pub(crate) fn from_documents(
        host: String,
        port: u16,
        connect_timeout: Duration,
        information: Information,
        supported_urls: &SupportedUrls,
        http: reqwest::Client,
    ) -> Self {
        let supported: BTreeSet<&'static str> = endpoint::request_endpoints()
            .filter(|e| supported_urls.contains(e.name()))
            .map(|e| e.name())
            .collect();

        let unknown_urls = supported_urls
            .urls
            .iter()
            .filter(|u| endpoint::lookup(u).is_none())
            .cloned()
            .collect();

        let unsupported_urls = endpoint::request_endpoints()
            .filter(|e| !supported.contains(e.name()))
            .map(|e| e.name().to_owned())
            .collect();

        Self {
            host,
            port,
            connect_timeout,
            device_name: RwLock::new(information.device_name.clone()),
            information,
            supported,
            unknown_urls,
            unsupported_urls,
            http,
        }
    }

    /// Capability gate predicate
    pub fn supports(&self, endpoint: &Endpoint) -> bool {
        self.supported.contains(endpoint.name())
    }

    /// Catalog request endpoints the device advertises
    pub fn supported_endpoints(&self) -> impl Iterator<Item = Endpoint> + '_ {
        self.supported.iter().filter_map(|name| endpoint::lookup(name))
    }

    /// Names the device advertises that the catalog does not know
    pub fn unknown_endpoint_names(&self) -> &[String] {
        &self.unknown_urls
    }

    /// Catalog request endpoints the device does not advertise
    pub fn unsupported_endpoint_names(&self) -> &[String] {
        &self.unsupported_urls
    }

    // ========== Identity ==========

    pub fn host(&self) -> &str {
        &self.host
    }

    /// HTTP control port
    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    pub fn device_id(&self) -> &str {
        &self.information.device_id
    }

    /// Friendly name; reflects renames made through a client
    pub fn device_name(&self) -> String {
        self.device_name
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn set_device_name(&self, name: &str) {
        *self.device_name.write().unwrap_or_else(PoisonError::into_inner) = name.to_owned();
    }

    /// Information document as read at connect time
    pub fn information(&self) -> &Information {
        &self.information
    }

    pub fn device_type(&self) -> Option<&str> {
        self.information.device_type.as_deref()
    }

    pub fn serial_number(&self) -> Option<&str> {
        self.information.serial_number()
    }

    pub fn software_version(&self) -> Option<&str> {
        self.information.software_version()
    }

    /// MAC address of the first interface, falling back to the device id
    pub fn mac_address(&self) -> &str {
        self.information
            .mac_address()
            .unwrap_or(&self.information.device_id)
    }

    pub fn country_code(&self) -> Option<&str> {
        self.information.country_code.as_deref()
    }

    pub fn region_code(&self) -> Option<&str> {
        self.information.region_code.as_deref()
    }

    pub fn module_type(&self) -> Option<&str> {
        self.information.module_type.as_deref()
    }

    pub fn variant(&self) -> Option<&str> {
        self.information.variant.as_deref()
    }

    // ========== URLs ==========

    /// `http://{host}:{port}/{endpoint}`
    pub fn url(&self, endpoint: &Endpoint) -> String {
        format!("http://{}:{}/{}", self.host, self.port, endpoint.path())
    }

    /// UPnP root description document
    pub fn upnp_url(&self) -> String {
        format!(
            "http://{}:8091/XD/BO5EBO5E-F00D-F00D-FEED-{}.xml",
            self.host, self.information.device_id
        )
    }

    /// Device system log
    pub fn logread_url(&self) -> String {
        format!("http://{}/logread.dat", self.host)
    }

    /// Device PTS log
    pub fn pts_url(&self) -> String {
        format!("http://{}/pts.dat", self.host)
    }

    /// Pooled HTTP client shared by clients of this device
    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }
}

impl fmt::Display for SoundTouchDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SoundTouchDevice: name=\"{}\" id=\"{}\" host=\"{}:{}\" type=\"{}\"",
            self.device_name(),
            self.device_id(),
            self.host,
            self.port,
            self.device_type().unwrap_or("")
        )
    }
}

/// Accepts dotted-quad IPv4 addresses only
pub(crate) fn validate_host(host: &str) -> Result<()> {
    host.parse::<Ipv4Addr>()
        .map(|_| ())
        .map_err(|_| SoundTouchError::InvalidHost(host.to_owned()))
}

/// GET a connect-time endpoint; the inner error describes a non-2xx or unparseable reply
async fn fetch_document(
    http: &reqwest::Client,
    base: &str,
    endpoint: Endpoint,
) -> Result<std::result::Result<XmlElement, String>> {
    let url = format!("{}/{}", base, endpoint.path());
    let response = http.get(&url).send().await?;
    let status = response.status();
    tracing::debug!("GET {} -> {}", url, status);

    if !status.is_success() {
        return Ok(Err(format!("HTTP status {}", status)));
    }
    let body = response.text().await?;
    Ok(XmlElement::parse(&body).map_err(|e| e.to_string()))
}
