//! Notification surface: a WebSocket subscription to device events
//!
//! The device pushes XML frames on `ws://{host}:8080/` using the `gabbo`
//! subprotocol. A frame is either an `<updates>` wrapper holding one or more
//! event elements, or a single event element. Each event is dispatched to the
//! handlers registered for its tag name.
//!
//! Handlers run one after another on the listener task, so they must not
//! block. A handler registered for [`WILDCARD`] intercepts every event; when
//! any wildcard handler is present, category handlers are not called.

use crate::client::SoundTouchClient;
use crate::device::DEFAULT_NOTIFICATION_PORT;
use crate::error::SoundTouchError;
use crate::xml::XmlElement;
use futures_util::{SinkExt, StreamExt};
use std::collections::HashMap;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval};
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use uuid::Uuid;

/// Registering for this category intercepts every event
pub const WILDCARD: &str = "*";
pub const WEBSOCKET_OPEN: &str = "WebSocketOpen";
pub const WEBSOCKET_CLOSE: &str = "WebSocketClose";
pub const WEBSOCKET_ERROR: &str = "WebSocketError";
pub const WEBSOCKET_PING: &str = "WebSocketPing";
pub const WEBSOCKET_PONG: &str = "WebSocketPong";

/// WebSocket subprotocol the device requires
pub const SUBPROTOCOL: &str = "gabbo";
/// Payload of keepalive pings
pub const PING_PAYLOAD: &[u8] = b"KeepAlive";
/// How long to wait for a pong before the connection is considered dead
pub const PING_TIMEOUT: Duration = Duration::from_secs(10);
/// Ping interval used when a requested interval would not outlast [`PING_TIMEOUT`]
pub const COERCED_PING_INTERVAL: u64 = 60;

const STOP_JOIN_TIMEOUT: Duration = Duration::from_millis(500);

/// Argument passed to listener handlers
#[derive(Debug, Clone)]
pub enum NotificationEvent {
    /// An event element from the device
    Xml(XmlElement),
    /// A connection lifecycle notice (open, close, ping and pong payloads)
    Lifecycle(String),
    /// A transport or parse failure on the notification surface
    Error(Arc<SoundTouchError>),
}

impl NotificationEvent {
    pub fn as_xml(&self) -> Option<&XmlElement> {
        match self {
            NotificationEvent::Xml(elm) => Some(elm),
            _ => None,
        }
    }
}

/// Handle returned by [`SoundTouchWebSocket::add_listener`], used to remove the handler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(Uuid);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Listener handler
pub type Handler = Arc<dyn Fn(&SoundTouchClient, &NotificationEvent) + Send + Sync + 'static>;

/// Category to handler map shared between the caller and the listener task
#[derive(Default)]
pub struct ListenerRegistry {
    handlers: RwLock<HashMap<String, Vec<(ListenerId, Handler)>>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `category`; handlers run in registration order
    pub fn add<F>(&self, category: &str, handler: F) -> ListenerId
    where
        F: Fn(&SoundTouchClient, &NotificationEvent) + Send + Sync + 'static,
    {
        let id = ListenerId(Uuid::new_v4());
        self.handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(category.to_owned())
            .or_default()
            .push((id, Arc::new(handler)));
        id
    }

    pub fn remove(&self, category: &str, id: ListenerId) -> bool {
        let mut handlers = self.handlers.write().unwrap_or_else(PoisonError::into_inner);
        let Some(list) = handlers.get_mut(category) else {
            return false;
        };
        let before = list.len();
        list.retain(|(existing, _)| *existing != id);
        let removed = list.len() != before;
        if list.is_empty() {
            handlers.remove(category);
        }
        removed
    }

    pub fn clear(&self) {
        self.handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Number of handlers registered for `category`
    pub fn count(&self, category: &str) -> usize {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(category)
            .map_or(0, Vec::len)
    }

    /// Handlers to call for `category`, copied out so none run under the lock
    fn dispatch_set(&self, category: &str) -> Vec<Handler> {
        let handlers = self.handlers.read().unwrap_or_else(PoisonError::into_inner);
        let list = match handlers.get(WILDCARD) {
            Some(wildcard) if !wildcard.is_empty() => Some(wildcard),
            _ => handlers.get(category),
        };
        list.map(|l| l.iter().map(|(_, h)| h.clone()).collect())
            .unwrap_or_default()
    }

    /// Call each handler for `category`; a panicking handler does not stop the rest
    pub fn dispatch(
        &self,
        client: &SoundTouchClient,
        category: &str,
        event: &NotificationEvent,
    ) -> usize {
        let handlers = self.dispatch_set(category);
        for handler in &handlers {
            if catch_unwind(AssertUnwindSafe(|| handler(client, event))).is_err() {
                tracing::error!(
                    "Listener for '{}' panicked; continuing with the next one",
                    category
                );
            }
        }
        handlers.len()
    }
}

impl fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let handlers = self.handlers.read().unwrap_or_else(PoisonError::into_inner);
        let counts: HashMap<&str, usize> = handlers
            .iter()
            .map(|(k, v)| (k.as_str(), v.len()))
            .collect();
        f.debug_struct("ListenerRegistry").field("handlers", &counts).finish()
    }
}

/// Split a frame into `(category, element)` pairs
pub fn split_frame(root: XmlElement) -> Vec<(String, XmlElement)> {
    if root.name() == "updates" {
        root.children()
            .iter()
            .map(|child| (child.name().to_owned(), child.clone()))
            .collect()
    } else {
        vec![(root.name().to_owned(), root)]
    }
}

/// Apply the ping-interval rule: values in `(0, 10]` seconds become 60
pub fn coerce_ping_interval(seconds: u64) -> u64 {
    if seconds > 0 && seconds <= PING_TIMEOUT.as_secs() {
        tracing::warn!(
            "Ping interval of {}s does not outlast the {}s pong timeout; using {}s",
            seconds,
            PING_TIMEOUT.as_secs(),
            COERCED_PING_INTERVAL
        );
        COERCED_PING_INTERVAL
    } else {
        seconds
    }
}

/// Long-lived subscription to a device's notification surface
///
/// # Example
///
/// ```no_run
/// use soundtouch_api::{
///     nodes, NotificationEvent, SoundTouchClient, SoundTouchDevice, SoundTouchWebSocket,
/// };
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let device = SoundTouchDevice::connect("192.168.1.131").await?;
///     let client = Arc::new(SoundTouchClient::new(Arc::new(device)));
///
///     let mut listener = SoundTouchWebSocket::new(client, 8080, 0);
///     listener.add_listener(nodes::VOLUME_UPDATED.name(), |_client, event| {
///         if let NotificationEvent::Xml(elm) = event {
///             println!("volume now {:?}", elm.find_text("volume/actualvolume"));
///         }
///     });
///     listener.start().await?;
///
///     tokio::time::sleep(std::time::Duration::from_secs(60)).await;
///     listener.stop().await;
///     Ok(())
/// }
/// ```
pub struct SoundTouchWebSocket {
    client: Arc<SoundTouchClient>,
    port: u16,
    ping_interval: u64,
    registry: Arc<ListenerRegistry>,
    worker_alive: Arc<AtomicBool>,
    stop_requested: bool,
    stop_tx: Option<broadcast::Sender<()>>,
    task_handle: Option<JoinHandle<()>>,
}

impl SoundTouchWebSocket {
    /// Listener for `client`'s device; a `ping_interval` of 0 disables keepalive pings
    pub fn new(client: Arc<SoundTouchClient>, notification_port: u16, ping_interval: u64) -> Self {
        Self {
            client,
            port: notification_port,
            ping_interval: coerce_ping_interval(ping_interval),
            registry: Arc::new(ListenerRegistry::new()),
            worker_alive: Arc::new(AtomicBool::new(false)),
            stop_requested: false,
            stop_tx: None,
            task_handle: None,
        }
    }

    /// Listener on the default port 8080 without keepalive pings
    pub fn with_defaults(client: Arc<SoundTouchClient>) -> Self {
        Self::new(client, DEFAULT_NOTIFICATION_PORT, 0)
    }

    pub fn client(&self) -> &Arc<SoundTouchClient> {
        &self.client
    }

    pub fn notification_port(&self) -> u16 {
        self.port
    }

    /// Effective ping interval in seconds, after coercion
    pub fn ping_interval(&self) -> u64 {
        self.ping_interval
    }

    pub fn registry(&self) -> &Arc<ListenerRegistry> {
        &self.registry
    }

    pub fn add_listener<F>(&self, category: &str, handler: F) -> ListenerId
    where
        F: Fn(&SoundTouchClient, &NotificationEvent) + Send + Sync + 'static,
    {
        self.registry.add(category, handler)
    }

    pub fn remove_listener(&self, category: &str, id: ListenerId) -> bool {
        self.registry.remove(category, id)
    }

    pub fn clear_listeners(&self) {
        self.registry.clear();
    }

    /// True while the listener task holds an open connection or is connecting
    pub fn is_worker_alive(&self) -> bool {
        self.worker_alive.load(Ordering::SeqCst)
    }

    /// Open the WebSocket and start dispatching events.
    ///
    /// A no-op while the listener task is running. Connection failures are
    /// not returned; they are dispatched to [`WEBSOCKET_ERROR`] handlers and
    /// the task exits.
    pub async fn start(&mut self) -> crate::Result<()> {
        if let Some(handle) = &self.task_handle {
            if !handle.is_finished() {
                tracing::debug!(
                    "Listener for '{}' already running",
                    self.client.device().device_name()
                );
                return Ok(());
            }
            self.stop().await;
        }
        self.stop_requested = false;

        let (stop_tx, stop_rx) = broadcast::channel(1);
        self.stop_tx = Some(stop_tx);

        let url = format!("ws://{}:{}/", self.client.device().host(), self.port);
        let worker = Worker {
            url,
            ping_interval: self.ping_interval,
            client: self.client.clone(),
            registry: self.registry.clone(),
            alive: self.worker_alive.clone(),
        };

        self.worker_alive.store(true, Ordering::SeqCst);
        self.task_handle = Some(tokio::spawn(worker.run(stop_rx)));
        Ok(())
    }

    /// Close the WebSocket and join the listener task
    pub async fn stop(&mut self) {
        self.stop_requested = true;
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.task_handle.take() {
            if tokio::time::timeout(STOP_JOIN_TIMEOUT, handle).await.is_err() {
                tracing::warn!("Listener task did not stop within {:?}", STOP_JOIN_TIMEOUT);
            }
        }
        self.worker_alive.store(false, Ordering::SeqCst);
    }

    /// Restart the task if it exited on its own; returns true when restarted
    pub async fn restart_if_dead(&mut self) -> crate::Result<bool> {
        if self.stop_requested || self.is_worker_alive() {
            return Ok(false);
        }
        tracing::info!("Listener for '{}' died; restarting", self.client.device().device_name());
        self.start().await?;
        Ok(true)
    }
}

/// Periodically restart a listener whose task exited without [`SoundTouchWebSocket::stop`].
///
/// The supervisor ends once the listener has been stopped.
pub fn spawn_supervisor(
    listener: Arc<tokio::sync::Mutex<SoundTouchWebSocket>>,
    check_interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(check_interval);
        loop {
            ticker.tick().await;
            let mut listener = listener.lock().await;
            if listener.stop_requested {
                tracing::debug!("Listener stopped; supervisor exiting");
                break;
            }
            if let Err(e) = listener.restart_if_dead().await {
                tracing::error!("Failed to restart listener: {}", e);
            }
        }
    })
}

impl fmt::Debug for SoundTouchWebSocket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SoundTouchWebSocket")
            .field("host", &self.client.device().host())
            .field("port", &self.port)
            .field("ping_interval", &self.ping_interval)
            .field("alive", &self.is_worker_alive())
            .finish()
    }
}

struct Worker {
    url: String,
    ping_interval: u64,
    client: Arc<SoundTouchClient>,
    registry: Arc<ListenerRegistry>,
    alive: Arc<AtomicBool>,
}

impl Worker {
    fn dispatch(&self, category: &str, event: NotificationEvent) {
        self.registry.dispatch(&self.client, category, &event);
    }

    fn dispatch_error(&self, error: SoundTouchError) {
        tracing::error!("Notification error on {}: {}", self.url, error);
        self.dispatch(WEBSOCKET_ERROR, NotificationEvent::Error(Arc::new(error)));
    }

    async fn run(self, mut stop_rx: broadcast::Receiver<()>) {
        self.read_loop(&mut stop_rx).await;
        self.alive.store(false, Ordering::SeqCst);
    }

    async fn read_loop(&self, stop_rx: &mut broadcast::Receiver<()>) {
        tracing::info!("Opening notification socket {}", self.url);

        let mut request = match self.url.as_str().into_client_request() {
            Ok(request) => request,
            Err(e) => return self.dispatch_error(e.into()),
        };
        request
            .headers_mut()
            .insert("Sec-WebSocket-Protocol", HeaderValue::from_static(SUBPROTOCOL));

        let ws_stream = tokio::select! {
            _ = stop_rx.recv() => return,
            result = connect_async(request) => match result {
                Ok((ws_stream, _)) => ws_stream,
                Err(e) => return self.dispatch_error(e.into()),
            },
        };
        let (mut write, mut read) = ws_stream.split();

        tracing::info!("Notification socket open: {}", self.url);
        self.dispatch(WEBSOCKET_OPEN, NotificationEvent::Lifecycle(self.url.clone()));

        let mut ping_timer = (self.ping_interval > 0).then(|| {
            let period = Duration::from_secs(self.ping_interval);
            tokio::time::interval_at(Instant::now() + period, period)
        });
        let mut pong_deadline: Option<Instant> = None;

        loop {
            tokio::select! {
                _ = stop_rx.recv() => {
                    tracing::info!("Closing notification socket {}", self.url);
                    let _ = write.send(Message::Close(None)).await;
                    break;
                }
                _ = next_tick(&mut ping_timer) => {
                    if let Err(e) = write.send(Message::Ping(PING_PAYLOAD.to_vec())).await {
                        self.dispatch_error(e.into());
                        break;
                    }
                    pong_deadline.get_or_insert_with(|| Instant::now() + PING_TIMEOUT);
                }
                _ = tokio::time::sleep_until(pong_deadline.unwrap_or_else(Instant::now)),
                    if pong_deadline.is_some() =>
                {
                    self.dispatch_error(SoundTouchError::Timeout);
                    break;
                }
                msg = read.next() => match msg {
                    Some(Ok(Message::Text(text))) => self.handle_frame(&text),
                    Some(Ok(Message::Ping(payload))) => {
                        self.dispatch(WEBSOCKET_PING, lifecycle(&payload));
                    }
                    Some(Ok(Message::Pong(payload))) => {
                        pong_deadline = None;
                        self.dispatch(WEBSOCKET_PONG, lifecycle(&payload));
                    }
                    Some(Ok(Message::Close(frame))) => {
                        tracing::info!("Notification socket closed by device: {:?}", frame);
                        break;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        self.dispatch_error(e.into());
                        break;
                    }
                    None => {
                        tracing::info!("Notification socket stream ended: {}", self.url);
                        break;
                    }
                },
            }
        }

        self.dispatch(WEBSOCKET_CLOSE, NotificationEvent::Lifecycle(self.url.clone()));
    }

    fn handle_frame(&self, text: &str) {
        tracing::debug!("Notification: {}", text);
        match XmlElement::parse(text) {
            Ok(root) => {
                for (category, element) in split_frame(root) {
                    self.dispatch(&category, NotificationEvent::Xml(element));
                }
            }
            Err(e) => self.dispatch_error(e),
        }
    }
}

fn lifecycle(payload: &[u8]) -> NotificationEvent {
    NotificationEvent::Lifecycle(String::from_utf8_lossy(payload).into_owned())
}

async fn next_tick(timer: &mut Option<Interval>) {
    match timer {
        Some(timer) => {
            timer.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures;
    use std::sync::Mutex;

    fn recorder() -> (Arc<Mutex<Vec<String>>>, impl Fn(&str) -> Handler) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let make = {
            let calls = calls.clone();
            move |tag: &str| -> Handler {
                let calls = calls.clone();
                let tag = tag.to_owned();
                Arc::new(move |_: &SoundTouchClient, _: &NotificationEvent| {
                    calls.lock().unwrap().push(tag.clone());
                })
            }
        };
        (calls, make)
    }

    #[test]
    fn test_dispatch_in_registration_order() {
        let client = test_fixtures::client(&[]);
        let registry = ListenerRegistry::new();
        let (calls, make) = recorder();

        let h1 = make("h1");
        let h2 = make("h2");
        registry.add("volumeUpdated", move |c, e| h1(c, e));
        registry.add("volumeUpdated", move |c, e| h2(c, e));

        let event = NotificationEvent::Lifecycle("x".into());
        assert_eq!(registry.dispatch(&client, "volumeUpdated", &event), 2);
        assert_eq!(registry.dispatch(&client, "zoneUpdated", &event), 0);
        assert_eq!(*calls.lock().unwrap(), ["h1", "h2"]);
    }

    #[test]
    fn test_wildcard_intercepts_updates_frame() {
        let client = test_fixtures::client(&[]);
        let registry = ListenerRegistry::new();
        let (calls, make) = recorder();

        let h1 = make("h1");
        let h2 = make("h2");
        let all = make("all");
        registry.add("connectionStateUpdated", move |c, e| h1(c, e));
        registry.add("volumeUpdated", move |c, e| h2(c, e));
        registry.add(WILDCARD, move |c, e| all(c, e));

        let frame = XmlElement::parse(
            r#"<updates deviceID="AAA"><connectionStateUpdated state="NETWORK_WIFI_CONNECTED" up="true"/><volumeUpdated><volume><targetvolume>30</targetvolume></volume></volumeUpdated></updates>"#,
        )
        .unwrap();
        for (category, element) in split_frame(frame) {
            registry.dispatch(&client, &category, &NotificationEvent::Xml(element));
        }

        assert_eq!(*calls.lock().unwrap(), ["all", "all"]);
    }

    #[test]
    fn test_panicking_handler_does_not_stop_others() {
        let client = test_fixtures::client(&[]);
        let registry = ListenerRegistry::new();
        let (calls, make) = recorder();

        registry.add("nowPlayingUpdated", |_, _| panic!("handler failure"));
        let after = make("after");
        registry.add("nowPlayingUpdated", move |c, e| after(c, e));

        let event = NotificationEvent::Lifecycle(String::new());
        registry.dispatch(&client, "nowPlayingUpdated", &event);
        assert_eq!(*calls.lock().unwrap(), ["after"]);
    }

    #[test]
    fn test_remove_and_clear() {
        let registry = ListenerRegistry::new();
        let id = registry.add("volumeUpdated", |_, _| {});
        registry.add("zoneUpdated", |_, _| {});

        assert!(!registry.remove("zoneUpdated", id));
        assert!(registry.remove("volumeUpdated", id));
        assert!(!registry.remove("volumeUpdated", id));
        assert_eq!(registry.count("volumeUpdated"), 0);

        registry.clear();
        assert_eq!(registry.count("zoneUpdated"), 0);
    }

    #[test]
    fn test_split_standalone_and_wrapper_frames() {
        let single =
            split_frame(XmlElement::parse(r#"<nowPlayingUpdated deviceID="AAA"/>"#).unwrap());
        assert_eq!(single.len(), 1);
        assert_eq!(single[0].0, "nowPlayingUpdated");

        let empty = split_frame(XmlElement::parse("<updates deviceID=\"AAA\"/>").unwrap());
        assert!(empty.is_empty());
    }

    #[test]
    fn test_ping_interval_coercion() {
        assert_eq!(coerce_ping_interval(0), 0);
        assert_eq!(coerce_ping_interval(1), 60);
        assert_eq!(coerce_ping_interval(10), 60);
        assert_eq!(coerce_ping_interval(11), 11);
        assert_eq!(coerce_ping_interval(300), 300);
    }

    #[tokio::test]
    async fn test_stop_is_idempotent_without_start() {
        let client = Arc::new(test_fixtures::client(&[]));
        let mut listener = SoundTouchWebSocket::new(client, 8080, 5);
        assert_eq!(listener.ping_interval(), 60);
        listener.stop().await;
        listener.stop().await;
        assert!(!listener.is_worker_alive());
        assert!(!listener.restart_if_dead().await.unwrap());
    }
}
