use crate::cache::ConfigurationCache;
use crate::device::SoundTouchDevice;
use crate::endpoint::{nodes, Endpoint};
use crate::error::{Result, SoundTouchError};
use crate::message::SoundTouchMessage;
use crate::models::{
    AddStation, AudioDspControls, AudioProductLevelControls, AudioProductToneControls,
    AudioSpeakerAttributeAndSetting, Balance, Bass, BassCapabilities, BluetoothInfo, Capabilities,
    ClockTime, ContentItem, DspMonoStereo, Group, Information, Introspect, KeyAction, KeyState,
    MediaServerList, Navigate, NavigateResponse, NetworkInfo, NetworkStatus, NotificationOptions,
    NowPlayingStatus, PlayInfo, PowerManagement, Preset, PresetList, ProductCecHdmiControl,
    RebroadcastLatencyMode, Recent, RecentList, RemoveStation, Search, SearchResponse,
    SearchStation, SearchStationResults, ServiceAvailability, SimpleConfig,
    SoundTouchConfigurationStatus, SoundTouchKey, SourceList, SupportedUrls, SystemTimeout,
    TrackInfo, UserPlayControlType, UserRatingType, UserTrackControlType, Volume, Zone,
    DEFAULT_APP_KEY, NOTIFICATION_VOLUME_MAX, NOTIFICATION_VOLUME_MIN,
};
use crate::snapshot::SnapshotStore;
use crate::xml::{FromXml, RequestBody, XmlElement};
use reqwest::header::{HeaderMap, ALLOW};
use reqwest::Method;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

/// Upper bound for every settle delay
pub const MAX_SETTLE_DELAY: Duration = Duration::from_secs(10);
/// Default settle delay after selecting content, a preset, or a recent
pub const DEFAULT_SELECT_DELAY: Duration = Duration::from_secs(5);
/// Default settle delay after selecting a source
pub const DEFAULT_SOURCE_DELAY: Duration = Duration::from_secs(3);
/// Default TCP port of the device's diagnostic shell
pub const DEFAULT_REBOOT_PORT: u16 = 17000;
/// Text-to-speech service used when no template is given; `{saytext}` is replaced
pub const DEFAULT_TTS_URL: &str =
    "http://translate.google.com/translate_tts?ie=UTF-8&tl=EN&client=tw-ob&q={saytext}";

const REBOOT_COMMAND: &[u8] = b"sys reboot\n";
const REBOOT_REPLY_TIMEOUT: Duration = Duration::from_secs(2);

/// Client for a single SoundTouch device
///
/// Every device operation goes through one request pipeline: the endpoint is
/// checked against the device's advertised capabilities, the request is sent
/// to `http://{host}:{port}/{endpoint}`, and the XML response is checked for
/// an error envelope. Parsed configuration values are memoized per endpoint;
/// accessors take a `refresh` flag to bypass the cache.
///
/// Operations that give the device time to change state sleep for a settle
/// delay before returning. Each such operation documents its default, and all
/// delays are capped at [`MAX_SETTLE_DELAY`].
///
/// # Example
///
/// ```no_run
/// use soundtouch_api::{SoundTouchClient, SoundTouchDevice};
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let device = SoundTouchDevice::connect("192.168.1.131").await?;
///     let client = SoundTouchClient::new(Arc::new(device));
///
///     let volume = client.get_volume(true).await?;
///     println!("volume is {}", volume.actual);
///     client.set_volume_level(volume.actual + 5).await?;
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct SoundTouchClient {
    device: Arc<SoundTouchDevice>,
    raise_errors: bool,
    cache: Mutex<ConfigurationCache>,
    snapshot: Mutex<SnapshotStore>,
}

impl SoundTouchClient {
    /// Client that fails with [`SoundTouchError::Device`] when the device reports an error
    pub fn new(device: Arc<SoundTouchDevice>) -> Self {
        Self {
            device,
            raise_errors: true,
            cache: Mutex::new(ConfigurationCache::new()),
            snapshot: Mutex::new(SnapshotStore::default()),
        }
    }

    /// When disabled, device errors are attached to the returned message
    /// instead of failing the call
    pub fn with_raise_errors(mut self, raise_errors: bool) -> Self {
        self.raise_errors = raise_errors;
        self
    }

    pub fn device(&self) -> &Arc<SoundTouchDevice> {
        &self.device
    }

    pub fn raise_errors(&self) -> bool {
        self.raise_errors
    }

    /// Cached configuration values
    pub fn cache(&self) -> MutexGuard<'_, ConfigurationCache> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Cached value for `endpoint` without any I/O
    pub fn cached<T: Clone + Send + Sync + 'static>(&self, endpoint: Endpoint) -> Option<T> {
        self.cache().get::<T>(&endpoint)
    }

    pub(crate) fn snapshot_store(&self) -> MutexGuard<'_, SnapshotStore> {
        self.snapshot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ========== Request pipeline ==========

    /// `GET` an endpoint
    ///
    /// Event endpoints return an empty message without any I/O. Endpoints the
    /// device does not advertise fail with [`SoundTouchError::NotCapable`],
    /// also without I/O.
    pub async fn get(&self, endpoint: Endpoint) -> Result<SoundTouchMessage> {
        let mut message = SoundTouchMessage::new(endpoint, None);
        if endpoint.is_event() {
            return Ok(message);
        }
        self.check_capable(&endpoint)?;
        self.execute(Method::GET, &mut message).await?;
        Ok(message)
    }

    /// `POST` a body to an endpoint
    ///
    /// Values implementing [`ToXml`](crate::ToXml) are rendered to XML; strings
    /// are sent as-is. Gating is the same as for [`get`](Self::get).
    pub async fn put<B: RequestBody + ?Sized>(
        &self,
        endpoint: Endpoint,
        body: &B,
    ) -> Result<SoundTouchMessage> {
        let mut message = SoundTouchMessage::new(endpoint, Some(body.to_body()));
        if endpoint.is_event() {
            return Ok(message);
        }
        self.check_capable(&endpoint)?;
        self.execute(Method::POST, &mut message).await?;
        Ok(message)
    }

    /// Methods the device allows on an endpoint, from the `Allow` header.
    ///
    /// Empty when the endpoint is an event, is not advertised by the device,
    /// or the device sends no `Allow` header.
    pub async fn options(&self, endpoint: Endpoint) -> Result<Vec<String>> {
        if endpoint.is_event() || !self.device.supports(&endpoint) {
            tracing::debug!(
                "OPTIONS '{}' skipped: not a request endpoint of '{}'",
                endpoint,
                self.device.device_name()
            );
            return Ok(Vec::new());
        }

        let url = self.device.url(&endpoint);
        let response = self.device.http().request(Method::OPTIONS, &url).send().await?;
        tracing::debug!("OPTIONS {} -> {}", url, response.status());

        Ok(allowed_methods(response.headers()))
    }

    /// Alias of [`options`](Self::options)
    pub async fn get_options(&self, endpoint: Endpoint) -> Result<Vec<String>> {
        self.options(endpoint).await
    }

    fn check_capable(&self, endpoint: &Endpoint) -> Result<()> {
        if self.device.supports(endpoint) {
            return Ok(());
        }
        tracing::debug!(
            "Device '{}' is not capable of '{}'; request not sent",
            self.device.device_name(),
            endpoint
        );
        Err(SoundTouchError::NotCapable {
            endpoint: endpoint.name().to_owned(),
            device: self.device.device_name(),
        })
    }

    async fn execute(&self, method: Method, message: &mut SoundTouchMessage) -> Result<()> {
        let url = self.device.url(&message.endpoint());
        let mut request = self.device.http().request(method.clone(), &url);
        if let Some(body) = message.request_body() {
            tracing::debug!("{} {} body: {}", method, url, body);
            request = request.body(body.to_owned());
        }

        let response = request.send().await?;
        let status = response.status();
        tracing::debug!("{} {} -> {}", method, url, status);

        let bytes = response.bytes().await?;
        let text = String::from_utf8_lossy(&bytes);
        let tree = if text.trim().is_empty() {
            if !status.is_success() {
                return Err(SoundTouchError::InvalidResponse(format!(
                    "{} {} returned HTTP status {} with an empty body",
                    method, url, status
                )));
            }
            None
        } else {
            Some(XmlElement::parse(&text)?)
        };

        message.set_response(status.as_u16(), tree);

        if let Some(envelope) = message.error() {
            tracing::warn!(
                "Device '{}' returned an error for '{}': {}",
                self.device.device_name(),
                message.endpoint(),
                envelope
            );
            if self.raise_errors {
                return Err(SoundTouchError::Device(envelope.clone()));
            }
        }
        Ok(())
    }

    /// Builds a value from a message, failing on error envelopes and empty bodies
    pub(crate) fn parse_response<T: FromXml>(message: &SoundTouchMessage) -> Result<T> {
        if let Some(envelope) = message.error() {
            return Err(SoundTouchError::Device(envelope.clone()));
        }
        let tree = message.response().ok_or_else(|| {
            SoundTouchError::InvalidResponse(format!(
                "'{}' returned an empty response",
                message.endpoint()
            ))
        })?;
        T::from_xml(tree)
    }

    // ========== Configuration cache ==========

    /// Cached value for `endpoint`, fetched from the device on a miss or when `refresh` is set
    pub async fn get_property<T>(&self, endpoint: Endpoint, refresh: bool) -> Result<T>
    where
        T: FromXml + Clone + Send + Sync + 'static,
    {
        if !refresh {
            let cached = self.cache().get::<T>(&endpoint);
            if let Some(value) = cached {
                tracing::debug!("Using cached '{}' for '{}'", endpoint, self.device.device_name());
                return Ok(value);
            }
        }
        self.refresh_configuration(endpoint).await
    }

    /// Fetch `endpoint` from the device and replace its cache entry
    pub async fn refresh_configuration<T>(&self, endpoint: Endpoint) -> Result<T>
    where
        T: FromXml + Clone + Send + Sync + 'static,
    {
        let message = self.get(endpoint).await?;
        let value: T = Self::parse_response(&message)?;
        self.cache().insert(&endpoint, value.clone());
        Ok(value)
    }

    // ========== Accessors ==========

    pub async fn get_information(&self, refresh: bool) -> Result<Information> {
        self.get_property(nodes::INFO, refresh).await
    }

    pub async fn get_supported_urls(&self, refresh: bool) -> Result<SupportedUrls> {
        self.get_property(nodes::SUPPORTED_URLS, refresh).await
    }

    pub async fn get_volume(&self, refresh: bool) -> Result<Volume> {
        self.get_property(nodes::VOLUME, refresh).await
    }

    pub async fn get_bass(&self, refresh: bool) -> Result<Bass> {
        self.get_property(nodes::BASS, refresh).await
    }

    pub async fn get_bass_capabilities(&self, refresh: bool) -> Result<BassCapabilities> {
        self.get_property(nodes::BASS_CAPABILITIES, refresh).await
    }

    pub async fn get_balance(&self, refresh: bool) -> Result<Balance> {
        self.get_property(nodes::BALANCE, refresh).await
    }

    pub async fn get_capabilities(&self, refresh: bool) -> Result<Capabilities> {
        self.get_property(nodes::CAPABILITIES, refresh).await
    }

    pub async fn get_now_playing_status(&self, refresh: bool) -> Result<NowPlayingStatus> {
        self.get_property(nodes::NOW_PLAYING, refresh).await
    }

    pub async fn get_preset_list(&self, refresh: bool) -> Result<PresetList> {
        self.get_property(nodes::PRESETS, refresh).await
    }

    pub async fn get_recent_list(&self, refresh: bool) -> Result<RecentList> {
        self.get_property(nodes::RECENTS, refresh).await
    }

    pub async fn get_source_list(&self, refresh: bool) -> Result<SourceList> {
        self.get_property(nodes::SOURCES, refresh).await
    }

    /// Current zone; a device outside any zone reports an empty zone
    pub async fn get_zone_status(&self, refresh: bool) -> Result<Zone> {
        self.get_property(nodes::GET_ZONE, refresh).await
    }

    /// Current stereo pair; only stereo-pair capable products advertise `getGroup`
    pub async fn get_group_stereo_pair_status(&self, refresh: bool) -> Result<Group> {
        self.get_property(nodes::GET_GROUP, refresh).await
    }

    pub async fn get_name(&self, refresh: bool) -> Result<SimpleConfig> {
        self.get_property(nodes::NAME, refresh).await
    }

    pub async fn get_language(&self, refresh: bool) -> Result<SimpleConfig> {
        self.get_property(nodes::LANGUAGE, refresh).await
    }

    pub async fn get_audio_dsp_controls(&self, refresh: bool) -> Result<AudioDspControls> {
        self.get_property(nodes::AUDIO_DSP_CONTROLS, refresh).await
    }

    pub async fn get_audio_product_tone_controls(
        &self,
        refresh: bool,
    ) -> Result<AudioProductToneControls> {
        self.get_property(nodes::AUDIO_PRODUCT_TONE_CONTROLS, refresh).await
    }

    pub async fn get_track_info(&self, refresh: bool) -> Result<TrackInfo> {
        self.get_property(nodes::TRACK_INFO, refresh).await
    }

    pub async fn get_clock_time(&self, refresh: bool) -> Result<ClockTime> {
        self.get_property(nodes::CLOCK_TIME, refresh).await
    }

    pub async fn get_power_management(&self, refresh: bool) -> Result<PowerManagement> {
        self.get_property(nodes::POWER_MANAGEMENT, refresh).await
    }

    pub async fn get_audio_product_level_controls(
        &self,
        refresh: bool,
    ) -> Result<AudioProductLevelControls> {
        self.get_property(nodes::AUDIO_PRODUCT_LEVEL_CONTROLS, refresh).await
    }

    /// Rear speaker and subwoofer attachments (e.g. ST-300)
    pub async fn get_audio_speaker_attribute_and_setting(
        &self,
        refresh: bool,
    ) -> Result<AudioSpeakerAttributeAndSetting> {
        self.get_property(nodes::AUDIO_SPEAKER_ATTRIBUTE_AND_SETTING, refresh).await
    }

    pub async fn get_bluetooth_info(&self, refresh: bool) -> Result<BluetoothInfo> {
        self.get_property(nodes::BLUETOOTH_INFO, refresh).await
    }

    pub async fn get_dsp_mono_stereo(&self, refresh: bool) -> Result<DspMonoStereo> {
        self.get_property(nodes::DSP_MONO_STEREO, refresh).await
    }

    /// UPnP media servers the device can browse
    pub async fn get_media_server_list(&self, refresh: bool) -> Result<MediaServerList> {
        self.get_property(nodes::LIST_MEDIA_SERVERS, refresh).await
    }

    pub async fn get_network_info(&self, refresh: bool) -> Result<NetworkInfo> {
        self.get_property(nodes::NETWORK_INFO, refresh).await
    }

    pub async fn get_network_status(&self, refresh: bool) -> Result<NetworkStatus> {
        self.get_property(nodes::NET_STATS, refresh).await
    }

    pub async fn get_product_cec_hdmi_control(
        &self,
        refresh: bool,
    ) -> Result<ProductCecHdmiControl> {
        self.get_property(nodes::PRODUCT_CEC_HDMI_CONTROL, refresh).await
    }

    pub async fn get_rebroadcast_latency_mode(
        &self,
        refresh: bool,
    ) -> Result<RebroadcastLatencyMode> {
        self.get_property(nodes::REBROADCAST_LATENCY_MODE, refresh).await
    }

    /// Bearer token for the device's cloud account; the token is an attribute of the document
    pub async fn get_request_token(&self, refresh: bool) -> Result<SimpleConfig> {
        self.get_property(nodes::REQUEST_TOKEN, refresh).await
    }

    pub async fn get_service_availability(&self, refresh: bool) -> Result<ServiceAvailability> {
        self.get_property(nodes::SERVICE_AVAILABILITY, refresh).await
    }

    pub async fn get_soundtouch_configuration_status(
        &self,
        refresh: bool,
    ) -> Result<SoundTouchConfigurationStatus> {
        self.get_property(nodes::SOUNDTOUCH_CONFIGURATION_STATUS, refresh).await
    }

    pub async fn get_system_timeout(&self, refresh: bool) -> Result<SystemTimeout> {
        self.get_property(nodes::SYSTEM_TIMEOUT, refresh).await
    }

    // ========== Levels and settings ==========

    /// Set the volume; levels outside 0-100 are clamped
    ///
    /// The cached volume keeps its mute flag and takes the new level.
    pub async fn set_volume_level(&self, level: i32) -> Result<SoundTouchMessage> {
        let request = Volume::new(level);
        tracing::debug!(
            "Setting volume of '{}' to {}",
            self.device.device_name(),
            request.actual
        );

        let message = self.put(nodes::VOLUME, &request).await?;
        if !message.has_error() {
            self.cache().update::<Volume, _>(&nodes::VOLUME, |v| {
                v.actual = request.actual;
                v.target = request.target;
            });
        }
        Ok(message)
    }

    pub async fn set_bass_level(&self, level: i32) -> Result<SoundTouchMessage> {
        let request = Bass::new(level);
        tracing::debug!("Setting bass of '{}' to {}", self.device.device_name(), level);

        let message = self.put(nodes::BASS, &request).await?;
        if !message.has_error() {
            self.cache().insert(&nodes::BASS, request);
        }
        Ok(message)
    }

    pub async fn set_balance_level(&self, level: i32) -> Result<SoundTouchMessage> {
        let request = Balance::new(level);
        tracing::debug!("Setting balance of '{}' to {}", self.device.device_name(), level);

        let message = self.put(nodes::BALANCE, &request).await?;
        if !message.has_error() {
            self.cache().update::<Balance, _>(&nodes::BALANCE, |b| {
                b.actual = request.actual;
                b.target = request.target;
            });
        }
        Ok(message)
    }

    /// Rename the device; updates the device handle and the cached `name`
    pub async fn set_name(&self, name: &str) -> Result<SoundTouchMessage> {
        tracing::info!("Renaming '{}' to '{}'", self.device.device_name(), name);

        let request = SimpleConfig::new(nodes::NAME.name(), name);
        let message = self.put(nodes::NAME, &request).await?;
        if !message.has_error() {
            self.device.set_device_name(name);
            self.cache().insert(&nodes::NAME, request);
        }
        Ok(message)
    }

    pub async fn set_audio_dsp_controls(
        &self,
        controls: &AudioDspControls,
    ) -> Result<SoundTouchMessage> {
        let message = self.put(nodes::AUDIO_DSP_CONTROLS, controls).await?;
        if !message.has_error() {
            self.cache().insert(&nodes::AUDIO_DSP_CONTROLS, controls.clone());
        }
        Ok(message)
    }

    pub async fn set_audio_product_tone_controls(
        &self,
        controls: &AudioProductToneControls,
    ) -> Result<SoundTouchMessage> {
        let message = self.put(nodes::AUDIO_PRODUCT_TONE_CONTROLS, controls).await?;
        if !message.has_error() {
            self.cache()
                .insert(&nodes::AUDIO_PRODUCT_TONE_CONTROLS, controls.clone());
        }
        Ok(message)
    }

    pub async fn set_audio_product_level_controls(
        &self,
        controls: &AudioProductLevelControls,
    ) -> Result<SoundTouchMessage> {
        let message = self.put(nodes::AUDIO_PRODUCT_LEVEL_CONTROLS, controls).await?;
        if !message.has_error() {
            self.cache()
                .update::<AudioProductLevelControls, _>(&nodes::AUDIO_PRODUCT_LEVEL_CONTROLS, |c| {
                    c.front_center_speaker_level.value = controls.front_center_speaker_level.value;
                    c.rear_surround_speakers_level.value =
                        controls.rear_surround_speakers_level.value;
                });
        }
        Ok(message)
    }

    pub async fn set_product_cec_hdmi_control(
        &self,
        control: &ProductCecHdmiControl,
    ) -> Result<SoundTouchMessage> {
        tracing::debug!("Setting {} on '{}'", control, self.device.device_name());
        let message = self.put(nodes::PRODUCT_CEC_HDMI_CONTROL, control).await?;
        if !message.has_error() {
            self.cache()
                .insert(&nodes::PRODUCT_CEC_HDMI_CONTROL, control.clone());
        }
        Ok(message)
    }

    // ========== Bluetooth ==========

    /// Make the device discoverable; it switches to the BLUETOOTH source once a phone pairs
    pub async fn enter_bluetooth_pairing(&self) -> Result<SoundTouchMessage> {
        tracing::info!("Entering bluetooth pairing on '{}'", self.device.device_name());
        self.get(nodes::ENTER_BLUETOOTH_PAIRING).await
    }

    /// Forget every paired bluetooth device
    pub async fn clear_bluetooth_paired(&self) -> Result<SoundTouchMessage> {
        tracing::info!("Clearing bluetooth pairings on '{}'", self.device.device_name());
        self.get(nodes::CLEAR_BLUETOOTH_PAIRED).await
    }

    // ========== Keys ==========

    /// Simulate a remote-control key; [`KeyState::Both`] sends a press then a release
    pub async fn action(&self, key: SoundTouchKey, state: KeyState) -> Result<()> {
        tracing::debug!(
            "Key {} ({}) on '{}'",
            key,
            state,
            self.device.device_name()
        );
        if matches!(state, KeyState::Press | KeyState::Both) {
            let press = KeyAction {
                key,
                state: KeyState::Press,
            };
            self.put(nodes::KEY, &press).await?;
        }
        if matches!(state, KeyState::Release | KeyState::Both) {
            let release = KeyAction {
                key,
                state: KeyState::Release,
            };
            self.put(nodes::KEY, &release).await?;
        }
        Ok(())
    }

    pub async fn volume_up(&self) -> Result<()> {
        self.action(SoundTouchKey::VolumeUp, KeyState::Both).await
    }

    pub async fn volume_down(&self) -> Result<()> {
        self.action(SoundTouchKey::VolumeDown, KeyState::Both).await
    }

    /// Toggle mute
    pub async fn mute(&self) -> Result<()> {
        self.action(SoundTouchKey::Mute, KeyState::Press).await
    }

    /// Mute unless already muted
    pub async fn mute_on(&self, refresh: bool) -> Result<()> {
        if !self.get_volume(refresh).await?.is_muted {
            self.mute().await?;
        }
        Ok(())
    }

    /// Unmute if muted
    pub async fn mute_off(&self, refresh: bool) -> Result<()> {
        if self.get_volume(refresh).await?.is_muted {
            self.mute().await?;
        }
        Ok(())
    }

    /// Toggle power
    pub async fn power(&self) -> Result<()> {
        self.action(SoundTouchKey::Power, KeyState::Both).await
    }

    /// Power on if the device is in standby
    pub async fn power_on(&self, refresh: bool) -> Result<()> {
        let status = self.get_now_playing_status(refresh).await?;
        if status.source.is_none() || status.is_standby() {
            self.power().await?;
        }
        Ok(())
    }

    /// Put the device in standby unless it already is
    pub async fn power_off(&self, refresh: bool) -> Result<()> {
        let status = self.get_now_playing_status(refresh).await?;
        if status.source.is_some() && !status.is_standby() {
            self.power().await?;
        }
        Ok(())
    }

    pub async fn power_standby(&self) -> Result<SoundTouchMessage> {
        tracing::debug!("Standby on '{}'", self.device.device_name());
        self.get(nodes::STANDBY).await
    }

    pub async fn power_standby_low_power(&self) -> Result<SoundTouchMessage> {
        tracing::debug!("Low-power standby on '{}'", self.device.device_name());
        self.get(nodes::LOW_POWER_STANDBY).await
    }

    /// Rate the current track up; skipped when the source does not support rating
    pub async fn thumbs_up(&self) -> Result<()> {
        self.rate_with_key(SoundTouchKey::ThumbsUp).await
    }

    /// Rate the current track down; skipped when the source does not support rating
    pub async fn thumbs_down(&self) -> Result<()> {
        self.rate_with_key(SoundTouchKey::ThumbsDown).await
    }

    async fn rate_with_key(&self, key: SoundTouchKey) -> Result<()> {
        let status = self.get_now_playing_status(true).await?;
        if status.is_rating_enabled {
            self.action(key, KeyState::Press).await
        } else {
            tracing::debug!("Rating not enabled for {}", status);
            Ok(())
        }
    }

    /// Favorite the current track; skipped when the source does not support favorites
    pub async fn add_favorite(&self) -> Result<()> {
        self.favorite_with_key(SoundTouchKey::AddFavorite).await
    }

    /// Unfavorite the current track; skipped when the source does not support favorites
    pub async fn remove_favorite(&self) -> Result<()> {
        self.favorite_with_key(SoundTouchKey::RemoveFavorite).await
    }

    async fn favorite_with_key(&self, key: SoundTouchKey) -> Result<()> {
        let status = self.get_now_playing_status(true).await?;
        if status.is_favorite_enabled {
            self.action(key, KeyState::Press).await
        } else {
            tracing::debug!("Favorites not enabled for {}", status);
            Ok(())
        }
    }

    // ========== Media controls ==========

    pub async fn set_user_play_control(
        &self,
        control: UserPlayControlType,
    ) -> Result<SoundTouchMessage> {
        tracing::debug!("userPlayControl {} on '{}'", control, self.device.device_name());
        self.put(nodes::USER_PLAY_CONTROL, &control).await
    }

    pub async fn set_user_track_control(
        &self,
        control: UserTrackControlType,
    ) -> Result<SoundTouchMessage> {
        tracing::debug!("userTrackControl {} on '{}'", control, self.device.device_name());
        self.put(nodes::USER_TRACK_CONTROL, &control).await
    }

    pub async fn set_user_rating(&self, rating: UserRatingType) -> Result<SoundTouchMessage> {
        tracing::debug!("userRating {} on '{}'", rating, self.device.device_name());
        self.put(nodes::USER_RATING, &rating).await
    }

    pub async fn media_play(&self) -> Result<SoundTouchMessage> {
        self.set_user_play_control(UserPlayControlType::Play).await
    }

    pub async fn media_pause(&self) -> Result<SoundTouchMessage> {
        self.set_user_play_control(UserPlayControlType::Pause).await
    }

    pub async fn media_resume(&self) -> Result<SoundTouchMessage> {
        self.set_user_play_control(UserPlayControlType::Play).await
    }

    pub async fn media_play_pause(&self) -> Result<SoundTouchMessage> {
        self.set_user_play_control(UserPlayControlType::PlayPause).await
    }

    pub async fn media_stop(&self) -> Result<SoundTouchMessage> {
        self.set_user_play_control(UserPlayControlType::Stop).await
    }

    pub async fn media_next_track(&self) -> Result<SoundTouchMessage> {
        self.set_user_track_control(UserTrackControlType::NextTrack).await
    }

    /// Previous track; `force` skips back even when the track is past its start
    pub async fn media_previous_track(&self, force: bool) -> Result<SoundTouchMessage> {
        let control = if force {
            UserTrackControlType::PreviousTrackForce
        } else {
            UserTrackControlType::PreviousTrack
        };
        self.set_user_track_control(control).await
    }

    pub async fn media_repeat_all(&self) -> Result<SoundTouchMessage> {
        self.set_user_track_control(UserTrackControlType::RepeatAll).await
    }

    pub async fn media_repeat_one(&self) -> Result<SoundTouchMessage> {
        self.set_user_track_control(UserTrackControlType::RepeatOne).await
    }

    pub async fn media_repeat_off(&self) -> Result<SoundTouchMessage> {
        self.set_user_track_control(UserTrackControlType::RepeatOff).await
    }

    pub async fn media_shuffle_on(&self) -> Result<SoundTouchMessage> {
        self.set_user_track_control(UserTrackControlType::ShuffleOn).await
    }

    pub async fn media_shuffle_off(&self) -> Result<SoundTouchMessage> {
        self.set_user_track_control(UserTrackControlType::ShuffleOff).await
    }

    // ========== Selection ==========

    /// Play a content item, then settle (default 5s)
    pub async fn select_content_item(
        &self,
        item: &ContentItem,
        delay: Option<Duration>,
    ) -> Result<SoundTouchMessage> {
        tracing::debug!("Selecting {} on '{}'", item, self.device.device_name());
        let message = self.put(nodes::SELECT, item).await?;
        self.settle(settle_delay(delay, DEFAULT_SELECT_DELAY)).await;
        Ok(message)
    }

    /// Play a content item returned by navigation or search, then settle (default 5s)
    pub async fn play_content_item(
        &self,
        item: &ContentItem,
        delay: Option<Duration>,
    ) -> Result<SoundTouchMessage> {
        self.select_content_item(item, delay).await
    }

    /// Switch to a source, then settle (default 3s)
    pub async fn select_source(
        &self,
        source: &str,
        source_account: Option<&str>,
        delay: Option<Duration>,
    ) -> Result<SoundTouchMessage> {
        if source.trim().is_empty() {
            return Err(SoundTouchError::InvalidInput(
                "source must not be empty".to_string(),
            ));
        }
        let item = ContentItem::for_source(source, source_account.map(str::to_owned));
        self.select_content_item(&item, Some(delay.unwrap_or(DEFAULT_SOURCE_DELAY)))
            .await
    }

    /// Play a stored preset's content, then settle (default 5s)
    pub async fn select_preset(
        &self,
        preset: &Preset,
        delay: Option<Duration>,
    ) -> Result<SoundTouchMessage> {
        self.select_content_item(&preset.content_item, delay).await
    }

    /// Play a recently played item, then settle (default 5s)
    pub async fn select_recent(
        &self,
        recent: &Recent,
        delay: Option<Duration>,
    ) -> Result<SoundTouchMessage> {
        self.select_content_item(&recent.content_item, delay).await
    }

    /// Release the `PRESET_{slot}` key for slot 1-6, then settle (default 3s)
    pub async fn select_preset_slot(&self, slot: u8, delay: Option<Duration>) -> Result<()> {
        let key = SoundTouchKey::preset(slot).ok_or_else(|| {
            SoundTouchError::InvalidInput(format!("preset slot {} is not in 1-6", slot))
        })?;
        self.action(key, KeyState::Release).await?;
        self.settle(settle_delay(delay, DEFAULT_SOURCE_DELAY)).await;
        Ok(())
    }

    pub async fn select_preset_1(&self, delay: Option<Duration>) -> Result<()> {
        self.select_preset_slot(1, delay).await
    }

    pub async fn select_preset_2(&self, delay: Option<Duration>) -> Result<()> {
        self.select_preset_slot(2, delay).await
    }

    pub async fn select_preset_3(&self, delay: Option<Duration>) -> Result<()> {
        self.select_preset_slot(3, delay).await
    }

    pub async fn select_preset_4(&self, delay: Option<Duration>) -> Result<()> {
        self.select_preset_slot(4, delay).await
    }

    pub async fn select_preset_5(&self, delay: Option<Duration>) -> Result<()> {
        self.select_preset_slot(5, delay).await
    }

    pub async fn select_preset_6(&self, delay: Option<Duration>) -> Result<()> {
        self.select_preset_slot(6, delay).await
    }

    /// Return to the last used source, then settle (default 3s)
    pub async fn select_last_source(&self, delay: Option<Duration>) -> Result<SoundTouchMessage> {
        self.select_last(nodes::SELECT_LAST_SOURCE, delay).await
    }

    /// Return to the last SoundTouch source, then settle (default 3s)
    pub async fn select_last_soundtouch_source(
        &self,
        delay: Option<Duration>,
    ) -> Result<SoundTouchMessage> {
        self.select_last(nodes::SELECT_LAST_SOUNDTOUCH_SOURCE, delay).await
    }

    /// Return to the last Wi-Fi source, then settle (default 3s)
    pub async fn select_last_wifi_source(
        &self,
        delay: Option<Duration>,
    ) -> Result<SoundTouchMessage> {
        self.select_last(nodes::SELECT_LAST_WIFI_SOURCE, delay).await
    }

    /// Switch to the local input, then settle (default 3s)
    pub async fn select_local_source(&self, delay: Option<Duration>) -> Result<SoundTouchMessage> {
        self.select_last(nodes::SELECT_LOCAL_SOURCE, delay).await
    }

    async fn select_last(
        &self,
        endpoint: Endpoint,
        delay: Option<Duration>,
    ) -> Result<SoundTouchMessage> {
        tracing::debug!("{} on '{}'", endpoint, self.device.device_name());
        let message = self.get(endpoint).await?;
        self.settle(settle_delay(delay, DEFAULT_SOURCE_DELAY)).await;
        Ok(message)
    }

    // ========== Presets ==========

    /// Store a preset and cache the returned preset list.
    ///
    /// Zero timestamps are stamped with the current time. The cached list
    /// always holds the stored preset in its slot.
    pub async fn store_preset(&self, preset: &Preset) -> Result<PresetList> {
        let mut preset = preset.clone();
        let now = unix_now();
        if preset.created_on == 0 {
            preset.created_on = now;
        }
        if preset.updated_on == 0 {
            preset.updated_on = now;
        }
        tracing::info!("Storing {} on '{}'", preset, self.device.device_name());

        let message = self.put(nodes::STORE_PRESET, &preset).await?;
        let mut presets: PresetList = Self::parse_response(&message)?;
        if presets.get(preset.preset_id) != Some(&preset) {
            presets.presets.retain(|p| p.preset_id != preset.preset_id);
            presets.presets.push(preset);
            presets.presets.sort_by_key(|p| p.preset_id);
        }

        self.cache().insert(&nodes::PRESETS, presets.clone());
        Ok(presets)
    }

    /// Remove the preset in `preset_id` and cache the returned preset list
    pub async fn remove_preset(&self, preset_id: i32) -> Result<PresetList> {
        tracing::info!("Removing preset {} from '{}'", preset_id, self.device.device_name());

        let request = Preset {
            preset_id,
            ..Default::default()
        };
        let message = self.put(nodes::REMOVE_PRESET, &request).await?;
        let mut presets: PresetList = Self::parse_response(&message)?;
        presets.presets.retain(|p| p.preset_id != preset_id);

        self.cache().insert(&nodes::PRESETS, presets.clone());
        Ok(presets)
    }

    /// Remove every stored preset
    pub async fn remove_all_presets(&self) -> Result<PresetList> {
        let current = self.get_preset_list(true).await?;
        let mut remaining = PresetList::default();
        for preset in current.iter() {
            remaining = self.remove_preset(preset.preset_id).await?;
        }
        self.cache().insert(&nodes::PRESETS, remaining.clone());
        Ok(remaining)
    }

    // ========== Notifications ==========

    /// Play the device's notification beep
    pub async fn play_notification_beep(&self) -> Result<SoundTouchMessage> {
        self.get(nodes::PLAY_NOTIFICATION).await
    }

    /// Speak `text` through a text-to-speech URL.
    ///
    /// Empty text is ignored and returns `None`. `tts_url` is a template whose
    /// `{saytext}` placeholder receives the URL-encoded text; it defaults to
    /// [`DEFAULT_TTS_URL`] and must be plain `http://`. A volume of 0 keeps the
    /// current level; other levels are limited to 10-70.
    pub async fn play_notification_tts(
        &self,
        text: &str,
        tts_url: Option<&str>,
        options: &NotificationOptions,
    ) -> Result<Option<SoundTouchMessage>> {
        if text.is_empty() {
            tracing::warn!("No text given for a TTS notification; ignoring request");
            return Ok(None);
        }
        let url = tts_request_url(tts_url.unwrap_or(DEFAULT_TTS_URL), text)?;

        let mut volume = options.effective_volume();
        if volume > 0 {
            volume = volume.clamp(NOTIFICATION_VOLUME_MIN, NOTIFICATION_VOLUME_MAX);
        }

        let play_info = PlayInfo {
            url,
            app_key: app_key(options),
            service: options
                .artist
                .clone()
                .unwrap_or_else(|| "TTS Notification".to_string()),
            message: options
                .album
                .clone()
                .unwrap_or_else(|| "Google TTS".to_string()),
            reason: options.track.clone().unwrap_or_else(|| text.to_string()),
            volume,
        };

        tracing::info!("Speaking '{}' on '{}'", text, self.device.device_name());
        self.put(nodes::SPEAKER, &play_info).await.map(Some)
    }

    /// Play an `http://` media URL as a notification.
    ///
    /// The device cannot play TLS streams, so `https://` fails with
    /// [`SoundTouchError::InvalidInput`]. When a notification is already
    /// playing, the client skips past it first.
    pub async fn play_url(
        &self,
        url: &str,
        options: &NotificationOptions,
    ) -> Result<SoundTouchMessage> {
        let url = url.trim_start();
        check_playable_url(url)?;

        let now_playing = self.get_now_playing_status(true).await?;
        if now_playing.is_notification() {
            tracing::debug!("Skipping the notification playing on '{}'", self.device.device_name());
            self.media_next_track().await?;
        }

        let play_info = PlayInfo {
            url: url.to_string(),
            app_key: app_key(options),
            service: options
                .artist
                .clone()
                .unwrap_or_else(|| "Unknown Artist".to_string()),
            message: options
                .album
                .clone()
                .unwrap_or_else(|| "Unknown Album".to_string()),
            reason: options
                .track
                .clone()
                .unwrap_or_else(|| "Unknown Track".to_string()),
            volume: options.effective_volume(),
        };

        tracing::info!("Playing {} on '{}'", url, self.device.device_name());
        self.put(nodes::SPEAKER, &play_info).await
    }

    // ========== Search ==========

    pub async fn search_music_library(&self, search: &Search) -> Result<SearchResponse> {
        tracing::debug!(
            "Searching {} for '{}' on '{}'",
            search.source,
            search.search_text,
            self.device.device_name()
        );
        let message = self.put(nodes::SEARCH, search).await?;
        Self::parse_response(&message)
    }

    pub async fn search_music_service_stations(
        &self,
        search: &SearchStation,
    ) -> Result<SearchStationResults> {
        tracing::debug!(
            "Searching {} stations for '{}' on '{}'",
            search.source,
            search.search_text,
            self.device.device_name()
        );
        let message = self.put(nodes::SEARCH_STATION, search).await?;
        Self::parse_response(&message)
    }

    /// Browse a music library, e.g. a NAS source listed by
    /// [`get_source_list`](Self::get_source_list)
    pub async fn get_music_library_items(&self, navigate: &Navigate) -> Result<NavigateResponse> {
        tracing::debug!("Navigating {} on '{}'", navigate.source, self.device.device_name());
        let message = self.put(nodes::NAVIGATE, navigate).await?;
        Self::parse_response(&message)
    }

    /// Stations stored in a music service menu, e.g. PANDORA `radioStations`
    pub async fn get_music_service_stations(
        &self,
        navigate: &Navigate,
    ) -> Result<NavigateResponse> {
        tracing::debug!(
            "Listing {} stations ({}) on '{}'",
            navigate.source,
            navigate.menu.as_deref().unwrap_or(""),
            self.device.device_name()
        );
        let message = self.put(nodes::NAVIGATE, navigate).await?;
        Self::parse_response(&message)
    }

    pub async fn add_music_service_station(
        &self,
        station: &AddStation,
    ) -> Result<SoundTouchMessage> {
        tracing::info!("Adding station: {} on '{}'", station, self.device.device_name());
        self.put(nodes::ADD_STATION, station).await
    }

    /// Remove a stored station; a station that is playing stops and the source becomes
    /// `INVALID_SOURCE`
    pub async fn remove_music_service_station(
        &self,
        station: &RemoveStation,
    ) -> Result<SoundTouchMessage> {
        tracing::info!("Removing station: {} on '{}'", station, self.device.device_name());
        self.put(nodes::REMOVE_STATION, station).await
    }

    /// Raw introspection document for a source, if the device returned one
    pub async fn get_introspect_data(&self, introspect: &Introspect) -> Result<Option<String>> {
        let message = self.put(nodes::INTROSPECT, introspect).await?;
        Ok(message.response().map(XmlElement::to_xml_string))
    }

    // ========== Maintenance ==========

    /// Reboot through the device's diagnostic shell (usually port 17000).
    ///
    /// Returns whatever the shell wrote back before closing. The device
    /// accepts one shell session at a time.
    pub async fn reboot_device(&self, port: u16) -> Result<String> {
        let addr = format!("{}:{}", self.device.host(), port);
        tracing::info!("Rebooting '{}' via {}", self.device.device_name(), addr);

        let mut stream = timeout(self.device.connect_timeout(), TcpStream::connect(&addr))
            .await
            .map_err(|_| SoundTouchError::Timeout)??;
        stream.write_all(REBOOT_COMMAND).await?;

        let mut reply = Vec::new();
        if timeout(REBOOT_REPLY_TIMEOUT, stream.read_to_end(&mut reply))
            .await
            .is_err()
        {
            tracing::debug!("No close from {} after reboot command", addr);
        }
        Ok(String::from_utf8_lossy(&reply).into_owned())
    }

    /// Sleep for a settle delay
    pub(crate) async fn settle(&self, delay: Duration) {
        if delay.is_zero() {
            return;
        }
        tracing::debug!(
            "Waiting {:?} for '{}' to settle",
            delay,
            self.device.device_name()
        );
        tokio::time::sleep(delay).await;
    }
}

/// Requested delay or the operation default, capped at [`MAX_SETTLE_DELAY`]
pub(crate) fn settle_delay(delay: Option<Duration>, default: Duration) -> Duration {
    delay.unwrap_or(default).min(MAX_SETTLE_DELAY)
}

fn allowed_methods(headers: &HeaderMap) -> Vec<String> {
    headers
        .get(ALLOW)
        .and_then(|v| v.to_str().ok())
        .map(|allow| {
            allow
                .split(',')
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .map(str::to_owned)
                .collect()
        })
        .unwrap_or_default()
}

fn app_key(options: &NotificationOptions) -> String {
    options
        .app_key
        .clone()
        .unwrap_or_else(|| DEFAULT_APP_KEY.to_string())
}

/// Substitute the percent-encoded text into a TTS URL template
fn tts_request_url(template: &str, text: &str) -> Result<String> {
    let template = template.trim_start();
    if !template.starts_with("http://") {
        return Err(SoundTouchError::InvalidInput(format!(
            "TTS url '{}' does not start with 'http://'",
            template
        )));
    }
    let encoded: String = url::form_urlencoded::byte_serialize(text.as_bytes())
        .collect::<String>()
        .replace('+', "%20");
    Ok(template.replace("{saytext}", &encoded))
}

fn check_playable_url(url: &str) -> Result<()> {
    let parsed = url::Url::parse(url).map_err(|e| {
        SoundTouchError::InvalidInput(format!("'{}' is not a valid url: {}", url, e))
    })?;
    match parsed.scheme() {
        "http" => Ok(()),
        "https" => Err(SoundTouchError::InvalidInput(format!(
            "'{}' uses https; the device can only play http streams",
            url
        ))),
        other => Err(SoundTouchError::InvalidInput(format!(
            "'{}' uses unsupported scheme '{}'",
            url, other
        ))),
    }
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures;
    use reqwest::header::HeaderValue;

    #[tokio::test]
    async fn test_unsupported_endpoint_is_rejected_without_io() {
        let client = test_fixtures::client(&["info", "volume"]);

        let err = client.get_audio_dsp_controls(true).await.unwrap_err();
        assert_eq!(err.status_code(), Some(400));
        match err {
            SoundTouchError::NotCapable { endpoint, device } => {
                assert_eq!(endpoint, "audiodspcontrols");
                assert_eq!(device, "Living Room");
            }
            other => panic!("expected NotCapable, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_event_endpoint_returns_empty_message() {
        let client = test_fixtures::client(&[]);

        let message = client.get(nodes::VOLUME_UPDATED).await.unwrap();
        assert!(message.is_empty());
        assert_eq!(message.endpoint(), nodes::VOLUME_UPDATED);

        let message = client.put(nodes::ZONE_UPDATED, "<zone />").await.unwrap();
        assert_eq!(message.request_body(), Some("<zone />"));
        assert_eq!(message.status(), 0);
    }

    #[tokio::test]
    async fn test_options_skips_unsupported_endpoint() {
        let client = test_fixtures::client(&["info"]);
        assert!(client.options(nodes::VOLUME).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cached_value_served_without_refresh() {
        let client = test_fixtures::client(&["volume"]);
        client.cache().insert(&nodes::VOLUME, Volume::new(42));

        // nothing listens on the fixture address, so a request would fail
        let volume = client.get_volume(false).await.unwrap();
        assert_eq!(volume.actual, 42);
    }

    #[tokio::test]
    async fn test_play_url_rejects_https_before_io() {
        let client = test_fixtures::client(&["nowPlaying", "speaker"]);
        let err = client
            .play_url("https://example.com/a.mp3", &NotificationOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, SoundTouchError::InvalidInput(_)));

        let err = client
            .play_url("not a url", &NotificationOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, SoundTouchError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_empty_tts_text_is_ignored() {
        let client = test_fixtures::client(&["speaker"]);
        let message = client
            .play_notification_tts("", None, &NotificationOptions::default())
            .await
            .unwrap();
        assert!(message.is_none());
    }

    #[tokio::test]
    async fn test_invalid_preset_slot() {
        let client = test_fixtures::client(&["key"]);
        let err = client.select_preset_slot(7, None).await.unwrap_err();
        assert!(matches!(err, SoundTouchError::InvalidInput(_)));
    }

    #[test]
    fn test_settle_delay_clamp() {
        assert_eq!(settle_delay(None, DEFAULT_SELECT_DELAY), Duration::from_secs(5));
        assert_eq!(
            settle_delay(Some(Duration::from_secs(60)), DEFAULT_SELECT_DELAY),
            MAX_SETTLE_DELAY
        );
        assert_eq!(
            settle_delay(Some(Duration::ZERO), DEFAULT_SOURCE_DELAY),
            Duration::ZERO
        );
    }

    #[test]
    fn test_tts_request_url() {
        let url = tts_request_url(DEFAULT_TTS_URL, "Hello there & welcome").unwrap();
        assert!(url.ends_with("q=Hello%20there%20%26%20welcome"));

        assert!(tts_request_url("https://tts.example.com/?q={saytext}", "hi").is_err());
        assert_eq!(
            tts_request_url("  http://tts.local/say?text={saytext}", "a+b").unwrap(),
            "http://tts.local/say?text=a%2Bb"
        );
    }

    #[test]
    fn test_allowed_methods() {
        let mut headers = HeaderMap::new();
        assert!(allowed_methods(&headers).is_empty());

        headers.insert(ALLOW, HeaderValue::from_static("GET, POST, OPTIONS"));
        assert_eq!(allowed_methods(&headers), vec!["GET", "POST", "OPTIONS"]);
    }
}
