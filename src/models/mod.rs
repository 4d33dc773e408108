//! Value types for the device's configuration documents
//!
//! Every type parses from an [`XmlElement`](crate::XmlElement) via
//! [`FromXml`](crate::FromXml); types that can be written back to the device
//! also implement [`ToXml`](crate::ToXml).

mod capabilities;
mod content_item;
mod controls;
mod group;
mod info;
mod media;
mod network;
mod now_playing;
mod play_info;
mod preset;
mod recent;
mod search;
mod simple_config;
mod source;
mod supported_urls;
mod system;
mod tone;
mod volume;
mod zone;

pub use capabilities::{Capabilities, Capability};
pub use content_item::ContentItem;
pub use controls::{
    CecHdmiMode, KeyAction, KeyState, SoundTouchKey, UserPlayControlType, UserRatingType,
    UserTrackControlType, KEY_SENDER,
};
pub use group::{Group, GroupRole, GroupRoleType};
pub use info::{Component, InfoNetworkInfo, Information};
pub use media::{
    AddStation, MediaServer, MediaServerList, Navigate, NavigateResponse, RemoveStation,
};
pub use network::{
    BluetoothInfo, NetworkInfo, NetworkInterface, NetworkStatus, NetworkStatusInterface,
};
pub use now_playing::{NowPlayingStatus, SOURCE_NOTIFICATION, SOURCE_STANDBY};
pub use play_info::{
    NotificationOptions, PlayInfo, DEFAULT_APP_KEY, NOTIFICATION_VOLUME_FALLBACK,
    NOTIFICATION_VOLUME_MAX, NOTIFICATION_VOLUME_MIN,
};
pub use preset::{Preset, PresetList};
pub use recent::{Recent, RecentList};
pub use search::{
    Introspect, NavigateItem, Search, SearchResponse, SearchResult, SearchStation,
    SearchStationResults,
};
pub use simple_config::SimpleConfig;
pub use source::{SourceItem, SourceList};
pub use supported_urls::SupportedUrls;
pub use system::{
    ClockTime, PowerManagement, ProductCecHdmiControl, RebroadcastLatencyMode, ServiceAvailability,
    ServiceState, SoundTouchConfigurationStatus, SystemTimeout, TrackInfo,
};
pub use tone::{
    AudioDspControls, AudioProductLevelControls, AudioProductToneControls,
    AudioSpeakerAttributeAndSetting, Balance, Bass, BassCapabilities, ControlLevel, DspMonoStereo,
    SpeakerSetting,
};
pub use volume::Volume;
pub use zone::{Zone, ZoneMember};
