//! Static catalog of SoundTouch endpoints
//!
//! Every operation the device exposes is identified by an [`Endpoint`]. Request
//! endpoints are addressed over the HTTP control surface as
//! `http://{host}:{port}/{name}`; event endpoints only ever arrive on the
//! WebSocket notification surface.
//!
//! The catalog is intersected with a device's `supportedURLs` document when a
//! [`SoundTouchDevice`](crate::SoundTouchDevice) is connected.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether an endpoint is part of the documented public surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Visibility {
    Public,
    Private,
}

/// Which device surface an endpoint lives on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EndpointKind {
    /// Served over the HTTP control surface
    Request,
    /// Pushed over the WebSocket notification surface
    Event,
}

/// A named operation exposed by a SoundTouch device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Endpoint {
    name: &'static str,
    visibility: Visibility,
    kind: EndpointKind,
}

impl Endpoint {
    const fn new(name: &'static str, visibility: Visibility, kind: EndpointKind) -> Self {
        Self {
            name,
            visibility,
            kind,
        }
    }

    /// Unique endpoint name
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// URL path segment; always identical to the name
    pub const fn path(&self) -> &'static str {
        self.name
    }

    pub const fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub const fn kind(&self) -> EndpointKind {
        self.kind
    }

    /// True if the endpoint only appears on the notification surface
    pub fn is_event(&self) -> bool {
        self.kind == EndpointKind::Event
    }

    pub fn is_private(&self) -> bool {
        self.visibility == Visibility::Private
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

macro_rules! endpoint_catalog {
    ($($ident:ident => $name:literal, $vis:ident, $kind:ident;)*) => {
        $(
            #[doc = concat!("`", $name, "`")]
            pub const $ident: Endpoint =
                Endpoint::new($name, Visibility::$vis, EndpointKind::$kind);
        )*

        pub(super) const ALL: &[Endpoint] = &[$($ident),*];
    };
}

/// Named endpoint constants
pub mod nodes {
    use super::{Endpoint, EndpointKind, Visibility};

    endpoint_catalog! {
        // ========== Private ==========
        CRITICAL_ERROR => "criticalError", Private, Request;
        FACTORY_DEFAULT => "factoryDefault", Private, Request;
        PLAY_NOTIFICATION => "playNotification", Private, Request;
        SET_COMPONENT_SOFTWARE_VERSION => "setComponentSoftwareVersion", Private, Request;
        SET_PRODUCT_SERIAL_NUMBER => "setProductSerialNumber", Private, Request;
        SET_PRODUCT_SOFTWARE_VERSION => "setProductSoftwareVersion", Private, Request;
        SET_WIFI_RADIO => "setWiFiRadio", Private, Request;
        USER_ACTIVITY => "userActivity", Private, Request;

        // ========== Events ==========
        CONNECTION_STATE_UPDATED => "connectionStateUpdated", Public, Event;
        CRITICAL_ERROR_UPDATE => "criticalErrorUpdate", Public, Event;
        ERROR_NOTIFICATION => "errorNotification", Public, Event;
        GROUP_UPDATED => "groupUpdated", Public, Event;
        LANGUAGE_UPDATED => "languageUpdated", Public, Event;
        LOW_POWER_STANDBY_UPDATE => "LowPowerStandbyUpdate", Private, Event;
        NAME_UPDATED => "nameUpdated", Public, Event;
        NOW_PLAYING_UPDATED => "nowPlayingUpdated", Public, Event;
        NOW_SELECTION_UPDATED => "nowSelectionUpdated", Public, Event;
        PRESETS_UPDATED => "presetsUpdated", Public, Event;
        RECENTS_UPDATED => "recentsUpdated", Public, Event;
        SOUNDTOUCH_CONFIGURATION_UPDATED => "soundTouchConfigurationUpdated", Public, Event;
        SOURCES_UPDATED => "sourcesUpdated", Public, Event;
        SW_UPDATE_STATUS_UPDATED => "swUpdateStatusUpdated", Public, Event;
        TEST_COMMAND_BA => "testCommandBA", Public, Event;
        TEST_COMMAND_SU => "testCommandSU", Public, Event;
        USER_ACTIVITY_UPDATE => "userActivityUpdate", Private, Event;
        VOLUME_UPDATED => "volumeUpdated", Public, Event;
        ZONE_UPDATED => "zoneUpdated", Public, Event;

        // ========== Requests ==========
        ABORT_SOFTWARE_UPDATE => "AbortSoftwareUpdate", Public, Request;
        ADD_GROUP => "addGroup", Public, Request;
        ADD_STATION => "addStation", Public, Request;
        ADD_STEREO_PAIR => "addStereoPair", Public, Request;
        ADD_WIRELESS_PROFILE => "addWirelessProfile", Public, Request;
        ADD_ZONE_SLAVE => "addZoneSlave", Public, Request;
        ART => "art", Public, Request;
        AUDIO_DSP_CONTROLS => "audiodspcontrols", Public, Request;
        AUDIO_PRODUCT_LEVEL_CONTROLS => "audioproductlevelcontrols", Public, Request;
        AUDIO_PRODUCT_TONE_CONTROLS => "audioproducttonecontrols", Public, Request;
        AUDIO_SPEAKER_ATTRIBUTE_AND_SETTING => "audiospeakerattributeandsetting", Public, Request;
        BALANCE => "balance", Public, Request;
        BASS => "bass", Public, Request;
        BASS_CAPABILITIES => "bassCapabilities", Public, Request;
        BLUETOOTH_INFO => "bluetoothInfo", Public, Request;
        BOOKMARK => "bookmark", Public, Request;
        CANCEL_PAIR_LIGHTSWITCH => "cancelPairLightswitch", Public, Request;
        CAPABILITIES => "capabilities", Public, Request;
        CLEAR_BLUETOOTH_PAIRED => "clearBluetoothPaired", Public, Request;
        CLEAR_PAIRED_LIST => "clearPairedList", Public, Request;
        CLOCK_DISPLAY => "clockDisplay", Public, Request;
        CLOCK_TIME => "clockTime", Public, Request;
        DSP_MONO_STEREO => "DSPMonoStereo", Public, Request;
        ENTER_BLUETOOTH_PAIRING => "enterBluetoothPairing", Public, Request;
        ENTER_PAIRING_MODE => "enterPairingMode", Public, Request;
        GENRE_STATIONS => "genreStations", Public, Request;
        GET_ACTIVE_WIRELESS_PROFILE => "getActiveWirelessProfile", Public, Request;
        GET_BCO_RESET => "getBCOReset", Public, Request;
        GET_GROUP => "getGroup", Public, Request;
        GET_ZONE => "getZone", Public, Request;
        INFO => "info", Public, Request;
        INTROSPECT => "introspect", Public, Request;
        KEY => "key", Public, Request;
        LANGUAGE => "language", Public, Request;
        LIST_MEDIA_SERVERS => "listMediaServers", Public, Request;
        LOW_POWER_STANDBY => "lowPowerStandby", Public, Request;
        MARGE => "marge", Public, Request;
        MASTER_MSG => "masterMsg", Public, Request;
        NAME => "name", Public, Request;
        NAME_SOURCE => "nameSource", Public, Request;
        NAVIGATE => "navigate", Public, Request;
        NET_STATS => "netStats", Public, Request;
        NETWORK_INFO => "networkInfo", Public, Request;
        NOTIFICATION => "notification", Public, Request;
        NOW_PLAYING => "nowPlaying", Public, Request;
        NOW_SELECTION => "nowSelection", Public, Request;
        PAIR_LIGHTSWITCH => "pairLightswitch", Public, Request;
        PDO => "pdo", Public, Request;
        PERFORM_WIRELESS_SITE_SURVEY => "performWirelessSiteSurvey", Public, Request;
        PLAYBACK_REQUEST => "playbackRequest", Public, Request;
        POWER_MANAGEMENT => "powerManagement", Public, Request;
        POWERSAVING => "powersaving", Public, Request;
        PRESETS => "presets", Public, Request;
        PRODUCT_CEC_HDMI_CONTROL => "productcechdmicontrol", Public, Request;
        PRODUCT_HDMI_ASSIGNMENT_CONTROLS => "producthdmiassignmentcontrols", Public, Request;
        PUSH_CUSTOMER_SUPPORT_INFO_TO_MARGE => "pushCustomerSupportInfoToMarge", Public, Request;
        REBROADCAST_LATENCY_MODE => "rebroadcastlatencymode", Public, Request;
        RECENTS => "recents", Public, Request;
        REMOVE_GROUP => "removeGroup", Public, Request;
        REMOVE_MUSIC_SERVICE_ACCOUNT => "removeMusicServiceAccount", Public, Request;
        REMOVE_PRESET => "removePreset", Public, Request;
        REMOVE_STATION => "removeStation", Public, Request;
        REMOVE_STEREO_PAIR => "removeStereoPair", Public, Request;
        REMOVE_ZONE_SLAVE => "removeZoneSlave", Public, Request;
        REQUEST_TOKEN => "requestToken", Public, Request;
        SEARCH => "search", Public, Request;
        SEARCH_STATION => "searchStation", Public, Request;
        SELECT => "select", Public, Request;
        SELECT_LAST_SOUNDTOUCH_SOURCE => "selectLastSoundTouchSource", Public, Request;
        SELECT_LAST_SOURCE => "selectLastSource", Public, Request;
        SELECT_LAST_WIFI_SOURCE => "selectLastWiFiSource", Public, Request;
        SELECT_LOCAL_SOURCE => "selectLocalSource", Public, Request;
        SELECT_PRESET => "selectPreset", Public, Request;
        SERVICE_AVAILABILITY => "serviceAvailability", Public, Request;
        SERVICES => "services", Public, Request;
        SET_BCO_RESET => "setBCOReset", Public, Request;
        SET_MARGE_ACCOUNT => "setMargeAccount", Public, Request;
        SET_MUSIC_SERVICE_ACCOUNT => "setMusicServiceAccount", Public, Request;
        SET_MUSIC_SERVICE_OAUTH_ACCOUNT => "setMusicServiceOAuthAccount", Public, Request;
        SET_PAIRED_STATUS => "setPairedStatus", Public, Request;
        SET_PAIRING_STATUS => "setPairingStatus", Public, Request;
        SET_POWER => "setPower", Public, Request;
        SETUP => "setup", Public, Request;
        SET_ZONE => "setZone", Public, Request;
        SLAVE_MSG => "slaveMsg", Public, Request;
        SOFTWARE_UPDATE_EXIT => "SoftwareUpdateExit", Public, Request;
        SOUNDTOUCH_CONFIGURATION_STATUS => "soundTouchConfigurationStatus", Public, Request;
        SOURCE_DISCOVERY_STATUS => "sourceDiscoveryStatus", Public, Request;
        SOURCES => "sources", Public, Request;
        SPEAKER => "speaker", Public, Request;
        STANDBY => "standby", Public, Request;
        START_SOFTWARE_UPDATE => "StartSoftwareUpdate", Public, Request;
        STATION_INFO => "stationInfo", Public, Request;
        STORE_PRESET => "storePreset", Public, Request;
        SUPPORTED_URLS => "supportedURLs", Public, Request;
        SW_UPDATE_ABORT => "swUpdateAbort", Public, Request;
        SW_UPDATE_CHECK => "swUpdateCheck", Public, Request;
        SW_UPDATE_QUERY => "swUpdateQuery", Public, Request;
        SW_UPDATE_START => "swUpdateStart", Public, Request;
        SYSTEM_TIMEOUT => "systemtimeout", Public, Request;
        SYSTEM_TIMEOUT_CONTROL => "systemtimeoutcontrol", Public, Request;
        TEST => "test", Public, Request;
        TRACK_INFO => "trackInfo", Public, Request;
        UPDATE_GROUP => "updateGroup", Public, Request;
        USER_PLAY_CONTROL => "userPlayControl", Public, Request;
        USER_RATING => "userRating", Public, Request;
        USER_TRACK_CONTROL => "userTrackControl", Public, Request;
        VOLUME => "volume", Public, Request;
    }
}

/// All endpoints known to the library
pub fn catalog() -> &'static [Endpoint] {
    nodes::ALL
}

/// Look up an endpoint by its exact (case-sensitive) name
pub fn lookup(name: &str) -> Option<Endpoint> {
    nodes::ALL.iter().copied().find(|e| e.name == name)
}

/// All endpoints served over the HTTP control surface
pub fn request_endpoints() -> impl Iterator<Item = Endpoint> {
    nodes::ALL.iter().copied().filter(|e| !e.is_event())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_names_are_unique() {
        let names: HashSet<_> = catalog().iter().map(|e| e.name()).collect();
        assert_eq!(names.len(), catalog().len());
    }

    #[test]
    fn test_lookup_is_case_sensitive() {
        assert_eq!(lookup("volume"), Some(nodes::VOLUME));
        assert_eq!(lookup("Volume"), None);
        assert_eq!(lookup("supportedURLs").map(|e| e.path()), Some("supportedURLs"));
    }

    #[test]
    fn test_request_endpoints_exclude_events() {
        assert!(request_endpoints().all(|e| e.kind() == EndpointKind::Request));
        assert!(request_endpoints().any(|e| e == nodes::PLAY_NOTIFICATION));
        assert!(!request_endpoints().any(|e| e == nodes::NOW_PLAYING_UPDATED));
        assert!(nodes::USER_ACTIVITY_UPDATE.is_private());
        assert!(nodes::USER_ACTIVITY_UPDATE.is_event());
    }
}
