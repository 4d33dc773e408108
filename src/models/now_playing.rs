use super::ContentItem;
use crate::error::Result;
use crate::xml::{FromXml, XmlElement};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Source reported while the device is in standby
pub const SOURCE_STANDBY: &str = "STANDBY";
/// Source reported while a notification is playing
pub const SOURCE_NOTIFICATION: &str = "NOTIFICATION";

/// What the device is currently playing
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NowPlayingStatus {
    pub device_id: Option<String>,
    pub source: Option<String>,
    pub source_account: Option<String>,
    pub content_item: Option<ContentItem>,
    pub track: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub genre: Option<String>,
    pub station_name: Option<String>,
    pub station_location: Option<String>,
    pub description: Option<String>,
    /// Cover art URL, only when the device reports an image is present
    pub image: Option<String>,
    /// e.g. `PLAY_STATE`, `PAUSE_STATE`, `BUFFERING_STATE`
    pub play_status: Option<String>,
    pub repeat_setting: Option<String>,
    pub shuffle_setting: Option<String>,
    pub stream_type: Option<String>,
    pub track_id: Option<String>,
    /// Track length in seconds
    pub duration: i32,
    /// Play position in seconds
    pub position: i32,
    pub connection_status: Option<String>,
    pub connection_device_name: Option<String>,
    pub is_favorite: bool,
    pub is_favorite_enabled: bool,
    pub is_rating_enabled: bool,
    pub is_skip_enabled: bool,
    pub is_skip_previous_enabled: bool,
    pub is_seek_supported: bool,
}

impl NowPlayingStatus {
    pub fn is_standby(&self) -> bool {
        self.source.as_deref() == Some(SOURCE_STANDBY)
    }

    pub fn is_notification(&self) -> bool {
        self.source.as_deref() == Some(SOURCE_NOTIFICATION)
    }
}

impl FromXml for NowPlayingStatus {
    fn from_xml(element: &XmlElement) -> Result<Self> {
        let art = element.find("art");
        let image = art
            .filter(|a| a.attr("artImageStatus") == Some("IMAGE_PRESENT"))
            .and_then(|a| a.text())
            .map(str::to_owned);
        let connection = element.find("connectionStatusInfo");

        Ok(Self {
            device_id: element.attr("deviceID").map(str::to_owned),
            source: element.attr("source").map(str::to_owned),
            source_account: element.attr("sourceAccount").map(str::to_owned),
            content_item: element.child("ContentItem").map(ContentItem::from_xml).transpose()?,
            track: element.find_string("track"),
            artist: element.find_string("artist"),
            album: element.find_string("album"),
            genre: element.find_string("genre"),
            station_name: element.find_string("stationName"),
            station_location: element.find_string("stationLocation"),
            description: element.find_string("description"),
            image,
            play_status: element.find_string("playStatus"),
            repeat_setting: element.find_string("repeatSetting"),
            shuffle_setting: element.find_string("shuffleSetting"),
            stream_type: element.find_string("streamType"),
            track_id: element.find_string("trackID"),
            duration: element.find("time").map_or(0, |t| t.attr_or("total", 0)),
            position: element.find_or("time", 0),
            connection_status: connection.and_then(|c| c.attr("status")).map(str::to_owned),
            connection_device_name: connection
                .and_then(|c| c.attr("deviceName"))
                .map(str::to_owned),
            is_favorite: element.find_flag("isFavorite"),
            is_favorite_enabled: element.find_flag("favoriteEnabled"),
            is_rating_enabled: element.find_flag("rateEnabled"),
            is_skip_enabled: element.find_flag("skipEnabled"),
            is_skip_previous_enabled: element.find_flag("skipPreviousEnabled"),
            is_seek_supported: element.find_flag("seekSupported"),
        })
    }
}

impl fmt::Display for NowPlayingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "NowPlayingStatus: source=\"{}\" playStatus=\"{}\" artist=\"{}\" track=\"{}\" album=\"{}\"",
            self.source.as_deref().unwrap_or(""),
            self.play_status.as_deref().unwrap_or(""),
            self.artist.as_deref().unwrap_or(""),
            self.track.as_deref().unwrap_or(""),
            self.album.as_deref().unwrap_or("")
        )
    }
}
