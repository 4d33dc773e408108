use crate::xml::{ToXml, XmlElement};
use serde::{Deserialize, Serialize};

/// Request body for the `speaker` endpoint, which plays a URL as a notification
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PlayInfo {
    pub url: String,
    pub app_key: String,
    /// Shown as the artist while playing
    pub service: String,
    /// Shown as the album while playing
    pub message: String,
    /// Shown as the track while playing
    pub reason: String,
    /// 0 keeps the current level
    pub volume: i32,
}

/// Volume limits the device enforces for notification playback
pub const NOTIFICATION_VOLUME_MIN: i32 = 10;
pub const NOTIFICATION_VOLUME_MAX: i32 = 70;
/// Level used when a requested notification volume is outside 0-100
pub const NOTIFICATION_VOLUME_FALLBACK: i32 = 30;

/// Bose developer application key accepted by the `speaker` endpoint
pub const DEFAULT_APP_KEY: &str = "Ml7YGAI9JWjFhU7D348e86JPXtisddBa";

/// Metadata and volume for [`play_url`](crate::SoundTouchClient::play_url) and
/// [`play_notification_tts`](crate::SoundTouchClient::play_notification_tts)
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NotificationOptions {
    pub artist: Option<String>,
    pub album: Option<String>,
    pub track: Option<String>,
    /// 0 keeps the current level; values outside 0-100 fall back to 30
    pub volume: i32,
    /// Defaults to [`DEFAULT_APP_KEY`]
    pub app_key: Option<String>,
}

impl NotificationOptions {
    pub fn with_volume(mut self, volume: i32) -> Self {
        self.volume = volume;
        self
    }

    pub fn with_metadata(
        mut self,
        artist: impl Into<String>,
        album: impl Into<String>,
        track: impl Into<String>,
    ) -> Self {
        self.artist = Some(artist.into());
        self.album = Some(album.into());
        self.track = Some(track.into());
        self
    }

    /// Requested volume with out-of-range values replaced by the fallback level
    pub(crate) fn effective_volume(&self) -> i32 {
        if (0..=100).contains(&self.volume) {
            self.volume
        } else {
            NOTIFICATION_VOLUME_FALLBACK
        }
    }
}

impl ToXml for PlayInfo {
    fn to_xml(&self) -> XmlElement {
        let mut elm = XmlElement::new("play_info").with_text_child("url", self.url.as_str());
        if self.volume > 0 {
            let volume = self
                .volume
                .clamp(NOTIFICATION_VOLUME_MIN, NOTIFICATION_VOLUME_MAX);
            elm = elm.with_text_child("volume", volume.to_string());
        }
        elm.with_text_child("app_key", self.app_key.as_str())
            .with_text_child("service", self.service.as_str())
            .with_text_child("message", self.message.as_str())
            .with_text_child("reason", self.reason.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_volume_clamped_and_omitted() {
        let mut info = PlayInfo {
            url: "http://example.com/a.mp3".into(),
            volume: 5,
            ..Default::default()
        };
        assert!(info.to_xml().to_xml_string().contains("<volume>10</volume>"));

        info.volume = 90;
        assert!(info.to_xml().to_xml_string().contains("<volume>70</volume>"));

        info.volume = 0;
        assert!(!info.to_xml().to_xml_string().contains("<volume>"));
    }
}
