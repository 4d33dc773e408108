use crate::xml::{ToXml, XmlElement};
use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! wire_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $wire:literal),* $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $($variant),*
        }

        impl $name {
            /// Value sent on the wire
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire),*
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

wire_enum! {
    /// Remote-control keys accepted by the `key` endpoint
    SoundTouchKey {
        AddFavorite => "ADD_FAVORITE",
        AuxInput => "AUX_INPUT",
        Bookmark => "BOOKMARK",
        Mute => "MUTE",
        NextTrack => "NEXT_TRACK",
        Pause => "PAUSE",
        Play => "PLAY",
        PlayPause => "PLAY_PAUSE",
        Power => "POWER",
        Preset1 => "PRESET_1",
        Preset2 => "PRESET_2",
        Preset3 => "PRESET_3",
        Preset4 => "PRESET_4",
        Preset5 => "PRESET_5",
        Preset6 => "PRESET_6",
        PrevTrack => "PREV_TRACK",
        RemoveFavorite => "REMOVE_FAVORITE",
        RepeatAll => "REPEAT_ALL",
        RepeatOff => "REPEAT_OFF",
        RepeatOne => "REPEAT_ONE",
        ShuffleOff => "SHUFFLE_OFF",
        ShuffleOn => "SHUFFLE_ON",
        Stop => "STOP",
        ThumbsDown => "THUMBS_DOWN",
        ThumbsUp => "THUMBS_UP",
        VolumeDown => "VOLUME_DOWN",
        VolumeUp => "VOLUME_UP",
    }
}

impl SoundTouchKey {
    /// Preset key for slot 1-6
    pub fn preset(slot: u8) -> Option<Self> {
        match slot {
            1 => Some(SoundTouchKey::Preset1),
            2 => Some(SoundTouchKey::Preset2),
            3 => Some(SoundTouchKey::Preset3),
            4 => Some(SoundTouchKey::Preset4),
            5 => Some(SoundTouchKey::Preset5),
            6 => Some(SoundTouchKey::Preset6),
            _ => None,
        }
    }
}

wire_enum! {
    /// HDMI CEC modes accepted by `productcechdmicontrol`
    CecHdmiMode {
        Alternate => "CEC_MODE_ALTERNATE",
        Fine => "CEC_MODE_FINE",
        Off => "CEC_MODE_OFF",
        On => "CEC_MODE_ON",
    }
}

wire_enum! {
    /// Key press phase; `Both` sends a press followed by a release
    KeyState {
        Press => "press",
        Release => "release",
        Both => "both",
    }
}

wire_enum! {
    /// Values for the `userPlayControl` endpoint
    UserPlayControlType {
        Pause => "PAUSE_CONTROL",
        Play => "PLAY_CONTROL",
        PlayPause => "PLAY_PAUSE_CONTROL",
        Stop => "STOP_CONTROL",
    }
}

wire_enum! {
    /// Values for the `userTrackControl` endpoint
    UserTrackControlType {
        NextTrack => "NEXT_TRACK",
        PreviousTrack => "PREV_TRACK",
        PreviousTrackForce => "PREV_TRACK_FORCE",
        RepeatOne => "REPEAT_ONE_TRACK",
        RepeatAll => "REPEAT_ALL_TRACKS",
        RepeatOff => "REPEAT_TRACKS_OFF",
        ShuffleOn => "SHUFFLE_TRACKS_ON",
        ShuffleOff => "SHUFFLE_TRACKS_OFF",
    }
}

wire_enum! {
    /// Values for the `userRating` endpoint
    UserRatingType {
        NotRated => "NONE",
        ThumbsDown => "DOWN",
        ThumbsUp => "UP",
    }
}

/// `<key>` request body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyAction {
    pub key: SoundTouchKey,
    /// `Press` or `Release`; `Both` is expanded by the client into two requests
    pub state: KeyState,
}

/// Sender token the device expects on key presses
pub const KEY_SENDER: &str = "Gabbo";

impl ToXml for KeyAction {
    fn to_xml(&self) -> XmlElement {
        XmlElement::new("key")
            .with_attr("state", self.state)
            .with_attr("sender", KEY_SENDER)
            .with_text(self.key.as_str())
    }
}

impl ToXml for UserPlayControlType {
    fn to_xml(&self) -> XmlElement {
        XmlElement::new("PlayControl").with_text(self.as_str())
    }
}

impl ToXml for UserTrackControlType {
    fn to_xml(&self) -> XmlElement {
        XmlElement::new("TrackControl").with_text(self.as_str())
    }
}

impl ToXml for UserRatingType {
    fn to_xml(&self) -> XmlElement {
        XmlElement::new("Rating").with_text(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_body() {
        let action = KeyAction {
            key: SoundTouchKey::Mute,
            state: KeyState::Press,
        };
        assert_eq!(
            action.to_xml().to_xml_string(),
            r#"<key state="press" sender="Gabbo">MUTE</key>"#
        );
    }

    #[test]
    fn test_control_bodies() {
        assert_eq!(
            UserPlayControlType::PlayPause.to_xml().to_xml_string(),
            "<PlayControl>PLAY_PAUSE_CONTROL</PlayControl>"
        );
        assert_eq!(
            UserTrackControlType::ShuffleOn.to_xml().to_xml_string(),
            "<TrackControl>SHUFFLE_TRACKS_ON</TrackControl>"
        );
        assert_eq!(SoundTouchKey::preset(4), Some(SoundTouchKey::Preset4));
        assert_eq!(SoundTouchKey::preset(7), None);
    }
}
