use crate::error::Result;
use crate::xml::{FromXml, ToXml, XmlElement};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Current bass level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Bass {
    pub actual: i32,
    pub target: i32,
}

impl Bass {
    pub fn new(level: i32) -> Self {
        Self {
            actual: level,
            target: level,
        }
    }
}

impl FromXml for Bass {
    fn from_xml(element: &XmlElement) -> Result<Self> {
        Ok(Self {
            actual: element.find_or("actualbass", 0),
            target: element.find_or("targetbass", 0),
        })
    }
}

impl ToXml for Bass {
    fn to_xml(&self) -> XmlElement {
        XmlElement::new("bass").with_text(self.actual.to_string())
    }
}

impl fmt::Display for Bass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Bass: actual={} target={}", self.actual, self.target)
    }
}

/// Range of bass levels a device accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BassCapabilities {
    pub is_available: bool,
    pub minimum: i32,
    pub maximum: i32,
    pub default: i32,
}

impl BassCapabilities {
    /// Clamps a requested level into the supported range
    pub fn clamp(&self, level: i32) -> i32 {
        if self.minimum <= self.maximum {
            level.clamp(self.minimum, self.maximum)
        } else {
            level
        }
    }
}

impl FromXml for BassCapabilities {
    fn from_xml(element: &XmlElement) -> Result<Self> {
        Ok(Self {
            is_available: element.find_bool("bassAvailable"),
            minimum: element.find_or("bassMin", 0),
            maximum: element.find_or("bassMax", 0),
            default: element.find_or("bassDefault", 0),
        })
    }
}

impl fmt::Display for BassCapabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "BassCapabilities: available={} min={} max={} default={}",
            self.is_available, self.minimum, self.maximum, self.default
        )
    }
}

/// Stereo balance, available on stereo-capable products
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Balance {
    pub is_available: bool,
    pub actual: i32,
    pub target: i32,
    pub minimum: i32,
    pub maximum: i32,
    pub default: i32,
}

impl Balance {
    pub fn new(level: i32) -> Self {
        Self {
            actual: level,
            target: level,
            ..Default::default()
        }
    }
}

impl FromXml for Balance {
    fn from_xml(element: &XmlElement) -> Result<Self> {
        Ok(Self {
            is_available: element.find_bool("balanceAvailable"),
            actual: element.find_or("actualBalance", 0),
            target: element.find_or("targetBalance", 0),
            minimum: element.find_or("balanceMin", 0),
            maximum: element.find_or("balanceMax", 0),
            default: element.find_or("balanceDefault", 0),
        })
    }
}

impl ToXml for Balance {
    fn to_xml(&self) -> XmlElement {
        XmlElement::new("balance").with_text(self.actual.to_string())
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Balance: actual={} min={} max={}",
            self.actual, self.minimum, self.maximum
        )
    }
}

/// A single adjustable level with its limits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ControlLevel {
    pub value: i32,
    pub min_value: i32,
    pub max_value: i32,
    pub step: i32,
}

impl ControlLevel {
    fn parse(element: &XmlElement) -> Self {
        Self {
            value: element.attr_or("value", 0),
            min_value: element.attr_or("minValue", 0),
            max_value: element.attr_or("maxValue", 0),
            step: element.attr_or("step", 0),
        }
    }

    fn to_xml(self, name: &str) -> XmlElement {
        XmlElement::new(name).with_attr("value", self.value)
    }
}

/// Bass and treble settings on audio products (e.g. soundbars)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AudioProductToneControls {
    pub bass: ControlLevel,
    pub treble: ControlLevel,
}

impl FromXml for AudioProductToneControls {
    fn from_xml(element: &XmlElement) -> Result<Self> {
        Ok(Self {
            bass: element.child("bass").map(ControlLevel::parse).unwrap_or_default(),
            treble: element.child("treble").map(ControlLevel::parse).unwrap_or_default(),
        })
    }
}

impl ToXml for AudioProductToneControls {
    fn to_xml(&self) -> XmlElement {
        XmlElement::new("audioproducttonecontrols")
            .with_child(self.bass.to_xml("bass"))
            .with_child(self.treble.to_xml("treble"))
    }
}

impl fmt::Display for AudioProductToneControls {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AudioProductToneControls: bass={} treble={}",
            self.bass.value, self.treble.value
        )
    }
}

/// DSP audio mode settings on audio products
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AudioDspControls {
    pub audio_mode: Option<String>,
    /// Pipe-delimited list of modes, e.g. `AUDIO_MODE_DIRECT|AUDIO_MODE_NORMAL`
    pub supported_audio_modes: Option<String>,
    pub video_sync_audio_delay: i32,
}

impl AudioDspControls {
    pub fn supported_modes(&self) -> Vec<&str> {
        self.supported_audio_modes
            .as_deref()
            .map(|m| m.split('|').filter(|s| !s.is_empty()).collect())
            .unwrap_or_default()
    }
}

impl FromXml for AudioDspControls {
    fn from_xml(element: &XmlElement) -> Result<Self> {
        Ok(Self {
            audio_mode: element.attr("audiomode").map(str::to_owned),
            supported_audio_modes: element.attr("supportedaudiomodes").map(str::to_owned),
            video_sync_audio_delay: element.attr_or("videosyncaudiodelay", 0),
        })
    }
}

impl ToXml for AudioDspControls {
    fn to_xml(&self) -> XmlElement {
        XmlElement::new("audiodspcontrols")
            .with_opt_attr("audiomode", self.audio_mode.as_deref().filter(|m| !m.is_empty()))
            .with_attr("videosyncaudiodelay", self.video_sync_audio_delay)
    }
}

impl fmt::Display for AudioDspControls {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AudioDspControls: audioMode=\"{}\" videoSyncAudioDelay={}",
            self.audio_mode.as_deref().unwrap_or(""),
            self.video_sync_audio_delay
        )
    }
}

/// Speaker levels on audio products with surround speakers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AudioProductLevelControls {
    pub front_center_speaker_level: ControlLevel,
    pub rear_surround_speakers_level: ControlLevel,
}

impl FromXml for AudioProductLevelControls {
    fn from_xml(element: &XmlElement) -> Result<Self> {
        let level = |name: &str| element.child(name).map(ControlLevel::parse).unwrap_or_default();
        Ok(Self {
            front_center_speaker_level: level("frontCenterSpeakerLevel"),
            rear_surround_speakers_level: level("rearSurroundSpeakersLevel"),
        })
    }
}

impl ToXml for AudioProductLevelControls {
    fn to_xml(&self) -> XmlElement {
        XmlElement::new("audioproductlevelcontrols")
            .with_child(self.front_center_speaker_level.to_xml("frontCenterSpeakerLevel"))
            .with_child(self.rear_surround_speakers_level.to_xml("rearSurroundSpeakersLevel"))
    }
}

impl fmt::Display for AudioProductLevelControls {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AudioProductLevelControls: frontCenter={} rearSurround={}",
            self.front_center_speaker_level.value, self.rear_surround_speakers_level.value
        )
    }
}

/// Mono/stereo downmix setting
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DspMonoStereo {
    pub device_id: Option<String>,
    pub is_mono_enabled: bool,
}

impl FromXml for DspMonoStereo {
    fn from_xml(element: &XmlElement) -> Result<Self> {
        Ok(Self {
            device_id: element.attr("deviceID").map(str::to_owned),
            is_mono_enabled: element.child("mono").is_some_and(|m| m.attr_bool("enable")),
        })
    }
}

impl fmt::Display for DspMonoStereo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DspMonoStereo: monoEnabled={}", self.is_mono_enabled)
    }
}

/// State of one attachable speaker (rear or subwoofer)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SpeakerSetting {
    pub active: bool,
    pub available: bool,
    pub wireless: bool,
    pub controllable: bool,
}

impl SpeakerSetting {
    fn parse(element: &XmlElement) -> Self {
        Self {
            active: element.attr_bool("active"),
            available: element.attr_bool("available"),
            wireless: element.attr_bool("wireless"),
            controllable: element.attr_bool("controllable"),
        }
    }
}

/// Rear speaker and subwoofer attachments on audio products
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AudioSpeakerAttributeAndSetting {
    pub rear: Option<SpeakerSetting>,
    pub subwoofer01: Option<SpeakerSetting>,
    pub subwoofer02: Option<SpeakerSetting>,
}

impl FromXml for AudioSpeakerAttributeAndSetting {
    fn from_xml(element: &XmlElement) -> Result<Self> {
        Ok(Self {
            rear: element.child("rear").map(SpeakerSetting::parse),
            subwoofer01: element.child("subwoofer01").map(SpeakerSetting::parse),
            subwoofer02: element.child("subwoofer02").map(SpeakerSetting::parse),
        })
    }
}

impl fmt::Display for AudioSpeakerAttributeAndSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let active = |s: Option<SpeakerSetting>| s.is_some_and(|s| s.active);
        write!(
            f,
            "AudioSpeakerAttributeAndSetting: rear={} subwoofer01={} subwoofer02={}",
            active(self.rear),
            active(self.subwoofer01),
            active(self.subwoofer02)
        )
    }
}
