use crate::error::Result;
use crate::xml::{FromXml, ToXml, XmlElement};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Volume level and mute state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Volume {
    pub actual: i32,
    pub target: i32,
    pub is_muted: bool,
}

impl Volume {
    /// Request body setting both levels; the device range is 0-100
    pub fn new(level: i32) -> Self {
        let level = level.clamp(0, 100);
        Self {
            actual: level,
            target: level,
            is_muted: false,
        }
    }
}

impl FromXml for Volume {
    fn from_xml(element: &XmlElement) -> Result<Self> {
        Ok(Self {
            actual: element.find_or("actualvolume", 0),
            target: element.find_or("targetvolume", 0),
            is_muted: element.find_bool("muteenabled"),
        })
    }
}

impl ToXml for Volume {
    fn to_xml(&self) -> XmlElement {
        XmlElement::new("volume").with_text(self.actual.to_string())
    }
}

impl fmt::Display for Volume {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Volume: actual={} target={} muted={}",
            self.actual, self.target, self.is_muted
        )
    }
}
