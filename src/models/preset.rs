use super::ContentItem;
use crate::error::Result;
use crate::xml::{FromXml, ToXml, XmlElement};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A stored preset slot (1-6)
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Preset {
    pub preset_id: i32,
    /// Unix timestamp; 0 when unknown
    pub created_on: i64,
    pub updated_on: i64,
    pub content_item: ContentItem,
}

impl Preset {
    pub fn new(preset_id: i32, content_item: ContentItem) -> Self {
        Self {
            preset_id,
            content_item,
            ..Default::default()
        }
    }
}

impl FromXml for Preset {
    fn from_xml(element: &XmlElement) -> Result<Self> {
        Ok(Self {
            preset_id: element.attr_or("id", 0),
            created_on: element.attr_or("createdOn", 0),
            updated_on: element.attr_or("updatedOn", 0),
            content_item: element
                .child("ContentItem")
                .map(ContentItem::from_xml)
                .transpose()?
                .unwrap_or_default(),
        })
    }
}

impl ToXml for Preset {
    fn to_xml(&self) -> XmlElement {
        XmlElement::new("preset")
            .with_opt_attr("id", Some(self.preset_id).filter(|id| *id > 0))
            .with_opt_attr("createdOn", Some(self.created_on).filter(|t| *t > 0))
            .with_opt_attr("updatedOn", Some(self.updated_on).filter(|t| *t > 0))
            .with_child(self.content_item.to_xml())
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Preset: id={} {}", self.preset_id, self.content_item)
    }
}

/// All presets stored on a device
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PresetList {
    pub presets: Vec<Preset>,
}

impl PresetList {
    pub fn get(&self, preset_id: i32) -> Option<&Preset> {
        self.presets.iter().find(|p| p.preset_id == preset_id)
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Preset> {
        self.presets.iter()
    }
}

impl FromXml for PresetList {
    fn from_xml(element: &XmlElement) -> Result<Self> {
        Ok(Self {
            presets: element
                .children_named("preset")
                .map(Preset::from_xml)
                .collect::<Result<_>>()?,
        })
    }
}

impl ToXml for PresetList {
    fn to_xml(&self) -> XmlElement {
        self.presets
            .iter()
            .fold(XmlElement::new("presets"), |elm, p| elm.with_child(p.to_xml()))
    }
}

impl fmt::Display for PresetList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PresetList: count={}", self.presets.len())
    }
}
