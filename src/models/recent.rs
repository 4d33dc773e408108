use super::ContentItem;
use crate::error::Result;
use crate::xml::{FromXml, ToXml, XmlElement};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A recently played item
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Recent {
    pub recent_id: i64,
    /// Unix timestamp of the last play
    pub created_on: i64,
    pub device_id: Option<String>,
    pub content_item: ContentItem,
}

impl FromXml for Recent {
    fn from_xml(element: &XmlElement) -> Result<Self> {
        Ok(Self {
            recent_id: element.attr_or("id", 0),
            created_on: element.attr_or("utcTime", 0),
            device_id: element.attr("deviceID").map(str::to_owned),
            content_item: element
                .child("contentItem")
                .or_else(|| element.child("ContentItem"))
                .map(ContentItem::from_xml)
                .transpose()?
                .unwrap_or_default(),
        })
    }
}

impl ToXml for Recent {
    fn to_xml(&self) -> XmlElement {
        XmlElement::new("recent")
            .with_opt_attr("id", Some(self.recent_id).filter(|id| *id > 0))
            .with_opt_attr("createdOn", Some(self.created_on).filter(|t| *t > 0))
            .with_child(self.content_item.to_xml())
    }
}

impl fmt::Display for Recent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Recent: id={} {}", self.recent_id, self.content_item)
    }
}

/// Recently played items, most recent first
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RecentList {
    pub recents: Vec<Recent>,
}

impl RecentList {
    pub fn iter(&self) -> impl Iterator<Item = &Recent> {
        self.recents.iter()
    }
}

impl FromXml for RecentList {
    fn from_xml(element: &XmlElement) -> Result<Self> {
        Ok(Self {
            recents: element
                .children_named("recent")
                .map(Recent::from_xml)
                .collect::<Result<_>>()?,
        })
    }
}

impl fmt::Display for RecentList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecentList: count={}", self.recents.len())
    }
}
