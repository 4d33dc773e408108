use crate::error::Result;
use crate::xml::{FromXml, XmlElement};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An input or music service the device can play from
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SourceItem {
    pub source: Option<String>,
    pub source_account: Option<String>,
    /// `READY` or `UNAVAILABLE`
    pub status: Option<String>,
    pub is_local: bool,
    pub is_multiroom_allowed: bool,
    /// Account display name
    pub user_name: Option<String>,
}

impl SourceItem {
    pub fn is_ready(&self) -> bool {
        self.status.as_deref() == Some("READY")
    }
}

impl FromXml for SourceItem {
    fn from_xml(element: &XmlElement) -> Result<Self> {
        Ok(Self {
            source: element.attr("source").map(str::to_owned),
            source_account: element.attr("sourceAccount").map(str::to_owned),
            status: element.attr("status").map(str::to_owned),
            is_local: element.attr_bool("isLocal"),
            is_multiroom_allowed: element.attr_bool("multiroomallowed"),
            user_name: element.text().map(str::to_owned),
        })
    }
}

impl fmt::Display for SourceItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SourceItem: source=\"{}\" sourceAccount=\"{}\" status=\"{}\"",
            self.source.as_deref().unwrap_or(""),
            self.source_account.as_deref().unwrap_or(""),
            self.status.as_deref().unwrap_or("")
        )
    }
}

/// All sources configured on a device
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SourceList {
    pub device_id: Option<String>,
    pub sources: Vec<SourceItem>,
}

impl SourceList {
    /// Sources whose status is `READY`
    pub fn ready(&self) -> impl Iterator<Item = &SourceItem> {
        self.sources.iter().filter(|s| s.is_ready())
    }
}

impl FromXml for SourceList {
    fn from_xml(element: &XmlElement) -> Result<Self> {
        // the sourcesUpdated event wraps the list in another <sources> element
        let list = match element.child("sources") {
            Some(inner) => inner,
            None => element,
        };
        Ok(Self {
            device_id: element
                .attr("deviceID")
                .or_else(|| list.attr("deviceID"))
                .map(str::to_owned),
            sources: list
                .children_named("sourceItem")
                .map(SourceItem::from_xml)
                .collect::<Result<_>>()?,
        })
    }
}

impl fmt::Display for SourceList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SourceList: count={}", self.sources.len())
    }
}
