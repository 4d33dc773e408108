use crate::error::Result;
use crate::xml::{FromXml, ToXml, XmlElement};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A playable item: a station, playlist, track, or input source
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ContentItem {
    /// Source type, e.g. `TUNEIN`, `BLUETOOTH`, `AUX`
    pub source: Option<String>,
    pub source_account: Option<String>,
    /// Item type, e.g. `stationurl`, `uri`, `playlist`
    pub item_type: Option<String>,
    pub location: Option<String>,
    pub is_presetable: bool,
    pub name: Option<String>,
    pub container_art: Option<String>,
}

impl ContentItem {
    /// Content item that selects a source with an optional account
    pub fn for_source(source: impl Into<String>, source_account: Option<String>) -> Self {
        Self {
            source: Some(source.into()),
            source_account,
            ..Default::default()
        }
    }
}

impl FromXml for ContentItem {
    fn from_xml(element: &XmlElement) -> Result<Self> {
        Ok(Self {
            source: element.attr("source").map(str::to_owned),
            source_account: element.attr("sourceAccount").map(str::to_owned),
            item_type: element.attr("type").map(str::to_owned),
            location: element.attr("location").map(str::to_owned),
            is_presetable: element.attr_bool("isPresetable"),
            name: element.find_string("itemName"),
            container_art: element.find_string("containerArt"),
        })
    }
}

impl ToXml for ContentItem {
    fn to_xml(&self) -> XmlElement {
        let non_empty = |v: &Option<String>| v.clone().filter(|s| !s.is_empty());
        let mut elm = XmlElement::new("ContentItem")
            .with_opt_attr("source", non_empty(&self.source))
            .with_opt_attr("type", non_empty(&self.item_type))
            .with_opt_attr("location", non_empty(&self.location))
            .with_opt_attr("sourceAccount", non_empty(&self.source_account));
        if self.is_presetable {
            elm.set_attr("isPresetable", "true");
        }

        let mut item_name = XmlElement::new("itemName");
        if let Some(name) = &self.name {
            item_name = item_name.with_text(name.as_str());
        }
        let mut art = XmlElement::new("containerArt");
        if let Some(url) = &self.container_art {
            art = art.with_text(url.as_str());
        }
        elm.with_child(item_name).with_child(art)
    }
}

impl fmt::Display for ContentItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ContentItem: name=\"{}\" source=\"{}\" location=\"{}\"",
            self.name.as_deref().unwrap_or(""),
            self.source.as_deref().unwrap_or(""),
            self.location.as_deref().unwrap_or("")
        )?;
        if let Some(account) = &self.source_account {
            write!(f, " sourceAccount=\"{}\"", account)?;
        }
        Ok(())
    }
}
