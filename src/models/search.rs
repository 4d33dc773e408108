use super::ContentItem;
use crate::error::Result;
use crate::xml::{FromXml, ToXml, XmlElement};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Music library or music service search criteria
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Search {
    pub source: String,
    pub source_account: Option<String>,
    /// e.g. `album`, `artist`, `track`
    pub filter: Option<String>,
    pub search_text: String,
    pub sort_order: Option<String>,
    pub start_item: u32,
    pub num_items: u32,
}

impl Search {
    pub fn new(source: impl Into<String>, search_text: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            search_text: search_text.into(),
            start_item: 1,
            num_items: 1000,
            ..Default::default()
        }
    }
}

impl ToXml for Search {
    fn to_xml(&self) -> XmlElement {
        let term = XmlElement::new("searchTerm")
            .with_opt_attr("filter", self.filter.as_deref())
            .with_text(self.search_text.as_str());
        XmlElement::new("search")
            .with_attr("source", self.source.as_str())
            .with_opt_attr("sourceAccount", self.source_account.as_deref())
            .with_opt_attr("sortOrder", self.sort_order.as_deref())
            .with_text_child("startItem", self.start_item.to_string())
            .with_text_child("numItems", self.num_items.to_string())
            .with_child(term)
    }
}

/// An entry returned by a library search or navigation
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NavigateItem {
    pub name: Option<String>,
    pub item_type: Option<String>,
    pub is_playable: bool,
    pub content_item: Option<ContentItem>,
}

impl FromXml for NavigateItem {
    fn from_xml(element: &XmlElement) -> Result<Self> {
        Ok(Self {
            name: element.find_string("name"),
            item_type: element.find_string("type"),
            is_playable: element.attr("Playable") == Some("1") || element.attr_bool("Playable"),
            content_item: element.child("ContentItem").map(ContentItem::from_xml).transpose()?,
        })
    }
}

/// Result of a music library search
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SearchResponse {
    pub source: Option<String>,
    pub source_account: Option<String>,
    pub total_items: u32,
    pub items: Vec<NavigateItem>,
}

impl FromXml for SearchResponse {
    fn from_xml(element: &XmlElement) -> Result<Self> {
        Ok(Self {
            source: element.attr("source").map(str::to_owned),
            source_account: element.attr("sourceAccount").map(str::to_owned),
            total_items: element.find_or("totalItems", 0),
            items: element
                .find("items")
                .map(|items| {
                    items
                        .children_named("item")
                        .map(NavigateItem::from_xml)
                        .collect::<Result<Vec<_>>>()
                })
                .transpose()?
                .unwrap_or_default(),
        })
    }
}

impl fmt::Display for SearchResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SearchResponse: source=\"{}\" totalItems={}",
            self.source.as_deref().unwrap_or(""),
            self.total_items
        )
    }
}

/// Music service station search criteria
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SearchStation {
    pub source: String,
    pub source_account: Option<String>,
    pub search_text: String,
}

impl SearchStation {
    pub fn new(
        source: impl Into<String>,
        source_account: Option<String>,
        search_text: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            source_account,
            search_text: search_text.into(),
        }
    }
}

impl ToXml for SearchStation {
    fn to_xml(&self) -> XmlElement {
        XmlElement::new("search")
            .with_attr("source", self.source.as_str())
            .with_opt_attr("sourceAccount", self.source_account.as_deref())
            .with_text(self.search_text.as_str())
    }
}

/// A song or artist station returned by a station search
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SearchResult {
    pub name: Option<String>,
    pub artist: Option<String>,
    pub logo: Option<String>,
    /// Token to pass when adding the station
    pub token: Option<String>,
}

impl FromXml for SearchResult {
    fn from_xml(element: &XmlElement) -> Result<Self> {
        Ok(Self {
            name: element.find_string("name"),
            artist: element.find_string("artist"),
            logo: element.find_string("logo"),
            token: element.attr("token").map(str::to_owned),
        })
    }
}

/// Result of a music service station search
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SearchStationResults {
    pub source: Option<String>,
    pub source_account: Option<String>,
    pub songs: Vec<SearchResult>,
    pub artists: Vec<SearchResult>,
}

fn search_results(element: &XmlElement, list: &str) -> Result<Vec<SearchResult>> {
    match element.child(list) {
        Some(node) => node
            .children_named("searchResult")
            .map(SearchResult::from_xml)
            .collect(),
        None => Ok(Vec::new()),
    }
}

impl FromXml for SearchStationResults {
    fn from_xml(element: &XmlElement) -> Result<Self> {
        Ok(Self {
            source: element.attr("source").map(str::to_owned),
            source_account: element.attr("sourceAccount").map(str::to_owned),
            songs: search_results(element, "songs")?,
            artists: search_results(element, "artists")?,
        })
    }
}

impl fmt::Display for SearchStationResults {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SearchStationResults: songs={} artists={}",
            self.songs.len(),
            self.artists.len()
        )
    }
}

/// Request for a music service's internal state
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Introspect {
    pub source: String,
    pub source_account: Option<String>,
}

impl Introspect {
    pub fn new(source: impl Into<String>, source_account: Option<String>) -> Self {
        Self {
            source: source.into(),
            source_account,
        }
    }
}

impl ToXml for Introspect {
    fn to_xml(&self) -> XmlElement {
        XmlElement::new("introspect")
            .with_attr("source", self.source.as_str())
            .with_opt_attr("sourceAccount", self.source_account.as_deref())
    }
}
