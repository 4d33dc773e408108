use super::{ContentItem, NavigateItem};
use crate::error::Result;
use crate::xml::{FromXml, ToXml, XmlElement};
use serde::{Deserialize, Serialize};
use std::fmt;

/// UPnP/DLNA media server visible to the device
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MediaServer {
    pub server_id: Option<String>,
    pub mac_address: Option<String>,
    pub ip_address: Option<String>,
    pub manufacturer: Option<String>,
    pub model_name: Option<String>,
    pub friendly_name: Option<String>,
    pub model_description: Option<String>,
    pub location: Option<String>,
}

impl FromXml for MediaServer {
    fn from_xml(element: &XmlElement) -> Result<Self> {
        let attr = |name: &str| element.attr(name).map(str::to_owned);
        Ok(Self {
            server_id: attr("id"),
            mac_address: attr("mac"),
            ip_address: attr("ip"),
            manufacturer: attr("manufacturer"),
            model_name: attr("model_name"),
            friendly_name: attr("friendly_name"),
            model_description: attr("model_description"),
            location: attr("location"),
        })
    }
}

/// Media servers sorted by friendly name, case-insensitive
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MediaServerList {
    pub media_servers: Vec<MediaServer>,
}

impl FromXml for MediaServerList {
    fn from_xml(element: &XmlElement) -> Result<Self> {
        let mut media_servers = element
            .children_named("media_server")
            .map(MediaServer::from_xml)
            .collect::<Result<Vec<_>>>()?;
        media_servers.sort_by_key(|s| s.friendly_name.as_deref().unwrap_or("").to_lowercase());
        Ok(Self { media_servers })
    }
}

impl fmt::Display for MediaServerList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MediaServerList: count={}", self.media_servers.len())
    }
}

/// Criteria for browsing a music library or a music service menu
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Navigate {
    pub source: String,
    pub source_account: Option<String>,
    /// Music service menu, e.g. `radioStations`
    pub menu: Option<String>,
    pub start_item: u32,
    pub num_items: u32,
}

impl Navigate {
    pub fn new(source: impl Into<String>, source_account: Option<String>) -> Self {
        Self {
            source: source.into(),
            source_account,
            start_item: 1,
            num_items: 1000,
            ..Default::default()
        }
    }

    pub fn with_menu(mut self, menu: impl Into<String>) -> Self {
        self.menu = Some(menu.into());
        self
    }
}

impl ToXml for Navigate {
    fn to_xml(&self) -> XmlElement {
        let non_empty = |v: &Option<String>| v.clone().filter(|s| !s.is_empty());
        let mut elm = XmlElement::new("navigate")
            .with_opt_attr("source", Some(self.source.as_str()).filter(|s| !s.is_empty()))
            .with_opt_attr("sourceAccount", non_empty(&self.source_account))
            .with_opt_attr("menu", non_empty(&self.menu));
        if self.start_item > 0 {
            elm = elm.with_text_child("startItem", self.start_item.to_string());
        }
        if self.num_items > 0 {
            elm = elm.with_text_child("numItems", self.num_items.to_string());
        }
        elm
    }
}

/// Result of a `navigate` request
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NavigateResponse {
    pub source: Option<String>,
    pub source_account: Option<String>,
    pub total_items: u32,
    pub items: Vec<NavigateItem>,
}

impl FromXml for NavigateResponse {
    fn from_xml(element: &XmlElement) -> Result<Self> {
        element.expect_name("navigateResponse")?;
        Ok(Self {
            source: element.attr("source").map(str::to_owned),
            source_account: element.attr("sourceAccount").map(str::to_owned),
            total_items: element.find_or("totalItems", 0),
            items: element
                .child("items")
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

impl fmt::Display for NavigateResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "NavigateResponse: source=\"{}\" totalItems={} items={}",
            self.source.as_deref().unwrap_or(""),
            self.total_items,
            self.items.len()
        )
    }
}

/// Station to add to a music service collection
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AddStation {
    pub source: String,
    pub source_account: Option<String>,
    /// Service token identifying the station
    pub token: String,
    pub name: Option<String>,
}

impl AddStation {
    pub fn new(
        source: impl Into<String>,
        source_account: Option<String>,
        token: impl Into<String>,
        name: Option<String>,
    ) -> Self {
        Self {
            source: source.into(),
            source_account,
            token: token.into(),
            name,
        }
    }
}

impl ToXml for AddStation {
    fn to_xml(&self) -> XmlElement {
        let non_empty = |v: &str| Some(v.to_owned()).filter(|s| !s.is_empty());
        XmlElement::new("addStation")
            .with_opt_attr("source", non_empty(&self.source))
            .with_opt_attr(
                "sourceAccount",
                self.source_account.as_deref().and_then(non_empty),
            )
            .with_opt_attr("token", non_empty(&self.token))
            .with_opt_text_child("name", self.name.as_deref().filter(|n| !n.is_empty()))
    }
}

impl fmt::Display for AddStation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AddStation: source=\"{}\" token=\"{}\" name=\"{}\"",
            self.source,
            self.token,
            self.name.as_deref().unwrap_or("")
        )
    }
}

/// Station to remove from a music service collection; posted as its content item
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RemoveStation {
    pub content_item: ContentItem,
}

impl RemoveStation {
    pub fn new(
        source: impl Into<String>,
        source_account: Option<String>,
        location: impl Into<String>,
        name: Option<String>,
    ) -> Self {
        Self {
            content_item: ContentItem {
                source: Some(source.into()),
                source_account,
                location: Some(location.into()),
                name,
                is_presetable: true,
                ..Default::default()
            },
        }
    }
}

impl From<ContentItem> for RemoveStation {
    fn from(content_item: ContentItem) -> Self {
        Self { content_item }
    }
}

impl ToXml for RemoveStation {
    fn to_xml(&self) -> XmlElement {
        self.content_item.to_xml()
    }
}

impl fmt::Display for RemoveStation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RemoveStation: {}", self.content_item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_servers_sorted_by_name() {
        let root = XmlElement::parse(
            r#"<ListMediaServersResponse>
                <media_server id="2" mac="00:11" ip="192.168.1.5" manufacturer="Plex" model_name="Plex Media Server" friendly_name="plex" model_description="" location="http://192.168.1.5:32469/desc.xml" />
                <media_server id="1" mac="00:22" ip="192.168.1.6" manufacturer="Microsoft" model_name="Windows Media Player" friendly_name="Anne's PC" location="http://192.168.1.6:2869/desc.xml" />
            </ListMediaServersResponse>"#,
        )
        .unwrap();
        let list = MediaServerList::from_xml(&root).unwrap();
        let names: Vec<_> = list
            .media_servers
            .iter()
            .map(|s| s.friendly_name.as_deref().unwrap_or(""))
            .collect();
        assert_eq!(names, ["Anne's PC", "plex"]);
        assert_eq!(list.media_servers[1].ip_address.as_deref(), Some("192.168.1.5"));
    }

    #[test]
    fn test_navigate_request_body() {
        let navigate =
            Navigate::new("PANDORA", Some("user".to_string())).with_menu("radioStations");
        assert_eq!(
            navigate.to_xml().to_xml_string(),
            "<navigate source=\"PANDORA\" sourceAccount=\"user\" menu=\"radioStations\">\
             <startItem>1</startItem><numItems>1000</numItems></navigate>"
        );

        let unbounded = Navigate {
            start_item: 0,
            num_items: 0,
            ..Navigate::new("STORED_MUSIC", None)
        };
        assert_eq!(
            unbounded.to_xml().to_xml_string(),
            "<navigate source=\"STORED_MUSIC\" />"
        );
    }

    #[test]
    fn test_station_bodies() {
        let name = Some("Zach Williams".to_string());
        let add = AddStation::new("PANDORA", Some("user".into()), "R4328162", name);
        assert_eq!(
            add.to_xml().to_xml_string(),
            "<addStation source=\"PANDORA\" sourceAccount=\"user\" token=\"R4328162\">\
             <name>Zach Williams</name></addStation>"
        );

        let remove = RemoveStation::new("PANDORA", Some("user".into()), "126740707481236361", None);
        let body = remove.to_xml();
        assert_eq!(body.name(), "ContentItem");
        assert_eq!(body.attr("location"), Some("126740707481236361"));
        assert_eq!(body.attr("isPresetable"), Some("true"));
    }
}
