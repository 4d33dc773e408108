use crate::error::Result;
use crate::xml::{FromXml, XmlElement};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Endpoint names advertised by the `supportedURLs` document
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SupportedUrls {
    pub device_id: Option<String>,
    /// Names without the leading `/`, in document order
    pub urls: Vec<String>,
}

impl SupportedUrls {
    pub fn contains(&self, name: &str) -> bool {
        self.urls.iter().any(|u| u == name)
    }
}

impl FromXml for SupportedUrls {
    fn from_xml(element: &XmlElement) -> Result<Self> {
        element.expect_name("supportedURLs")?;
        Ok(Self {
            device_id: element.attr("deviceID").map(str::to_owned),
            urls: element
                .children_named("URL")
                .filter_map(|u| u.attr("location"))
                .map(|loc| loc.trim_start_matches('/').to_owned())
                .filter(|name| !name.is_empty())
                .collect(),
        })
    }
}

impl fmt::Display for SupportedUrls {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SupportedUrls: count={}", self.urls.len())
    }
}
