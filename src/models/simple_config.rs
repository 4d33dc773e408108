use crate::error::Result;
use crate::xml::{FromXml, ToXml, XmlElement};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Single-valued configuration document such as `<name>Kitchen</name>`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SimpleConfig {
    /// Tag name of the document
    pub config_name: String,
    pub value: Option<String>,
    pub attributes: Vec<(String, String)>,
}

impl SimpleConfig {
    pub fn new(config_name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            config_name: config_name.into(),
            value: Some(value.into()),
            attributes: Vec::new(),
        }
    }
}

impl FromXml for SimpleConfig {
    fn from_xml(element: &XmlElement) -> Result<Self> {
        Ok(Self {
            config_name: element.name().to_owned(),
            value: element.text().map(str::to_owned),
            attributes: element.attributes().to_vec(),
        })
    }
}

impl ToXml for SimpleConfig {
    fn to_xml(&self) -> XmlElement {
        let elm = XmlElement::new(self.config_name.as_str());
        match &self.value {
            Some(v) => elm.with_text(v.as_str()),
            None => elm,
        }
    }
}

impl fmt::Display for SimpleConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: \"{}\"", self.config_name, self.value.as_deref().unwrap_or(""))
    }
}
