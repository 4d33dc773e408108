use crate::error::Result;
use crate::xml::{FromXml, ToXml, XmlElement};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A device taking part in a multi-room zone
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ZoneMember {
    pub ip_address: Option<String>,
    pub device_id: String,
    /// Member role, only present for stereo-pair members
    pub role: Option<String>,
}

impl ZoneMember {
    pub fn new(ip_address: impl Into<String>, device_id: impl Into<String>) -> Self {
        Self {
            ip_address: Some(ip_address.into()),
            device_id: device_id.into(),
            role: None,
        }
    }
}

impl FromXml for ZoneMember {
    fn from_xml(element: &XmlElement) -> Result<Self> {
        Ok(Self {
            ip_address: element.attr("ipaddress").map(str::to_owned),
            device_id: element.text().map(str::trim).unwrap_or_default().to_owned(),
            role: element.attr("role").map(str::to_owned),
        })
    }
}

impl ToXml for ZoneMember {
    fn to_xml(&self) -> XmlElement {
        let elm = XmlElement::new("member")
            .with_opt_attr("ipaddress", self.ip_address.as_deref().filter(|ip| !ip.is_empty()))
            .with_opt_attr("role", self.role.as_deref().filter(|r| !r.is_empty()));
        if self.device_id.is_empty() {
            elm
        } else {
            elm.with_text(self.device_id.as_str())
        }
    }
}

impl fmt::Display for ZoneMember {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({})",
            self.device_id,
            self.ip_address.as_deref().unwrap_or("?")
        )
    }
}

/// Multi-room zone: one master and the members that play its audio
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Zone {
    pub master_device_id: Option<String>,
    pub master_ip_address: Option<String>,
    /// True when the reporting device is the master
    pub is_master: bool,
    pub members: Vec<ZoneMember>,
}

impl Zone {
    pub fn new(master_device_id: impl Into<String>, master_ip_address: impl Into<String>) -> Self {
        Self {
            master_device_id: Some(master_device_id.into()),
            master_ip_address: Some(master_ip_address.into()),
            is_master: true,
            members: Vec::new(),
        }
    }

    /// Appends a member unless one with the same device id is already present
    pub fn add_member(&mut self, member: ZoneMember) -> bool {
        if self.contains(&member.device_id) {
            return false;
        }
        self.members.push(member);
        true
    }

    pub fn contains(&self, device_id: &str) -> bool {
        self.members.iter().any(|m| m.device_id == device_id)
    }

    /// Comma-separated member ids, for logging
    pub fn member_summary(&self) -> String {
        self.members
            .iter()
            .map(|m| m.device_id.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl FromXml for Zone {
    fn from_xml(element: &XmlElement) -> Result<Self> {
        Ok(Self {
            master_device_id: element.attr("master").filter(|m| !m.is_empty()).map(str::to_owned),
            master_ip_address: element.attr("senderIPAddress").map(str::to_owned),
            is_master: element.attr_bool("senderIsMaster"),
            members: element
                .children_named("member")
                .map(ZoneMember::from_xml)
                .collect::<Result<_>>()?,
        })
    }
}

impl ToXml for Zone {
    fn to_xml(&self) -> XmlElement {
        let mut elm = XmlElement::new("zone")
            .with_opt_attr("master", self.master_device_id.as_deref())
            .with_opt_attr("senderIPAddress", self.master_ip_address.as_deref());
        if self.is_master {
            elm.set_attr("senderIsMaster", "true");
        }
        self.members
            .iter()
            .fold(elm, |elm, m| elm.with_child(m.to_xml()))
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Zone: master=\"{}\" members=[{}]",
            self.master_device_id.as_deref().unwrap_or(""),
            self.member_summary()
        )
    }
}
