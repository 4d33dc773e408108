use crate::error::Result;
use crate::xml::{FromXml, ToXml, XmlElement};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Speaker role within a stereo pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum GroupRoleType {
    Left,
    Right,
    #[default]
    Normal,
}

impl GroupRoleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupRoleType::Left => "LEFT",
            GroupRoleType::Right => "RIGHT",
            GroupRoleType::Normal => "NORMAL",
        }
    }
}

impl FromStr for GroupRoleType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim() {
            "LEFT" => Ok(GroupRoleType::Left),
            "RIGHT" => Ok(GroupRoleType::Right),
            "NORMAL" => Ok(GroupRoleType::Normal),
            other => Err(format!("unknown group role: {}", other)),
        }
    }
}

impl fmt::Display for GroupRoleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One speaker of a stereo pair
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GroupRole {
    pub device_id: String,
    pub role: GroupRoleType,
    pub ip_address: Option<String>,
}

impl GroupRole {
    pub fn new(
        device_id: impl Into<String>,
        role: GroupRoleType,
        ip_address: impl Into<String>,
    ) -> Self {
        Self {
            device_id: device_id.into(),
            role,
            ip_address: Some(ip_address.into()),
        }
    }
}

impl FromXml for GroupRole {
    fn from_xml(element: &XmlElement) -> Result<Self> {
        Ok(Self {
            device_id: element.find_string("deviceId").unwrap_or_default(),
            role: element
                .find_text("role")
                .and_then(|r| r.parse().ok())
                .unwrap_or_default(),
            ip_address: element.find_string("ipAddress"),
        })
    }
}

impl ToXml for GroupRole {
    fn to_xml(&self) -> XmlElement {
        XmlElement::new("groupRole")
            .with_text_child("deviceId", self.device_id.as_str())
            .with_text_child("role", self.role.as_str())
            .with_opt_text_child("ipAddress", self.ip_address.as_deref())
    }
}

/// Left/right stereo pair of two speakers
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Group {
    pub group_id: Option<String>,
    pub name: Option<String>,
    pub master_device_id: Option<String>,
    pub sender_ip_address: Option<String>,
    /// e.g. `GROUP_OK`
    pub status: Option<String>,
    pub roles: Vec<GroupRole>,
}

impl Group {
    pub fn new(name: impl Into<String>, master_device_id: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            master_device_id: Some(master_device_id.into()),
            ..Default::default()
        }
    }

    pub fn with_role(mut self, role: GroupRole) -> Self {
        self.roles.push(role);
        self
    }

    /// True when the device reported no active pair
    pub fn is_empty(&self) -> bool {
        self.group_id.is_none() && self.roles.is_empty()
    }
}

impl FromXml for Group {
    fn from_xml(element: &XmlElement) -> Result<Self> {
        Ok(Self {
            group_id: element.attr("id").map(str::to_owned),
            name: element.find_string("name"),
            master_device_id: element.find_string("masterDeviceId"),
            sender_ip_address: element.find_string("senderIPAddress"),
            status: element.find_string("status"),
            roles: element
                .find("roles")
                .map(|r| {
                    r.children_named("groupRole")
                        .map(GroupRole::from_xml)
                        .collect::<Result<Vec<_>>>()
                })
                .transpose()?
                .unwrap_or_default(),
        })
    }
}

impl ToXml for Group {
    fn to_xml(&self) -> XmlElement {
        let roles = self
            .roles
            .iter()
            .fold(XmlElement::new("roles"), |elm, r| elm.with_child(r.to_xml()));
        XmlElement::new("group")
            .with_opt_attr("id", self.group_id.as_deref())
            .with_opt_text_child("name", self.name.as_deref())
            .with_opt_text_child("masterDeviceId", self.master_device_id.as_deref())
            .with_opt_text_child("senderIPAddress", self.sender_ip_address.as_deref())
            .with_opt_text_child("status", self.status.as_deref())
            .with_child(roles)
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Group: name=\"{}\" master=\"{}\" roles={}",
            self.name.as_deref().unwrap_or(""),
            self.master_device_id.as_deref().unwrap_or(""),
            self.roles.len()
        )
    }
}
