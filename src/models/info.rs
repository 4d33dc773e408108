use crate::error::Result;
use crate::xml::{FromXml, XmlElement};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Device identity returned by the `info` endpoint
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Information {
    pub device_id: String,
    pub device_name: String,
    /// Product type, e.g. `SoundTouch 10`
    pub device_type: Option<String>,
    pub country_code: Option<String>,
    pub region_code: Option<String>,
    pub module_type: Option<String>,
    pub variant: Option<String>,
    pub variant_mode: Option<String>,
    pub streaming_account_uuid: Option<String>,
    pub streaming_url: Option<String>,
    pub components: Vec<Component>,
    pub network_info: Vec<InfoNetworkInfo>,
}

/// Hardware or software component of a device
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Component {
    pub category: Option<String>,
    pub software_version: Option<String>,
    pub serial_number: Option<String>,
}

/// Network interface summary embedded in the `info` document
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InfoNetworkInfo {
    /// Interface type, e.g. `SCM` or `SMSC`
    pub interface_type: Option<String>,
    pub mac_address: Option<String>,
    pub ip_address: Option<String>,
}

impl Information {
    /// Serial number of the first component that reports one
    pub fn serial_number(&self) -> Option<&str> {
        self.components.iter().find_map(|c| c.serial_number.as_deref())
    }

    /// Software version of the first component that reports one
    pub fn software_version(&self) -> Option<&str> {
        self.components.iter().find_map(|c| c.software_version.as_deref())
    }

    /// MAC address of the first network interface, if the device reports one
    pub fn mac_address(&self) -> Option<&str> {
        self.network_info.iter().find_map(|n| n.mac_address.as_deref())
    }
}

impl FromXml for Information {
    fn from_xml(element: &XmlElement) -> Result<Self> {
        element.expect_name("info")?;

        let components = element
            .find("components")
            .map(|c| {
                c.children_named("component")
                    .map(|comp| Component {
                        category: comp.find_string("componentCategory"),
                        software_version: comp.find_string("softwareVersion"),
                        serial_number: comp.find_string("serialNumber"),
                    })
                    .collect()
            })
            .unwrap_or_default();

        let network_info = element
            .children_named("networkInfo")
            .map(|n| InfoNetworkInfo {
                interface_type: n.attr("type").map(str::to_owned),
                mac_address: n.find_string("macAddress"),
                ip_address: n.find_string("ipAddress"),
            })
            .collect();

        Ok(Self {
            device_id: element.attr("deviceID").unwrap_or_default().to_owned(),
            device_name: element.find_string("name").unwrap_or_default(),
            device_type: element.find_string("type"),
            country_code: element.find_string("countryCode"),
            region_code: element.find_string("regionCode"),
            module_type: element.find_string("moduleType"),
            variant: element.find_string("variant"),
            variant_mode: element.find_string("variantMode"),
            streaming_account_uuid: element.find_string("margeAccountUUID"),
            streaming_url: element.find_string("margeURL"),
            components,
            network_info,
        })
    }
}

impl fmt::Display for Information {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Information: name=\"{}\" deviceId=\"{}\" type=\"{}\"",
            self.device_name,
            self.device_id,
            self.device_type.as_deref().unwrap_or("")
        )
    }
}
