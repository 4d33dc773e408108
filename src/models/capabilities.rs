use crate::error::Result;
use crate::xml::{FromXml, XmlElement};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A named product capability
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Capability {
    pub name: String,
    pub url: Option<String>,
    pub info: Option<String>,
}

/// Product capability flags from the `capabilities` endpoint
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Capabilities {
    pub device_id: Option<String>,
    pub capabilities: Vec<Capability>,
    pub is_bco_reset_capable: bool,
    pub is_clock_display_capable: bool,
    pub is_disable_power_saving_capable: bool,
    pub is_dual_mode_capable: bool,
    pub is_light_switch_capable: bool,
    /// Left/right stereo pairs (groups) can be created
    pub is_lr_stereo_capable: bool,
    pub is_websocket_api_proxy_capable: bool,
}

impl Capabilities {
    pub fn has(&self, name: &str) -> bool {
        self.capabilities.iter().any(|c| c.name == name)
    }
}

impl FromXml for Capabilities {
    fn from_xml(element: &XmlElement) -> Result<Self> {
        Ok(Self {
            device_id: element.attr("deviceID").map(str::to_owned),
            capabilities: element
                .children_named("capability")
                .map(|c| Capability {
                    name: c.attr("name").unwrap_or_default().to_owned(),
                    url: c.attr("url").map(str::to_owned),
                    info: c.attr("info").map(str::to_owned),
                })
                .collect(),
            is_bco_reset_capable: element.find_bool("bcoresetCapable"),
            is_clock_display_capable: element.find_bool("clockDisplay"),
            is_disable_power_saving_capable: element.find_bool("disablePowerSaving"),
            is_dual_mode_capable: element.find_bool("networkConfig/dualMode"),
            is_light_switch_capable: element.find_bool("lightswitch"),
            is_lr_stereo_capable: element.find_bool("lrStereoCapable"),
            is_websocket_api_proxy_capable: element.find_bool("networkConfig/wsapiproxy"),
        })
    }
}

impl fmt::Display for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Capabilities: count={} lrStereoCapable={} wsapiproxy={}",
            self.capabilities.len(),
            self.is_lr_stereo_capable,
            self.is_websocket_api_proxy_capable
        )
    }
}
