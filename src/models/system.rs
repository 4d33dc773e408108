use super::CecHdmiMode;
use crate::error::Result;
use crate::xml::{FromXml, ToXml, XmlElement};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Free-form track information
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TrackInfo {
    pub device_id: Option<String>,
    pub info: Option<String>,
}

impl FromXml for TrackInfo {
    fn from_xml(element: &XmlElement) -> Result<Self> {
        Ok(Self {
            device_id: element.attr("deviceID").map(str::to_owned),
            info: element.text().map(str::to_owned),
        })
    }
}

impl fmt::Display for TrackInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TrackInfo: \"{}\"", self.info.as_deref().unwrap_or(""))
    }
}

/// Device clock, on products with a display
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ClockTime {
    pub utc_time: i64,
    pub utc_sync_time: i64,
    pub time_format: Option<String>,
    pub brightness: i32,
    pub cue_music: i32,
    pub clock_error: i32,
    pub year: i32,
    pub month: i32,
    pub day: i32,
    pub day_of_week: i32,
    pub hour: i32,
    pub minute: i32,
    pub second: i32,
}

impl FromXml for ClockTime {
    fn from_xml(element: &XmlElement) -> Result<Self> {
        let local = element.child("localTime");
        let local_attr = |name: &str| local.map_or(0, |l| l.attr_or(name, 0));
        Ok(Self {
            utc_time: element.attr_or("utcTime", 0),
            utc_sync_time: element.attr_or("utcSyncTime", 0),
            time_format: element.attr("timeFormat").map(str::to_owned),
            brightness: element.attr_or("brightness", 0),
            cue_music: element.attr_or("cueMusic", 0),
            clock_error: element.attr_or("clockError", 0),
            year: local_attr("year"),
            month: local_attr("month"),
            day: local_attr("dayOfMonth"),
            day_of_week: local_attr("dayOfWeek"),
            hour: local_attr("hour"),
            minute: local_attr("minute"),
            second: local_attr("second"),
        })
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ClockTime: {:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }
}

/// Power supply state
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PowerManagement {
    /// e.g. `FullPower`
    pub state: Option<String>,
    pub battery_capable: bool,
}

impl FromXml for PowerManagement {
    fn from_xml(element: &XmlElement) -> Result<Self> {
        Ok(Self {
            state: element.find_string("powerState"),
            battery_capable: element.find_bool("capable") || element.find_bool("battery/capable"),
        })
    }
}

impl fmt::Display for PowerManagement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PowerManagement: state=\"{}\" batteryCapable={}",
            self.state.as_deref().unwrap_or(""),
            self.battery_capable
        )
    }
}

/// Auto power-off setting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SystemTimeout {
    pub powersaving_enabled: bool,
}

impl FromXml for SystemTimeout {
    fn from_xml(element: &XmlElement) -> Result<Self> {
        Ok(Self {
            powersaving_enabled: element.find_bool("powersaving_enabled"),
        })
    }
}

impl fmt::Display for SystemTimeout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SystemTimeout: powersavingEnabled={}", self.powersaving_enabled)
    }
}

/// Availability of one source service, e.g. `BLUETOOTH` or `SPOTIFY`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ServiceState {
    pub service_type: Option<String>,
    pub is_available: bool,
    pub reason: Option<String>,
}

impl FromXml for ServiceState {
    fn from_xml(element: &XmlElement) -> Result<Self> {
        Ok(Self {
            service_type: element.attr("type").map(str::to_owned),
            is_available: element.attr_bool("isAvailable"),
            reason: element.attr("reason").map(str::to_owned),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ServiceAvailability {
    pub services: Vec<ServiceState>,
}

impl ServiceAvailability {
    pub fn is_available(&self, service_type: &str) -> bool {
        self.services
            .iter()
            .any(|s| s.is_available && s.service_type.as_deref() == Some(service_type))
    }
}

impl FromXml for ServiceAvailability {
    fn from_xml(element: &XmlElement) -> Result<Self> {
        Ok(Self {
            services: element
                .child("services")
                .map(|list| {
                    list.children_named("service")
                        .map(ServiceState::from_xml)
                        .collect::<Result<Vec<_>>>()
                })
                .transpose()?
                .unwrap_or_default(),
        })
    }
}

impl fmt::Display for ServiceAvailability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let available = self.services.iter().filter(|s| s.is_available).count();
        write!(
            f,
            "ServiceAvailability: {} of {} available",
            available,
            self.services.len()
        )
    }
}

/// Setup state of the device, e.g. `SETUP_COMPLETE`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SoundTouchConfigurationStatus {
    pub status: Option<String>,
}

impl FromXml for SoundTouchConfigurationStatus {
    fn from_xml(element: &XmlElement) -> Result<Self> {
        Ok(Self {
            status: element.attr("status").map(str::to_owned),
        })
    }
}

impl fmt::Display for SoundTouchConfigurationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SoundTouchConfigurationStatus: status=\"{}\"",
            self.status.as_deref().unwrap_or("")
        )
    }
}

/// Latency mode used when rebroadcasting to zone members
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RebroadcastLatencyMode {
    pub mode: Option<String>,
    pub is_controllable: bool,
}

impl FromXml for RebroadcastLatencyMode {
    fn from_xml(element: &XmlElement) -> Result<Self> {
        Ok(Self {
            mode: element.attr("mode").map(str::to_owned),
            is_controllable: element.attr_bool("controllable"),
        })
    }
}

impl fmt::Display for RebroadcastLatencyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RebroadcastLatencyMode: mode=\"{}\" controllable={}",
            self.mode.as_deref().unwrap_or(""),
            self.is_controllable
        )
    }
}

/// HDMI CEC setting on products with an HDMI input
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProductCecHdmiControl {
    /// e.g. `CEC_MODE_ON`; devices may report modes not listed in [`CecHdmiMode`]
    pub cec_mode: Option<String>,
}

impl ProductCecHdmiControl {
    pub fn new(mode: CecHdmiMode) -> Self {
        Self {
            cec_mode: Some(mode.as_str().to_owned()),
        }
    }
}

impl FromXml for ProductCecHdmiControl {
    fn from_xml(element: &XmlElement) -> Result<Self> {
        Ok(Self {
            cec_mode: element.attr("cecmode").map(str::to_owned),
        })
    }
}

impl ToXml for ProductCecHdmiControl {
    fn to_xml(&self) -> XmlElement {
        XmlElement::new("productcechdmicontrol").with_opt_attr("cecmode", self.cec_mode.as_deref())
    }
}

impl fmt::Display for ProductCecHdmiControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ProductCecHdmiControl: cecMode=\"{}\"",
            self.cec_mode.as_deref().unwrap_or("")
        )
    }
}
