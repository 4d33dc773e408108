use crate::error::Result;
use crate::xml::{FromXml, XmlElement};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Bluetooth radio of the device
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BluetoothInfo {
    pub mac_address: Option<String>,
}

impl FromXml for BluetoothInfo {
    fn from_xml(element: &XmlElement) -> Result<Self> {
        Ok(Self {
            mac_address: element.attr("BluetoothMACAddress").map(str::to_owned),
        })
    }
}

impl fmt::Display for BluetoothInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "BluetoothInfo: macAddress=\"{}\"",
            self.mac_address.as_deref().unwrap_or("")
        )
    }
}

/// Interfaces configured on the device, from `networkInfo`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NetworkInfo {
    pub wifi_profile_count: u32,
    pub interfaces: Vec<NetworkInterface>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NetworkInterface {
    /// e.g. `WIFI_INTERFACE` or `ETHERNET_INTERFACE`
    pub interface_type: Option<String>,
    pub name: Option<String>,
    pub mac_address: Option<String>,
    pub ip_address: Option<String>,
    pub ssid: Option<String>,
    pub frequency_khz: Option<String>,
    /// e.g. `NETWORK_WIFI_CONNECTED`
    pub state: Option<String>,
    pub signal: Option<String>,
    pub mode: Option<String>,
}

impl NetworkInfo {
    /// First interface that reports an address
    pub fn connected(&self) -> Option<&NetworkInterface> {
        self.interfaces.iter().find(|i| i.ip_address.is_some())
    }
}

impl FromXml for NetworkInterface {
    fn from_xml(element: &XmlElement) -> Result<Self> {
        let attr = |name: &str| element.attr(name).map(str::to_owned);
        Ok(Self {
            interface_type: attr("type"),
            name: attr("name"),
            mac_address: attr("macAddress"),
            ip_address: attr("ipAddress"),
            ssid: attr("ssid"),
            frequency_khz: attr("frequencyKHz"),
            state: attr("state"),
            signal: attr("signal"),
            mode: attr("mode"),
        })
    }
}

impl FromXml for NetworkInfo {
    fn from_xml(element: &XmlElement) -> Result<Self> {
        Ok(Self {
            wifi_profile_count: element.attr_or("wifiProfileCount", 0),
            interfaces: element
                .child("interfaces")
                .map(|list| {
                    list.children()
                        .iter()
                        .map(NetworkInterface::from_xml)
                        .collect::<Result<Vec<_>>>()
                })
                .transpose()?
                .unwrap_or_default(),
        })
    }
}

impl fmt::Display for NetworkInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "NetworkInfo: wifiProfileCount={} interfaces={}",
            self.wifi_profile_count,
            self.interfaces.len()
        )
    }
}

/// Live interface statistics, from `netStats`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NetworkStatus {
    pub device_id: Option<String>,
    pub serial_number: Option<String>,
    pub interfaces: Vec<NetworkStatusInterface>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NetworkStatusInterface {
    pub name: Option<String>,
    /// e.g. `Wireless`
    pub kind: Option<String>,
    pub mac_address: Option<String>,
    pub ssid: Option<String>,
    pub rssi: Option<String>,
    pub frequency_khz: Option<String>,
    pub is_running: bool,
    pub ipv4_addresses: Vec<String>,
}

impl FromXml for NetworkStatusInterface {
    fn from_xml(element: &XmlElement) -> Result<Self> {
        Ok(Self {
            name: element.find_string("name"),
            kind: element.find_string("kind"),
            mac_address: element.find_string("mac-addr"),
            ssid: element.find_string("ssid"),
            rssi: element.find_string("rssi"),
            frequency_khz: element.find_string("frequencyKHz"),
            is_running: element.find_bool("running"),
            ipv4_addresses: element
                .child("bindings")
                .map(|b| {
                    b.children()
                        .iter()
                        .filter_map(|binding| binding.find_string("ipv4address"))
                        .collect()
                })
                .unwrap_or_default(),
        })
    }
}

impl FromXml for NetworkStatus {
    fn from_xml(element: &XmlElement) -> Result<Self> {
        let Some(device) = element.find("devices/device") else {
            return Ok(Self::default());
        };
        Ok(Self {
            device_id: device.attr("deviceID").map(str::to_owned),
            serial_number: device.find_string("deviceSerialNumber"),
            interfaces: device
                .child("interfaces")
                .map(|list| {
                    list.children()
                        .iter()
                        .map(NetworkStatusInterface::from_xml)
                        .collect::<Result<Vec<_>>>()
                })
                .transpose()?
                .unwrap_or_default(),
        })
    }
}

impl fmt::Display for NetworkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "NetworkStatus: deviceId=\"{}\" interfaces={}",
            self.device_id.as_deref().unwrap_or(""),
            self.interfaces.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_info_interfaces() {
        let root = XmlElement::parse(
            r#"<networkInfo wifiProfileCount="1">
                <interfaces>
                    <interface type="WIFI_INTERFACE" name="wlan0" macAddress="9070658C9D4A" ipAddress="192.168.1.131" ssid="home" frequencyKHz="2452000" state="NETWORK_WIFI_CONNECTED" signal="GOOD_SIGNAL" mode="STATION" />
                    <interface type="WIFI_INTERFACE" name="wlan1" macAddress="9070658C9D4B" state="NETWORK_WIFI_DISCONNECTED" />
                </interfaces>
            </networkInfo>"#,
        )
        .unwrap();
        let info = NetworkInfo::from_xml(&root).unwrap();
        assert_eq!(info.wifi_profile_count, 1);
        assert_eq!(info.interfaces.len(), 2);

        let connected = info.connected().unwrap();
        assert_eq!(connected.name.as_deref(), Some("wlan0"));
        assert_eq!(connected.ssid.as_deref(), Some("home"));
        assert_eq!(info.interfaces[1].ip_address, None);
    }

    #[test]
    fn test_network_status_bindings() {
        let root = XmlElement::parse(
            r#"<network-data><devices><device deviceID="9070658C9D4A">
                <deviceSerialNumber>P123</deviceSerialNumber>
                <interfaces><interface>
                    <name>wlan0</name><mac-addr>90:70:65:8C:9D:4A</mac-addr>
                    <bindings><binding><ipv4address>192.168.1.131</ipv4address></binding></bindings>
                    <running>true</running><kind>Wireless</kind><ssid>home</ssid><rssi>Good</rssi>
                </interface></interfaces>
            </device></devices></network-data>"#,
        )
        .unwrap();
        let status = NetworkStatus::from_xml(&root).unwrap();
        assert_eq!(status.device_id.as_deref(), Some("9070658C9D4A"));
        assert_eq!(status.serial_number.as_deref(), Some("P123"));

        let wlan = &status.interfaces[0];
        assert!(wlan.is_running);
        assert_eq!(wlan.kind.as_deref(), Some("Wireless"));
        assert_eq!(wlan.ipv4_addresses, ["192.168.1.131"]);
    }
}
