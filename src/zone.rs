//! Multi-room zones and stereo pairs
//!
//! Zone changes are POSTed to the master device and take a moment to
//! propagate to the members; each operation sleeps for a settle delay before
//! returning instead of polling for completion.

use crate::client::{settle_delay, SoundTouchClient};
use crate::device::SoundTouchDevice;
use crate::endpoint::nodes;
use crate::error::{Result, SoundTouchError};
use crate::message::SoundTouchMessage;
use crate::models::{Group, GroupRoleType, Zone, ZoneMember};
use std::time::Duration;

/// Default settle delay after creating a zone or changing its members
pub const DEFAULT_ZONE_DELAY: Duration = Duration::from_secs(3);
/// Default settle delay after dissolving a zone
pub const DEFAULT_REMOVE_ZONE_DELAY: Duration = Duration::from_secs(1);

impl SoundTouchClient {
    /// Create a zone, then settle (default 3s).
    ///
    /// The master is listed as the first member of the posted document; it
    /// is prepended when `zone.members[0]` is some other device.
    pub async fn create_zone(
        &self,
        zone: &Zone,
        delay: Option<Duration>,
    ) -> Result<SoundTouchMessage> {
        let request = zone_request(zone)?;
        tracing::info!(
            "Creating zone on '{}': {}",
            self.device().device_name(),
            request.member_summary()
        );

        let message = self.put(nodes::SET_ZONE, &request).await?;
        if !message.has_error() {
            self.cache().insert(&nodes::GET_ZONE, request);
        }
        self.settle(settle_delay(delay, DEFAULT_ZONE_DELAY)).await;
        Ok(message)
    }

    /// Create a zone mastered by `master` from connected devices, then settle (default 3s)
    pub async fn create_zone_from_devices(
        &self,
        master: &SoundTouchDevice,
        members: &[&SoundTouchDevice],
        delay: Option<Duration>,
    ) -> Result<Zone> {
        if members.is_empty() {
            return Err(SoundTouchError::InvalidInput(
                "a zone needs at least one member".to_string(),
            ));
        }

        let mut zone = Zone::new(master.device_id(), master.host());
        for member in members {
            zone.add_member(ZoneMember::new(member.host(), member.device_id()));
        }

        self.create_zone(&zone, delay).await?;
        Ok(zone)
    }

    /// Add members to the zone this device currently masters, then settle (default 3s).
    ///
    /// The master is taken from the zone status the device reports now;
    /// fails when the device is not in a zone.
    pub async fn add_zone_members(
        &self,
        members: &[ZoneMember],
        delay: Option<Duration>,
    ) -> Result<SoundTouchMessage> {
        let request = self.member_request(members).await?;
        tracing::info!(
            "Adding zone members on '{}': {}",
            self.device().device_name(),
            request.member_summary()
        );

        let message = self.put(nodes::ADD_ZONE_SLAVE, &request).await?;
        if !message.has_error() {
            self.cache().update::<Zone, _>(&nodes::GET_ZONE, |zone| {
                for member in &request.members {
                    zone.add_member(member.clone());
                }
            });
        }
        self.settle(settle_delay(delay, DEFAULT_ZONE_DELAY)).await;
        Ok(message)
    }

    /// Remove members from the zone this device currently masters, then settle (default 3s)
    pub async fn remove_zone_members(
        &self,
        members: &[ZoneMember],
        delay: Option<Duration>,
    ) -> Result<SoundTouchMessage> {
        let request = self.member_request(members).await?;
        tracing::info!(
            "Removing zone members on '{}': {}",
            self.device().device_name(),
            request.member_summary()
        );

        let message = self.put(nodes::REMOVE_ZONE_SLAVE, &request).await?;
        if !message.has_error() {
            self.cache().update::<Zone, _>(&nodes::GET_ZONE, |zone| {
                zone.members.retain(|m| !request.contains(&m.device_id));
            });
        }
        self.settle(settle_delay(delay, DEFAULT_ZONE_DELAY)).await;
        Ok(message)
    }

    /// Dissolve the current zone by removing every member, then settle (default 1s)
    pub async fn remove_zone(&self, delay: Option<Duration>) -> Result<SoundTouchMessage> {
        let current = self.get_zone_status(true).await?;
        if current.members.is_empty() {
            return Err(SoundTouchError::InvalidInput(format!(
                "'{}' is not in a zone; there is nothing to remove",
                self.device().device_name()
            )));
        }
        tracing::info!(
            "Removing zone on '{}': {}",
            self.device().device_name(),
            current.member_summary()
        );

        let message = self.put(nodes::REMOVE_ZONE_SLAVE, &current).await?;
        if !message.has_error() {
            self.cache().insert(&nodes::GET_ZONE, Zone::default());
        }
        self.settle(settle_delay(delay, DEFAULT_REMOVE_ZONE_DELAY)).await;
        Ok(message)
    }

    async fn member_request(&self, members: &[ZoneMember]) -> Result<Zone> {
        if members.is_empty() {
            return Err(SoundTouchError::InvalidInput(
                "no zone members were given".to_string(),
            ));
        }
        if let Some(member) = members.iter().find(|m| m.device_id.is_empty()) {
            return Err(SoundTouchError::InvalidInput(format!(
                "zone member {} has no device id",
                member
            )));
        }

        let current = self.get_zone_status(true).await?;
        let master = match current.master_device_id {
            Some(master) if !current.members.is_empty() => master,
            _ => {
                return Err(SoundTouchError::InvalidInput(format!(
                    "'{}' is not in a zone; members cannot be changed",
                    self.device().device_name()
                )))
            }
        };
        if let Some(member) = members.iter().find(|m| m.device_id == master) {
            return Err(SoundTouchError::InvalidInput(format!(
                "zone member {} is the master device and cannot be added or removed",
                member
            )));
        }

        let mut request = Zone {
            master_device_id: Some(master),
            ..Default::default()
        };
        for member in members {
            request.add_member(member.clone());
        }
        Ok(request)
    }

    // ========== Stereo pairs ==========

    /// Pair two speakers as left and right; `roles[0]` must be the master
    pub async fn create_group_stereo_pair(&self, group: &Group) -> Result<Group> {
        validate_stereo_pair(group)?;
        tracing::info!("Creating stereo pair on '{}': {}", self.device().device_name(), group);

        let message = self.put(nodes::ADD_GROUP, group).await?;
        let created: Group = Self::parse_response(&message)?;
        self.cache().insert(&nodes::GET_GROUP, created.clone());
        Ok(created)
    }

    /// Dissolve the current stereo pair
    pub async fn remove_group_stereo_pair(&self) -> Result<SoundTouchMessage> {
        tracing::info!("Removing stereo pair on '{}'", self.device().device_name());

        let message = self.get(nodes::REMOVE_GROUP).await?;
        if !message.has_error() {
            self.cache().insert(&nodes::GET_GROUP, Group::default());
        }
        Ok(message)
    }

    /// Rename the current stereo pair
    pub async fn update_group_stereo_pair_name(&self, name: &str) -> Result<Group> {
        let mut group = self.get_group_stereo_pair_status(true).await?;
        group.name = Some(name.to_owned());
        tracing::info!("Renaming stereo pair on '{}' to '{}'", self.device().device_name(), name);

        let message = self.put(nodes::UPDATE_GROUP, &group).await?;
        let updated: Group = Self::parse_response(&message)?;
        self.cache().insert(&nodes::GET_GROUP, updated.clone());
        Ok(updated)
    }
}

/// Validate a zone and put its master first in the member list
fn zone_request(zone: &Zone) -> Result<Zone> {
    if zone.members.is_empty() {
        return Err(SoundTouchError::InvalidInput(
            "a zone needs at least one member".to_string(),
        ));
    }
    let master = zone
        .master_device_id
        .as_deref()
        .filter(|id| !id.is_empty())
        .ok_or_else(|| SoundTouchError::InvalidInput("zone has no master device id".to_string()))?;

    for (i, member) in zone.members.iter().enumerate() {
        if member.device_id.is_empty() {
            return Err(SoundTouchError::InvalidInput(format!(
                "zone member {} has no device id",
                member
            )));
        }
        if i > 0 && member.device_id == master {
            return Err(SoundTouchError::InvalidInput(format!(
                "master {} may only be listed as the first zone member",
                master
            )));
        }
    }

    let mut request = zone.clone();
    if request.members[0].device_id != master {
        let master_member = ZoneMember {
            ip_address: zone.master_ip_address.clone(),
            device_id: master.to_owned(),
            role: None,
        };
        request.members.insert(0, master_member);
    }
    Ok(request)
}

fn validate_stereo_pair(group: &Group) -> Result<()> {
    if group.roles.len() != 2 {
        return Err(SoundTouchError::InvalidInput(format!(
            "a stereo pair needs exactly 2 roles, got {}",
            group.roles.len()
        )));
    }
    if group.master_device_id.as_deref() != Some(group.roles[0].device_id.as_str()) {
        return Err(SoundTouchError::InvalidInput(
            "the first group role must be the master device".to_string(),
        ));
    }
    let has = |role: GroupRoleType| group.roles.iter().any(|r| r.role == role);
    if !has(GroupRoleType::Left) || !has(GroupRoleType::Right) {
        return Err(SoundTouchError::InvalidInput(
            "a stereo pair needs one left and one right role".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GroupRole;
    use crate::test_fixtures;
    use crate::xml::ToXml;

    fn zone_with(members: &[&str]) -> Zone {
        let mut zone = Zone::new("AAA", "192.168.1.10");
        for (i, id) in members.iter().enumerate() {
            zone.members
                .push(ZoneMember::new(format!("192.168.1.{}", 20 + i), *id));
        }
        zone
    }

    #[test]
    fn test_master_is_prepended() {
        let request = zone_request(&zone_with(&["BBB", "CCC"])).unwrap();
        let ids: Vec<_> = request.members.iter().map(|m| m.device_id.as_str()).collect();
        assert_eq!(ids, ["AAA", "BBB", "CCC"]);
        assert_eq!(request.members[0].ip_address.as_deref(), Some("192.168.1.10"));

        let request = zone_request(&zone_with(&["AAA", "BBB"])).unwrap();
        assert_eq!(request.members.len(), 2);
        assert!(request
            .to_xml()
            .to_xml_string()
            .contains(r#"<member ipaddress="192.168.1.20">AAA</member>"#));
    }

    #[test]
    fn test_zone_validation() {
        assert!(matches!(
            zone_request(&zone_with(&[])),
            Err(SoundTouchError::InvalidInput(_))
        ));
        assert!(zone_request(&zone_with(&["BBB", ""])).is_err());
        assert!(zone_request(&zone_with(&["BBB", "AAA"])).is_err());

        let mut no_master = zone_with(&["BBB"]);
        no_master.master_device_id = None;
        assert!(zone_request(&no_master).is_err());
    }

    #[test]
    fn test_stereo_pair_validation() {
        let pair = Group::new("Pair", "AAA")
            .with_role(GroupRole::new("AAA", GroupRoleType::Left, "192.168.1.10"))
            .with_role(GroupRole::new("BBB", GroupRoleType::Right, "192.168.1.11"));
        assert!(validate_stereo_pair(&pair).is_ok());

        let swapped = Group::new("Pair", "BBB")
            .with_role(pair.roles[0].clone())
            .with_role(pair.roles[1].clone());
        assert!(validate_stereo_pair(&swapped).is_err());

        let two_lefts = Group::new("Pair", "AAA")
            .with_role(GroupRole::new("AAA", GroupRoleType::Left, "192.168.1.10"))
            .with_role(GroupRole::new("BBB", GroupRoleType::Left, "192.168.1.11"));
        assert!(validate_stereo_pair(&two_lefts).is_err());

        let single = Group::new("Pair", "AAA").with_role(pair.roles[0].clone());
        assert!(validate_stereo_pair(&single).is_err());
    }

    #[tokio::test]
    async fn test_empty_members_rejected_before_io() {
        let client = test_fixtures::client(&["getZone", "addZoneSlave"]);
        let err = client.add_zone_members(&[], None).await.unwrap_err();
        assert!(matches!(err, SoundTouchError::InvalidInput(_)));
    }
}
