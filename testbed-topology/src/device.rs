use crate::{Attrs, TopologyError};
use mac_address::MacAddress;
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

/// Role a device plays in the plant network.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DeviceRole {
    Controller,
    Switch,
    Hmi,
    Historian,
    Workstation,
    Adversary,
}

impl DeviceRole {
    pub fn as_str(self) -> &'static str {
        match self {
            DeviceRole::Controller => "controller",
            DeviceRole::Switch => "switch",
            DeviceRole::Hmi => "hmi",
            DeviceRole::Historian => "historian",
            DeviceRole::Workstation => "workstation",
            DeviceRole::Adversary => "adversary",
        }
    }
}

impl fmt::Display for DeviceRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeviceRole {
    type Err = TopologyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "controller" => Ok(DeviceRole::Controller),
            "switch" => Ok(DeviceRole::Switch),
            "hmi" => Ok(DeviceRole::Hmi),
            "historian" => Ok(DeviceRole::Historian),
            "workstation" => Ok(DeviceRole::Workstation),
            "adversary" => Ok(DeviceRole::Adversary),
            other => Err(TopologyError::InvariantViolation(format!(
                "unknown device role `{other}`"
            ))),
        }
    }
}

/// Network and link-layer identity of a non-switch device.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NetworkIdentity {
    pub address: Ipv4Addr,
    pub netmask: Ipv4Addr,
    pub mac: MacAddress,
}

/// Immutable record of a device's identity and role.
///
/// Every non-switch device carries exactly one network identity; switches
/// carry none.
#[derive(Clone, Debug, PartialEq)]
pub struct DeviceSpec {
    id: String,
    role: DeviceRole,
    identity: Option<NetworkIdentity>,
}

impl DeviceSpec {
    /// Creates a non-switch device from its textual identity, validating the
    /// address, netmask and MAC.
    pub fn host(
        id: impl Into<String>,
        role: DeviceRole,
        address: &str,
        netmask: &str,
        mac: &str,
    ) -> Result<Self, TopologyError> {
        let id = id.into();
        if role == DeviceRole::Switch {
            return Err(TopologyError::InvalidAddress {
                device: id,
                reason: "switches carry no network identity".to_string(),
            });
        }

        let address: Ipv4Addr = address.parse().map_err(|_| TopologyError::InvalidAddress {
            device: id.clone(),
            reason: format!("`{address}` is not a valid IPv4 address"),
        })?;
        let netmask: Ipv4Addr = netmask.parse().map_err(|_| TopologyError::InvalidAddress {
            device: id.clone(),
            reason: format!("`{netmask}` is not a valid IPv4 netmask"),
        })?;
        ipnet::ipv4_mask_to_prefix(netmask).map_err(|_| TopologyError::InvalidAddress {
            device: id.clone(),
            reason: format!("netmask `{netmask}` is not a contiguous prefix mask"),
        })?;
        let mac: MacAddress = mac.parse().map_err(|_| TopologyError::InvalidAddress {
            device: id.clone(),
            reason: format!("`{mac}` is not a valid MAC address"),
        })?;

        Ok(Self {
            id,
            role,
            identity: Some(NetworkIdentity {
                address,
                netmask,
                mac,
            }),
        })
    }

    /// Creates a switch. Switches have no network identity of their own.
    pub fn switch(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role: DeviceRole::Switch,
            identity: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn role(&self) -> DeviceRole {
        self.role
    }

    pub fn identity(&self) -> Option<&NetworkIdentity> {
        self.identity.as_ref()
    }

    /// The attribute mapping attached to this device's graph node.
    pub fn attributes(&self) -> Attrs {
        let mut attrs = Attrs::new();
        attrs.insert("role".to_string(), self.role.to_string());
        if let Some(identity) = &self.identity {
            attrs.insert("address".to_string(), identity.address.to_string());
            attrs.insert("netmask".to_string(), identity.netmask.to_string());
            attrs.insert("mac".to_string(), identity.mac.to_string());
        }
        attrs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_attributes_contain_full_identity() {
        let device = DeviceSpec::host(
            "plc1",
            DeviceRole::Controller,
            "192.168.1.10",
            "255.255.255.0",
            "00:1d:9c:c7:b0:01",
        )
        .unwrap();

        let attrs = device.attributes();
        assert_eq!(attrs.get("role").unwrap(), "controller");
        assert_eq!(attrs.get("address").unwrap(), "192.168.1.10");
        assert_eq!(attrs.get("netmask").unwrap(), "255.255.255.0");
        let expected_mac = "00:1d:9c:c7:b0:01".parse::<MacAddress>().unwrap();
        assert_eq!(attrs.get("mac").unwrap(), &expected_mac.to_string());
    }

    #[test]
    fn switch_has_no_network_identity() {
        let device = DeviceSpec::switch("s3");
        assert_eq!(device.role(), DeviceRole::Switch);
        assert!(device.identity().is_none());

        let attrs = device.attributes();
        assert_eq!(attrs.get("role").unwrap(), "switch");
        assert!(!attrs.contains_key("address"));
    }

    #[test]
    fn malformed_address_is_rejected() {
        let result = DeviceSpec::host(
            "plc1",
            DeviceRole::Controller,
            "192.168.1.300",
            "255.255.255.0",
            "00:1d:9c:c7:b0:01",
        );
        assert!(matches!(result, Err(TopologyError::InvalidAddress { .. })));
    }

    #[test]
    fn non_contiguous_netmask_is_rejected() {
        let result = DeviceSpec::host(
            "plc1",
            DeviceRole::Controller,
            "192.168.1.10",
            "255.0.255.0",
            "00:1d:9c:c7:b0:01",
        );
        assert!(matches!(result, Err(TopologyError::InvalidAddress { .. })));
    }

    #[test]
    fn malformed_mac_is_rejected() {
        let result = DeviceSpec::host(
            "plc1",
            DeviceRole::Controller,
            "192.168.1.10",
            "255.255.255.0",
            "not-a-mac",
        );
        assert!(matches!(result, Err(TopologyError::InvalidAddress { .. })));
    }

    #[test]
    fn switch_role_cannot_take_an_address() {
        let result = DeviceSpec::host(
            "s3",
            DeviceRole::Switch,
            "192.168.1.1",
            "255.255.255.0",
            "00:1d:9c:c7:b0:ff",
        );
        assert!(matches!(result, Err(TopologyError::InvalidAddress { .. })));
    }

    #[test]
    fn role_round_trips_through_its_tag() {
        for role in [
            DeviceRole::Controller,
            DeviceRole::Switch,
            DeviceRole::Hmi,
            DeviceRole::Historian,
            DeviceRole::Workstation,
            DeviceRole::Adversary,
        ] {
            assert_eq!(role.as_str().parse::<DeviceRole>().unwrap(), role);
        }
        assert!("plc".parse::<DeviceRole>().is_err());
    }
}
