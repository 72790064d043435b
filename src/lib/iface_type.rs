// SPDX-License-Identifier: Apache-2.0

// This file is based on the work of nmstate project(https://nmstate.io/) which
// is under license of Apache 2.0, authors of original file are:
//  * Gris Ge <fge@redhat.com>
//  * Fernando Fernandez Mancera <ffmancera@riseup.net>

use serde::{Deserialize, Serialize};

use crate::JsonDisplay;

/// Kind of interface, serialized in kebab-case, e.g. `linux-bridge`.
///
/// Any string not listed is kept as [InterfaceType::Unknown], which is only
/// valid for absent or ignored interfaces.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    JsonDisplay,
)]
#[non_exhaustive]
#[serde(rename_all = "kebab-case")]
pub enum InterfaceType {
    Bond,
    LinuxBridge,
    Dummy,
    Ethernet,
    MacVlan,
    MacVtap,
    OvsBridge,
    /// OVS internal interface, `patch` and `dpdk` included.
    OvsInterface,
    /// Stored as [crate::EthernetInterface] holding a `veth` section.
    Veth,
    Vlan,
    Vrf,
    Vxlan,
    #[serde(rename = "infiniband")]
    InfiniBand,
    Team,
    Wireguard,
    #[serde(untagged)]
    Unknown(String),
}

impl Default for InterfaceType {
    fn default() -> Self {
        Self::Unknown("unknown".to_string())
    }
}

impl InterfaceType {
    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown(_))
    }

    /// Interface has no kernel interface index, so its name may collide
    /// with a kernel interface.
    pub fn is_userspace(&self) -> bool {
        self == &Self::OvsBridge
    }

    pub fn is_controller(&self) -> bool {
        matches!(
            self,
            Self::OvsBridge
                | Self::Bond
                | Self::LinuxBridge
                | Self::Team
                | Self::Vrf,
        )
    }

    pub(crate) fn need_controller(&self) -> bool {
        self == &Self::OvsInterface
    }

    /// Connection type used in NetworkManager keyfile.
    pub(crate) fn nm_conn_type(&self) -> Option<&'static str> {
        Some(match self {
            Self::Ethernet => "ethernet",
            Self::Veth => "veth",
            Self::Bond => "bond",
            Self::LinuxBridge => "bridge",
            Self::OvsBridge => "ovs-bridge",
            Self::OvsInterface => "ovs-interface",
            Self::Vlan => "vlan",
            Self::Vxlan => "vxlan",
            Self::MacVlan | Self::MacVtap => "macvlan",
            Self::Vrf => "vrf",
            Self::InfiniBand => "infiniband",
            Self::Team => "team",
            Self::Dummy => "dummy",
            Self::Wireguard => "wireguard",
            Self::Unknown(_) => return None,
        })
    }

    /// The `port-type` a port of this controller holds in keyfile.
    pub(crate) fn nm_port_type(&self) -> Option<&'static str> {
        match self {
            Self::Bond => Some("bond"),
            Self::LinuxBridge => Some("bridge"),
            Self::Vrf => Some("vrf"),
            Self::Team => Some("team"),
            Self::OvsBridge => Some("ovs-port"),
            _ => None,
        }
    }
}
