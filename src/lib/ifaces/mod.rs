// SPDX-License-Identifier: Apache-2.0

mod base;
mod bond;
mod bridge_vlan;
mod dummy;
mod ethernet;
mod ethtool;
mod iface;
mod infiniband;
mod inter_ifaces;
mod linux_bridge;
mod mac_vlan;
mod mac_vtap;
mod ovs_bridge;
mod ovs_iface;
mod sriov;
mod team;
mod unknown;
mod vlan;
mod vrf;
mod vxlan;
mod wireguard;

pub use self::{
    base::{BaseInterface, WaitIp},
    bond::{
        BondAdSelect, BondAllPortActive, BondArpAllTargets, BondArpValidate,
        BondConfig, BondFailOverMac, BondInterface, BondLacpRate, BondMode,
        BondOptions, BondPrimaryReselect, BondXmitHashPolicy,
    },
    bridge_vlan::{
        BridgeVlanConfig, BridgeVlanMode, BridgeVlanRange, BridgeVlanTrunkTag,
    },
    dummy::DummyInterface,
    ethernet::{EthernetConfig, EthernetDuplex, EthernetInterface, VethConfig},
    ethtool::{
        EthtoolCoalesceConfig, EthtoolConfig, EthtoolPauseConfig,
        EthtoolRingConfig,
    },
    iface::Interface,
    infiniband::{InfiniBandConfig, InfiniBandInterface, InfiniBandMode},
    inter_ifaces::Interfaces,
    linux_bridge::{
        LinuxBridgeConfig, LinuxBridgeInterface,
        LinuxBridgeMulticastRouterType, LinuxBridgeOptions,
        LinuxBridgePortConfig, LinuxBridgeStpOptions,
    },
    mac_vlan::{MacVlanConfig, MacVlanInterface, MacVlanMode},
    mac_vtap::{MacVtapConfig, MacVtapInterface},
    ovs_bridge::{
        OvsBridgeBondConfig, OvsBridgeBondMode, OvsBridgeBondPortConfig,
        OvsBridgeConfig, OvsBridgeInterface, OvsBridgeOptions,
        OvsBridgePortConfig,
    },
    ovs_iface::{OvsDpdkConfig, OvsInterface, OvsPatchConfig},
    sriov::{SrIovConfig, SrIovVfConfig},
    team::{
        TeamConfig, TeamInterface, TeamPortConfig, TeamRunnerConfig,
        TeamRunnerMode,
    },
    unknown::UnknownInterface,
    vlan::{
        VlanConfig, VlanInterface, VlanProtocol, VlanQosMapping,
        VlanRegistrationProtocol,
    },
    vrf::{VrfConfig, VrfInterface},
    vxlan::{VxlanConfig, VxlanInterface},
    wireguard::{
        WireguardConfig, WireguardInterface, WireguardIpAddress,
        WireguardPeerConfig,
    },
};
