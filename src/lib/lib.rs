// SPDX-License-Identifier: Apache-2.0

//! Declarative network state engine.
//!
//! Merge desired [NetworkState] with current [NetworkState] into
//! [MergedNetworkState], which could then generate the edit plan or verify
//! the state after applied.

mod dns;
mod error;
mod gen_conf;
mod hostname;
mod ieee8021x;
mod iface_state;
mod iface_trait;
mod iface_type;
mod ifaces;
mod ip;
mod lldp;
mod merged;
mod mptcp;
mod net_state;
mod ovsdb;
mod policy;
mod route;
mod route_rule;
mod state_options;
mod value;

pub(crate) mod deserializer;
pub(crate) mod serializer;

pub use self::{
    dns::{DnsClientState, DnsIfaceMetadata, DnsState},
    error::{ErrorKind, NetstateError},
    gen_conf::NmKeyFile,
    hostname::{HostNameState, MergedHostNameState},
    ieee8021x::Ieee8021XConfig,
    iface_state::InterfaceState,
    iface_trait::NetstateInterface,
    iface_type::InterfaceType,
    ifaces::{
        BaseInterface, BondAdSelect, BondAllPortActive, BondArpAllTargets,
        BondArpValidate, BondConfig, BondFailOverMac, BondInterface,
        BondLacpRate, BondMode, BondOptions, BondPrimaryReselect,
        BondXmitHashPolicy, BridgeVlanConfig, BridgeVlanMode, BridgeVlanRange,
        BridgeVlanTrunkTag, DummyInterface, EthernetConfig, EthernetDuplex,
        EthernetInterface, EthtoolCoalesceConfig, EthtoolConfig,
        EthtoolPauseConfig, EthtoolRingConfig, InfiniBandConfig,
        InfiniBandInterface, InfiniBandMode, Interface, Interfaces,
        LinuxBridgeConfig, LinuxBridgeInterface,
        LinuxBridgeMulticastRouterType, LinuxBridgeOptions,
        LinuxBridgePortConfig, LinuxBridgeStpOptions, MacVlanConfig,
        MacVlanInterface, MacVlanMode, MacVtapConfig, MacVtapInterface,
        OvsBridgeBondConfig, OvsBridgeBondMode, OvsBridgeBondPortConfig,
        OvsBridgeConfig, OvsBridgeInterface, OvsBridgeOptions,
        OvsBridgePortConfig, OvsDpdkConfig, OvsInterface, OvsPatchConfig,
        SrIovConfig, SrIovVfConfig, TeamConfig, TeamInterface,
        TeamPortConfig, TeamRunnerConfig, TeamRunnerMode, UnknownInterface,
        VethConfig, VlanConfig, VlanInterface, VlanProtocol, VlanQosMapping,
        VlanRegistrationProtocol, VrfConfig, VrfInterface, VxlanConfig,
        VxlanInterface, WaitIp, WireguardConfig, WireguardInterface,
        WireguardIpAddress, WireguardPeerConfig,
    },
    ip::{
        AddressFamily, Dhcpv4ClientId, Dhcpv6Duid, InterfaceIpAddr,
        InterfaceIpv4, InterfaceIpv6, Ipv6AddrGenMode,
    },
    lldp::LldpConfig,
    merged::{
        MergedDns, MergedInterface, MergedInterfaces, MergedNetworkState,
        MergedRouteRules, MergedRoutes,
    },
    mptcp::{MptcpAddressFlag, MptcpConfig},
    net_state::{CUR_SCHEMA_VERSION, NetworkState},
    ovsdb::{MergedOvsDbGlobalConfig, OvsDbGlobalConfig, OvsDbIfaceConfig},
    policy::{
        NetworkCaptureCommand, NetworkCaptureRules, NetworkPolicy,
        NetworkStateTemplate,
    },
    route::{RouteEntry, RouteState, RouteType, Routes},
    route_rule::{
        RouteRuleAction, RouteRuleEntry, RouteRuleState, RouteRules,
    },
    state_options::NetstateApplyOption,
};

pub(crate) use self::ip::IpMetadata;
pub(crate) use netstate_derive::{
    DebugHideSecrets, JsonDisplay, JsonDisplayHideSecrets,
};

#[cfg(test)]
mod unit_tests;
