// SPDX-License-Identifier: Apache-2.0

// This file is based on the work of nmstate project(https://nmstate.io/) which
// is under license of Apache 2.0, authors of original file are:
//  * Gris Ge <fge@redhat.com>
//  * Marcelo Guerrero <marguerr@redhat.com>

use serde::{Deserialize, Serialize};

use crate::{
    BaseInterface, ErrorKind, InterfaceType, JsonDisplay, NetstateError,
    NetstateInterface, SrIovConfig,
};

/// Ethernet interface, also used for veth which is holding the `veth`
/// section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonDisplay)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
#[non_exhaustive]
pub struct EthernetInterface {
    #[serde(flatten)]
    pub base: BaseInterface,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ethernet: Option<EthernetConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub veth: Option<VethConfig>,
    // This end of veth pair is created along with its peer.
    #[serde(skip)]
    pub(crate) is_veth_peer: bool,
}

impl EthernetInterface {
    pub fn new(base: BaseInterface, ethernet: Option<EthernetConfig>) -> Self {
        Self {
            base,
            ethernet,
            ..Default::default()
        }
    }

    pub fn new_veth(base: BaseInterface, veth_peer: &str) -> Self {
        Self {
            base,
            veth: Some(VethConfig {
                peer: veth_peer.to_string(),
            }),
            ..Default::default()
        }
    }

    pub fn veth_peer(&self) -> Option<&str> {
        self.veth.as_ref().map(|v| v.peer.as_str())
    }

    /// Whether this veth will be created by its peer.
    pub fn is_veth_peer(&self) -> bool {
        self.veth.is_some() && self.is_veth_peer
    }

    pub(crate) fn sriov_total_vfs(&self) -> Option<u32> {
        self.ethernet
            .as_ref()
            .and_then(|e| e.sr_iov.as_ref())
            .and_then(|s| s.total_vfs)
    }

    pub(crate) fn sriov_mut(&mut self) -> Option<&mut SrIovConfig> {
        self.ethernet.as_mut().and_then(|e| e.sr_iov.as_mut())
    }
}

impl Default for EthernetInterface {
    fn default() -> Self {
        Self {
            base: BaseInterface {
                iface_type: InterfaceType::Ethernet,
                ..Default::default()
            },
            ethernet: None,
            veth: None,
            is_veth_peer: false,
        }
    }
}

impl NetstateInterface for EthernetInterface {
    fn base_iface(&self) -> &BaseInterface {
        &self.base
    }

    fn base_iface_mut(&mut self) -> &mut BaseInterface {
        &mut self.base
    }

    fn is_virtual(&self) -> bool {
        self.veth.is_some()
    }

    fn sanitize_iface_specfic(
        &mut self,
        _current: Option<&Self>,
    ) -> Result<(), NetstateError> {
        // Veth is always handled as ethernet with `veth` section
        self.base.iface_type = InterfaceType::Ethernet;
        if let Some(peer) = self.veth_peer() {
            if peer.is_empty() {
                return Err(NetstateError::new(
                    ErrorKind::InvalidArgument,
                    format!(
                        "Veth interface {} is holding empty peer name",
                        self.base.name
                    ),
                ));
            }
            if peer == self.base.name {
                return Err(NetstateError::new(
                    ErrorKind::InvalidArgument,
                    format!(
                        "Veth interface {} cannot use itself as peer",
                        self.base.name
                    ),
                ));
            }
        }
        if let Some(sriov_conf) = self.sriov_mut() {
            sriov_conf.sanitize()?;
        }
        Ok(())
    }

    // Speed, duplex and auto-negotiation are tied to each other, only take
    // them from current when the `ethernet` section is not desired at all.
    fn post_merge_iface_specific(
        &mut self,
        desired: &Self,
        current: &Self,
    ) -> Result<(), NetstateError> {
        if let (Some(eth_conf), Some(des_eth_conf)) =
            (self.ethernet.as_mut(), desired.ethernet.as_ref())
        {
            eth_conf.auto_neg = des_eth_conf.auto_neg;
            eth_conf.speed = des_eth_conf.speed;
            eth_conf.duplex = des_eth_conf.duplex;
            if let (Some(sriov_conf), Some(cur_sriov_conf)) = (
                eth_conf.sr_iov.as_mut(),
                current.ethernet.as_ref().and_then(|e| e.sr_iov.as_ref()),
            ) {
                sriov_conf.merge_vfs(cur_sriov_conf)?;
            }
        }
        Ok(())
    }

    fn state_for_verify_iface_specific(&mut self) {
        self.base.iface_type = InterfaceType::Ethernet;
        if let Some(sriov_conf) = self.sriov_mut() {
            sriov_conf.state_for_verify();
        }
    }

    fn sanitize_before_verify_iface_specfic(&mut self, current: &mut Self) {
        // Veth peer could be in other network namespace which is not
        // reported by current.
        if self.veth.is_some() && current.veth.is_none() {
            self.veth = None;
        }
    }
}

#[derive(
    Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default, JsonDisplay,
)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
#[non_exhaustive]
pub struct EthernetConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sr_iov: Option<SrIovConfig>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        rename = "auto-negotiation",
        default,
        deserialize_with = "crate::deserializer::option_bool_or_string"
    )]
    pub auto_neg: Option<bool>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        deserialize_with = "crate::deserializer::option_u32_or_string"
    )]
    pub speed: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duplex: Option<EthernetDuplex>,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonDisplay,
)]
#[serde(rename_all = "kebab-case")]
#[non_exhaustive]
pub enum EthernetDuplex {
    Full,
    Half,
}

#[derive(
    Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonDisplay,
)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
#[non_exhaustive]
pub struct VethConfig {
    /// Name of the other end of veth pair.
    pub peer: String,
}
