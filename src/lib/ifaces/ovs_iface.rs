// SPDX-License-Identifier: Apache-2.0

// This file is based on the work of nmstate project(https://nmstate.io/) which
// is under license of Apache 2.0, authors of original file are:
//  * Gris Ge <fge@redhat.com>
//  * Fernando Fernandez Mancera <ffmancera@riseup.net>
//  * Ales Musil <amusil@redhat.com>
//  * Jan Vaclav <jvaclav@redhat.com>

use serde::{Deserialize, Serialize};

use crate::{
    BaseInterface, ErrorKind, InterfaceType, JsonDisplay, NetstateError,
    NetstateInterface,
};

/// OpenvSwitch Internal Interface, the owning OVS bridge is its parent.
///
/// Patch port:
/// ```yml
/// - name: patch0
///   type: ovs-interface
///   state: up
///   patch:
///     peer: patch1
/// ```
///
/// DPDK port:
/// ```yml
/// - name: ovs0
///   type: ovs-interface
///   state: up
///   dpdk:
///     devargs: "0000:af:00.1"
///     rx-queue: 100
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonDisplay)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
#[non_exhaustive]
pub struct OvsInterface {
    #[serde(flatten)]
    pub base: BaseInterface,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch: Option<OvsPatchConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dpdk: Option<OvsDpdkConfig>,
}

impl Default for OvsInterface {
    fn default() -> Self {
        Self {
            base: BaseInterface {
                iface_type: InterfaceType::OvsInterface,
                ..Default::default()
            },
            patch: None,
            dpdk: None,
        }
    }
}

impl OvsInterface {
    pub fn new(base: BaseInterface) -> Self {
        Self {
            base,
            ..Default::default()
        }
    }

    pub(crate) fn new_with_name_and_ctrl(name: &str, ctrl_name: &str) -> Self {
        let mut base =
            BaseInterface::new(name.to_string(), InterfaceType::OvsInterface);
        base.controller = Some(ctrl_name.to_string());
        base.controller_type = Some(InterfaceType::OvsBridge);
        Self::new(base)
    }

    pub fn is_patch(&self) -> bool {
        self.patch.is_some()
    }

    pub(crate) fn patch_peer(&self) -> Option<&str> {
        self.patch.as_ref().map(|p| p.peer.as_str())
    }

    fn invalid_patch_prop(&self, prop: &str) -> NetstateError {
        let e = NetstateError::new(
            ErrorKind::InvalidArgument,
            format!(
                "OVS patch interface {} is not allowed to hold {prop} \
                 configuration",
                self.base.name
            ),
        );
        log::error!("{e}");
        e
    }
}

impl NetstateInterface for OvsInterface {
    fn base_iface(&self) -> &BaseInterface {
        &self.base
    }

    fn base_iface_mut(&mut self) -> &mut BaseInterface {
        &mut self.base
    }

    fn is_virtual(&self) -> bool {
        true
    }

    fn parent(&self) -> Option<&str> {
        self.base.controller.as_deref().filter(|c| !c.is_empty())
    }

    fn need_parent(&self) -> bool {
        true
    }

    fn can_have_ip_as_port(&self) -> bool {
        true
    }

    fn sanitize_iface_specfic(
        &mut self,
        _current: Option<&Self>,
    ) -> Result<(), NetstateError> {
        if let Some(dpdk_conf) = self.dpdk.as_ref()
            && dpdk_conf.devargs.as_deref().unwrap_or_default().is_empty()
        {
            let e = NetstateError::new(
                ErrorKind::InvalidArgument,
                format!(
                    "OVS DPDK interface {} has missing mandatory property: \
                     dpdk.devargs",
                    self.base.name
                ),
            );
            log::error!("{e}");
            return Err(e);
        }
        Ok(())
    }

    fn pre_edit_cleanup_iface_specific(
        &mut self,
        _current: Option<&Self>,
    ) -> Result<(), NetstateError> {
        if self.is_patch() {
            if self.base.mac_address.is_some() {
                return Err(self.invalid_patch_prop("MAC address"));
            }
            if self.base.mtu.is_some() {
                return Err(self.invalid_patch_prop("MTU"));
            }
            if self.base.is_ipv4_enabled() || self.base.is_ipv6_enabled() {
                return Err(self.invalid_patch_prop("IP"));
            }
        }
        Ok(())
    }
}

#[derive(
    Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonDisplay,
)]
#[serde(deny_unknown_fields)]
#[non_exhaustive]
pub struct OvsPatchConfig {
    pub peer: String,
}

#[derive(
    Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonDisplay,
)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
#[non_exhaustive]
pub struct OvsDpdkConfig {
    /// Mandatory, PCI address or vdev arguments of DPDK device.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub devargs: Option<String>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        deserialize_with = "crate::deserializer::option_u32_or_string"
    )]
    pub rx_queue: Option<u32>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        deserialize_with = "crate::deserializer::option_u32_or_string"
    )]
    pub n_rxq_desc: Option<u32>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        deserialize_with = "crate::deserializer::option_u32_or_string"
    )]
    pub n_txq_desc: Option<u32>,
}
