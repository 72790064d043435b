// SPDX-License-Identifier: Apache-2.0

// This file is based on the work of nmstate project(https://nmstate.io/) which
// is under license of Apache 2.0, authors of original file are:
//  * Gris Ge <fge@redhat.com>

use serde::{Deserialize, Serialize};

use crate::{ErrorKind, JsonDisplay, NetstateError, VlanProtocol};

/// Single Root I/O Virtualization(SRIOV) configuration of physical
/// function.
#[derive(
    Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default, JsonDisplay,
)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
#[non_exhaustive]
pub struct SrIovConfig {
    /// Number of virtual functions to create. Reducing it removes the VF
    /// interfaces `<pf>v<id>` with ID not less than the new value.
    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        deserialize_with = "crate::deserializer::option_u32_or_string"
    )]
    pub total_vfs: Option<u32>,
    /// Per VF configuration, merged with current by VF ID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vfs: Option<Vec<SrIovVfConfig>>,
}

impl SrIovConfig {
    /// Kernel interface name of specified VF.
    pub fn vf_iface_name(pf_name: &str, vf_id: u32) -> String {
        format!("{pf_name}v{vf_id}")
    }

    pub(crate) fn sanitize(&mut self) -> Result<(), NetstateError> {
        if let Some(vfs) = self.vfs.as_mut() {
            for vf in vfs.iter_mut() {
                if let Some(mac) = vf.mac_address.as_mut() {
                    mac.make_ascii_uppercase();
                }
                if vf.vlan_proto == Some(VlanProtocol::Ieee8021Ad)
                    && vf.vlan_id.unwrap_or_default() == 0
                    && vf.qos.unwrap_or_default() == 0
                {
                    let e = NetstateError::new(
                        ErrorKind::InvalidArgument,
                        format!(
                            "VLAN protocol 802.1ad is not allowed for SR-IOV \
                             VF {} when both VLAN ID and VLAN QoS are zero or \
                             unset",
                            vf.id
                        ),
                    );
                    log::error!("{e}");
                    return Err(e);
                }
            }
            vfs.sort_unstable_by_key(|vf| vf.id);
        }
        Ok(())
    }

    // The JSON merge treat VF list as a whole, merge them by VF ID.
    pub(crate) fn merge_vfs(
        &mut self,
        current: &Self,
    ) -> Result<(), NetstateError> {
        let (Some(vfs), Some(cur_vfs)) =
            (self.vfs.as_mut(), current.vfs.as_ref())
        else {
            return Ok(());
        };
        for vf in vfs.iter_mut() {
            if let Some(cur_vf) = cur_vfs.iter().find(|c| c.id == vf.id) {
                let mut vf_value = serde_json::to_value(&*vf)?;
                crate::value::copy_undefined_value(
                    &mut vf_value,
                    &serde_json::to_value(cur_vf)?,
                );
                *vf = serde_json::from_value(vf_value)?;
            }
        }
        Ok(())
    }

    /// Remove VF configurations not less than `total_vfs`.
    pub(crate) fn shrink_vfs(&mut self, total_vfs: u32) {
        if let Some(vfs) = self.vfs.as_mut() {
            vfs.retain(|vf| vf.id < total_vfs);
        }
    }

    pub(crate) fn state_for_verify(&mut self) {
        if let Some(vfs) = self.vfs.as_mut() {
            for vf in vfs.iter_mut() {
                if let Some(mac) = vf.mac_address.as_mut() {
                    mac.make_ascii_uppercase();
                }
                vf.vf_iface_name = None;
            }
            vfs.sort_unstable_by_key(|vf| vf.id);
            // `vfs: []` is reverting all VFs to default, nothing to verify
            if vfs.is_empty() {
                self.vfs = None;
            }
        }
    }
}

#[derive(
    Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default, JsonDisplay,
)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
#[non_exhaustive]
pub struct SrIovVfConfig {
    #[serde(deserialize_with = "crate::deserializer::u32_or_string")]
    pub id: u32,
    /// Interface name of this VF, only reported by current state.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub iface_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mac_address: Option<String>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        deserialize_with = "crate::deserializer::option_bool_or_string"
    )]
    pub spoof_check: Option<bool>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        deserialize_with = "crate::deserializer::option_bool_or_string"
    )]
    pub trust: Option<bool>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        deserialize_with = "crate::deserializer::option_u32_or_string"
    )]
    pub min_tx_rate: Option<u32>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        deserialize_with = "crate::deserializer::option_u32_or_string"
    )]
    pub max_tx_rate: Option<u32>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        deserialize_with = "crate::deserializer::option_u32_or_string"
    )]
    pub vlan_id: Option<u32>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        deserialize_with = "crate::deserializer::option_u32_or_string"
    )]
    pub qos: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vlan_proto: Option<VlanProtocol>,
    /// Stable kernel interface name of this VF for backends, generated
    /// during metadata generation.
    #[serde(skip)]
    pub(crate) vf_iface_name: Option<String>,
}
