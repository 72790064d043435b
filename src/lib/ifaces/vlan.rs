// SPDX-License-Identifier: Apache-2.0

// This file is based on the work of nmstate project(https://nmstate.io/) which
// is under license of Apache 2.0, authors of original file are:
//  * Gris Ge <fge@redhat.com>
//  * Ales Musil <amusil@redhat.com>
//  * Enrique Llorente <ellorent@redhat.com>
//  * Íñigo Huguet <ihuguet@redhat.com>

use serde::{Deserialize, Serialize};

use crate::{
    BaseInterface, ErrorKind, InterfaceType, JsonDisplay, NetstateError,
    NetstateInterface,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonDisplay)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
#[non_exhaustive]
/// VLAN interface
pub struct VlanInterface {
    #[serde(flatten)]
    pub base: BaseInterface,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vlan: Option<VlanConfig>,
}

impl VlanInterface {
    pub const MAX_ID: u16 = 4095;

    pub fn new(name: String, vlan: VlanConfig) -> Self {
        Self {
            base: BaseInterface {
                name,
                iface_type: InterfaceType::Vlan,
                ..Default::default()
            },
            vlan: Some(vlan),
        }
    }

    /// Whether VLAN ID is different from current, backend should
    /// recreate the VLAN for this.
    pub(crate) fn is_id_changed(&self, current: &Self) -> bool {
        let des_id = self.vlan.as_ref().and_then(|v| v.id);
        let cur_id = current.vlan.as_ref().and_then(|v| v.id);
        des_id.is_some() && cur_id.is_some() && des_id != cur_id
    }
}

impl Default for VlanInterface {
    fn default() -> Self {
        Self {
            base: BaseInterface {
                iface_type: InterfaceType::Vlan,
                ..Default::default()
            },
            vlan: None,
        }
    }
}

impl NetstateInterface for VlanInterface {
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
        self.vlan.as_ref().and_then(|v| v.base_iface.as_deref())
    }

    fn need_parent(&self) -> bool {
        true
    }

    /// * VLAN ID should be in the range of 0 to 4095.
    /// * Sort and dedup QoS mapping
    fn sanitize_iface_specfic(
        &mut self,
        _current: Option<&Self>,
    ) -> Result<(), NetstateError> {
        if let Some(vlan_conf) = self.vlan.as_mut() {
            if let Some(id) = vlan_conf.id
                && id > Self::MAX_ID
            {
                let e = NetstateError::new(
                    ErrorKind::InvalidArgument,
                    format!(
                        "Invalid VLAN ID {id} of interface {}, should be in \
                         the range of 0 to {}",
                        self.base.name,
                        Self::MAX_ID
                    ),
                );
                log::error!("{e}");
                return Err(e);
            }
            if let Some(qos_map) = vlan_conf.ingress_qos_map.as_mut() {
                qos_map.sort_unstable();
                qos_map.dedup();
            }
            if let Some(qos_map) = vlan_conf.egress_qos_map.as_mut() {
                qos_map.sort_unstable();
                qos_map.dedup();
            }
        }
        Ok(())
    }

    fn post_merge_iface_specific(
        &mut self,
        desired: &Self,
        current: &Self,
    ) -> Result<(), NetstateError> {
        if desired.is_id_changed(current) {
            log::info!(
                "VLAN ID of interface {} changed, backend will recreate it",
                self.base.name
            );
        }
        Ok(())
    }

    /// Both VLAN ID and base interface are mandatory for VLAN been up.
    /// Reorder headers default to true unless current has it disabled.
    fn pre_edit_cleanup_iface_specific(
        &mut self,
        current: Option<&Self>,
    ) -> Result<(), NetstateError> {
        let vlan_conf = match self.vlan.as_mut() {
            Some(v) => v,
            None => {
                let e = NetstateError::new(
                    ErrorKind::InvalidArgument,
                    format!(
                        "`vlan` section is mandatory for VLAN interface {}",
                        self.base.name
                    ),
                );
                log::error!("{e}");
                return Err(e);
            }
        };
        if vlan_conf.base_iface.as_deref().unwrap_or_default().is_empty() {
            let e = NetstateError::new(
                ErrorKind::InvalidArgument,
                format!(
                    "`vlan.base-iface` is mandatory for VLAN {}",
                    self.base.name
                ),
            );
            log::error!("{e}");
            return Err(e);
        }
        if vlan_conf.id.is_none() {
            let e = NetstateError::new(
                ErrorKind::InvalidArgument,
                format!("`vlan.id` is mandatory for VLAN {}", self.base.name),
            );
            log::error!("{e}");
            return Err(e);
        }
        if vlan_conf.reorder_headers.is_none()
            && current
                .and_then(|c| c.vlan.as_ref())
                .and_then(|v| v.reorder_headers)
                != Some(false)
        {
            vlan_conf.reorder_headers = Some(true);
        }
        Ok(())
    }

    fn sanitize_before_verify_iface_specfic(&mut self, current: &mut Self) {
        if let Some(vlan_conf) = current.vlan.as_mut() {
            if vlan_conf.ingress_qos_map.is_none() {
                vlan_conf.ingress_qos_map = Some(Vec::new());
            }
            if vlan_conf.egress_qos_map.is_none() {
                vlan_conf.egress_qos_map = Some(Vec::new());
            }
        }
    }
}

#[derive(
    Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default, JsonDisplay,
)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
#[non_exhaustive]
pub struct VlanConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_iface: Option<String>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        deserialize_with = "crate::deserializer::option_u16_or_string"
    )]
    pub id: Option<u16>,
    /// Could be `802.1q` or `802.1ad`. Default to `802.1q` if not defined.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<VlanProtocol>,
    /// Could be `gvrp`, `mvrp` or `none`. Default to none if not defined.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registration_protocol: Option<VlanRegistrationProtocol>,
    /// Reordering of output packet headers. Default to true if not defined.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "crate::deserializer::option_bool_or_string"
    )]
    pub reorder_headers: Option<bool>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "crate::deserializer::option_bool_or_string"
    )]
    pub loose_binding: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ingress_qos_map: Option<Vec<VlanQosMapping>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub egress_qos_map: Option<Vec<VlanQosMapping>>,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default,
)]
pub enum VlanProtocol {
    #[serde(rename = "802.1q")]
    #[default]
    Ieee8021Q,
    #[serde(rename = "802.1ad")]
    Ieee8021Ad,
}

impl std::fmt::Display for VlanProtocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Ieee8021Q => "802.1q",
                Self::Ieee8021Ad => "802.1ad",
            }
        )
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonDisplay,
)]
#[serde(rename_all = "kebab-case")]
pub enum VlanRegistrationProtocol {
    Gvrp,
    Mvrp,
    None,
}

#[derive(
    Serialize,
    Deserialize,
    Debug,
    PartialEq,
    Eq,
    Clone,
    Copy,
    Default,
    PartialOrd,
    Ord,
)]
pub struct VlanQosMapping {
    #[serde(deserialize_with = "crate::deserializer::u32_or_string")]
    pub from: u32,
    #[serde(deserialize_with = "crate::deserializer::u32_or_string")]
    pub to: u32,
}

impl std::fmt::Display for VlanQosMapping {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.from, self.to)
    }
}
