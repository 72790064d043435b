// SPDX-License-Identifier: Apache-2.0

use std::net::IpAddr;

use serde::{Deserialize, Serialize};

use crate::{
    BaseInterface, ErrorKind, InterfaceType, JsonDisplay, NetstateError,
    NetstateInterface,
};

/// VXLAN interface
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonDisplay)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
#[non_exhaustive]
pub struct VxlanInterface {
    #[serde(flatten)]
    pub base: BaseInterface,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vxlan: Option<VxlanConfig>,
}

impl VxlanInterface {
    /// VXLAN Network Identifier is 24 bits.
    pub const MAX_ID: u32 = 16_777_215;
}

impl Default for VxlanInterface {
    fn default() -> Self {
        Self {
            base: BaseInterface {
                iface_type: InterfaceType::Vxlan,
                ..Default::default()
            },
            vxlan: None,
        }
    }
}

impl NetstateInterface for VxlanInterface {
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
        self.vxlan
            .as_ref()
            .and_then(|v| v.base_iface.as_deref())
            .filter(|b| !b.is_empty())
    }

    fn need_parent(&self) -> bool {
        true
    }

    fn sanitize_iface_specfic(
        &mut self,
        _current: Option<&Self>,
    ) -> Result<(), NetstateError> {
        if let Some(id) = self.vxlan.as_ref().and_then(|v| v.id)
            && id > Self::MAX_ID
        {
            let e = NetstateError::new(
                ErrorKind::InvalidArgument,
                format!(
                    "Invalid VXLAN ID {id} of interface {}, should be in the \
                     range of 0 to {}",
                    self.base.name,
                    Self::MAX_ID
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
        let name = self.base.name.as_str();
        let vxlan_conf = self.vxlan.as_ref();
        for (prop, missing) in [
            ("vxlan", vxlan_conf.is_none()),
            ("vxlan.id", vxlan_conf.is_some_and(|v| v.id.is_none())),
            (
                "vxlan.base-iface",
                vxlan_conf.is_some_and(|v| {
                    v.base_iface.as_deref().unwrap_or_default().is_empty()
                }),
            ),
            ("vxlan.remote", vxlan_conf.is_some_and(|v| v.remote.is_none())),
        ] {
            if missing {
                let e = NetstateError::new(
                    ErrorKind::InvalidArgument,
                    format!("`{prop}` is mandatory for VXLAN interface {name}"),
                );
                log::error!("{e}");
                return Err(e);
            }
        }
        Ok(())
    }
}

#[derive(
    Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default, JsonDisplay,
)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
#[non_exhaustive]
pub struct VxlanConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_iface: Option<String>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        deserialize_with = "crate::deserializer::option_u32_or_string"
    )]
    pub id: Option<u32>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        deserialize_with = "crate::deserializer::option_bool_or_string"
    )]
    pub learning: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local: Option<IpAddr>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote: Option<IpAddr>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        rename = "destination-port",
        default,
        deserialize_with = "crate::deserializer::option_u16_or_string"
    )]
    pub dst_port: Option<u16>,
}
