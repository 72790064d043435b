// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};

use crate::{
    BaseInterface, ErrorKind, InterfaceType, JsonDisplay, NetstateError,
    NetstateInterface,
};

/// Virtual Routing and Forwarding interface
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonDisplay)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
#[non_exhaustive]
pub struct VrfInterface {
    #[serde(flatten)]
    pub base: BaseInterface,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vrf: Option<VrfConfig>,
}

impl Default for VrfInterface {
    fn default() -> Self {
        Self {
            base: BaseInterface {
                iface_type: InterfaceType::Vrf,
                ..Default::default()
            },
            vrf: None,
        }
    }
}

impl VrfInterface {
    pub fn table_id(&self) -> Option<u32> {
        self.vrf.as_ref().and_then(|v| v.table_id)
    }
}

impl NetstateInterface for VrfInterface {
    fn base_iface(&self) -> &BaseInterface {
        &self.base
    }

    fn base_iface_mut(&mut self) -> &mut BaseInterface {
        &mut self.base
    }

    fn is_virtual(&self) -> bool {
        true
    }

    fn ports(&self) -> Option<Vec<&str>> {
        self.vrf
            .as_ref()
            .and_then(|v| v.port.as_ref())
            .map(|ports| ports.iter().map(|p| p.as_str()).collect())
    }

    // Kernel does not support assigning MAC to VRF, and it refuses
    // disabling `accept-all-mac-addresses`.
    fn sanitize_iface_specfic(
        &mut self,
        _current: Option<&Self>,
    ) -> Result<(), NetstateError> {
        if self.base.mac_address.take().is_some() {
            log::warn!(
                "Ignoring MAC address of VRF interface {} as it is not \
                 supported",
                self.base.name
            );
        }
        if self.base.accept_all_mac_addresses == Some(false) {
            self.base.accept_all_mac_addresses = None;
        }
        self.sort_ports();
        Ok(())
    }

    fn pre_edit_cleanup_iface_specific(
        &mut self,
        _current: Option<&Self>,
    ) -> Result<(), NetstateError> {
        if self.table_id().unwrap_or_default() == 0 {
            let e = NetstateError::new(
                ErrorKind::InvalidArgument,
                format!(
                    "Route table ID of VRF interface {} is mandatory and \
                     cannot be 0",
                    self.base.name
                ),
            );
            log::error!("{e}");
            return Err(e);
        }
        self.base.mac_address = None;
        if self.base.accept_all_mac_addresses == Some(false) {
            self.base.accept_all_mac_addresses = None;
        }
        Ok(())
    }

    fn state_for_verify_iface_specific(&mut self) {
        self.sort_ports();
    }

    fn sanitize_before_verify_iface_specfic(&mut self, current: &mut Self) {
        current.base.mac_address = None;
        current.base.accept_all_mac_addresses = None;
    }

    fn sort_ports(&mut self) {
        if let Some(ports) = self.vrf.as_mut().and_then(|v| v.port.as_mut()) {
            ports.sort_unstable();
        }
    }

    fn remove_port(&mut self, port_name: &str) -> Result<(), NetstateError> {
        if let Some(ports) = self.vrf.as_mut().and_then(|v| v.port.as_mut()) {
            ports.retain(|p| p != port_name);
        }
        Ok(())
    }
}

#[derive(
    Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonDisplay,
)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
#[non_exhaustive]
pub struct VrfConfig {
    /// Serialize to `port`. Deserialize from `port` or `ports`.
    #[serde(alias = "ports", skip_serializing_if = "Option::is_none")]
    pub port: Option<Vec<String>>,
    /// Route table ID of this VRF interface.
    /// Serialize to `route-table-id`.
    #[serde(
        rename = "route-table-id",
        skip_serializing_if = "Option::is_none",
        default,
        deserialize_with = "crate::deserializer::option_u32_or_string"
    )]
    pub table_id: Option<u32>,
}
