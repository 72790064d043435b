// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};

use crate::{
    BaseInterface, ErrorKind, InterfaceType, JsonDisplay, NetstateError,
    NetstateInterface,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonDisplay)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
#[non_exhaustive]
pub struct MacVlanInterface {
    #[serde(flatten)]
    pub base: BaseInterface,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mac_vlan: Option<MacVlanConfig>,
}

impl Default for MacVlanInterface {
    fn default() -> Self {
        Self {
            base: BaseInterface {
                iface_type: InterfaceType::MacVlan,
                ..Default::default()
            },
            mac_vlan: None,
        }
    }
}

impl NetstateInterface for MacVlanInterface {
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
        self.mac_vlan.as_ref().and_then(|c| c.base_iface.as_deref())
    }

    fn need_parent(&self) -> bool {
        true
    }

    fn pre_edit_cleanup_iface_specific(
        &mut self,
        _current: Option<&Self>,
    ) -> Result<(), NetstateError> {
        validate_mac_vlan_conf(
            self.base.name.as_str(),
            "mac-vlan",
            self.mac_vlan
                .as_ref()
                .map(|c| (&c.base_iface, c.mode, c.promiscuous)),
        )
    }
}

#[derive(
    Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonDisplay,
)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
#[non_exhaustive]
pub struct MacVlanConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_iface: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<MacVlanMode>,
    /// Serialize to `promiscuous`.
    /// Deserialize from `promiscuous` or `accept-all-mac`.
    #[serde(
        alias = "accept-all-mac",
        skip_serializing_if = "Option::is_none",
        default,
        deserialize_with = "crate::deserializer::option_bool_or_string"
    )]
    pub promiscuous: Option<bool>,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    JsonDisplay,
)]
#[serde(rename_all = "kebab-case")]
#[non_exhaustive]
pub enum MacVlanMode {
    /// Deserialize and serialize from/to `vepa`.
    Vepa,
    /// Deserialize and serialize from/to `bridge`.
    Bridge,
    /// Deserialize and serialize from/to `private`.
    Private,
    /// Deserialize and serialize from/to `passthru`.
    Passthru,
    /// Deserialize and serialize from/to `source`.
    Source,
    /// Only reported by current state, not allowed when applying.
    #[default]
    Unknown,
}

// Shared by MAC VLAN and MAC VTAP:
//  * Mode and base interface are mandatory.
//  * Unknown mode cannot be applied.
//  * Disabling promiscuous is only allowed in passthru mode.
pub(crate) fn validate_mac_vlan_conf(
    iface_name: &str,
    section: &str,
    conf: Option<(&Option<String>, Option<MacVlanMode>, Option<bool>)>,
) -> Result<(), NetstateError> {
    let (base_iface, mode, promiscuous) = conf.unwrap_or((&None, None, None));
    let mode = match mode {
        Some(m) => m,
        None => {
            let e = NetstateError::new(
                ErrorKind::InvalidArgument,
                format!(
                    "Interface {iface_name} has missing mandatory property: \
                     {section}.mode"
                ),
            );
            log::error!("{e}");
            return Err(e);
        }
    };
    if base_iface.as_deref().unwrap_or_default().is_empty() {
        let e = NetstateError::new(
            ErrorKind::InvalidArgument,
            format!(
                "Interface {iface_name} has missing mandatory property: \
                 {section}.base-iface"
            ),
        );
        log::error!("{e}");
        return Err(e);
    }
    if mode == MacVlanMode::Unknown {
        let e = NetstateError::new(
            ErrorKind::InvalidArgument,
            format!(
                "Mode unknown is not supported when applying interface \
                 {iface_name}"
            ),
        );
        log::error!("{e}");
        return Err(e);
    }
    if mode != MacVlanMode::Passthru && promiscuous == Some(false) {
        let e = NetstateError::new(
            ErrorKind::InvalidArgument,
            format!(
                "Disable promiscuous is only allowed on passthru mode, but \
                 interface {iface_name} is in {mode} mode"
            ),
        );
        log::error!("{e}");
        return Err(e);
    }
    Ok(())
}
