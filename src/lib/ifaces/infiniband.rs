// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};

use crate::{
    BaseInterface, ErrorKind, InterfaceType, JsonDisplay, NetstateError,
    NetstateInterface,
};

/// IP over InfiniBand interface
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonDisplay)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
#[non_exhaustive]
pub struct InfiniBandInterface {
    #[serde(flatten)]
    pub base: BaseInterface,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub infiniband: Option<InfiniBandConfig>,
}

impl Default for InfiniBandInterface {
    fn default() -> Self {
        Self {
            base: BaseInterface {
                iface_type: InterfaceType::InfiniBand,
                ..Default::default()
            },
            infiniband: None,
        }
    }
}

impl InfiniBandInterface {
    pub const DEFAULT_PKEY: u16 = 0xffff;

    /// Canonicalized partition key, undefined means default `0xffff`.
    pub fn pkey(&self) -> u16 {
        self.infiniband
            .as_ref()
            .and_then(|c| c.pkey)
            .unwrap_or(Self::DEFAULT_PKEY)
    }

    fn validate_name_for_pkey(&self) -> Result<(), NetstateError> {
        if let Some(parent) = self.parent() {
            let expected_name = format!("{parent}.{:x}", self.pkey());
            if self.base.name != expected_name {
                let e = NetstateError::new(
                    ErrorKind::InvalidArgument,
                    format!(
                        "InfiniBand interface name {} is invalid for \
                         specified pkey, should be {expected_name}",
                        self.base.name
                    ),
                );
                log::error!("{e}");
                return Err(e);
            }
        } else if self.need_parent() {
            let e = NetstateError::new(
                ErrorKind::InvalidArgument,
                format!(
                    "InfiniBand interface {} with pkey {:#x} requires \
                     `infiniband.base-iface`",
                    self.base.name,
                    self.pkey()
                ),
            );
            log::error!("{e}");
            return Err(e);
        }
        Ok(())
    }
}

impl NetstateInterface for InfiniBandInterface {
    fn base_iface(&self) -> &BaseInterface {
        &self.base
    }

    fn base_iface_mut(&mut self) -> &mut BaseInterface {
        &mut self.base
    }

    fn is_virtual(&self) -> bool {
        self.need_parent()
    }

    fn parent(&self) -> Option<&str> {
        self.infiniband
            .as_ref()
            .and_then(|c| c.base_iface.as_deref())
            .filter(|b| !b.is_empty())
    }

    fn need_parent(&self) -> bool {
        self.pkey() != Self::DEFAULT_PKEY
    }

    fn pre_edit_cleanup_iface_specific(
        &mut self,
        _current: Option<&Self>,
    ) -> Result<(), NetstateError> {
        let ib_conf = self.infiniband.get_or_insert_with(Default::default);
        if ib_conf.mode.is_none() {
            let e = NetstateError::new(
                ErrorKind::InvalidArgument,
                format!(
                    "InfiniBand interface {} has missing mandatory property: \
                     infiniband.mode",
                    self.base.name
                ),
            );
            log::error!("{e}");
            return Err(e);
        }
        ib_conf.pkey.get_or_insert(Self::DEFAULT_PKEY);
        self.validate_name_for_pkey()
    }

    fn state_for_verify_iface_specific(&mut self) {
        if let Some(ib_conf) = self.infiniband.as_mut() {
            ib_conf.pkey.get_or_insert(Self::DEFAULT_PKEY);
        }
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    JsonDisplay,
    Default,
)]
#[serde(rename_all = "kebab-case")]
#[non_exhaustive]
pub enum InfiniBandMode {
    #[default]
    Datagram,
    Connected,
}

#[derive(
    Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonDisplay,
)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
#[non_exhaustive]
pub struct InfiniBandConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<InfiniBandMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_iface: Option<String>,
    /// Partition key in the range of 1 to 0xffff. Accept integer, decimal
    /// string or `0x` prefixed hex string.
    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        deserialize_with = "deserialize_pkey"
    )]
    pub pkey: Option<u16>,
}

fn deserialize_pkey<'de, D>(deserializer: D) -> Result<Option<u16>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match crate::deserializer::option_u64_or_string(deserializer) {
        Ok(Some(pkey)) if pkey == 0 || pkey > u16::MAX as u64 => {
            Err(serde::de::Error::custom(format!(
                "Invalid infiniband pkey {pkey:#x}, should be integer or hex \
                 string in the range of 1 - 0xffff"
            )))
        }
        Ok(Some(pkey)) => Ok(Some(pkey as u16)),
        Ok(None) => Ok(None),
        Err(e) => Err(serde::de::Error::custom(format!(
            "Invalid infiniband pkey: {e}, should be integer or hex string in \
             the range of 1 - 0xffff"
        ))),
    }
}
