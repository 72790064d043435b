// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Deserializer, Serialize};

use crate::{BaseInterface, JsonDisplay, NetstateInterface};

/// Interface of type not supported, or with type undefined in desired state.
/// Properties other than `name`, `type` and `state` are kept as is.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, JsonDisplay)]
#[serde(rename_all = "kebab-case")]
#[non_exhaustive]
pub struct UnknownInterface {
    #[serde(flatten)]
    pub base: BaseInterface,
    #[serde(flatten)]
    pub(crate) other: serde_json::Map<String, serde_json::Value>,
}

impl UnknownInterface {
    pub fn new(base: BaseInterface) -> Self {
        Self {
            base,
            ..Default::default()
        }
    }
}

impl NetstateInterface for UnknownInterface {
    fn base_iface(&self) -> &BaseInterface {
        &self.base
    }

    fn base_iface_mut(&mut self) -> &mut BaseInterface {
        &mut self.base
    }

    fn is_virtual(&self) -> bool {
        false
    }
}

impl<'de> Deserialize<'de> for UnknownInterface {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let mut other = serde_json::Map::deserialize(deserializer)?;
        let mut base_value = serde_json::Map::new();
        for key in ["name", "type", "state"] {
            if let Some(v) = other.remove(key) {
                base_value.insert(key.to_string(), v);
            }
        }
        let base = BaseInterface::deserialize(serde_json::Value::Object(
            base_value,
        ))
        .map_err(serde::de::Error::custom)?;
        Ok(Self { base, other })
    }
}
