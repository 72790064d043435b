// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};

use crate::{BaseInterface, InterfaceType, JsonDisplay, NetstateInterface};

/// Kernel dummy interface, holding nothing beyond [BaseInterface].
/// Commonly used as anchor of IP addresses or VRF port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonDisplay)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
#[non_exhaustive]
pub struct DummyInterface {
    #[serde(flatten)]
    pub base: BaseInterface,
}

impl Default for DummyInterface {
    fn default() -> Self {
        Self::new(String::new())
    }
}

impl DummyInterface {
    pub fn new(name: String) -> Self {
        Self {
            base: BaseInterface::new(name, InterfaceType::Dummy),
        }
    }
}

impl NetstateInterface for DummyInterface {
    fn is_virtual(&self) -> bool {
        true
    }

    fn base_iface(&self) -> &BaseInterface {
        &self.base
    }

    fn base_iface_mut(&mut self) -> &mut BaseInterface {
        &mut self.base
    }
}
