// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};

use crate::JsonDisplay;

#[derive(
    Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize, JsonDisplay,
)]
#[non_exhaustive]
#[serde(rename_all = "kebab-case")]
pub struct NetstateApplyOption {
    /// Do not verify whether post applied state matches with desired state.
    #[serde(default)]
    pub no_verify: bool,
    /// When set to true, the desire state will not be persistent after OS
    /// reboot. Default to false.
    #[serde(default, alias = "save-to-disk-disabled")]
    pub memory_only: bool,
    /// Generating configuration without current state. Unknown interface
    /// type is treated as ethernet and unknown ports or parents are
    /// allowed.
    #[serde(default)]
    pub gen_conf_mode: bool,
    /// Only kernel side network configuration is desired, user space
    /// interfaces (OVS) are ignored.
    #[serde(default)]
    pub kernel_only: bool,
}

impl NetstateApplyOption {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn no_verify(mut self) -> Self {
        self.no_verify = true;
        self
    }

    pub fn memory_only(mut self) -> Self {
        self.memory_only = true;
        self
    }

    pub fn gen_conf_mode(mut self) -> Self {
        self.gen_conf_mode = true;
        self
    }

    pub fn kernel_only(mut self) -> Self {
        self.kernel_only = true;
        self
    }

    /// Whether the applied state should survive reboot.
    pub fn save_to_disk(&self) -> bool {
        !self.memory_only
    }
}
