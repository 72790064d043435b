// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};

/// LLDP configuration. Neighbors are only reported by current state and
/// never verified.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
#[non_exhaustive]
pub struct LldpConfig {
    #[serde(deserialize_with = "crate::deserializer::bool_or_string")]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub neighbors: Vec<Vec<serde_json::Value>>,
}

impl LldpConfig {
    pub(crate) fn sanitize(&mut self) {
        if !self.neighbors.is_empty() {
            log::debug!("Ignoring LLDP neighbors in desired state");
            self.neighbors.clear();
        }
    }
}
