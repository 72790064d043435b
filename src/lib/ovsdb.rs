// SPDX-License-Identifier: Apache-2.0

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// OpenvSwitch database `external_ids` and `other_config` of interface or
/// of the global `Open_vSwitch` table. A `null` value in desired state
/// removes the key.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
#[non_exhaustive]
pub struct OvsDbIfaceConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_ids: Option<HashMap<String, Option<String>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub other_config: Option<HashMap<String, Option<String>>>,
}

/// Global configuration of OpenvSwitch database, top level `ovs-db` section.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
#[non_exhaustive]
pub struct OvsDbGlobalConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_ids: Option<HashMap<String, Option<String>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub other_config: Option<HashMap<String, Option<String>>>,
}

impl OvsDbGlobalConfig {
    pub fn is_none(&self) -> bool {
        self.external_ids.is_none() && self.other_config.is_none()
    }
}

/// Merge desired OVS DB map into current: desired value override current,
/// desired `null` removes the key.
pub(crate) fn merge_ovsdb_map(
    desired: Option<&HashMap<String, Option<String>>>,
    current: Option<&HashMap<String, Option<String>>>,
) -> Option<HashMap<String, Option<String>>> {
    let desired = desired?;
    let mut ret: HashMap<String, Option<String>> =
        current.cloned().unwrap_or_default();
    for (key, value) in desired {
        if value.is_none() {
            ret.remove(key);
        } else {
            ret.insert(key.to_string(), value.clone());
        }
    }
    Some(ret)
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[non_exhaustive]
pub struct MergedOvsDbGlobalConfig {
    pub desired: Option<OvsDbGlobalConfig>,
    pub current: OvsDbGlobalConfig,
    pub merged: OvsDbGlobalConfig,
}

impl MergedOvsDbGlobalConfig {
    pub(crate) fn new(
        desired: Option<OvsDbGlobalConfig>,
        current: OvsDbGlobalConfig,
    ) -> Self {
        let merged = match desired.as_ref() {
            Some(des) => OvsDbGlobalConfig {
                external_ids: merge_ovsdb_map(
                    des.external_ids.as_ref(),
                    current.external_ids.as_ref(),
                )
                .or_else(|| current.external_ids.clone()),
                other_config: merge_ovsdb_map(
                    des.other_config.as_ref(),
                    current.other_config.as_ref(),
                )
                .or_else(|| current.other_config.clone()),
            },
            None => current.clone(),
        };
        Self {
            desired,
            current,
            merged,
        }
    }

    pub(crate) fn is_changed(&self) -> bool {
        self.desired.is_some() && self.merged != self.current
    }

    pub(crate) fn verify(
        &self,
        current: &OvsDbGlobalConfig,
    ) -> Result<(), crate::NetstateError> {
        if self.desired.is_none() {
            return Ok(());
        }
        for (name, merged_map, cur_map) in [
            (
                "external_ids",
                self.merged.external_ids.as_ref(),
                current.external_ids.as_ref(),
            ),
            (
                "other_config",
                self.merged.other_config.as_ref(),
                current.other_config.as_ref(),
            ),
        ] {
            let empty = HashMap::new();
            let merged_map = merged_map.unwrap_or(&empty);
            let cur_map = cur_map.unwrap_or(&empty);
            for (key, value) in merged_map {
                if cur_map.get(key) != Some(value) {
                    return Err(crate::NetstateError::new(
                        crate::ErrorKind::VerificationError,
                        format!(
                            "Verification failure: ovs-db.{name}.{key} \
                             desire '{}', current '{}'",
                            value.as_deref().unwrap_or_default(),
                            cur_map
                                .get(key)
                                .and_then(|v| v.as_deref())
                                .unwrap_or_default(),
                        ),
                    ));
                }
            }
        }
        Ok(())
    }
}
