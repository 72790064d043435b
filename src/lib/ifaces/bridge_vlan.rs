// SPDX-License-Identifier: Apache-2.0

// This file is based on the work of nmstate project(https://nmstate.io/) which
// is under license of Apache 2.0, authors of original
// file(rust/src/lib/ifaces/bridge_vlan.rs) are:
//  * Gris Ge <fge@redhat.com>
//  * Fernando Fernandez Mancera <ffmancera@riseup.net>

use std::collections::{HashMap, hash_map::Entry};

use serde::{Deserialize, Serialize};

use crate::{ErrorKind, JsonDisplay, NetstateError};

const MAX_VLAN_ID: u16 = 4095;

/// VLAN filtering configuration of bridge port, used by both linux bridge
/// and OVS bridge.
#[derive(
    Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonDisplay,
)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
#[non_exhaustive]
pub struct BridgeVlanConfig {
    /// Enable native VLAN, only valid in trunk mode.
    /// Deserialize and serialize from/to `enable-native`.
    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        deserialize_with = "crate::deserializer::option_bool_or_string"
    )]
    pub enable_native: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<BridgeVlanMode>,
    /// VLAN tag of access port, or native VLAN of trunk port.
    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        deserialize_with = "crate::deserializer::option_u16_or_string"
    )]
    pub tag: Option<u16>,
    /// Deserialize and serialize from/to `trunk-tags`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trunk_tags: Option<Vec<BridgeVlanTrunkTag>>,
}

impl BridgeVlanConfig {
    pub fn is_empty(&self) -> bool {
        self == &Default::default()
    }

    fn is_access(&self) -> bool {
        self.mode == Some(BridgeVlanMode::Access)
    }

    fn is_trunk(&self) -> bool {
        self.mode == Some(BridgeVlanMode::Trunk)
    }

    /// Validate user input:
    ///  * Access port cannot have trunk tags.
    ///  * Trunk port requires trunk tags.
    ///  * Tag in trunk mode requires `enable-native`.
    ///  * `enable-native` is invalid in access mode.
    ///  * VLAN IDs should not overlap with each other.
    pub(crate) fn validate(&self) -> Result<(), NetstateError> {
        let trunk_tags = self.trunk_tags.as_deref().unwrap_or_default();
        let err_msg = if self.is_access() && !trunk_tags.is_empty() {
            Some("Access port cannot have trunk tags")
        } else if (self.is_trunk()
            || (self.mode.is_none() && self.trunk_tags.is_some()))
            && trunk_tags.is_empty()
        {
            Some("A trunk port needs to specify trunk tags")
        } else if self.is_trunk()
            && self.tag.unwrap_or_default() != 0
            && self.enable_native != Some(true)
        {
            Some("Tag cannot be use in trunk mode without enable-native")
        } else if self.is_access() && self.enable_native == Some(true) {
            Some("enable-native cannot be set in access mode")
        } else {
            None
        };
        if let Some(msg) = err_msg {
            let e = NetstateError::new(
                ErrorKind::InvalidArgument,
                format!("{msg}: {self}"),
            );
            log::error!("{e}");
            return Err(e);
        }
        if let Some(tag) = self.tag
            && tag > MAX_VLAN_ID
        {
            let e = NetstateError::new(
                ErrorKind::InvalidArgument,
                format!(
                    "Invalid bridge VLAN tag {tag}, should be in the range of \
                     0 to {MAX_VLAN_ID}"
                ),
            );
            log::error!("{e}");
            return Err(e);
        }
        validate_overlap_trunk_tags(trunk_tags)
    }

    /// Remove properties conflicting with the VLAN mode, might be
    /// introduced by merging with current:
    ///  * Remove `enable-native` and `trunk-tags` in access mode.
    ///  * Remove `tag` in trunk mode without `enable-native`.
    pub(crate) fn cleanup(&mut self) {
        if self.trunk_tags.is_some() && self.mode.is_none() {
            self.mode = Some(BridgeVlanMode::Trunk);
        }
        if self.is_access() {
            self.enable_native = None;
            self.trunk_tags = None;
        }
        if self.is_trunk() && self.enable_native != Some(true) {
            self.tag = None;
        }
    }

    /// Expand and compress trunk tags so overlapping representations of
    /// the same VLAN set are equal.
    pub(crate) fn compress_trunk_tags(&mut self) {
        if let Some(trunk_tags) = self.trunk_tags.as_ref() {
            let vids: Vec<u16> =
                trunk_tags.iter().flat_map(|tag| tag.vlan_ids()).collect();
            self.trunk_tags = Some(compress_vlan_ids(vids));
        }
    }
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
pub enum BridgeVlanMode {
    /// Trunk mode
    Trunk,
    /// Access mode
    #[default]
    Access,
}

/// Trunk tag is either a single VLAN ID(`id: 101`) or an inclusive range
/// (`id-range: {min: 200, max: 299}`), never both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", try_from = "RawTrunkTag")]
#[non_exhaustive]
pub enum BridgeVlanTrunkTag {
    Id(u16),
    IdRange(BridgeVlanRange),
}

impl BridgeVlanTrunkTag {
    fn vlan_ids(&self) -> std::ops::RangeInclusive<u16> {
        match self {
            Self::Id(id) => *id..=*id,
            Self::IdRange(range) => range.min..=range.max,
        }
    }
}

impl std::fmt::Display for BridgeVlanTrunkTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Id(d) => write!(f, "id={d}"),
            Self::IdRange(range) => {
                write!(f, "id-range=[{},{}]", range.min, range.max)
            }
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct RawTrunkTag {
    #[serde(
        default,
        deserialize_with = "crate::deserializer::option_u16_or_string"
    )]
    id: Option<u16>,
    #[serde(default)]
    id_range: Option<RawVlanRange>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawVlanRange {
    #[serde(
        default,
        deserialize_with = "crate::deserializer::option_u16_or_string"
    )]
    min: Option<u16>,
    #[serde(
        default,
        deserialize_with = "crate::deserializer::option_u16_or_string"
    )]
    max: Option<u16>,
}

impl TryFrom<RawTrunkTag> for BridgeVlanTrunkTag {
    type Error = String;

    fn try_from(raw: RawTrunkTag) -> Result<Self, Self::Error> {
        let tag = match (raw.id, raw.id_range) {
            (Some(_), Some(_)) => {
                return Err("Trunk port cannot be configured by both id and \
                            range"
                    .to_string());
            }
            (Some(id), None) => Self::Id(id),
            (None, Some(RawVlanRange {
                min: Some(min),
                max: Some(max),
            })) => {
                if min > max {
                    return Err(format!(
                        "Trunk port range minimum {min} is bigger than \
                         maximum {max}"
                    ));
                }
                Self::IdRange(BridgeVlanRange { min, max })
            }
            (None, Some(_)) => {
                return Err("Trunk port range requires min / max keys"
                    .to_string());
            }
            (None, None) => {
                return Err(
                    "Trunk tag only support 'id' or 'id-range'".to_string()
                );
            }
        };
        if *tag.vlan_ids().end() > MAX_VLAN_ID {
            return Err(format!(
                "Trunk tag {tag} is out of VLAN ID range 0 to {MAX_VLAN_ID}"
            ));
        }
        Ok(tag)
    }
}

#[derive(
    Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonDisplay,
)]
#[non_exhaustive]
#[serde(deny_unknown_fields)]
pub struct BridgeVlanRange {
    /// Minimum VLAN ID(included).
    #[serde(deserialize_with = "crate::deserializer::u16_or_string")]
    pub min: u16,
    /// Maximum VLAN ID(included).
    #[serde(deserialize_with = "crate::deserializer::u16_or_string")]
    pub max: u16,
}

fn validate_overlap_trunk_tags(
    tags: &[BridgeVlanTrunkTag],
) -> Result<(), NetstateError> {
    let mut found: HashMap<u16, &BridgeVlanTrunkTag> = HashMap::new();
    for tag in tags {
        for vid in tag.vlan_ids() {
            match found.entry(vid) {
                Entry::Occupied(o) => {
                    let e = NetstateError::new(
                        ErrorKind::InvalidArgument,
                        format!(
                            "Bridge VLAN trunk tag {tag} is overlapping with \
                             other tag {}",
                            o.get()
                        ),
                    );
                    log::error!("{e}");
                    return Err(e);
                }
                Entry::Vacant(v) => {
                    v.insert(tag);
                }
            }
        }
    }
    Ok(())
}

fn compress_vlan_ids(mut vids: Vec<u16>) -> Vec<BridgeVlanTrunkTag> {
    vids.sort_unstable();
    vids.dedup();

    let mut ranges: Vec<BridgeVlanRange> = Vec::new();
    for vid in vids {
        match ranges.last_mut() {
            Some(last) if last.max + 1 == vid => last.max = vid,
            _ => ranges.push(BridgeVlanRange { min: vid, max: vid }),
        }
    }

    ranges
        .into_iter()
        .map(|range| {
            if range.min == range.max {
                BridgeVlanTrunkTag::Id(range.min)
            } else {
                BridgeVlanTrunkTag::IdRange(range)
            }
        })
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_compress_bridge_vlan_ids() {
        let vids = vec![11u16, 1, 2, 3, 4, 9, 10, 20, 25, 26];

        assert_eq!(
            compress_vlan_ids(vids),
            vec![
                BridgeVlanTrunkTag::IdRange(BridgeVlanRange { min: 1, max: 4 }),
                BridgeVlanTrunkTag::IdRange(BridgeVlanRange {
                    min: 9,
                    max: 11
                }),
                BridgeVlanTrunkTag::Id(20),
                BridgeVlanTrunkTag::IdRange(BridgeVlanRange {
                    min: 25,
                    max: 26
                })
            ],
        )
    }

    #[test]
    fn test_trunk_tag_with_both_id_and_range() {
        let result = serde_yaml::from_str::<BridgeVlanTrunkTag>(
            r"
            id: 101
            id-range:
              min: 200
              max: 299",
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_trunk_tag_range_missing_max() {
        let result = serde_yaml::from_str::<BridgeVlanTrunkTag>(
            r"
            id-range:
              min: 200",
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_trunk_tag_serialize() {
        let tags: Vec<BridgeVlanTrunkTag> = serde_yaml::from_str(
            r"
            - id: 101
            - id-range:
                min: 200
                max: 299",
        )
        .unwrap();
        assert_eq!(
            serde_json::to_value(&tags).unwrap(),
            serde_json::json!([
                {"id": 101},
                {"id-range": {"min": 200, "max": 299}}
            ])
        );
    }

    #[test]
    fn test_access_port_cleanup() {
        let mut conf: BridgeVlanConfig = serde_yaml::from_str(
            r"
            mode: access
            tag: 305
            enable-native: true
            trunk-tags:
            - id: 101",
        )
        .unwrap();
        conf.cleanup();
        assert_eq!(conf.mode, Some(BridgeVlanMode::Access));
        assert_eq!(conf.tag, Some(305));
        assert_eq!(conf.enable_native, None);
        assert_eq!(conf.trunk_tags, None);
    }

    #[test]
    fn test_trunk_port_without_native_cleanup() {
        let mut conf: BridgeVlanConfig = serde_yaml::from_str(
            r"
            mode: trunk
            tag: 100
            trunk-tags:
            - id: 101",
        )
        .unwrap();
        conf.cleanup();
        assert_eq!(conf.tag, None);
        assert_eq!(conf.trunk_tags, Some(vec![BridgeVlanTrunkTag::Id(101)]));
    }

    #[test]
    fn test_validate_access_with_trunk_tags() {
        let conf: BridgeVlanConfig = serde_yaml::from_str(
            r"
            mode: access
            trunk-tags:
            - id: 101",
        )
        .unwrap();
        let e = conf.validate().unwrap_err();
        assert_eq!(e.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_validate_trunk_without_tags() {
        let conf: BridgeVlanConfig =
            serde_yaml::from_str("mode: trunk").unwrap();
        assert!(conf.validate().is_err());
    }

    #[test]
    fn test_validate_overlap_trunk_tags() {
        let conf: BridgeVlanConfig = serde_yaml::from_str(
            r"
            mode: trunk
            trunk-tags:
            - id: 101
            - id-range:
                min: 100
                max: 110",
        )
        .unwrap();
        assert!(conf.validate().is_err());
    }
}
