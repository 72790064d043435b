// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};

use crate::{ErrorKind, JsonDisplay, NetstateError};

#[derive(
    Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonDisplay,
)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
#[non_exhaustive]
/// Hostname
/// ```yaml
/// hostname:
///   running: host1.example.org
///   config: host1.example.org
/// ```
pub struct HostNameState {
    /// Current hostname of the host. When applying, this is changed
    /// without touching the persistent configuration.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub running: Option<String>,
    /// Hostname stored in persistent configuration.
    /// Empty string means removing the persistent hostname.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<String>,
}

impl HostNameState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.running.is_none() && self.config.is_none()
    }

    pub(crate) fn update(&mut self, other: &Self) {
        if other.running.is_some() {
            self.running.clone_from(&other.running);
        }
        if other.config.is_some() {
            self.config.clone_from(&other.config);
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MergedHostNameState {
    pub desired: Option<HostNameState>,
    pub current: Option<HostNameState>,
    pub merged: Option<HostNameState>,
}

impl MergedHostNameState {
    pub(crate) fn new(
        desired: Option<HostNameState>,
        current: Option<HostNameState>,
    ) -> Self {
        let merged = match (desired.as_ref(), current.as_ref()) {
            (Some(des), Some(cur)) => {
                let mut merged = cur.clone();
                merged.update(des);
                Some(merged)
            }
            (Some(des), None) => Some(des.clone()),
            (None, cur) => cur.cloned(),
        };
        Self {
            desired,
            current,
            merged,
        }
    }

    pub(crate) fn is_changed(&self) -> bool {
        self.desired.as_ref().is_some_and(|d| !d.is_empty())
            && self.merged != self.current
    }

    pub(crate) fn verify(
        &self,
        current: Option<&HostNameState>,
    ) -> Result<(), NetstateError> {
        let Some(desired) = self.desired.as_ref() else {
            return Ok(());
        };
        if desired.is_empty() {
            return Ok(());
        }
        let Some(current) = current else {
            let e = NetstateError::new(
                ErrorKind::VerificationError,
                "Verification fail, desire hostname but current hostname \
                 is unknown"
                    .to_string(),
            );
            log::error!("{e}");
            return Err(e);
        };

        for (prop, des, cur) in [
            ("running", desired.running.as_ref(), current.running.as_ref()),
            ("config", desired.config.as_ref(), current.config.as_ref()),
        ] {
            if let Some(des) = des
                && Some(des) != cur
                && !(des.is_empty() && cur.is_none())
            {
                let e = NetstateError::new(
                    ErrorKind::VerificationError,
                    format!(
                        "Verification fail, desire hostname.{prop}: {des}, \
                         current: {}",
                        cur.map(String::as_str).unwrap_or_default()
                    ),
                );
                log::error!("{e}");
                return Err(e);
            }
        }
        Ok(())
    }
}
