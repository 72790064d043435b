// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};

use crate::{DebugHideSecrets, NetworkState};

/// The IEEE 802.1X authentication configuration.
/// ```yml
/// ---
/// interfaces:
///   - name: eth1
///     type: ethernet
///     state: up
///     802.1x:
///       ca-cert: /etc/pki/802-1x-test/ca.crt
///       client-cert: /etc/pki/802-1x-test/client.example.org.crt
///       eap-methods:
///         - tls
///       identity: client.example.org
///       private-key: /etc/pki/802-1x-test/client.example.org.key
///       private-key-password: password
/// ```
#[derive(
    Clone, PartialEq, Eq, Default, Serialize, Deserialize, DebugHideSecrets,
)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
#[non_exhaustive]
pub struct Ieee8021XConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity: Option<String>,
    /// Deserialize and serialize from/to `eap-methods`.
    #[serde(skip_serializing_if = "Option::is_none", rename = "eap-methods")]
    pub eap: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_cert: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ca_cert: Option<String>,
    /// Replaced by [NetworkState::HIDE_PASSWORD_STR] when hiding secrets.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_key_password: Option<String>,
}

impl Ieee8021XConfig {
    pub(crate) fn hide_secrets(&mut self) {
        if self.private_key_password.is_some() {
            self.private_key_password =
                Some(NetworkState::HIDE_PASSWORD_STR.to_string());
        }
    }
}
