// SPDX-License-Identifier: Apache-2.0

use std::net::{IpAddr, SocketAddr};

use serde::{Deserialize, Serialize};

use crate::{
    BaseInterface, DebugHideSecrets, ErrorKind, InterfaceType, JsonDisplay,
    JsonDisplayHideSecrets, NetstateError, NetstateInterface, NetworkState,
};

/// WireGuard tunnel.
/// Private key and preshared keys are replaced by
/// [NetworkState::HIDE_PASSWORD_STR] when hiding secrets.
#[derive(
    Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonDisplayHideSecrets,
)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
#[non_exhaustive]
pub struct WireguardInterface {
    #[serde(flatten)]
    pub base: BaseInterface,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wireguard: Option<WireguardConfig>,
}

impl Default for WireguardInterface {
    fn default() -> Self {
        Self {
            base: BaseInterface {
                iface_type: InterfaceType::Wireguard,
                ..Default::default()
            },
            wireguard: None,
        }
    }
}

impl NetstateInterface for WireguardInterface {
    fn base_iface(&self) -> &BaseInterface {
        &self.base
    }

    fn base_iface_mut(&mut self) -> &mut BaseInterface {
        &mut self.base
    }

    fn is_virtual(&self) -> bool {
        true
    }

    fn hide_secrets_iface_specific(&mut self) {
        if let Some(wg_conf) = self.wireguard.as_mut() {
            wg_conf.hide_secrets();
        }
    }

    fn sanitize_iface_specfic(
        &mut self,
        current: Option<&Self>,
    ) -> Result<(), NetstateError> {
        if let Some(wg_conf) = self.wireguard.as_mut() {
            wg_conf.sanitize(
                current.and_then(|c| c.wireguard.as_ref()),
                self.base.name.as_str(),
            )?;
        }
        Ok(())
    }

    fn pre_edit_cleanup_iface_specific(
        &mut self,
        _current: Option<&Self>,
    ) -> Result<(), NetstateError> {
        if self
            .wireguard
            .as_ref()
            .and_then(|w| w.private_key.as_ref())
            .is_none()
        {
            let e = NetstateError::new(
                ErrorKind::InvalidArgument,
                format!(
                    "Need private key for wireguard interface {}",
                    self.base.name
                ),
            );
            log::error!("{e}");
            return Err(e);
        }
        Ok(())
    }

    // Public key is derived from private key, and current never reports
    // the keys after hiding.
    fn state_for_verify_iface_specific(&mut self) {
        if let Some(wg_conf) = self.wireguard.as_mut() {
            wg_conf.public_key = None;
            wg_conf.private_key = None;
            for peer in wg_conf.peers.as_deref_mut().unwrap_or_default() {
                peer.preshared_key = None;
                peer.rx_bytes = None;
                peer.tx_bytes = None;
                peer.last_handshake = None;
            }
        }
    }
}

#[derive(
    Clone, PartialEq, Eq, Default, Serialize, Deserialize, DebugHideSecrets,
)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
#[non_exhaustive]
pub struct WireguardConfig {
    /// Only reported by current state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_key: Option<String>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        deserialize_with = "crate::deserializer::option_u16_or_string"
    )]
    pub listen_port: Option<u16>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        deserialize_with = "crate::deserializer::option_u32_or_string"
    )]
    pub fwmark: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peers: Option<Vec<WireguardPeerConfig>>,
}

impl WireguardConfig {
    pub(crate) fn hide_secrets(&mut self) {
        if self.private_key.is_some() {
            self.private_key =
                Some(NetworkState::HIDE_PASSWORD_STR.to_string());
        }
        for peer in self.peers.as_deref_mut().unwrap_or_default() {
            peer.hide_secrets();
        }
    }

    // * Remove query only properties.
    // * Treat hidden private key as not defined when current exists.
    // * Every peer needs endpoint.
    pub(crate) fn sanitize(
        &mut self,
        current: Option<&Self>,
        iface_name: &str,
    ) -> Result<(), NetstateError> {
        self.public_key = None;
        if current.is_some()
            && self.private_key.as_deref()
                == Some(NetworkState::HIDE_PASSWORD_STR)
        {
            self.private_key = None;
        }
        for peer in self.peers.as_deref_mut().unwrap_or_default() {
            if peer.endpoint.is_none() {
                let e = NetstateError::new(
                    ErrorKind::InvalidArgument,
                    format!(
                        "Missing mandatory property `endpoint` for \
                         wireguard peer {} of interface {iface_name}",
                        peer.public_key.as_deref().unwrap_or_default()
                    ),
                );
                log::error!("{e}");
                return Err(e);
            }
            peer.rx_bytes = None;
            peer.tx_bytes = None;
            peer.last_handshake = None;
            if peer.preshared_key.as_deref()
                == Some(NetworkState::HIDE_PASSWORD_STR)
            {
                peer.preshared_key = None;
            }
        }
        Ok(())
    }
}

#[derive(
    Clone, PartialEq, Eq, Default, Serialize, Deserialize, DebugHideSecrets,
)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
#[non_exhaustive]
pub struct WireguardPeerConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<SocketAddr>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preshared_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_handshake: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rx_bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_bytes: Option<u64>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        deserialize_with = "crate::deserializer::option_u16_or_string"
    )]
    pub persistent_keepalive: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_ips: Option<Vec<WireguardIpAddress>>,
}

impl WireguardPeerConfig {
    pub(crate) fn hide_secrets(&mut self) {
        if self.preshared_key.is_some() {
            self.preshared_key =
                Some(NetworkState::HIDE_PASSWORD_STR.to_string());
        }
    }
}

#[derive(
    Serialize, Deserialize, Debug, Eq, PartialEq, Clone, Copy, JsonDisplay,
)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct WireguardIpAddress {
    pub ip: IpAddr,
    #[serde(deserialize_with = "crate::deserializer::u8_or_string")]
    pub prefix_length: u8,
}
