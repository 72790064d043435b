// SPDX-License-Identifier: Apache-2.0

// This file is based on the work of nmstate project(https://nmstate.io/) which
// is under license of Apache 2.0, authors of original file are:
//  * Gris Ge <fge@redhat.com>

use serde::{Deserialize, Serialize};

use crate::{BaseInterface, ErrorKind, NetstateError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
#[non_exhaustive]
pub struct MptcpConfig {
    /// MPTCP flags assigned to all valid IP addresses of this interface
    /// including both static and dynamic ones.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_flags: Option<Vec<MptcpAddressFlag>>,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "kebab-case")]
#[non_exhaustive]
pub enum MptcpAddressFlag {
    /// Announce this endpoint to peer via ADD_ADDR sub-option.
    /// Cannot be used along with [MptcpAddressFlag::Fullmesh].
    Signal,
    /// Create additional subflow using this endpoint as source address.
    Subflow,
    /// Subflow created using this endpoint has the backup flag set.
    Backup,
    /// Create additional subflow to each known peer address.
    Fullmesh,
}

impl BaseInterface {
    pub(crate) fn validate_mptcp(&self) -> Result<(), NetstateError> {
        let mut iface_flags = self
            .mptcp
            .as_ref()
            .and_then(|m| m.address_flags.clone())
            .unwrap_or_default();
        if iface_flags.contains(&MptcpAddressFlag::Signal)
            && iface_flags.contains(&MptcpAddressFlag::Fullmesh)
        {
            return Err(NetstateError::new(
                ErrorKind::InvalidArgument,
                format!(
                    "MPTCP flags of interface {} mustn't have both signal \
                     and fullmesh",
                    self.name
                ),
            ));
        }
        iface_flags.sort_unstable();

        let addrs = self
            .ipv4
            .as_ref()
            .map(|i| i.addresses())
            .unwrap_or_default()
            .iter()
            .chain(
                self.ipv6
                    .as_ref()
                    .map(|i| i.addresses())
                    .unwrap_or_default()
                    .iter(),
            );
        for addr in addrs {
            if let Some(mut addr_flags) = addr.mptcp_flags.clone() {
                addr_flags.sort_unstable();
                if addr_flags != iface_flags {
                    log::warn!(
                        "Ignoring MPTCP flags {addr_flags:?} of IP address \
                         {addr} as it is different from interface level \
                         MPTCP flags {iface_flags:?}"
                    );
                }
            }
        }
        Ok(())
    }

    pub(crate) fn remove_per_addr_mptcp_flags(&mut self) {
        if let Some(addrs) =
            self.ipv4.as_mut().and_then(|i| i.addresses.as_mut())
        {
            addrs.iter_mut().for_each(|a| a.mptcp_flags = None);
        }
        if let Some(addrs) =
            self.ipv6.as_mut().and_then(|i| i.addresses.as_mut())
        {
            addrs.iter_mut().for_each(|a| a.mptcp_flags = None);
        }
    }
}
