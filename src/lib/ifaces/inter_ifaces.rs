// SPDX-License-Identifier: Apache-2.0

// This file is based on the work of nmstate project(https://nmstate.io/) which
// is under license of Apache 2.0, authors of original file are:
//  * Gris Ge <fge@redhat.com>
//  * Fernando Fernandez Mancera <ffmancera@riseup.net>
//  * Ales Musil <amusil@redhat.com>
//  * Jan Vaclav <jvaclav@redhat.com>
//  * Dan Kenigsberg <danken@redhat.com>
//  * Enrique Llorente <ellorent@redhat.com>

use std::collections::HashMap;

use serde::{
    Deserialize, Deserializer, Serialize, Serializer, ser::SerializeSeq,
};

use crate::{
    ErrorKind, Interface, InterfaceType, JsonDisplayHideSecrets,
    NetstateError, NetstateInterface,
};

/// Represent a list of [Interface].
///
/// Kernel interfaces are indexed by name, user space interfaces (OVS bridge)
/// are indexed by name and type, hence OVS bridge can share the same name
/// with its OVS internal interface.
///
/// Deserializing a list holding the same interface twice will fail.
#[derive(Clone, Debug, Default, PartialEq, Eq, JsonDisplayHideSecrets)]
#[non_exhaustive]
pub struct Interfaces {
    /// Holding all interfaces with kernel representative. E.g. ethernet, bond.
    pub kernel_ifaces: HashMap<String, Interface>,
    /// Holding all interfaces which only exist in user space tool.
    /// For example: OVS bridge
    pub user_ifaces: HashMap<(String, InterfaceType), Interface>,
}

impl<'de> Deserialize<'de> for Interfaces {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let mut ret = Self::default();

        for iface in <Vec<Interface> as Deserialize>::deserialize(deserializer)?
        {
            ret.try_push(iface).map_err(serde::de::Error::custom)?;
        }
        Ok(ret)
    }
}

impl Serialize for Interfaces {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let ifaces = self.to_vec();
        let mut seq = serializer.serialize_seq(Some(ifaces.len()))?;
        for iface in ifaces {
            seq.serialize_element(iface)?;
        }
        seq.end()
    }
}

impl Interfaces {
    pub fn new(ifaces: Vec<Interface>) -> Self {
        let mut ret = Self::default();
        for iface in ifaces {
            ret.push(iface);
        }
        ret
    }

    pub fn is_empty(&self) -> bool {
        self.kernel_ifaces.is_empty() && self.user_ifaces.is_empty()
    }

    pub fn len(&self) -> usize {
        self.kernel_ifaces.len() + self.user_ifaces.len()
    }

    /// Extract internal interfaces to `Vec()` sorted by `up_priority` and
    /// then by name.
    pub fn to_vec(&self) -> Vec<&Interface> {
        let mut ifaces: Vec<&Interface> = self.iter().collect();
        ifaces.sort_unstable_by(|a, b| {
            (a.name(), a.iface_type()).cmp(&(b.name(), b.iface_type()))
        });
        // Stable sort to preserve the alphabet order within the same
        // priority.
        ifaces.sort_by_key(|iface| iface.base_iface().up_priority);
        ifaces
    }

    pub fn hide_secrets(&mut self) {
        for iface in self.iter_mut() {
            iface.hide_secrets();
        }
    }

    /// The iteration order is not sorted by `up_priority`
    pub fn iter(&self) -> impl Iterator<Item = &Interface> {
        self.kernel_ifaces.values().chain(self.user_ifaces.values())
    }

    /// The iteration order is not sorted by `up_priority`
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Interface> {
        self.kernel_ifaces
            .values_mut()
            .chain(self.user_ifaces.values_mut())
    }

    /// The iteration order is not sorted by `up_priority`
    pub fn drain(&mut self) -> impl Iterator<Item = Interface> {
        self.kernel_ifaces
            .drain()
            .map(|(_, iface)| iface)
            .chain(self.user_ifaces.drain().map(|(_, iface)| iface))
    }

    /// Search interface based on interface name and interface type.
    /// When iface_type is defined, we validate interface type also.
    /// Kernel interface is preferred when iface_type is undefined.
    pub fn get<'a>(
        &'a self,
        iface_name: &str,
        iface_type: Option<&InterfaceType>,
    ) -> Option<&'a Interface> {
        match iface_type {
            Some(t) if t.is_userspace() => {
                self.user_ifaces.get(&(iface_name.to_string(), t.clone()))
            }
            Some(t) => self
                .kernel_ifaces
                .get(iface_name)
                .filter(|i| i.iface_type() == t),
            None => self.kernel_ifaces.get(iface_name).or_else(|| {
                self.user_ifaces
                    .values()
                    .find(|i| i.name() == iface_name)
            }),
        }
    }

    pub fn get_mut<'a>(
        &'a mut self,
        iface_name: &str,
        iface_type: Option<&InterfaceType>,
    ) -> Option<&'a mut Interface> {
        match iface_type {
            Some(t) if t.is_userspace() => self
                .user_ifaces
                .get_mut(&(iface_name.to_string(), t.clone())),
            Some(t) => self
                .kernel_ifaces
                .get_mut(iface_name)
                .filter(|i| i.iface_type() == t),
            None => {
                if self.kernel_ifaces.contains_key(iface_name) {
                    self.kernel_ifaces.get_mut(iface_name)
                } else {
                    self.user_ifaces
                        .values_mut()
                        .find(|i| i.name() == iface_name)
                }
            }
        }
    }

    /// Append specified [Interface], replacing existing one holding the
    /// same identity. Veth is stored as ethernet.
    pub fn push(&mut self, mut iface: Interface) {
        if iface.iface_type() == &InterfaceType::Veth {
            iface.base_iface_mut().iface_type = InterfaceType::Ethernet;
        }
        if iface.is_userspace() {
            self.user_ifaces.insert(
                (iface.name().to_string(), iface.iface_type().clone()),
                iface,
            );
        } else {
            self.kernel_ifaces.insert(iface.name().to_string(), iface);
        }
    }

    /// Append specified [Interface], fail if interface with the same
    /// identity already exists.
    pub fn try_push(&mut self, iface: Interface) -> Result<(), NetstateError> {
        let exists = if iface.is_userspace() {
            self.user_ifaces.contains_key(&(
                iface.name().to_string(),
                iface.iface_type().clone(),
            ))
        } else {
            self.kernel_ifaces.contains_key(iface.name())
        };
        if exists {
            return Err(NetstateError::new(
                ErrorKind::InvalidArgument,
                format!(
                    "Duplicate interface {}/{} found",
                    iface.name(),
                    iface.iface_type()
                ),
            ));
        }
        self.push(iface);
        Ok(())
    }

    /// Remove interface based on interface name and interface type.
    /// When iface_type is defined, we validate interface type also.
    /// If iface_type is undefined, only search kernel interfaces
    pub fn remove(
        &mut self,
        iface_name: &str,
        iface_type: Option<&InterfaceType>,
    ) -> Option<Interface> {
        if let Some(iface_type) = iface_type {
            if iface_type.is_userspace() {
                self.user_ifaces
                    .remove(&(iface_name.to_string(), iface_type.clone()))
            } else if let Some(iface) = self.kernel_ifaces.get(iface_name) {
                if iface.iface_type() == iface_type {
                    self.kernel_ifaces.remove(iface_name)
                } else {
                    log::debug!(
                        "Interfaces::remove(): found interface {iface_name} \
                         holding {}, not requested {iface_type}",
                        iface.iface_type()
                    );
                    None
                }
            } else {
                None
            }
        } else {
            self.kernel_ifaces.remove(iface_name)
        }
    }
}
