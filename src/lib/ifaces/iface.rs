// SPDX-License-Identifier: Apache-2.0

// This file is based on the work of nmstate project(https://nmstate.io/) which
// is under license of Apache 2.0, authors of original file is:
//  * Gris Ge <fge@redhat.com>
//  * Fernando Fernandez Mancera <ffmancera@riseup.net>
//  * Ales Musil <amusil@redhat.com>
//  * Quique Llorente <ellorent@redhat.com>
//  * Wen Liang <liangwen12year@gmail.com>
//  * Íñigo Huguet <ihuguet@redhat.com>

use serde::{Deserialize, Deserializer, Serialize};

use crate::{
    BaseInterface, BondInterface, DummyInterface, ErrorKind, EthernetInterface,
    InfiniBandInterface, InterfaceState, InterfaceType,
    JsonDisplayHideSecrets, LinuxBridgeInterface, MacVlanInterface,
    MacVtapInterface, NetstateError, NetstateInterface, OvsBridgeInterface,
    OvsInterface, TeamInterface, UnknownInterface, VlanInterface,
    VrfInterface, VxlanInterface, WireguardInterface,
    value::get_json_value_difference,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonDisplayHideSecrets)]
#[serde(rename_all = "kebab-case", untagged)]
#[non_exhaustive]
/// Represent a kernel or user space network interface.
pub enum Interface {
    /// Ethernet interface, veth included.
    Ethernet(Box<EthernetInterface>),
    /// Bond interface
    Bond(Box<BondInterface>),
    /// Linux Bridge Interface
    LinuxBridge(Box<LinuxBridgeInterface>),
    /// OVS Bridge
    OvsBridge(Box<OvsBridgeInterface>),
    /// OVS System Interface
    OvsInterface(Box<OvsInterface>),
    /// VLAN Interface
    Vlan(Box<VlanInterface>),
    /// VXLAN Interface
    Vxlan(Box<VxlanInterface>),
    /// MAC VLAN Interface
    MacVlan(Box<MacVlanInterface>),
    /// MAC VTAP Interface
    MacVtap(Box<MacVtapInterface>),
    /// Virtual Routing and Forwarding Interface
    Vrf(Box<VrfInterface>),
    /// IP over InfiniBand Interface
    InfiniBand(Box<InfiniBandInterface>),
    /// Team Interface
    Team(Box<TeamInterface>),
    /// Dummy Interface
    Dummy(Box<DummyInterface>),
    /// WireGuard Interface
    Wireguard(Box<WireguardInterface>),
    /// Unknown interface.
    Unknown(Box<UnknownInterface>),
}

impl Default for Interface {
    fn default() -> Self {
        Self::Unknown(Box::default())
    }
}

impl<'de> Deserialize<'de> for Interface {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let mut v = serde_json::Value::deserialize(deserializer)?;

        // It is safe to do `v["state"]` here as serde_json will
        // return `json!(null)` for undefined property
        if matches!(
            Option::deserialize(&v["state"])
                .map_err(serde::de::Error::custom)?,
            Some(InterfaceState::Absent)
        ) {
            // Ignore all properties except type if state: absent
            let mut new_value = serde_json::map::Map::new();
            for key in ["name", "type", "state"] {
                if let Some(n) = v.get(key) {
                    new_value.insert(key.to_string(), n.clone());
                }
            }
            v = serde_json::value::Value::Object(new_value);
        }

        macro_rules! parse_as {
            ($variant:path, $iface_type:ty) => {
                <$iface_type>::deserialize(v)
                    .map(|i| $variant(Box::new(i)))
                    .map_err(serde::de::Error::custom)
            };
        }

        match Option::deserialize(&v["type"])
            .map_err(serde::de::Error::custom)?
        {
            Some(InterfaceType::Ethernet) | Some(InterfaceType::Veth) => {
                parse_as!(Interface::Ethernet, EthernetInterface)
            }
            Some(InterfaceType::Bond) => {
                parse_as!(Interface::Bond, BondInterface)
            }
            Some(InterfaceType::LinuxBridge) => {
                parse_as!(Interface::LinuxBridge, LinuxBridgeInterface)
            }
            Some(InterfaceType::OvsBridge) => {
                parse_as!(Interface::OvsBridge, OvsBridgeInterface)
            }
            Some(InterfaceType::OvsInterface) => {
                parse_as!(Interface::OvsInterface, OvsInterface)
            }
            Some(InterfaceType::Vlan) => {
                parse_as!(Interface::Vlan, VlanInterface)
            }
            Some(InterfaceType::Vxlan) => {
                parse_as!(Interface::Vxlan, VxlanInterface)
            }
            Some(InterfaceType::MacVlan) => {
                parse_as!(Interface::MacVlan, MacVlanInterface)
            }
            Some(InterfaceType::MacVtap) => {
                parse_as!(Interface::MacVtap, MacVtapInterface)
            }
            Some(InterfaceType::Vrf) => {
                parse_as!(Interface::Vrf, VrfInterface)
            }
            Some(InterfaceType::InfiniBand) => {
                parse_as!(Interface::InfiniBand, InfiniBandInterface)
            }
            Some(InterfaceType::Team) => {
                parse_as!(Interface::Team, TeamInterface)
            }
            Some(InterfaceType::Dummy) => {
                parse_as!(Interface::Dummy, DummyInterface)
            }
            Some(InterfaceType::Wireguard) => {
                parse_as!(Interface::Wireguard, WireguardInterface)
            }
            _ => parse_as!(Interface::Unknown, UnknownInterface),
        }
    }
}

macro_rules! gen_sanitize_iface_specfic {
    ( $desired:ident, $current:ident, $func:ident, $($variant:path,)+ ) => {
        match $desired {
            $(
                $variant(i) => {
                    let cur_iface = if let Some($variant(c)) = $current {
                        Some(c)
                    } else {
                        if let Some(current) = $current {
                            return Err(NetstateError::new(
                                ErrorKind::Bug,
                                format!(
                                    "current interface is not holding the \
                                    same interface type as desired, current \
                                    {}, desired {}",
                                    current.iface_type(),
                                    i.iface_type(),
                                ),
                            ));
                        }
                        None
                    };
                    i.$func(cur_iface.map(|v| &**v))
                }
            )+
        }
    };
}

macro_rules! gen_sanitize_before_verify_iface_specfic {
    ( $desired:ident, $current:ident, $($variant:path,)+ ) => {
        match $desired {
            $(
                $variant(i) => {
                    if let $variant(cur_iface) = $current {
                        i.sanitize_before_verify_iface_specfic(cur_iface);
                    };
                }
            )+
        }
    };
}

macro_rules! gen_post_merge_iface_specific {
    ( $merged:ident, $desired:ident, $current:ident, $($variant:path,)+ ) => {
        match ($merged, $desired, $current) {
            $(
                ($variant(i), $variant(d), $variant(c)) => {
                    i.post_merge_iface_specific(d, c)
                }
            )+
            (merged, desired, current) => {
                Err(NetstateError::new(
                    ErrorKind::Bug,
                    format!(
                        "Interface::post_merge_iface_specific() unexpected \
                         input merged {merged:?} desired {desired:?} \
                         current {current:?}"
                    ),
                ))
            }
        }
    };
}

macro_rules! gen_iface_no_arg {
    ( $self:ident, $func:ident, $($variant:path,)+ ) => {
        match $self {
            $(
                $variant(i) => i.$func(),
            )+
        }
    };
}

macro_rules! gen_iface_trait_impl {
    ( $(($func:ident, $return:ty),)+ ) => {
        $(
            fn $func(&self) -> $return {
                gen_iface_no_arg!(
                    self,
                    $func,
                    Self::Ethernet,
                    Self::Bond,
                    Self::LinuxBridge,
                    Self::OvsBridge,
                    Self::OvsInterface,
                    Self::Vlan,
                    Self::Vxlan,
                    Self::MacVlan,
                    Self::MacVtap,
                    Self::Vrf,
                    Self::InfiniBand,
                    Self::Team,
                    Self::Dummy,
                    Self::Wireguard,
                    Self::Unknown,
                )
            }
        )+
    }
}

macro_rules! gen_iface_trait_impl_mut {
    ( $(($func:ident, $return:ty),)+ ) => {
        $(
            fn $func(&mut self) -> $return {
                gen_iface_no_arg!(
                    self,
                    $func,
                    Self::Ethernet,
                    Self::Bond,
                    Self::LinuxBridge,
                    Self::OvsBridge,
                    Self::OvsInterface,
                    Self::Vlan,
                    Self::Vxlan,
                    Self::MacVlan,
                    Self::MacVtap,
                    Self::Vrf,
                    Self::InfiniBand,
                    Self::Team,
                    Self::Dummy,
                    Self::Wireguard,
                    Self::Unknown,
                )
            }
        )+
    }
}

impl NetstateInterface for Interface {
    gen_iface_trait_impl!(
        (is_virtual, bool),
        (is_controller, bool),
        (base_iface, &BaseInterface),
        (ports, Option<Vec<&str>>),
        (parent, Option<&str>),
        (need_parent, bool),
        (can_have_ip_as_port, bool),
    );

    gen_iface_trait_impl_mut!(
        (base_iface_mut, &mut BaseInterface),
        (hide_secrets_iface_specific, ()),
        (state_for_verify_iface_specific, ()),
        (sort_ports, ()),
    );

    fn sanitize_iface_specfic(
        &mut self,
        current: Option<&Self>,
    ) -> Result<(), NetstateError> {
        gen_sanitize_iface_specfic!(
            self,
            current,
            sanitize_iface_specfic,
            Interface::Ethernet,
            Interface::Bond,
            Interface::LinuxBridge,
            Interface::OvsBridge,
            Interface::OvsInterface,
            Interface::Vlan,
            Interface::Vxlan,
            Interface::MacVlan,
            Interface::MacVtap,
            Interface::Vrf,
            Interface::InfiniBand,
            Interface::Team,
            Interface::Dummy,
            Interface::Wireguard,
            Interface::Unknown,
        )
    }

    fn pre_edit_cleanup_iface_specific(
        &mut self,
        current: Option<&Self>,
    ) -> Result<(), NetstateError> {
        gen_sanitize_iface_specfic!(
            self,
            current,
            pre_edit_cleanup_iface_specific,
            Interface::Ethernet,
            Interface::Bond,
            Interface::LinuxBridge,
            Interface::OvsBridge,
            Interface::OvsInterface,
            Interface::Vlan,
            Interface::Vxlan,
            Interface::MacVlan,
            Interface::MacVtap,
            Interface::Vrf,
            Interface::InfiniBand,
            Interface::Team,
            Interface::Dummy,
            Interface::Wireguard,
            Interface::Unknown,
        )
    }

    fn sanitize_before_verify_iface_specfic(&mut self, current: &mut Self) {
        gen_sanitize_before_verify_iface_specfic!(
            self,
            current,
            Interface::Ethernet,
            Interface::Bond,
            Interface::LinuxBridge,
            Interface::OvsBridge,
            Interface::OvsInterface,
            Interface::Vlan,
            Interface::Vxlan,
            Interface::MacVlan,
            Interface::MacVtap,
            Interface::Vrf,
            Interface::InfiniBand,
            Interface::Team,
            Interface::Dummy,
            Interface::Wireguard,
            Interface::Unknown,
        );
    }

    fn post_merge_iface_specific(
        &mut self,
        desired: &Self,
        current: &Self,
    ) -> Result<(), NetstateError> {
        gen_post_merge_iface_specific!(
            self,
            desired,
            current,
            Interface::Ethernet,
            Interface::Bond,
            Interface::LinuxBridge,
            Interface::OvsBridge,
            Interface::OvsInterface,
            Interface::Vlan,
            Interface::Vxlan,
            Interface::MacVlan,
            Interface::MacVtap,
            Interface::Vrf,
            Interface::InfiniBand,
            Interface::Team,
            Interface::Dummy,
            Interface::Wireguard,
            Interface::Unknown,
        )
    }

    fn remove_port(&mut self, port_name: &str) -> Result<(), NetstateError> {
        match self {
            Self::Bond(i) => i.remove_port(port_name),
            Self::LinuxBridge(i) => i.remove_port(port_name),
            Self::OvsBridge(i) => i.remove_port(port_name),
            Self::Vrf(i) => i.remove_port(port_name),
            Self::Team(i) => i.remove_port(port_name),
            _ => Err(NetstateError::new(
                ErrorKind::Bug,
                format!(
                    "Cannot remove port {port_name} from interface {} of \
                     type {} which cannot hold ports",
                    self.name(),
                    self.iface_type()
                ),
            )),
        }
    }
}

impl From<BaseInterface> for Interface {
    fn from(base_iface: BaseInterface) -> Self {
        let mut iface = match &base_iface.iface_type {
            InterfaceType::Ethernet | InterfaceType::Veth => {
                Interface::Ethernet(Default::default())
            }
            InterfaceType::Bond => Interface::Bond(Default::default()),
            InterfaceType::LinuxBridge => {
                Interface::LinuxBridge(Default::default())
            }
            InterfaceType::OvsBridge => {
                Interface::OvsBridge(Default::default())
            }
            InterfaceType::OvsInterface => {
                Interface::OvsInterface(Default::default())
            }
            InterfaceType::Vlan => Interface::Vlan(Default::default()),
            InterfaceType::Vxlan => Interface::Vxlan(Default::default()),
            InterfaceType::MacVlan => Interface::MacVlan(Default::default()),
            InterfaceType::MacVtap => Interface::MacVtap(Default::default()),
            InterfaceType::Vrf => Interface::Vrf(Default::default()),
            InterfaceType::InfiniBand => {
                Interface::InfiniBand(Default::default())
            }
            InterfaceType::Team => Interface::Team(Default::default()),
            InterfaceType::Dummy => Interface::Dummy(Default::default()),
            InterfaceType::Wireguard => {
                Interface::Wireguard(Default::default())
            }
            InterfaceType::Unknown(_) => Interface::Unknown(Default::default()),
        };
        *iface.base_iface_mut() = base_iface;
        iface
    }
}

impl Interface {
    pub(crate) fn clone_name_type_only(&self) -> Self {
        self.base_iface().clone_name_type_only().into()
    }

    /// Rebuild the interface as specified type, used when desired state has
    /// no interface type defined.
    pub(crate) fn with_iface_type(
        &self,
        iface_type: &InterfaceType,
    ) -> Result<Self, NetstateError> {
        let mut value = serde_json::to_value(self)?;
        if let Some(obj) = value.as_object_mut() {
            obj.insert("type".to_string(), serde_json::to_value(iface_type)?);
        }
        Ok(Self::deserialize(value)?)
    }

    pub(crate) fn verify(&self, current: &Self) -> Result<(), NetstateError> {
        let mut self_value = serde_json::to_value(self.clone())?;
        let current_value = serde_json::to_value(current.clone())?;
        let reference_prefix = format!("{}.interface", self.name());

        let rounded = if let Self::LinuxBridge(_) = self {
            LinuxBridgeInterface::accept_integer_rounded(
                reference_prefix.as_str(),
                &mut self_value,
                &current_value,
            )
        } else {
            None
        };

        let Some((reference, desire, cur)) = get_json_value_difference(
            reference_prefix,
            &self_value,
            &current_value,
        ) else {
            if let Some((reference, desire, cur)) = rounded {
                return Err(NetstateError::new(
                    ErrorKind::KernelIntegerRoundedError,
                    format!(
                        "Linux kernel configured with value {cur} for \
                         {reference} while desired {desire}, please amend \
                         the desired state to use the kernel rounded value"
                    ),
                ));
            }
            return Ok(());
        };

        if let (Self::Bond(des_bond), Self::Bond(cur_bond)) = (self, current)
        {
            let des_value =
                serde_json::to_value(des_bond.clone_without_options())?;
            let cur_value =
                serde_json::to_value(cur_bond.clone_without_options())?;
            if get_json_value_difference(
                format!("{}.interface", self.name()),
                &des_value,
                &cur_value,
            )
            .is_none()
            {
                log::warn!(
                    "Bond {} option {reference} desire '{desire}', current \
                     '{cur}', ignoring as bond options might be changed by \
                     kernel",
                    self.name()
                );
                return Ok(());
            }
        }

        Err(NetstateError::new(
            ErrorKind::VerificationError,
            format!(
                "Verification failure: {reference} desire '{desire}', \
                 current '{cur}'"
            ),
        ))
    }
}
