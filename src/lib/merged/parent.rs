// SPDX-License-Identifier: Apache-2.0

use crate::{
    ErrorKind, Interface, InterfaceState, InterfaceType, MergedInterface,
    MergedInterfaces, NetstateError, NetstateInterface,
};

impl MergedInterfaces {
    pub(crate) fn get_parent(
        &self,
        child: &Interface,
    ) -> Option<&MergedInterface> {
        let parent_name = child.parent()?;
        if child.iface_type() == &InterfaceType::OvsInterface {
            self.user_ifaces
                .get(&(parent_name.to_string(), InterfaceType::OvsBridge))
        } else {
            self.kernel_ifaces.get(parent_name)
        }
    }

    pub(crate) fn validate_unknown_parents(
        &self,
    ) -> Result<(), NetstateError> {
        if self.gen_conf_mode {
            return Ok(());
        }
        for iface in self
            .iter()
            .filter(|i| i.is_desired() && i.merged.is_up())
            .map(|i| &i.merged)
        {
            let Some(parent_name) = iface.parent() else {
                continue;
            };
            if self.get_parent(iface).is_none() {
                let e = NetstateError::new(
                    ErrorKind::InvalidArgument,
                    format!(
                        "Interface {} is holding unknown parent \
                         {parent_name}",
                        iface.name()
                    ),
                );
                log::error!("{e}");
                return Err(e);
            }
        }
        Ok(())
    }

    // VLAN and VXLAN cannot use InfiniBand as parent. VLAN MTU should not
    // exceed its parent, the parent inherits child MTU if not defined.
    pub(crate) fn validate_child_over_parent(
        &mut self,
    ) -> Result<(), NetstateError> {
        let mut pending_mtu_changes: Vec<(String, u64)> = Vec::new();
        for iface in self
            .kernel_ifaces
            .values()
            .filter(|i| i.is_desired() && i.merged.is_up())
            .map(|i| &i.merged)
        {
            if !matches!(iface, Interface::Vlan(_) | Interface::Vxlan(_)) {
                continue;
            }
            let Some(parent) = self.get_parent(iface) else {
                continue;
            };
            if parent.merged.iface_type() == &InterfaceType::InfiniBand {
                let e = NetstateError::new(
                    ErrorKind::InvalidArgument,
                    format!(
                        "Interface {} of type {} cannot use InfiniBand \
                         interface {} as parent",
                        iface.name(),
                        iface.iface_type(),
                        parent.merged.name()
                    ),
                );
                log::error!("{e}");
                return Err(e);
            }
            if !matches!(iface, Interface::Vlan(_)) {
                continue;
            }
            let Some(mtu) = iface.base_iface().mtu else {
                continue;
            };
            match parent.merged.base_iface().mtu {
                Some(parent_mtu) if parent_mtu < mtu => {
                    let e = NetstateError::new(
                        ErrorKind::InvalidArgument,
                        format!(
                            "Interface {} desired MTU {mtu} is bigger than \
                             MTU {parent_mtu} of its parent {}",
                            iface.name(),
                            parent.merged.name()
                        ),
                    );
                    log::error!("{e}");
                    return Err(e);
                }
                None if parent.is_for_apply() => {
                    pending_mtu_changes
                        .push((parent.merged.name().to_string(), mtu));
                }
                _ => (),
            }
        }
        for (parent_name, mtu) in pending_mtu_changes {
            if let Some(parent) = self.kernel_ifaces.get_mut(&parent_name) {
                let base_iface = parent.merged.base_iface_mut();
                // Multiple children may request different MTU.
                if base_iface.mtu.is_none_or(|cur| cur < mtu) {
                    log::info!(
                        "Setting MTU {mtu} of interface {parent_name} \
                         based on its child"
                    );
                    base_iface.mtu = Some(mtu);
                }
            }
        }
        Ok(())
    }

    // Children follow the absent or down state of their parent unless
    // mentioned in desired state. Repeat till stable for nested children.
    pub(crate) fn apply_parent_state_to_children(
        &mut self,
    ) -> Result<(), NetstateError> {
        loop {
            let mut pending_changes: Vec<(String, InterfaceState)> =
                Vec::new();
            for iface in self.kernel_ifaces.values().filter(|i| {
                !i.merged.is_absent() && !i.merged.is_ignore()
            }) {
                let Some(parent) = self.get_parent(&iface.merged) else {
                    continue;
                };
                if !parent.is_desired() && !parent.is_changed() {
                    continue;
                }
                if parent.merged.is_absent() {
                    if iface.is_desired() && iface.merged.is_up() {
                        let e = NetstateError::new(
                            ErrorKind::InvalidArgument,
                            format!(
                                "Interface {} is desired as up but its \
                                 parent {} is marked as absent",
                                iface.merged.name(),
                                parent.merged.name()
                            ),
                        );
                        log::error!("{e}");
                        return Err(e);
                    }
                    pending_changes.push((
                        iface.merged.name().to_string(),
                        InterfaceState::Absent,
                    ));
                } else if parent.merged.is_down()
                    && !iface.is_desired()
                    && iface.merged.is_up()
                {
                    pending_changes.push((
                        iface.merged.name().to_string(),
                        InterfaceState::Down,
                    ));
                }
            }
            if pending_changes.is_empty() {
                return Ok(());
            }
            for (iface_name, state) in pending_changes {
                let Some(iface) = self.kernel_ifaces.get_mut(&iface_name)
                else {
                    continue;
                };
                if state == InterfaceState::Absent {
                    log::info!(
                        "Marking interface {iface_name} as absent as its \
                         parent is absent"
                    );
                    iface.mark_as_absent();
                } else {
                    log::info!(
                        "Marking interface {iface_name} as {state} as its \
                         parent is {state}"
                    );
                    iface.merged.base_iface_mut().state = state;
                    iface.mark_as_changed();
                }
                if !iface.is_desired() {
                    self.insert_order.push((
                        iface_name,
                        iface.merged.iface_type().clone(),
                    ));
                }
            }
        }
    }
}
