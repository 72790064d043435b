// SPDX-License-Identifier: Apache-2.0

// This file is based on the work of nmstate project(https://nmstate.io/) which
// is under license of Apache 2.0, authors of original file are:
//  * Gris Ge <fge@redhat.com>
//  * Fernando Fernandez Mancera <ffmancera@riseup.net>

use std::collections::{HashMap, HashSet};

use crate::{
    BondMode, ErrorKind, Interface, InterfaceState, InterfaceType,
    MergedInterface, MergedInterfaces, NetstateError, NetstateInterface,
};

fn is_port_overbook(
    port_to_ctrl: &mut HashMap<String, String>,
    port: &str,
    ctrl: &str,
) -> Result<(), NetstateError> {
    if let Some(cur_ctrl) = port_to_ctrl.get(port) {
        let e = NetstateError::new(
            ErrorKind::InvalidArgument,
            format!(
                "Port {port} is overbooked by two controller: {ctrl}, \
                 {cur_ctrl}"
            ),
        );
        log::error!("{e}");
        return Err(e);
    }
    port_to_ctrl.insert(port.to_string(), ctrl.to_string());
    Ok(())
}

impl MergedInterface {
    /// Return `(attached_ports, detached_ports)` compared to current.
    /// None means port list is not desired.
    pub(crate) fn get_changed_ports(&self) -> Option<(Vec<&str>, Vec<&str>)> {
        let desired = self.desired.as_ref()?;
        let des_ports: HashSet<&str> = if self.merged.is_absent() {
            HashSet::new()
        } else {
            desired.ports()?.into_iter().collect()
        };
        let cur_ports: HashSet<&str> = self
            .current
            .as_ref()
            .and_then(|c| c.ports())
            .map(|p| p.into_iter().collect())
            .unwrap_or_default();

        let mut attached: Vec<&str> =
            des_ports.difference(&cur_ports).copied().collect();
        let mut detached: Vec<&str> =
            cur_ports.difference(&des_ports).copied().collect();
        attached.sort_unstable();
        detached.sort_unstable();
        Some((attached, detached))
    }
}

impl MergedInterfaces {
    /// Search controller by name, OVS bridge is searched first when
    /// controller type is undefined.
    pub(crate) fn get_controller(
        &self,
        ctrl_name: &str,
        ctrl_type: Option<&InterfaceType>,
    ) -> Option<&MergedInterface> {
        match ctrl_type {
            Some(t) => self.get_iface(ctrl_name, t),
            None => self
                .user_ifaces
                .get(&(ctrl_name.to_string(), InterfaceType::OvsBridge))
                .or_else(|| self.kernel_ifaces.get(ctrl_name)),
        }
        .filter(|i| i.merged.is_controller())
    }

    // Every port of desired up controller should exist.
    pub(crate) fn validate_unknown_ports(
        &mut self,
    ) -> Result<(), NetstateError> {
        let mut missing_ports: Vec<(String, String)> = Vec::new();
        for iface in self.iter().filter(|i| {
            i.is_desired() && i.merged.is_up() && i.merged.is_controller()
        }) {
            for port_name in iface.merged.ports().unwrap_or_default() {
                match self.kernel_ifaces.get(port_name) {
                    Some(port_iface) => {
                        if port_iface.is_desired()
                            && port_iface.merged.is_absent()
                        {
                            let e = NetstateError::new(
                                ErrorKind::InvalidArgument,
                                format!(
                                    "Interface {port_name} is marked as \
                                     absent but listed as port of \
                                     controller {}",
                                    iface.merged.name()
                                ),
                            );
                            log::error!("{e}");
                            return Err(e);
                        }
                    }
                    None => missing_ports.push((
                        iface.merged.name().to_string(),
                        port_name.to_string(),
                    )),
                }
            }
        }
        for (ctrl_name, port_name) in missing_ports {
            if self.gen_conf_mode {
                log::debug!(
                    "Treating unknown port {port_name} of controller \
                     {ctrl_name} as ethernet"
                );
                let mut merged_iface = MergedInterface::new(
                    Some(Interface::from(crate::BaseInterface::new(
                        port_name.clone(),
                        InterfaceType::Ethernet,
                    ))),
                    None,
                )?;
                merged_iface.mark_as_changed();
                self.insert_order
                    .push((port_name, InterfaceType::Ethernet));
                self.insert(merged_iface);
            } else {
                let e = NetstateError::new(
                    ErrorKind::InvalidArgument,
                    format!(
                        "Controller interface {ctrl_name} is holding unknown \
                         port {port_name}"
                    ),
                );
                log::error!("{e}");
                return Err(e);
            }
        }
        Ok(())
    }

    // IP over InfiniBand can only be port of active-backup bond as it is a
    // layer 3 interface.
    pub(crate) fn check_infiniband_as_ports(
        &self,
    ) -> Result<(), NetstateError> {
        let ib_iface_names: HashSet<&str> = self
            .kernel_ifaces
            .values()
            .filter(|i| i.merged.iface_type() == &InterfaceType::InfiniBand)
            .map(|i| i.merged.name())
            .collect();
        if ib_iface_names.is_empty() {
            return Ok(());
        }

        for iface in self
            .iter()
            .filter(|i| i.is_desired() && i.merged.is_controller())
            .map(|i| &i.merged)
        {
            let ports: HashSet<&str> =
                iface.ports().unwrap_or_default().into_iter().collect();
            let mut ib_ports: Vec<&str> =
                ib_iface_names.intersection(&ports).copied().collect();
            if ib_ports.is_empty() {
                continue;
            }
            if let Interface::Bond(bond_iface) = iface
                && bond_iface.mode() == Some(BondMode::ActiveBackup)
            {
                continue;
            }
            ib_ports.sort_unstable();
            let e = NetstateError::new(
                ErrorKind::InvalidArgument,
                format!(
                    "InfiniBand interface {} cannot be used as port of {} \
                     {}, only active-backup bond is allowed",
                    ib_ports.join(", "),
                    iface.iface_type(),
                    iface.name()
                ),
            );
            log::error!("{e}");
            return Err(e);
        }
        Ok(())
    }

    // The `copy-mac-from` should point to a port of this controller, the
    // permanent MAC address of the port is preferred.
    pub(crate) fn apply_copy_mac_from(&mut self) -> Result<(), NetstateError> {
        let mut pending_changes: Vec<(String, InterfaceType, String)> =
            Vec::new();
        for iface in self.iter().filter(|i| i.is_desired() && i.merged.is_up())
        {
            let Some(port_name) =
                iface.merged.base_iface().copy_mac_from.as_deref()
            else {
                continue;
            };
            if !iface.merged.ports().unwrap_or_default().contains(&port_name)
            {
                let e = NetstateError::new(
                    ErrorKind::InvalidArgument,
                    format!(
                        "The interface {} is holding copy-mac-from {port_name} \
                         which is not its port",
                        iface.merged.name()
                    ),
                );
                log::error!("{e}");
                return Err(e);
            }
            let mac = self.kernel_ifaces.get(port_name).and_then(|port| {
                let base_iface = port
                    .current
                    .as_ref()
                    .unwrap_or(&port.merged)
                    .base_iface();
                base_iface
                    .permanent_mac_address
                    .as_ref()
                    .or(base_iface.mac_address.as_ref())
                    .filter(|m| !m.is_empty())
            });
            match mac {
                Some(mac) => pending_changes.push((
                    iface.merged.name().to_string(),
                    iface.merged.iface_type().clone(),
                    mac.to_string(),
                )),
                None => {
                    let e = NetstateError::new(
                        ErrorKind::InvalidArgument,
                        format!(
                            "Failed to find MAC address of port {port_name} \
                             for copy-mac-from of interface {}",
                            iface.merged.name()
                        ),
                    );
                    log::error!("{e}");
                    return Err(e);
                }
            }
        }
        for (iface_name, iface_type, mac) in pending_changes {
            if let Some(iface) = self.get_iface_mut(&iface_name, &iface_type) {
                log::debug!(
                    "Using MAC address {mac} for interface {iface_name} \
                     based on copy-mac-from"
                );
                iface.merged.base_iface_mut().mac_address = Some(mac);
            }
        }
        Ok(())
    }

    // Check whether user defined both controller property and port list of
    // controller interface, examples of invalid desire state:
    //  * eth1 has controller: br1, but br1 has no eth1 in port list
    //  * eth2 has controller: br1, but br2 has eth2 in port list
    //  * eth1 has controller: "" (detach), but br1 has eth1 in port list
    pub(crate) fn validate_controller_and_port_list_confliction(
        &self,
    ) -> Result<(), NetstateError> {
        self.validate_controller_not_in_port_list()?;
        self.validate_controller_in_other_port_list()
    }

    fn validate_controller_not_in_port_list(
        &self,
    ) -> Result<(), NetstateError> {
        for iface in self
            .kernel_ifaces
            .values()
            .filter(|i| i.is_desired() && i.merged.is_up())
        {
            let Some(des_ctrl_name) = iface
                .desired
                .as_ref()
                .and_then(|i| i.base_iface().controller.as_deref())
            else {
                continue;
            };
            // Detaching from current controller
            if des_ctrl_name.is_empty() {
                continue;
            }
            let des_ctrl_type = iface
                .desired
                .as_ref()
                .and_then(|i| i.base_iface().controller_type.as_ref());

            let Some(ctrl_iface) =
                self.get_controller(des_ctrl_name, des_ctrl_type)
            else {
                let e = NetstateError::new(
                    ErrorKind::InvalidArgument,
                    format!(
                        "Interface {} desired controller {des_ctrl_name} \
                         not found",
                        iface.merged.name()
                    ),
                );
                log::error!("{e}");
                return Err(e);
            };
            // controller iface not mentioned in desire state
            if !ctrl_iface.is_desired() {
                continue;
            }
            if let Some(ports) =
                ctrl_iface.desired.as_ref().and_then(|i| i.ports())
                && !ports.contains(&iface.merged.name())
            {
                let e = NetstateError::new(
                    ErrorKind::InvalidArgument,
                    format!(
                        "Interface {} has controller {des_ctrl_name} but not \
                         listed in port list of controller interface",
                        iface.merged.name(),
                    ),
                );
                log::error!("{e}");
                return Err(e);
            }
        }
        Ok(())
    }

    fn validate_controller_in_other_port_list(
        &self,
    ) -> Result<(), NetstateError> {
        let mut port_to_ctrl: HashMap<&str, &str> = HashMap::new();
        for iface in self.iter().filter(|i| i.is_desired() && i.merged.is_up())
        {
            if let Some(port_names) =
                iface.desired.as_ref().and_then(|i| i.ports())
            {
                for port_name in port_names {
                    port_to_ctrl.insert(port_name, iface.merged.name());
                }
            }
        }
        for iface in self
            .kernel_ifaces
            .values()
            .filter(|i| i.is_desired() && i.merged.is_up())
        {
            let Some(des_ctrl_name) = iface
                .desired
                .as_ref()
                .and_then(|i| i.base_iface().controller.as_deref())
            else {
                continue;
            };
            let Some(ctrl_name) = port_to_ctrl.get(iface.merged.name()) else {
                continue;
            };
            if des_ctrl_name == *ctrl_name {
                continue;
            }
            let e = if des_ctrl_name.is_empty() {
                NetstateError::new(
                    ErrorKind::InvalidArgument,
                    format!(
                        "Interface {} desired to detach controller via \
                         controller property set to '', but still been \
                         listed as port of controller {ctrl_name}",
                        iface.merged.name(),
                    ),
                )
            } else {
                NetstateError::new(
                    ErrorKind::InvalidArgument,
                    format!(
                        "Interface {} has controller property set to \
                         {des_ctrl_name}, but been listed as port of \
                         controller {ctrl_name}",
                        iface.merged.name(),
                    ),
                )
            };
            log::error!("{e}");
            return Err(e);
        }
        Ok(())
    }

    // Attach or detach ports when port list of desired controller differs
    // from current. Ports with changed port configuration are marked as
    // changed.
    pub(crate) fn handle_changed_ports(&mut self) -> Result<(), NetstateError> {
        // port name -> (controller name, controller type, controller is up)
        let mut pending_changes: HashMap<
            String,
            (String, Option<InterfaceType>, bool),
        > = HashMap::new();
        let mut config_changed_ports: Vec<String> = Vec::new();

        for iface in self
            .iter()
            .filter(|i| i.is_desired() && i.merged.is_controller())
        {
            let Some((attached_ports, detached_ports)) =
                iface.get_changed_ports()
            else {
                continue;
            };
            for port_name in attached_ports {
                pending_changes.insert(
                    port_name.to_string(),
                    (
                        iface.merged.name().to_string(),
                        Some(iface.merged.iface_type().clone()),
                        iface.merged.is_up(),
                    ),
                );
            }
            for port_name in detached_ports {
                // Port might move from one controller to another, do not
                // override the attach action.
                pending_changes
                    .entry(port_name.to_string())
                    .or_insert_with(|| (String::new(), None, false));
            }
            if let (
                Interface::LinuxBridge(br_iface),
                Some(Interface::LinuxBridge(cur_br_iface)),
            ) = (&iface.merged, iface.current.as_ref())
            {
                config_changed_ports.extend(
                    br_iface
                        .config_changed_ports(cur_br_iface)
                        .into_iter()
                        .map(|p| p.to_string()),
                );
            }
        }

        let mut pending_changes: Vec<(
            String,
            (String, Option<InterfaceType>, bool),
        )> = pending_changes.into_iter().collect();
        pending_changes.sort_unstable_by(|a, b| a.0.cmp(&b.0));

        // (old controller name, old controller type, port name)
        let mut old_ctrl_changes: Vec<(String, Option<InterfaceType>, String)> =
            Vec::new();

        for (port_name, (ctrl_name, ctrl_type, ctrl_is_up)) in pending_changes
        {
            let Some(port_iface) = self.kernel_ifaces.get_mut(&port_name)
            else {
                if !ctrl_name.is_empty() {
                    let e = NetstateError::new(
                        ErrorKind::InvalidArgument,
                        format!(
                            "Controller interface {ctrl_name} is holding \
                             unknown port {port_name}"
                        ),
                    );
                    log::error!("{e}");
                    return Err(e);
                }
                continue;
            };
            let cur_base_iface = port_iface.merged.base_iface();
            if !ctrl_name.is_empty()
                && let Some(old_ctrl) = cur_base_iface
                    .controller
                    .as_deref()
                    .filter(|c| !c.is_empty() && *c != ctrl_name)
            {
                old_ctrl_changes.push((
                    old_ctrl.to_string(),
                    cur_base_iface.controller_type.clone(),
                    port_name.clone(),
                ));
            }
            if !port_iface.is_desired() && !port_iface.is_changed() {
                self.insert_order.push((
                    port_name.clone(),
                    port_iface.merged.iface_type().clone(),
                ));
            }
            port_iface.apply_ctrller_change(ctrl_name, ctrl_type, ctrl_is_up)?;
        }

        // Port changing its own controller property
        for iface in self
            .kernel_ifaces
            .values()
            .filter(|i| i.is_desired() && i.merged.is_up())
        {
            let Some(des_ctrl) = iface
                .desired
                .as_ref()
                .and_then(|i| i.base_iface().controller.as_deref())
            else {
                continue;
            };
            if let Some(cur_base_iface) =
                iface.current.as_ref().map(|i| i.base_iface())
                && let Some(cur_ctrl) = cur_base_iface
                    .controller
                    .as_deref()
                    .filter(|c| !c.is_empty() && *c != des_ctrl)
            {
                old_ctrl_changes.push((
                    cur_ctrl.to_string(),
                    cur_base_iface.controller_type.clone(),
                    iface.merged.name().to_string(),
                ));
            }
        }

        // Remove moved port from its old controller not in desired state.
        for (old_ctrl_name, old_ctrl_type, port_name) in old_ctrl_changes {
            let old_ctrl = match old_ctrl_type.as_ref() {
                Some(t) => self.get_iface_mut(&old_ctrl_name, t),
                None => self.kernel_ifaces.get_mut(&old_ctrl_name),
            };
            if let Some(old_ctrl) = old_ctrl
                && !old_ctrl.is_desired()
                && old_ctrl.merged.is_controller()
            {
                log::debug!(
                    "Removing port {port_name} from its original controller \
                     {old_ctrl_name}"
                );
                old_ctrl.merged.remove_port(&port_name)?;
            }
        }

        for port_name in config_changed_ports {
            if let Some(port_iface) = self.kernel_ifaces.get_mut(&port_name)
                && !port_iface.is_desired()
                && !port_iface.is_changed()
            {
                log::debug!(
                    "Marking port {port_name} as changed as its port \
                     configuration changed"
                );
                port_iface.mark_as_changed();
                self.insert_order.push((
                    port_name.clone(),
                    port_iface.merged.iface_type().clone(),
                ));
            }
        }
        Ok(())
    }

    pub(crate) fn check_overbook_ports(&self) -> Result<(), NetstateError> {
        let mut port_to_ctrl: HashMap<String, String> = HashMap::new();
        let mut ctrls: Vec<&Interface> = self
            .iter()
            .filter(|i| {
                i.is_desired() && i.merged.is_controller() && i.merged.is_up()
            })
            .map(|i| &i.merged)
            .collect();
        ctrls.sort_unstable_by(|a, b| a.name().cmp(b.name()));

        for ctrl in ctrls {
            for port in ctrl.ports().unwrap_or_default() {
                is_port_overbook(&mut port_to_ctrl, port, ctrl.name())?;
            }
        }
        Ok(())
    }

    // Ports not mentioned in desired state should be brought up along with
    // their desired up controller.
    pub(crate) fn bring_ports_up(&mut self) {
        let mut pending_changes: Vec<String> = Vec::new();
        for iface in self.iter().filter(|i| {
            i.is_desired() && i.merged.is_up() && i.merged.is_controller()
        }) {
            for port_name in iface.merged.ports().unwrap_or_default() {
                if let Some(port_iface) = self.kernel_ifaces.get(port_name)
                    && !port_iface.is_desired()
                    && !port_iface.merged.is_up()
                    && !port_iface.merged.is_ignore()
                {
                    pending_changes.push(port_name.to_string());
                }
            }
        }
        for port_name in pending_changes {
            if let Some(port_iface) = self.kernel_ifaces.get_mut(&port_name) {
                log::info!(
                    "Bringing up port {port_name} as its controller is up"
                );
                port_iface.merged.base_iface_mut().state = InterfaceState::Up;
                port_iface.mark_as_changed();
            }
        }
    }

    // When only port iface with `controller` property without its
    // controller interface been mentioned in desired state, we need to
    // resolve its controller type for backend to proceed.
    pub(crate) fn resolve_port_iface_controller_type(&mut self) {
        let mut pending_changes: Vec<(String, InterfaceType)> = Vec::new();
        for iface in self
            .kernel_ifaces
            .values()
            .filter(|i| i.is_desired() || i.is_changed())
        {
            let base_iface = iface.merged.base_iface();
            if base_iface.controller_type.is_some() {
                continue;
            }
            let Some(ctrl_name) =
                base_iface.controller.as_deref().filter(|c| !c.is_empty())
            else {
                continue;
            };
            if let Some(ctrl_iface) = self.get_controller(ctrl_name, None) {
                pending_changes.push((
                    iface.merged.name().to_string(),
                    ctrl_iface.merged.iface_type().clone(),
                ));
            } else {
                log::warn!(
                    "Failed to resolve type of controller {ctrl_name} for \
                     interface {}",
                    iface.merged.name()
                );
            }
        }
        for (iface_name, ctrl_type) in pending_changes {
            if let Some(iface) = self.kernel_ifaces.get_mut(&iface_name) {
                iface.merged.base_iface_mut().controller_type = Some(ctrl_type);
            }
        }
    }

    // Port of controller other than VRF cannot hold IP unless the port
    // itself allows so.
    pub(crate) fn validate_port_ip(&mut self) -> Result<(), NetstateError> {
        for iface in self
            .kernel_ifaces
            .values_mut()
            .filter(|i| i.is_desired() && i.merged.is_up())
        {
            let base_iface = iface.merged.base_iface();
            if base_iface.can_have_ip() || iface.merged.can_have_ip_as_port()
            {
                continue;
            }
            if let Some(des_base_iface) =
                iface.desired.as_ref().map(|i| i.base_iface())
                && (des_base_iface.is_ipv4_enabled()
                    || des_base_iface.is_ipv6_enabled())
            {
                let e = NetstateError::new(
                    ErrorKind::InvalidArgument,
                    format!(
                        "Interface {} is port of controller {}({}) which \
                         does not allow IP on its ports, but IP is enabled \
                         in desired state",
                        base_iface.name,
                        base_iface.controller.as_deref().unwrap_or_default(),
                        base_iface
                            .controller_type
                            .as_ref()
                            .map(|t| t.to_string())
                            .unwrap_or_default(),
                    ),
                );
                log::error!("{e}");
                return Err(e);
            }
            if base_iface.is_ipv4_enabled() || base_iface.is_ipv6_enabled() {
                log::info!(
                    "Disabling IP of interface {} as it is attached to \
                     controller",
                    base_iface.name
                );
                iface.merged.base_iface_mut().disable_ip();
            }
        }
        Ok(())
    }

    // Store the port configuration of the controller on each port in edit
    // plan and make sure their controller pointers are set.
    pub(crate) fn gen_port_metadata(&mut self) -> Result<(), NetstateError> {
        // port name -> (controller name, controller type, port config)
        let mut pending_changes: Vec<(
            String,
            String,
            InterfaceType,
            Option<serde_json::Value>,
        )> = Vec::new();
        for ctrl in self
            .iter()
            .map(|i| &i.merged)
            .filter(|i| i.is_controller() && !i.is_absent())
        {
            for port_name in ctrl.ports().unwrap_or_default() {
                let Some(port_iface) = self.kernel_ifaces.get(port_name) else {
                    continue;
                };
                if !port_iface.is_desired() && !port_iface.is_changed() {
                    continue;
                }
                let port_conf = match ctrl {
                    Interface::LinuxBridge(br_iface) => br_iface
                        .get_port_conf(port_name)
                        .map(serde_json::to_value)
                        .transpose()?,
                    Interface::OvsBridge(br_iface) => br_iface
                        .get_port_conf(port_name)
                        .map(serde_json::to_value)
                        .transpose()?,
                    _ => None,
                };
                pending_changes.push((
                    port_name.to_string(),
                    ctrl.name().to_string(),
                    ctrl.iface_type().clone(),
                    port_conf,
                ));
            }
        }
        for (port_name, ctrl_name, ctrl_type, port_conf) in pending_changes {
            if let Some(port_iface) = self.kernel_ifaces.get_mut(&port_name) {
                let base_iface = port_iface.merged.base_iface_mut();
                if base_iface.controller.as_deref() != Some(ctrl_name.as_str())
                {
                    base_iface.controller = Some(ctrl_name);
                }
                base_iface.controller_type = Some(ctrl_type);
                base_iface.port_config = port_conf;
            }
        }
        Ok(())
    }
}
