// SPDX-License-Identifier: Apache-2.0

use crate::{
    ErrorKind, Interface, InterfaceType, MergedInterface, MergedInterfaces,
    NetstateError, NetstateInterface, OvsInterface,
};

impl MergedInterfaces {
    // Port of OVS bridge not found in kernel interfaces is treated as new
    // OVS internal interface.
    pub(crate) fn create_ovs_internal_ports(
        &mut self,
    ) -> Result<(), NetstateError> {
        let mut new_ifaces: Vec<(String, String)> = Vec::new();
        for iface in self.user_ifaces.values().filter(|i| {
            i.is_desired()
                && i.merged.is_up()
                && i.merged.iface_type() == &InterfaceType::OvsBridge
        }) {
            for port_name in iface.merged.ports().unwrap_or_default() {
                if !self.kernel_ifaces.contains_key(port_name) {
                    new_ifaces.push((
                        port_name.to_string(),
                        iface.merged.name().to_string(),
                    ));
                }
            }
        }
        for (iface_name, ctrl_name) in new_ifaces {
            log::debug!(
                "Creating OVS internal interface {iface_name} for port of \
                 OVS bridge {ctrl_name}"
            );
            let new_iface = Interface::OvsInterface(Box::new(
                OvsInterface::new_with_name_and_ctrl(&iface_name, &ctrl_name),
            ));
            let mut merged_iface = MergedInterface::new(Some(new_iface), None)?;
            merged_iface.mark_as_changed();
            self.insert_order
                .push((iface_name, InterfaceType::OvsInterface));
            self.insert(merged_iface);
        }
        Ok(())
    }

    pub(crate) fn validate_ovs_patch_peers(&self) -> Result<(), NetstateError> {
        for iface in self
            .kernel_ifaces
            .values()
            .filter(|i| i.is_desired() && i.merged.is_up())
        {
            let Interface::OvsInterface(ovs_iface) = &iface.merged else {
                continue;
            };
            let Some(peer_name) = ovs_iface.patch_peer() else {
                continue;
            };
            let peer_is_valid_patch = match self
                .kernel_ifaces
                .get(peer_name)
                .map(|i| &i.merged)
            {
                Some(Interface::OvsInterface(peer_iface)) => {
                    if !peer_iface.is_up() {
                        let e = NetstateError::new(
                            ErrorKind::InvalidArgument,
                            format!(
                                "OVS patch interface {} is using peer \
                                 {peer_name} which is not up",
                                ovs_iface.name()
                            ),
                        );
                        log::error!("{e}");
                        return Err(e);
                    }
                    peer_iface.patch_peer().is_some()
                }
                Some(_) => false,
                None => {
                    let e = NetstateError::new(
                        ErrorKind::InvalidArgument,
                        format!(
                            "OVS patch interface {} is using peer \
                             {peer_name} which does not exist",
                            ovs_iface.name()
                        ),
                    );
                    log::error!("{e}");
                    return Err(e);
                }
            };
            if !peer_is_valid_patch {
                let e = NetstateError::new(
                    ErrorKind::InvalidArgument,
                    format!(
                        "OVS patch interface {} is using peer {peer_name} \
                         which is not OVS patch interface",
                        ovs_iface.name()
                    ),
                );
                log::error!("{e}");
                return Err(e);
            }
        }
        Ok(())
    }
}
