// SPDX-License-Identifier: Apache-2.0

use std::collections::HashMap;

use crate::{
    BaseInterface, ErrorKind, EthernetInterface, Interface, InterfaceType,
    MergedInterface, MergedInterfaces, NetstateError, NetstateInterface,
    SrIovConfig,
};

impl MergedInterfaces {
    // Reducing `total-vfs` removes VF interfaces with ID not less than the
    // new value.
    pub(crate) fn shrink_sriov_vfs(&mut self) {
        let mut removed_vfs: Vec<String> = Vec::new();
        for iface in self.kernel_ifaces.values_mut().filter(|i| {
            i.is_desired() && i.merged.is_up()
        }) {
            let (
                Interface::Ethernet(eth_iface),
                Some(Interface::Ethernet(cur_eth_iface)),
            ) = (&mut iface.merged, iface.current.as_ref())
            else {
                continue;
            };
            let (Some(total_vfs), Some(cur_total_vfs)) = (
                eth_iface.sriov_total_vfs(),
                cur_eth_iface.sriov_total_vfs(),
            ) else {
                continue;
            };
            if total_vfs >= cur_total_vfs {
                continue;
            }
            if let Some(sriov_conf) = eth_iface.sriov_mut() {
                sriov_conf.shrink_vfs(total_vfs);
            }
            for vf_id in total_vfs..cur_total_vfs {
                removed_vfs.push(SrIovConfig::vf_iface_name(
                    eth_iface.name(),
                    vf_id,
                ));
            }
        }
        for vf_iface_name in removed_vfs {
            if let Some(vf_iface) = self.kernel_ifaces.get_mut(&vf_iface_name)
                && !vf_iface.merged.is_absent()
            {
                log::info!(
                    "Marking SR-IOV VF interface {vf_iface_name} as absent \
                     as total-vfs reduced"
                );
                vf_iface.mark_as_absent();
                if !vf_iface.is_desired() {
                    self.insert_order.push((
                        vf_iface_name,
                        vf_iface.merged.iface_type().clone(),
                    ));
                }
            }
        }
    }

    pub(crate) fn gen_sriov_metadata(&mut self) {
        for iface in self.kernel_ifaces.values_mut().filter(|i| {
            i.is_desired() && i.merged.is_up()
        }) {
            let Interface::Ethernet(eth_iface) = &mut iface.merged else {
                continue;
            };
            let pf_name = eth_iface.base.name.clone();
            let Some(vfs) =
                eth_iface.sriov_mut().and_then(|s| s.vfs.as_mut())
            else {
                continue;
            };
            for vf in vfs.iter_mut() {
                vf.vf_iface_name = Some(if vf.iface_name.is_empty() {
                    SrIovConfig::vf_iface_name(&pf_name, vf.id)
                } else {
                    vf.iface_name.clone()
                });
            }
        }
    }

    pub(crate) fn handle_veth(&mut self) -> Result<(), NetstateError> {
        self.validate_veth_peers()?;
        self.mark_new_veth_peers();
        self.bring_new_veth_peer_up()?;
        self.mark_veth_peer_absent();
        Ok(())
    }

    // New ethernet interface without `veth` section is only valid when it
    // is the peer of other new veth or in generate configuration mode.
    fn validate_veth_peers(&mut self) -> Result<(), NetstateError> {
        let mut veth_peers: HashMap<String, String> = HashMap::new();
        for iface in self.kernel_ifaces.values().filter(|i| {
            i.is_desired() && i.current.is_none() && i.merged.is_up()
        }) {
            if let Interface::Ethernet(eth_iface) = &iface.merged
                && let Some(peer) = eth_iface.veth_peer()
            {
                veth_peers
                    .insert(peer.to_string(), eth_iface.name().to_string());
            }
        }

        for iface in self.kernel_ifaces.values_mut().filter(|i| {
            i.is_desired() && i.current.is_none() && i.merged.is_up()
        }) {
            let Interface::Ethernet(eth_iface) = &mut iface.merged else {
                continue;
            };
            if eth_iface.veth.is_some() {
                continue;
            }
            if let Some(peer_of) = veth_peers.get(eth_iface.name()) {
                log::debug!(
                    "Marking interface {} as veth peer of {peer_of}",
                    eth_iface.name()
                );
                let mut veth_iface = EthernetInterface::new_veth(
                    eth_iface.base.clone(),
                    peer_of,
                );
                veth_iface.is_veth_peer = true;
                *eth_iface = Box::new(veth_iface);
            } else if !self.gen_conf_mode {
                let e = NetstateError::new(
                    ErrorKind::InvalidArgument,
                    format!(
                        "Ethernet interface {} does not exist, the peer \
                         name is required for creating veth interface",
                        eth_iface.name()
                    ),
                );
                log::error!("{e}");
                return Err(e);
            }
        }
        Ok(())
    }

    // When both ends of a new veth pair are desired, only the first one
    // in name order creates the pair, the other one is marked as peer.
    fn mark_new_veth_peers(&mut self) {
        let mut veth_names: Vec<String> = self
            .kernel_ifaces
            .values()
            .filter(|i| {
                i.is_desired() && i.current.is_none() && i.merged.is_up()
            })
            .filter_map(|i| match &i.merged {
                Interface::Ethernet(eth) if eth.veth_peer().is_some() => {
                    Some(eth.name().to_string())
                }
                _ => None,
            })
            .collect();
        veth_names.sort_unstable();

        for veth_name in veth_names {
            let peer = match self.kernel_ifaces.get(&veth_name) {
                Some(MergedInterface {
                    merged: Interface::Ethernet(eth),
                    ..
                }) if !eth.is_veth_peer() => eth.veth_peer().map(String::from),
                _ => None,
            };
            let Some(peer) = peer else {
                continue;
            };
            if let Some(peer_iface) = self.kernel_ifaces.get_mut(&peer)
                && peer_iface.current.is_none()
                && let Interface::Ethernet(peer_eth) = &mut peer_iface.merged
                && peer_eth.veth.is_some()
                && !peer_eth.is_veth_peer
            {
                log::debug!(
                    "Marking veth {peer} as peer of {veth_name}, the pair \
                     is created by {veth_name}"
                );
                peer_eth.is_veth_peer = true;
            }
        }
    }

    fn bring_new_veth_peer_up(&mut self) -> Result<(), NetstateError> {
        let mut new_peers: Vec<(String, String)> = Vec::new();
        for iface in self.kernel_ifaces.values().filter(|i| {
            i.is_desired() && i.current.is_none() && i.merged.is_up()
        }) {
            if let Interface::Ethernet(eth_iface) = &iface.merged
                && let Some(peer) = eth_iface.veth_peer()
                && !self.kernel_ifaces.contains_key(peer)
            {
                new_peers
                    .push((peer.to_string(), eth_iface.name().to_string()));
            }
        }
        for (peer_name, veth_name) in new_peers {
            log::debug!(
                "Bringing up veth peer {peer_name} of new veth {veth_name}"
            );
            let mut base_iface =
                BaseInterface::new(peer_name.clone(), InterfaceType::Ethernet);
            base_iface.up_priority = 1;
            let mut peer_eth =
                EthernetInterface::new_veth(base_iface, &veth_name);
            peer_eth.is_veth_peer = true;
            let peer_iface = Interface::Ethernet(Box::new(peer_eth));
            let mut merged_iface =
                MergedInterface::new(Some(peer_iface), None)?;
            merged_iface.mark_as_changed();
            // Peer might be moved to other network namespace
            merged_iface.for_verify = None;
            self.insert_order
                .push((peer_name, InterfaceType::Ethernet));
            self.insert(merged_iface);
        }
        Ok(())
    }

    fn mark_veth_peer_absent(&mut self) {
        let mut pending_peers: Vec<String> = Vec::new();
        for iface in self
            .kernel_ifaces
            .values()
            .filter(|i| i.is_desired() && i.merged.is_absent())
        {
            if let Some(Interface::Ethernet(cur_iface)) = iface.current.as_ref()
                && let Some(peer) = cur_iface.veth_peer()
                && let Some(peer_iface) = self.kernel_ifaces.get(peer)
                && !peer_iface.is_desired()
                && !peer_iface.merged.is_absent()
            {
                pending_peers.push(peer.to_string());
            }
        }
        for peer in pending_peers {
            if let Some(peer_iface) = self.kernel_ifaces.get_mut(&peer) {
                log::info!(
                    "Marking veth peer {peer} as absent as its peer is \
                     absent"
                );
                peer_iface.mark_as_absent();
                self.insert_order
                    .push((peer, InterfaceType::Ethernet));
            }
        }
    }

    // Absent interface which does not exist in current has nothing to
    // remove.
    pub(crate) fn remove_absent_non_exist_ifaces(&mut self) {
        for iface in self.iter_mut().filter(|i| {
            i.for_apply.is_some()
                && i.current.is_none()
                && i.merged.is_absent()
        }) {
            log::debug!(
                "Removing interface {}/{} from edit plan as it is absent \
                 and does not exist",
                iface.merged.name(),
                iface.merged.iface_type()
            );
            iface.for_apply = None;
        }
    }
}
