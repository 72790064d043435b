// SPDX-License-Identifier: Apache-2.0

// This file is based on the work of nmstate project(https://nmstate.io/) which
// is under license of Apache 2.0, authors of original file are:
//  * Gris Ge <fge@redhat.com>
//  * Fernando Fernandez Mancera <ffmancera@riseup.net>

use serde::Deserialize;
use uuid::Uuid;

use crate::{
    BaseInterface, BondInterface, BridgeVlanMode, BridgeVlanTrunkTag,
    ErrorKind, EthernetInterface, InfiniBandInterface, Interface,
    InterfaceIpAddr, InterfaceType, LinuxBridgeInterface,
    LinuxBridgePortConfig, MacVlanMode, MergedNetworkState,
    NetstateApplyOption, NetstateError, NetstateInterface, NetworkState,
    OvsBridgeInterface, OvsInterface, RouteEntry, RouteRuleEntry,
    Ipv6AddrGenMode, ip::IpMetadata,
};

const DEFAULT_DNS_PRIORITY: i32 = 40;
const OVS_PORT_PREFIX: &str = "ovs-port-";

/// NetworkManager keyfile of a single connection profile.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[non_exhaustive]
pub struct NmKeyFile {
    pub id: String,
    sections: Vec<(String, Vec<(String, String)>)>,
}

impl NmKeyFile {
    fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            sections: Vec::new(),
        }
    }

    /// File name used by NetworkManager keyfile plugin.
    pub fn file_name(&self) -> String {
        format!("{}.nmconnection", self.id)
    }

    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.sections
            .iter()
            .find(|(name, _)| name == section)
            .and_then(|(_, entries)| {
                entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
            })
            .map(String::as_str)
    }

    pub fn has_section(&self, section: &str) -> bool {
        self.sections.iter().any(|(name, _)| name == section)
    }

    fn set(&mut self, section: &str, key: &str, value: impl ToString) {
        let entries = if let Some(index) =
            self.sections.iter().position(|(name, _)| name == section)
        {
            &mut self.sections[index].1
        } else {
            self.sections.push((section.to_string(), Vec::new()));
            let last = self.sections.len() - 1;
            &mut self.sections[last].1
        };
        if let Some(entry) = entries.iter_mut().find(|(k, _)| k == key) {
            entry.1 = value.to_string();
        } else {
            entries.push((key.to_string(), value.to_string()));
        }
    }

    fn set_opt<T: ToString>(
        &mut self,
        section: &str,
        key: &str,
        value: Option<T>,
    ) {
        if let Some(v) = value {
            self.set(section, key, v);
        }
    }
}

impl std::fmt::Display for NmKeyFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (index, (name, entries)) in self.sections.iter().enumerate() {
            if index != 0 {
                writeln!(f)?;
            }
            writeln!(f, "[{name}]")?;
            for (key, value) in entries {
                writeln!(f, "{key}={value}")?;
            }
        }
        Ok(())
    }
}

impl NetworkState {
    /// Generate NetworkManager keyfiles without current state. Interfaces
    /// of unknown type and ports not defined are treated as ethernet.
    pub fn gen_conf(&self) -> Result<Vec<NmKeyFile>, NetstateError> {
        let merged = MergedNetworkState::new(
            self.clone(),
            NetworkState::new(),
            NetstateApplyOption::new().gen_conf_mode(),
        )?;
        let plan = merged.gen_state_for_apply();
        let mut ret = Vec::new();
        for iface in plan.ifaces.to_vec() {
            if iface.is_absent() || iface.is_ignore() {
                log::debug!(
                    "Skipping {}/{} as it is marked as {}",
                    iface.name(),
                    iface.iface_type(),
                    iface.iface_state()
                );
                continue;
            }
            ret.extend(iface_to_keyfiles(iface, &plan)?);
        }
        Ok(ret)
    }
}

fn conn_uuid(name: &str, nm_type: &str) -> String {
    let seed = format!("{nm_type}/{name}");
    Uuid::new_v5(&Uuid::NAMESPACE_OID, seed.as_bytes())
        .hyphenated()
        .to_string()
}

fn nm_iface_type(iface: &Interface) -> Result<&'static str, NetstateError> {
    let iface_type = match iface {
        Interface::Ethernet(eth)
            if eth.veth_peer().is_some() && !eth.is_veth_peer() =>
        {
            &InterfaceType::Veth
        }
        _ => iface.iface_type(),
    };
    iface_type.nm_conn_type().ok_or_else(|| {
        let e = NetstateError::new(
            ErrorKind::NotSupportedError,
            format!(
                "Interface {} of type {} is not supported by keyfile \
                 generation",
                iface.name(),
                iface.iface_type()
            ),
        );
        log::error!("{e}");
        e
    })
}

fn iface_to_keyfiles(
    iface: &Interface,
    plan: &NetworkState,
) -> Result<Vec<NmKeyFile>, NetstateError> {
    let nm_type = nm_iface_type(iface)?;
    let base = iface.base_iface();
    let mut ret = Vec::new();
    let mut keyfile = NmKeyFile::new(&base.name);

    keyfile.set("connection", "id", &base.name);
    keyfile.set("connection", "uuid", conn_uuid(&base.name, nm_type));
    keyfile.set("connection", "type", nm_type);
    keyfile.set("connection", "interface-name", &base.name);
    keyfile.set("connection", "autoconnect", iface.is_up());
    if base.up_priority > 0 {
        keyfile.set(
            "connection",
            "autoconnect-priority",
            100 - base.up_priority.min(100),
        );
    }
    if let Some(ovs_port) = gen_controller_conf(&mut keyfile, base, plan) {
        ret.push(ovs_port);
    }

    match iface {
        Interface::Ethernet(eth) => gen_ethernet_conf(&mut keyfile, eth),
        Interface::Bond(bond) => gen_bond_conf(&mut keyfile, bond)?,
        Interface::LinuxBridge(br) => gen_bridge_conf(&mut keyfile, br),
        Interface::OvsBridge(br) => gen_ovs_bridge_conf(&mut keyfile, br),
        Interface::OvsInterface(ovs_iface) => {
            gen_ovs_iface_conf(&mut keyfile, ovs_iface)
        }
        Interface::Vlan(vlan) => {
            if let Some(conf) = vlan.vlan.as_ref() {
                keyfile.set_opt("vlan", "id", conf.id);
                keyfile.set_opt("vlan", "parent", conf.base_iface.as_ref());
                keyfile.set_opt("vlan", "protocol", conf.protocol);
            }
        }
        Interface::Vxlan(vxlan) => {
            if let Some(conf) = vxlan.vxlan.as_ref() {
                keyfile.set_opt("vxlan", "id", conf.id);
                keyfile.set_opt("vxlan", "parent", conf.base_iface.as_ref());
                keyfile.set_opt("vxlan", "remote", conf.remote);
                keyfile.set_opt("vxlan", "local", conf.local);
                keyfile.set_opt("vxlan", "destination-port", conf.dst_port);
                keyfile.set_opt("vxlan", "learning", conf.learning);
            }
        }
        Interface::MacVlan(mac_vlan) => {
            if let Some(conf) = mac_vlan.mac_vlan.as_ref() {
                gen_mac_vlan_conf(
                    &mut keyfile,
                    conf.base_iface.as_deref(),
                    conf.mode,
                    conf.promiscuous,
                    false,
                );
            }
        }
        Interface::MacVtap(mac_vtap) => {
            if let Some(conf) = mac_vtap.mac_vtap.as_ref() {
                gen_mac_vlan_conf(
                    &mut keyfile,
                    conf.base_iface.as_deref(),
                    conf.mode,
                    conf.promiscuous,
                    true,
                );
            }
        }
        Interface::Vrf(vrf) => {
            keyfile.set_opt("vrf", "table", vrf.table_id());
        }
        Interface::InfiniBand(ib) => gen_ib_conf(&mut keyfile, ib),
        _ => (),
    }

    if !iface.is_userspace() {
        keyfile.set_opt("ethernet", "mtu", base.mtu);
        keyfile.set_opt(
            "ethernet",
            "cloned-mac-address",
            base.mac_address.as_ref(),
        );
    }
    if !iface.is_userspace() && base.can_have_ip() {
        gen_ipv4_conf(&mut keyfile, base);
        gen_ipv6_conf(&mut keyfile, base);
    }

    ret.push(keyfile);
    Ok(ret)
}

// Return the OVS port keyfile when interface is attached to OVS bridge.
fn gen_controller_conf(
    keyfile: &mut NmKeyFile,
    base: &BaseInterface,
    plan: &NetworkState,
) -> Option<NmKeyFile> {
    let ctrl_name = base.controller.as_deref().filter(|c| !c.is_empty())?;
    let ctrl_type = base.controller_type.as_ref()?;
    let Some(port_type) = ctrl_type.nm_port_type() else {
        log::warn!(
            "Unsupported controller type {ctrl_type} of interface {}",
            base.name
        );
        return None;
    };
    if ctrl_type != &InterfaceType::OvsBridge {
        keyfile.set("connection", "controller", ctrl_name);
        keyfile.set("connection", "port-type", port_type);
        if ctrl_type == &InterfaceType::LinuxBridge {
            gen_bridge_port_conf(keyfile, base);
        }
        return None;
    }

    // OVS needs a `ovs-port` profile between bridge and interface.
    let port_name = match plan.ifaces.get(ctrl_name, Some(ctrl_type)) {
        Some(Interface::OvsBridge(br)) => br
            .get_port_conf(&base.name)
            .map(|p| p.name.as_str())
            .unwrap_or(base.name.as_str()),
        _ => base.name.as_str(),
    };
    let port_uuid = conn_uuid(port_name, "ovs-port");
    keyfile.set("connection", "controller", &port_uuid);
    keyfile.set("connection", "port-type", port_type);

    let port_conn_id = format!("{OVS_PORT_PREFIX}{port_name}");
    let mut port_keyfile = NmKeyFile::new(&port_conn_id);
    port_keyfile.set("connection", "id", &port_conn_id);
    port_keyfile.set("connection", "uuid", &port_uuid);
    port_keyfile.set("connection", "type", "ovs-port");
    port_keyfile.set("connection", "interface-name", port_name);
    port_keyfile.set(
        "connection",
        "controller",
        conn_uuid(ctrl_name, "ovs-bridge"),
    );
    port_keyfile.set("connection", "port-type", "ovs-bridge");
    if let Some(Interface::OvsBridge(br)) =
        plan.ifaces.get(ctrl_name, Some(ctrl_type))
        && let Some(port_conf) = br.get_port_conf(&base.name)
    {
        if let Some(vlan) = port_conf.vlan.as_ref() {
            port_keyfile.set_opt("ovs-port", "tag", vlan.tag);
            port_keyfile.set_opt(
                "ovs-port",
                "vlan-mode",
                vlan.mode.map(|m| match m {
                    BridgeVlanMode::Access => "access",
                    BridgeVlanMode::Trunk => "trunk",
                }),
            );
        }
        if let Some(bond) = port_conf.bond.as_ref() {
            port_keyfile.set_opt("ovs-port", "bond-mode", bond.mode);
            port_keyfile.set_opt(
                "ovs-port",
                "bond-downdelay",
                bond.bond_downdelay,
            );
            port_keyfile.set_opt("ovs-port", "bond-updelay", bond.bond_updelay);
        }
    }
    Some(port_keyfile)
}

fn gen_ethernet_conf(keyfile: &mut NmKeyFile, eth: &EthernetInterface) {
    if let Some(conf) = eth.ethernet.as_ref() {
        keyfile.set_opt("ethernet", "auto-negotiate", conf.auto_neg);
        keyfile.set_opt("ethernet", "speed", conf.speed);
        keyfile.set_opt("ethernet", "duplex", conf.duplex);
        if let Some(total_vfs) = conf.sr_iov.as_ref().and_then(|s| s.total_vfs)
        {
            keyfile.set("sriov", "total-vfs", total_vfs);
        }
    }
    // The peer end binds to the link created by its partner.
    if let Some(peer) = eth.veth_peer()
        && !eth.is_veth_peer()
    {
        keyfile.set("veth", "peer", peer);
    }
}

fn gen_bond_conf(
    keyfile: &mut NmKeyFile,
    bond: &BondInterface,
) -> Result<(), NetstateError> {
    let Some(conf) = bond.bond.as_ref() else {
        return Ok(());
    };
    keyfile.set_opt("bond", "mode", conf.mode);
    if let Some(opts) = conf.options.as_ref() {
        let value = serde_json::to_value(opts).map_err(|e| {
            NetstateError::new(
                ErrorKind::Bug,
                format!("Failed to convert bond options {opts} to JSON: {e}"),
            )
        })?;
        if let Some(opts) = value.as_object() {
            for (key, value) in opts.iter().filter(|(_, v)| !v.is_null()) {
                let value = match value {
                    serde_json::Value::String(s) => s.to_string(),
                    v => v.to_string(),
                };
                keyfile.set("bond", key, value);
            }
        }
    }
    Ok(())
}

fn gen_bridge_conf(keyfile: &mut NmKeyFile, br: &LinuxBridgeInterface) {
    let Some(conf) = br.bridge.as_ref() else {
        return;
    };
    if let Some(opts) = conf.options.as_ref() {
        if let Some(stp) = opts.stp.as_ref() {
            keyfile.set_opt("bridge", "stp", stp.enabled);
            keyfile.set_opt("bridge", "priority", stp.priority);
            keyfile.set_opt("bridge", "forward-delay", stp.forward_delay);
            keyfile.set_opt("bridge", "hello-time", stp.hello_time);
            keyfile.set_opt("bridge", "max-age", stp.max_age);
        }
        keyfile.set_opt("bridge", "ageing-time", opts.mac_ageing_time);
        keyfile.set_opt("bridge", "group-address", opts.group_addr.as_ref());
        keyfile.set_opt(
            "bridge",
            "group-forward-mask",
            opts.group_forward_mask.or(opts.group_fwd_mask),
        );
        keyfile.set_opt("bridge", "multicast-hash-max", opts.hash_max);
        keyfile.set_opt(
            "bridge",
            "multicast-snooping",
            opts.multicast_snooping,
        );
        keyfile.set_opt("bridge", "multicast-querier", opts.multicast_querier);
        keyfile.set_opt(
            "bridge",
            "multicast-router",
            opts.multicast_router.as_ref(),
        );
        keyfile.set_opt(
            "bridge",
            "multicast-membership-interval",
            opts.multicast_membership_interval,
        );
        keyfile.set_opt("bridge", "vlan-protocol", opts.vlan_protocol);
    }
    if conf
        .ports
        .as_deref()
        .unwrap_or_default()
        .iter()
        .any(|p| p.vlan.is_some())
    {
        keyfile.set("bridge", "vlan-filtering", true);
    }
}

fn trunk_tag_to_keyfile(tag: &BridgeVlanTrunkTag) -> String {
    match tag {
        BridgeVlanTrunkTag::Id(id) => id.to_string(),
        BridgeVlanTrunkTag::IdRange(range) => {
            format!("{}-{}", range.min, range.max)
        }
    }
}

fn gen_bridge_port_conf(keyfile: &mut NmKeyFile, base: &BaseInterface) {
    let Some(port_conf) = base
        .port_config
        .as_ref()
        .and_then(|v| LinuxBridgePortConfig::deserialize(v).ok())
    else {
        return;
    };
    keyfile.set_opt("bridge-port", "hairpin-mode", port_conf.stp_hairpin_mode);
    keyfile.set_opt("bridge-port", "path-cost", port_conf.stp_path_cost);
    keyfile.set_opt("bridge-port", "priority", port_conf.stp_priority);
    let Some(vlan) = port_conf.vlan.as_ref() else {
        return;
    };
    let mut vlans: Vec<String> = Vec::new();
    match vlan.mode.unwrap_or_default() {
        BridgeVlanMode::Access => {
            if let Some(tag) = vlan.tag {
                vlans.push(format!("{tag} pvid untagged"));
            }
        }
        BridgeVlanMode::Trunk => {
            if vlan.enable_native == Some(true)
                && let Some(tag) = vlan.tag
            {
                vlans.push(format!("{tag} pvid untagged"));
            }
            for trunk_tag in vlan.trunk_tags.as_deref().unwrap_or_default() {
                vlans.push(trunk_tag_to_keyfile(trunk_tag));
            }
        }
    }
    if !vlans.is_empty() {
        keyfile.set("bridge-port", "vlans", vlans.join(","));
    }
}

fn gen_ovs_bridge_conf(keyfile: &mut NmKeyFile, br: &OvsBridgeInterface) {
    if let Some(opts) = br.bridge.as_ref().and_then(|b| b.options.as_ref()) {
        keyfile.set_opt("ovs-bridge", "stp-enable", opts.stp);
        keyfile.set_opt("ovs-bridge", "rstp-enable", opts.rstp);
        keyfile.set_opt(
            "ovs-bridge",
            "mcast-snooping-enable",
            opts.mcast_snooping_enable,
        );
        keyfile.set_opt("ovs-bridge", "fail-mode", opts.fail_mode.as_ref());
        keyfile.set_opt("ovs-bridge", "datapath-type", opts.datapath.as_ref());
    }
}

fn gen_ovs_iface_conf(keyfile: &mut NmKeyFile, ovs_iface: &OvsInterface) {
    if let Some(peer) = ovs_iface.patch_peer() {
        keyfile.set("ovs-interface", "type", "patch");
        keyfile.set("ovs-patch", "peer", peer);
    } else if let Some(dpdk) = ovs_iface.dpdk.as_ref() {
        keyfile.set("ovs-interface", "type", "dpdk");
        keyfile.set_opt("ovs-dpdk", "devargs", dpdk.devargs.as_ref());
        keyfile.set_opt("ovs-dpdk", "n-rxq", dpdk.rx_queue);
        keyfile.set_opt("ovs-dpdk", "n-rxq-desc", dpdk.n_rxq_desc);
        keyfile.set_opt("ovs-dpdk", "n-txq-desc", dpdk.n_txq_desc);
    } else {
        keyfile.set("ovs-interface", "type", "internal");
    }
}

fn gen_mac_vlan_conf(
    keyfile: &mut NmKeyFile,
    base_iface: Option<&str>,
    mode: Option<MacVlanMode>,
    promiscuous: Option<bool>,
    is_tap: bool,
) {
    keyfile.set_opt("macvlan", "parent", base_iface);
    keyfile.set_opt(
        "macvlan",
        "mode",
        mode.and_then(|m| match m {
            MacVlanMode::Vepa => Some(1),
            MacVlanMode::Bridge => Some(2),
            MacVlanMode::Private => Some(3),
            MacVlanMode::Passthru => Some(4),
            MacVlanMode::Source => Some(5),
            _ => None,
        }),
    );
    keyfile.set_opt("macvlan", "promiscuous", promiscuous);
    keyfile.set("macvlan", "tap", is_tap);
}

fn gen_ib_conf(keyfile: &mut NmKeyFile, ib: &InfiniBandInterface) {
    if let Some(conf) = ib.infiniband.as_ref() {
        keyfile.set_opt("infiniband", "transport-mode", conf.mode);
        if let Some(pkey) = conf.pkey.filter(|p| *p != 0xffff) {
            keyfile.set("infiniband", "p-key", pkey);
            keyfile.set_opt("infiniband", "parent", conf.base_iface.as_ref());
        }
    }
}

fn addrs_to_keyfile(
    keyfile: &mut NmKeyFile,
    section: &str,
    addrs: &[InterfaceIpAddr],
) {
    for (index, addr) in addrs.iter().enumerate() {
        keyfile.set(
            section,
            &format!("address{}", index + 1),
            format!("{}/{}", addr.ip, addr.prefix_length),
        );
    }
}

fn metadata_to_keyfile(
    keyfile: &mut NmKeyFile,
    section: &str,
    metadata: &IpMetadata,
) {
    let routes: Vec<&RouteEntry> = metadata
        .routes
        .as_deref()
        .unwrap_or_default()
        .iter()
        .filter(|r| !r.is_absent())
        .collect();
    for (index, rt) in routes.iter().enumerate() {
        let key = format!("route{}", index + 1);
        let mut value = rt.destination.clone().unwrap_or_default();
        if let Some(via) = rt.next_hop_addr.as_ref() {
            value.push(',');
            value.push_str(via);
        }
        if let Some(metric) = rt.metric.filter(|m| *m >= 0) {
            if rt.next_hop_addr.is_none() {
                value.push(',');
            }
            value.push_str(&format!(",{metric}"));
        }
        keyfile.set(section, &key, value);
        let table_id = rt.table_id_or_default();
        if table_id != RouteEntry::DEFAULT_ROUTE_TABLE_ID {
            keyfile.set(
                section,
                &format!("{key}_options"),
                format!("table={table_id}"),
            );
        }
    }

    let rules: Vec<&RouteRuleEntry> = metadata
        .route_rules
        .as_deref()
        .unwrap_or_default()
        .iter()
        .filter(|r| !r.is_absent())
        .collect();
    for (index, rule) in rules.iter().enumerate() {
        keyfile.set(
            section,
            &format!("routing-rule{}", index + 1),
            rule_to_keyfile(rule),
        );
    }

    if let Some(dns) = metadata.dns.as_ref() {
        if !dns.server.is_empty() {
            keyfile.set(section, "dns", format!("{};", dns.server.join(";")));
        }
        if !dns.search.is_empty() {
            keyfile.set(
                section,
                "dns-search",
                format!("{};", dns.search.join(";")),
            );
        }
        if !dns.options.is_empty() {
            keyfile.set(
                section,
                "dns-options",
                format!("{};", dns.options.join(";")),
            );
        }
        keyfile.set(
            section,
            "dns-priority",
            DEFAULT_DNS_PRIORITY + 10 * dns.priority,
        );
    }
}

fn rule_to_keyfile(rule: &RouteRuleEntry) -> String {
    let mut items: Vec<String> = Vec::new();
    if let Some(priority) = rule.priority.filter(|p| *p >= 0) {
        items.push(format!("priority {priority}"));
    }
    if let Some(from) = rule.ip_from.as_ref() {
        items.push(format!("from {from}"));
    } else if rule.ip_to.is_none() {
        items.push(
            if rule.is_ipv6() {
                "from ::/0"
            } else {
                "from 0.0.0.0/0"
            }
            .to_string(),
        );
    }
    if let Some(to) = rule.ip_to.as_ref() {
        items.push(format!("to {to}"));
    }
    if let Some(fwmark) = rule.fwmark {
        items.push(match rule.fwmask {
            Some(fwmask) => format!("fwmark {fwmark:#x}/{fwmask:#x}"),
            None => format!("fwmark {fwmark:#x}"),
        });
    }
    if let Some(iif) = rule.iif.as_ref() {
        items.push(format!("iif {iif}"));
    }
    if let Some(len) = rule.suppress_prefix_length {
        items.push(format!("suppress_prefixlength {len}"));
    }
    match rule.action {
        Some(action) => items.push(action.to_string()),
        None => items.push(format!("table {}", rule.table_id_or_default())),
    }
    items.join(" ")
}

fn gen_ipv4_conf(keyfile: &mut NmKeyFile, base: &BaseInterface) {
    let Some(ipv4) = base.ipv4.as_ref() else {
        keyfile.set("ipv4", "method", "disabled");
        return;
    };
    if !ipv4.is_enabled() {
        keyfile.set("ipv4", "method", "disabled");
        return;
    }
    if ipv4.is_auto() {
        keyfile.set("ipv4", "method", "auto");
        keyfile.set_opt("ipv4", "ignore-auto-dns", ipv4.auto_dns.map(|v| !v));
        keyfile.set_opt(
            "ipv4",
            "ignore-auto-routes",
            ipv4.auto_routes.map(|v| !v),
        );
        keyfile.set_opt("ipv4", "never-default", ipv4.auto_gateway.map(|v| !v));
        keyfile.set_opt("ipv4", "route-table", ipv4.auto_table_id);
        keyfile.set_opt("ipv4", "route-metric", ipv4.auto_route_metric);
    } else if ipv4.addresses.as_ref().is_some_and(|a| !a.is_empty()) {
        keyfile.set("ipv4", "method", "manual");
    } else {
        keyfile.set("ipv4", "method", "disabled");
        return;
    }
    addrs_to_keyfile(
        keyfile,
        "ipv4",
        ipv4.addresses.as_deref().unwrap_or_default(),
    );
    metadata_to_keyfile(keyfile, "ipv4", ipv4.metadata());
}

fn gen_ipv6_conf(keyfile: &mut NmKeyFile, base: &BaseInterface) {
    let Some(ipv6) = base.ipv6.as_ref() else {
        keyfile.set("ipv6", "method", "disabled");
        return;
    };
    if !ipv6.is_enabled() {
        keyfile.set("ipv6", "method", "disabled");
        return;
    }
    if ipv6.is_auto() {
        keyfile.set(
            "ipv6",
            "method",
            if ipv6.autoconf == Some(true) {
                "auto"
            } else {
                "dhcp"
            },
        );
        keyfile.set_opt("ipv6", "ignore-auto-dns", ipv6.auto_dns.map(|v| !v));
        keyfile.set_opt(
            "ipv6",
            "ignore-auto-routes",
            ipv6.auto_routes.map(|v| !v),
        );
        keyfile.set_opt("ipv6", "never-default", ipv6.auto_gateway.map(|v| !v));
        keyfile.set_opt("ipv6", "route-table", ipv6.auto_table_id);
        keyfile.set_opt("ipv6", "route-metric", ipv6.auto_route_metric);
    } else if ipv6.addresses.as_ref().is_some_and(|a| !a.is_empty()) {
        keyfile.set("ipv6", "method", "manual");
    } else {
        keyfile.set("ipv6", "method", "link-local");
    }
    keyfile.set_opt(
        "ipv6",
        "addr-gen-mode",
        ipv6.addr_gen_mode.as_ref().map(|m| match m {
            Ipv6AddrGenMode::Eui64 => "eui64",
            Ipv6AddrGenMode::StablePrivacy => "stable-privacy",
            Ipv6AddrGenMode::Other(s) => s.as_str(),
        }),
    );
    keyfile.set_opt("ipv6", "token", ipv6.token.as_ref());
    addrs_to_keyfile(
        keyfile,
        "ipv6",
        ipv6.addresses.as_deref().unwrap_or_default(),
    );
    metadata_to_keyfile(keyfile, "ipv6", ipv6.metadata());
}
