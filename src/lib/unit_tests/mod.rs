// SPDX-License-Identifier: Apache-2.0

mod bond;
mod controller;
mod dns;
mod ethernet;
mod gen_conf;
mod ifaces;
mod ip;
mod linux_bridge;
mod mac_vlan;
mod net_state;
mod ovs;
mod policy;
mod route;
mod route_rule;
mod vrf;
