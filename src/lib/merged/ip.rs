// SPDX-License-Identifier: Apache-2.0

use std::net::IpAddr;

use crate::{InterfaceIpAddr, InterfaceIpv4, InterfaceIpv6};

macro_rules! impl_ip_post_merge {
    ($ip_type:ty) => {
        impl $ip_type {
            // When dynamic IP switched off with addresses not mentioned in
            // desire, the dynamic addresses copied from current should be
            // converted to static ones.
            pub(crate) fn post_merge(&mut self, current: &Self) {
                if current.is_auto()
                    && current.addresses.is_some()
                    && self.is_enabled()
                    && !self.is_auto()
                    && is_ip_addrs_none_or_all_auto(
                        current.addresses.as_deref(),
                    )
                    && let Some(addrs) = self.addresses.as_mut()
                {
                    for addr in addrs.iter_mut() {
                        addr.valid_life_time = None;
                        addr.preferred_life_time = None;
                    }
                }
            }
        }
    };
}

impl_ip_post_merge!(InterfaceIpv4);
impl_ip_post_merge!(InterfaceIpv6);

fn is_ip_addrs_none_or_all_auto(addrs: Option<&[InterfaceIpAddr]>) -> bool {
    addrs.is_none_or(|addrs| {
        addrs.iter().all(|a| {
            if let IpAddr::V6(ip_addr) = a.ip {
                ip_addr.is_unicast_link_local() || a.is_auto()
            } else {
                a.is_auto()
            }
        })
    })
}
