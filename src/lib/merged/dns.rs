// SPDX-License-Identifier: Apache-2.0

// This file is based on the work of nmstate project(https://nmstate.io/) which
// is under license of Apache 2.0, authors of original file are:
//  * Gris Ge <fge@redhat.com>
//  * Fernando Fernandez Mancera <ffmancera@riseup.net>

use crate::{
    DnsClientState, DnsIfaceMetadata, DnsState, ErrorKind, MergedInterface,
    MergedInterfaces, MergedRoutes, NetstateError, NetstateInterface,
    dns::parse_dns_ipv6_link_local_srv, ip::is_ipv6_addr,
};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[non_exhaustive]
pub struct MergedDns {
    pub desired: DnsState,
    pub current: DnsState,
    pub servers: Vec<String>,
    pub searches: Vec<String>,
    pub options: Vec<String>,
}

impl MergedDns {
    pub fn new(
        mut desired: DnsState,
        mut current: DnsState,
    ) -> Result<Self, NetstateError> {
        desired.sanitize()?;
        if let Err(e) = current.sanitize() {
            log::debug!("Ignoring invalid current DNS config: {e}");
        }
        let cur_conf = current.config.clone().unwrap_or_default();
        let mut servers = cur_conf.server.unwrap_or_default();
        let mut searches = cur_conf.search.unwrap_or_default();
        let mut options = cur_conf.options.unwrap_or_default();

        if let Some(conf) = desired.config.as_ref() {
            if conf.is_purge() {
                servers.clear();
                searches.clear();
                options.clear();
            } else {
                if let Some(des_srvs) = conf.server.as_ref() {
                    servers.clone_from(des_srvs);
                }
                if let Some(des_schs) = conf.search.as_ref() {
                    searches.clone_from(des_schs);
                }
                if let Some(des_opts) = conf.options.as_ref() {
                    options.clone_from(des_opts);
                }
            }
        }

        Ok(Self {
            desired,
            current,
            servers,
            searches,
            options,
        })
    }

    pub fn is_desired(&self) -> bool {
        self.desired.config.is_some()
    }

    pub fn is_changed(&self) -> bool {
        let cur_conf = self.current.config.clone().unwrap_or_default();
        self.servers != cur_conf.server.unwrap_or_default()
            || self.searches != cur_conf.search.unwrap_or_default()
            || self.options != cur_conf.options.unwrap_or_default()
    }

    /// Whether first name server is IPv6, which makes IPv6 the preferred
    /// family.
    fn is_ipv6_preferred(&self) -> bool {
        self.servers.first().is_some_and(|s| is_ipv6_addr(s))
    }

    fn servers_of_family(&self, is_ipv6: bool) -> Vec<String> {
        self.servers
            .iter()
            .filter(|s| is_ipv6_addr(s) == is_ipv6)
            .cloned()
            .collect()
    }

    pub(crate) fn gen_state_for_apply(&self) -> Option<DnsState> {
        if !self.is_desired() {
            return None;
        }
        Some(DnsState {
            running: None,
            config: Some(DnsClientState {
                server: Some(self.servers.clone()),
                search: Some(self.searches.clone()),
                options: Some(self.options.clone()),
            }),
        })
    }

    pub(crate) fn verify(
        &self,
        current: &DnsState,
    ) -> Result<(), NetstateError> {
        let Some(des_conf) = self.desired.config.as_ref() else {
            return Ok(());
        };
        let cur_conf = current
            .config
            .as_ref()
            .or(current.running.as_ref())
            .cloned()
            .unwrap_or_default();
        for (prop, desired, merged, cur) in [
            ("server", &des_conf.server, &self.servers, &cur_conf.server),
            ("search", &des_conf.search, &self.searches, &cur_conf.search),
            (
                "options",
                &des_conf.options,
                &self.options,
                &cur_conf.options,
            ),
        ] {
            if desired.is_none() && !des_conf.is_purge() {
                continue;
            }
            let cur = cur.clone().unwrap_or_default();
            if merged != &cur {
                let e = NetstateError::new(
                    ErrorKind::VerificationError,
                    format!(
                        "Failed to apply DNS config: desire {prop} {}, got {}",
                        merged.join(" "),
                        cur.join(" ")
                    ),
                );
                log::error!("{e}");
                return Err(e);
            }
        }
        Ok(())
    }
}

impl MergedInterface {
    fn is_iface_valid_for_dns(&self, is_ipv6: bool) -> bool {
        if self.merged.is_absent() || self.merged.is_ignore() {
            return false;
        }
        let base_iface = self.merged.base_iface();
        if is_ipv6 {
            base_iface.is_ipv6_enabled()
        } else {
            base_iface.is_ipv4_enabled()
        }
    }

    fn is_dynamic_ip(&self, is_ipv6: bool) -> bool {
        let base_iface = self.merged.base_iface();
        if is_ipv6 {
            base_iface.ipv6.as_ref().is_some_and(|i| i.is_auto())
        } else {
            base_iface.ipv4.as_ref().is_some_and(|i| i.is_auto())
        }
    }

    fn is_auto_dns(&self, is_ipv6: bool) -> bool {
        let base_iface = self.merged.base_iface();
        if is_ipv6 {
            base_iface.ipv6.as_ref().is_some_and(|i| i.auto_dns())
        } else {
            base_iface.ipv4.as_ref().is_some_and(|i| i.auto_dns())
        }
    }
}

impl MergedInterfaces {
    // Find interface to hold DNS config of specified IP family:
    //  * IPv6 link local name server interface.
    //  * Interface holding default gateway in main route table.
    //  * First dynamic IP interface with `auto-dns: false`.
    //  * First dynamic IP interface.
    fn find_dns_iface(
        &self,
        is_ipv6: bool,
        merged_dns: &MergedDns,
        merged_routes: &MergedRoutes,
    ) -> Result<Option<String>, NetstateError> {
        if is_ipv6 {
            for srv in merged_dns.servers.iter() {
                if let Some((_, iface_name)) =
                    parse_dns_ipv6_link_local_srv(srv)?
                {
                    return Ok(Some(iface_name.to_string()));
                }
            }
        }

        // BTreeMap is sorted by interface name
        for (iface_name, rts) in merged_routes.merged.iter() {
            if rts.iter().any(|rt| rt.is_ipv6() == is_ipv6 && rt.is_gateway())
                && self
                    .kernel_ifaces
                    .get(iface_name)
                    .is_some_and(|i| i.is_iface_valid_for_dns(is_ipv6))
            {
                return Ok(Some(iface_name.to_string()));
            }
        }

        let mut iface_names: Vec<&str> = self
            .kernel_ifaces
            .values()
            .filter(|i| {
                i.is_iface_valid_for_dns(is_ipv6) && i.is_dynamic_ip(is_ipv6)
            })
            .map(|i| i.merged.name())
            .collect();
        iface_names.sort_unstable();

        if let Some(iface_name) = iface_names.iter().find(|n| {
            self.kernel_ifaces
                .get(**n)
                .is_some_and(|i| !i.is_auto_dns(is_ipv6))
        }) {
            return Ok(Some(iface_name.to_string()));
        }
        Ok(iface_names.first().map(|n| n.to_string()))
    }

    /// Store DNS config to the IP stack of carrier interfaces. The IP
    /// family of first name server gets priority 0 and holds the search
    /// and options list, the other family gets priority 1.
    pub(crate) fn gen_dns_metadata(
        &mut self,
        merged_dns: &MergedDns,
        merged_routes: &MergedRoutes,
    ) -> Result<(), NetstateError> {
        if !merged_dns.is_desired() {
            return Ok(());
        }
        let ipv6_preferred = merged_dns.is_ipv6_preferred();

        for is_ipv6 in [ipv6_preferred, !ipv6_preferred] {
            let is_preferred = is_ipv6 == ipv6_preferred;
            let servers = merged_dns.servers_of_family(is_ipv6);
            let dns_conf = DnsIfaceMetadata {
                priority: if is_preferred { 0 } else { 1 },
                server: servers,
                search: if is_preferred {
                    merged_dns.searches.clone()
                } else {
                    Vec::new()
                },
                options: if is_preferred {
                    merged_dns.options.clone()
                } else {
                    Vec::new()
                },
            };
            if dns_conf.server.is_empty()
                && dns_conf.search.is_empty()
                && dns_conf.options.is_empty()
            {
                continue;
            }
            let Some(iface_name) =
                self.find_dns_iface(is_ipv6, merged_dns, merged_routes)?
            else {
                if dns_conf.server.is_empty() {
                    continue;
                }
                let e = NetstateError::new(
                    ErrorKind::InvalidArgument,
                    format!(
                        "Failed to find interface to store IPv{} DNS name \
                         servers {}, please set default gateway or enable \
                         dynamic IP on an interface",
                        if is_ipv6 { 6 } else { 4 },
                        dns_conf.server.join(" ")
                    ),
                );
                log::error!("{e}");
                return Err(e);
            };
            let Some(iface) = self.kernel_ifaces.get_mut(&iface_name) else {
                let e = NetstateError::new(
                    ErrorKind::InvalidArgument,
                    format!(
                        "Interface {iface_name} for holding DNS config does \
                         not exist"
                    ),
                );
                log::error!("{e}");
                return Err(e);
            };
            log::debug!(
                "Storing IPv{} DNS config {dns_conf} to interface \
                 {iface_name}",
                if is_ipv6 { 6 } else { 4 }
            );
            let base_iface = iface.merged.base_iface_mut();
            let metadata = if is_ipv6 {
                base_iface.ipv6.as_mut().map(|i| i.metadata_mut())
            } else {
                base_iface.ipv4.as_mut().map(|i| i.metadata_mut())
            };
            let Some(metadata) = metadata else {
                let e = NetstateError::new(
                    ErrorKind::InvalidArgument,
                    format!(
                        "Interface {iface_name} has no IPv{} stack to hold \
                         DNS config",
                        if is_ipv6 { 6 } else { 4 }
                    ),
                );
                log::error!("{e}");
                return Err(e);
            };
            metadata.dns = Some(dns_conf);
            if !iface.is_desired() && !iface.is_changed() {
                iface.mark_as_changed();
                self.insert_order.push((
                    iface_name.to_string(),
                    iface.merged.iface_type().clone(),
                ));
            }
        }
        Ok(())
    }
}
