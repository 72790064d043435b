// SPDX-License-Identifier: Apache-2.0

// This file is based on the work of nmstate project(https://nmstate.io/) which
// is under license of Apache 2.0, authors of original file are:
//  * Gris Ge <fge@redhat.com>
//  * Wen Liang <liangwen12year@gmail.com>
//  * Jan Vaclav <jvaclav@redhat.com>
//  * Íñigo Huguet <ihuguet@redhat.com>
//  * Fernando Fernandez Mancera <ffmancera@riseup.net>

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::{
    ErrorKind, JsonDisplay, MergedInterface, MergedInterfaces, NetstateError,
    NetstateInterface, RouteEntry, RouteState, Routes,
};

const LOOPBACK_IFACE_NAME: &str = "lo";

#[derive(
    Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonDisplay,
)]
#[serde(rename_all = "kebab-case")]
#[non_exhaustive]
pub struct MergedRoutes {
    // When all routes next hop to a interface are all marked as absent,
    // the `MergedRoutes.merged` will not have entry for this interface, but
    // interface name is found in `MergedRoutes.route_changed_ifaces`.
    pub merged: BTreeMap<String, Vec<RouteEntry>>,
    pub route_changed_ifaces: Vec<String>,
    // Desired new routes and current routes been marked as absent. Not
    // including desired route equal to current route.
    pub changed_routes: Vec<RouteEntry>,
    pub desired: Routes,
    pub current: Routes,
}

// Whether the next hop interface cannot hold routes of specified family.
fn is_route_blocked(iface: &MergedInterface, is_ipv6: bool) -> bool {
    if iface.is_for_apply()
        && (iface.merged.is_absent() || iface.merged.is_down())
    {
        return true;
    }
    let base_iface = iface.merged.base_iface();
    if is_ipv6 {
        base_iface.ipv6.as_ref().is_some_and(|i| !i.is_enabled())
    } else {
        base_iface.ipv4.as_ref().is_some_and(|i| !i.is_enabled())
    }
}

impl MergedRoutes {
    pub fn new(
        mut desired: Routes,
        mut current: Routes,
        merged_ifaces: &MergedInterfaces,
    ) -> Result<Self, NetstateError> {
        desired.remove_ignored_routes();
        desired.validate()?;
        current.remove_ignored_routes();

        let mut desired_routes = Vec::new();
        for rt in desired.config.as_deref().unwrap_or_default() {
            let mut rt = rt.clone();
            rt.sanitize()?;
            desired_routes.push(rt);
        }

        let mut changed_ifaces: HashSet<String> = HashSet::new();
        let mut changed_routes: HashSet<RouteEntry> = HashSet::new();

        // Interface has route added.
        for rt in desired_routes.iter().filter(|rt| !rt.is_absent()) {
            let Some(via) = rt.next_hop_iface.as_deref() else {
                changed_ifaces.insert(LOOPBACK_IFACE_NAME.to_string());
                continue;
            };
            let Some(iface) = merged_ifaces.kernel_ifaces.get(via) else {
                let e = NetstateError::new(
                    ErrorKind::InvalidArgument,
                    format!(
                        "The next hop interface of desired route '{rt}' \
                         does not exist"
                    ),
                );
                log::error!("{e}");
                return Err(e);
            };
            if is_route_blocked(iface, rt.is_ipv6()) {
                let e = NetstateError::new(
                    ErrorKind::InvalidArgument,
                    format!(
                        "The next hop interface of desired route '{rt}' has \
                         been marked as {} or has IPv{} disabled",
                        iface.merged.iface_state(),
                        if rt.is_ipv6() { 6 } else { 4 }
                    ),
                );
                log::error!("{e}");
                return Err(e);
            }
            changed_ifaces.insert(via.to_string());
        }

        // Interface has route deleted.
        for absent_rt in desired_routes.iter().filter(|rt| rt.is_absent()) {
            for rt in current.config.as_deref().unwrap_or_default() {
                if absent_rt.is_match(rt) {
                    changed_ifaces.insert(
                        rt.next_hop_iface
                            .clone()
                            .unwrap_or_else(|| LOOPBACK_IFACE_NAME.to_string()),
                    );
                }
            }
        }

        let mut merged_routes: Vec<RouteEntry> = Vec::new();

        for rt in current.config.as_deref().unwrap_or_default() {
            let via_blocked = rt.next_hop_iface.as_deref().is_some_and(|via| {
                merged_ifaces
                    .kernel_ifaces
                    .get(via)
                    .is_some_and(|i| is_route_blocked(i, rt.is_ipv6()))
            });
            // Current route is removed when its next hop interface is
            // absent, down or IP disabled, or matches desired absent route.
            if via_blocked
                || desired_routes
                    .iter()
                    .filter(|r| r.is_absent())
                    .any(|absent_rt| absent_rt.is_match(rt))
            {
                let mut new_rt = rt.clone();
                new_rt.state = Some(RouteState::Absent);
                changed_routes.insert(new_rt);
                if via_blocked && let Some(via) = rt.next_hop_iface.as_ref() {
                    changed_ifaces.insert(via.to_string());
                }
            } else if desired_routes
                .iter()
                .any(|des_rt| !des_rt.is_absent() && des_rt == rt)
            {
                // Replaced by desired route which might differ in metric.
                continue;
            } else {
                merged_routes.push(rt.clone());
            }
        }

        // Append desired routes
        let cur_rts = current.config.as_deref().unwrap_or_default();
        for rt in desired_routes.iter().filter(|rt| !rt.is_absent()) {
            if !cur_rts.iter().any(|cur_rt| rt.is_match(cur_rt)) {
                changed_routes.insert(rt.clone());
            }
            merged_routes.push(rt.clone());
        }

        // Routes differ only in metric are treated as duplicate.
        merged_routes.sort();
        merged_routes.dedup();

        let mut merged: BTreeMap<String, Vec<RouteEntry>> = BTreeMap::new();
        for rt in merged_routes {
            let via = rt
                .next_hop_iface
                .clone()
                .unwrap_or_else(|| LOOPBACK_IFACE_NAME.to_string());
            merged.entry(via).or_default().push(rt);
        }

        let mut route_changed_ifaces: Vec<String> =
            changed_ifaces.into_iter().collect();
        route_changed_ifaces.sort_unstable();
        let mut changed_routes: Vec<RouteEntry> =
            changed_routes.into_iter().collect();
        changed_routes.sort_unstable();

        let mut ret = Self {
            merged,
            desired,
            current,
            route_changed_ifaces,
            changed_routes,
        };

        ret.remove_routes_to_ignored_ifaces(merged_ifaces);

        Ok(ret)
    }

    fn remove_routes_to_ignored_ifaces(
        &mut self,
        merged_ifaces: &MergedInterfaces,
    ) {
        let ignored_ifaces: Vec<&str> = merged_ifaces
            .kernel_ifaces
            .values()
            .filter(|i| i.merged.is_ignore())
            .map(|i| i.merged.name())
            .collect();

        for iface in ignored_ifaces.as_slice() {
            self.merged.remove(*iface);
        }
        self.route_changed_ifaces
            .retain(|n| !ignored_ifaces.contains(&n.as_str()));
        self.changed_routes.retain(|rt| {
            rt.next_hop_iface
                .as_deref()
                .is_none_or(|via| !ignored_ifaces.contains(&via))
        });
    }

    pub fn is_changed(&self) -> bool {
        !self.route_changed_ifaces.is_empty()
    }

    /// Routes of specified interface after merge, split into IPv4 and IPv6.
    pub(crate) fn get_routes_of_iface(
        &self,
        iface_name: &str,
    ) -> (Vec<RouteEntry>, Vec<RouteEntry>) {
        self.merged
            .get(iface_name)
            .map(|rts| rts.iter().cloned().partition(|rt| !rt.is_ipv6()))
            .unwrap_or_default()
    }

    pub(crate) fn gen_state_for_apply(&self) -> Routes {
        Routes {
            running: None,
            config: if self.changed_routes.is_empty() {
                None
            } else {
                Some(self.changed_routes.clone())
            },
        }
    }

    pub(crate) fn verify(&self, current: &Routes) -> Result<(), NetstateError> {
        let cur_rts = current.config.as_deref().unwrap_or_default();
        for rt in self.changed_routes.iter() {
            let found = cur_rts.iter().any(|cur_rt| rt.is_match(cur_rt));
            if rt.is_absent() && found {
                let e = NetstateError::new(
                    ErrorKind::VerificationError,
                    format!("Desired absent route {rt} still found"),
                );
                log::error!("{e}");
                return Err(e);
            }
            if !rt.is_absent() && !found {
                let e = NetstateError::new(
                    ErrorKind::VerificationError,
                    format!("Desired route {rt} not found after apply"),
                );
                log::error!("{e}");
                return Err(e);
            }
        }
        Ok(())
    }
}

impl MergedInterfaces {
    /// Store merged routes on IP stack of next hop interfaces whose routes
    /// changed, those interfaces are included in edit plan.
    pub(crate) fn gen_route_metadata(&mut self, merged_routes: &MergedRoutes) {
        for iface_name in merged_routes.route_changed_ifaces.iter() {
            let (ipv4_rts, ipv6_rts) =
                merged_routes.get_routes_of_iface(iface_name);
            let Some(iface) = self.kernel_ifaces.get_mut(iface_name) else {
                continue;
            };
            if iface.merged.is_absent() || iface.merged.is_ignore() {
                continue;
            }
            let base_iface = iface.merged.base_iface_mut();
            if let Some(ipv4) = base_iface.ipv4.as_mut() {
                let metadata = ipv4.metadata_mut();
                metadata.routes = Some(ipv4_rts);
                metadata.routes_changed = true;
            }
            if let Some(ipv6) = base_iface.ipv6.as_mut() {
                let metadata = ipv6.metadata_mut();
                metadata.routes = Some(ipv6_rts);
                metadata.routes_changed = true;
            }
            if !iface.is_desired() && !iface.is_changed() {
                log::debug!(
                    "Including interface {iface_name} in edit plan as its \
                     routes changed"
                );
                iface.mark_as_changed();
                self.insert_order.push((
                    iface_name.to_string(),
                    iface.merged.iface_type().clone(),
                ));
            }
        }
    }
}
