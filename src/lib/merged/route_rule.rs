// SPDX-License-Identifier: Apache-2.0

// This file is based on the work of nmstate project(https://nmstate.io/) which
// is under license of Apache 2.0, authors of original file are:
//  * Gris Ge <fge@redhat.com>
//  * Fernando Fernandez Mancera <ffmancera@riseup.net>
//  * Wen Liang <liangwen12year@gmail.com>

use std::collections::{BTreeMap, HashSet};

use crate::{
    ErrorKind, Interface, MergedInterfaces, MergedRoutes, NetstateError,
    NetstateInterface, RouteRuleEntry, RouteRuleState, RouteRules,
};

const LOOPBACK_IFACE_NAME: &str = "lo";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[non_exhaustive]
pub struct MergedRouteRules {
    pub desired: RouteRules,
    pub current: RouteRules,
    /// Route rules after merge, with priority resolved.
    pub merged: Vec<RouteRuleEntry>,
    // Desired route rules not found in current and current route rules
    // been marked as absent.
    pub for_apply: Vec<RouteRuleEntry>,
}

impl MergedRouteRules {
    /// First priority assigned to route rule without priority defined.
    pub const AUTO_PRIORITY_START: i64 = 30000;

    pub fn new(
        desired: RouteRules,
        current: RouteRules,
        merged_ifaces: &MergedInterfaces,
        merged_routes: &MergedRoutes,
    ) -> Result<Self, NetstateError> {
        let mut des_rules: Vec<RouteRuleEntry> = Vec::new();
        for rule in desired.config.as_deref().unwrap_or_default() {
            let mut rule = rule.clone();
            rule.sanitize()?;
            des_rules.push(rule);
        }
        let (des_absent_rules, des_rules): (Vec<_>, Vec<_>) =
            des_rules.into_iter().partition(|r| r.is_absent());

        let tables_with_routes = get_tables_with_routes(merged_ifaces);

        for rule in des_rules.iter() {
            if !is_table_valid(rule, &tables_with_routes, merged_routes) {
                let e = NetstateError::new(
                    ErrorKind::InvalidArgument,
                    format!(
                        "Route rule {rule} is pointing to route table {} \
                         which has no route defined",
                        rule.table_id_or_default()
                    ),
                );
                log::error!("{e}");
                return Err(e);
            }
            if let Some(iif) = rule.iif.as_deref()
                && !merged_ifaces.kernel_ifaces.contains_key(iif)
            {
                let e = NetstateError::new(
                    ErrorKind::InvalidArgument,
                    format!(
                        "The interface {iif} required by route rule {rule} \
                         does not exist"
                    ),
                );
                log::error!("{e}");
                return Err(e);
            }
        }

        let mut merged: Vec<RouteRuleEntry> = Vec::new();
        let mut for_apply: Vec<RouteRuleEntry> = Vec::new();

        for rule in current.config.as_deref().unwrap_or_default() {
            let mut rule = rule.clone();
            rule.state = None;
            if des_absent_rules.iter().any(|r| r.is_match(&rule)) {
                rule.state = Some(RouteRuleState::Absent);
                for_apply.push(rule);
            } else if is_table_valid(&rule, &tables_with_routes, merged_routes)
            {
                merged.push(rule);
            } else {
                log::debug!(
                    "Discarding current route rule {rule} as its route \
                     table has no route"
                );
            }
        }

        let mut used_priorities: HashSet<i64> = merged
            .iter()
            .chain(des_rules.iter())
            .filter_map(|r| r.priority)
            .filter(|p| *p != RouteRuleEntry::USE_DEFAULT_PRIORITY)
            .collect();
        let mut next_priority = Self::AUTO_PRIORITY_START;

        for mut rule in des_rules {
            if !rule.has_priority() {
                // Reuse the priority of current rule for idempotence.
                if let Some(cur_rule) = merged.iter().find(|r| rule.is_match(r))
                {
                    rule.priority = cur_rule.priority;
                } else {
                    while used_priorities.contains(&next_priority) {
                        next_priority += 1;
                    }
                    log::debug!(
                        "Assigning priority {next_priority} to route rule \
                         {rule}"
                    );
                    rule.priority = Some(next_priority);
                    used_priorities.insert(next_priority);
                }
            }
            if !merged.iter().any(|r| rule.is_match(r)) {
                for_apply.push(rule.clone());
                merged.push(rule);
            }
        }
        merged.sort_unstable();
        for_apply.sort_unstable();

        Ok(Self {
            desired,
            current,
            merged,
            for_apply,
        })
    }

    pub fn is_changed(&self) -> bool {
        !self.for_apply.is_empty()
    }

    pub(crate) fn remove_rules_to_ignored_ifaces(
        &mut self,
        merged_ifaces: &MergedInterfaces,
    ) {
        let is_ignored = |rule: &RouteRuleEntry| {
            rule.iif.as_deref().is_some_and(|iif| {
                merged_ifaces
                    .kernel_ifaces
                    .get(iif)
                    .is_some_and(|i| i.merged.is_ignore())
            })
        };
        self.merged.retain(|r| !is_ignored(r));
        self.for_apply.retain(|r| !is_ignored(r));
    }

    pub(crate) fn gen_state_for_apply(&self) -> RouteRules {
        RouteRules {
            config: if self.for_apply.is_empty() {
                None
            } else {
                Some(self.for_apply.clone())
            },
        }
    }

    pub(crate) fn verify(
        &self,
        current: &RouteRules,
    ) -> Result<(), NetstateError> {
        let cur_rules = current.config.as_deref().unwrap_or_default();
        for rule in self.for_apply.iter() {
            let found = cur_rules.iter().any(|cur| rule.is_match(cur));
            if rule.is_absent() && found {
                let e = NetstateError::new(
                    ErrorKind::VerificationError,
                    format!("Desired absent route rule {rule} still found"),
                );
                log::error!("{e}");
                return Err(e);
            }
            if !rule.is_absent() && !found {
                let e = NetstateError::new(
                    ErrorKind::VerificationError,
                    format!("Desired route rule {rule} not found after apply"),
                );
                log::error!("{e}");
                return Err(e);
            }
        }
        Ok(())
    }
}

// Route table used by VRF or automatic routes of dynamic IP.
fn get_tables_with_routes(merged_ifaces: &MergedInterfaces) -> HashSet<u32> {
    let mut ret = HashSet::new();
    for iface in merged_ifaces
        .kernel_ifaces
        .values()
        .map(|i| &i.merged)
        .filter(|i| !i.is_absent())
    {
        if let Interface::Vrf(vrf_iface) = iface
            && let Some(table_id) = vrf_iface.table_id()
        {
            ret.insert(table_id);
        }
        let base_iface = iface.base_iface();
        if let Some(table_id) = base_iface
            .ipv4
            .as_ref()
            .filter(|i| i.is_auto())
            .and_then(|i| i.auto_table_id)
        {
            ret.insert(table_id);
        }
        if let Some(table_id) = base_iface
            .ipv6
            .as_ref()
            .filter(|i| i.is_auto())
            .and_then(|i| i.auto_table_id)
        {
            ret.insert(table_id);
        }
    }
    ret
}

fn is_table_valid(
    rule: &RouteRuleEntry,
    tables_with_routes: &HashSet<u32>,
    merged_routes: &MergedRoutes,
) -> bool {
    let table_id = rule.table_id_or_default();
    rule.action.is_some()
        || table_id == RouteRuleEntry::DEFAULT_ROUTE_TABLE_ID
        || tables_with_routes.contains(&table_id)
        || merged_routes
            .merged
            .values()
            .flatten()
            .any(|rt| rt.table_id_or_default() == table_id)
}

impl MergedInterfaces {
    // Each route rule is stored on the IP stack of interface:
    //  * Defined in `iif`.
    //  * Holding route in the route table of this rule.
    //  * VRF or dynamic IP interface using the route table.
    //  * First desired interface with the IP stack enabled.
    fn find_iface_for_rule(
        &self,
        rule: &RouteRuleEntry,
        merged_routes: &MergedRoutes,
    ) -> String {
        if let Some(iif) = rule.iif.as_deref() {
            return iif.to_string();
        }
        let table_id = rule.table_id_or_default();
        let is_ipv6 = rule.is_ipv6();

        // BTreeMap is sorted by interface name
        for (iface_name, rts) in merged_routes.merged.iter() {
            if rts.iter().any(|rt| {
                rt.is_ipv6() == is_ipv6 && rt.table_id_or_default() == table_id
            }) {
                return iface_name.to_string();
            }
        }

        let mut iface_names: Vec<&str> = self
            .kernel_ifaces
            .values()
            .filter(|i| !i.merged.is_absent())
            .filter(|i| {
                let base_iface = i.merged.base_iface();
                let auto_table_id = if is_ipv6 {
                    base_iface.ipv6.as_ref().and_then(|i| i.auto_table_id)
                } else {
                    base_iface.ipv4.as_ref().and_then(|i| i.auto_table_id)
                };
                auto_table_id == Some(table_id)
                    || matches!(&i.merged, Interface::Vrf(v)
                        if v.table_id() == Some(table_id))
            })
            .map(|i| i.merged.name())
            .collect();
        iface_names.sort_unstable();
        if let Some(iface_name) = iface_names.first() {
            return iface_name.to_string();
        }

        for (iface_name, iface_type) in self.insert_order.iter() {
            if let Some(iface) = self.get_iface(iface_name, iface_type)
                && iface.is_desired()
                && !iface.merged.is_absent()
                && !iface.merged.iface_type().is_userspace()
                && if is_ipv6 {
                    iface.merged.base_iface().is_ipv6_enabled()
                } else {
                    iface.merged.base_iface().is_ipv4_enabled()
                }
            {
                return iface_name.to_string();
            }
        }
        log::info!("Using loopback interface to store route rule {rule}");
        LOOPBACK_IFACE_NAME.to_string()
    }

    /// Store route rules on IP stack of the interface holding the route
    /// table, those interfaces are included in edit plan.
    pub(crate) fn gen_route_rule_metadata(
        &mut self,
        merged_rules: &MergedRouteRules,
        merged_routes: &MergedRoutes,
    ) {
        if !merged_rules.is_changed() {
            return;
        }
        // (iface_name, is_ipv6) -> rules
        let mut iface_rules: BTreeMap<(String, bool), Vec<RouteRuleEntry>> =
            BTreeMap::new();
        for rule in merged_rules.merged.iter() {
            iface_rules
                .entry((
                    self.find_iface_for_rule(rule, merged_routes),
                    rule.is_ipv6(),
                ))
                .or_default()
                .push(rule.clone());
        }
        let mut changed_ifaces: Vec<(String, bool)> = Vec::new();
        for rule in merged_rules.for_apply.iter() {
            let key = (
                self.find_iface_for_rule(rule, merged_routes),
                rule.is_ipv6(),
            );
            if !changed_ifaces.contains(&key) {
                changed_ifaces.push(key);
            }
        }

        for (iface_name, is_ipv6) in changed_ifaces {
            let rules = iface_rules
                .remove(&(iface_name.clone(), is_ipv6))
                .unwrap_or_default();
            let Some(iface) = self.kernel_ifaces.get_mut(&iface_name) else {
                log::debug!(
                    "Interface {iface_name} holding route rules not found"
                );
                continue;
            };
            if iface.merged.is_absent() || iface.merged.is_ignore() {
                continue;
            }
            let base_iface = iface.merged.base_iface_mut();
            let metadata = if is_ipv6 {
                base_iface.ipv6.as_mut().map(|i| i.metadata_mut())
            } else {
                base_iface.ipv4.as_mut().map(|i| i.metadata_mut())
            };
            let Some(metadata) = metadata else {
                continue;
            };
            metadata.route_rules = Some(rules);
            metadata.rules_changed = true;
            if !iface.is_desired() && !iface.is_changed() {
                log::debug!(
                    "Including interface {iface_name} in edit plan as its \
                     route rules changed"
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
