// SPDX-License-Identifier: Apache-2.0

use crate::{
    Interfaces, MergedDns, MergedHostNameState, MergedInterfaces,
    MergedOvsDbGlobalConfig, MergedRouteRules, MergedRoutes,
    NetstateApplyOption, NetstateError, NetworkState,
};

/// Reconciliation result of desired and current [NetworkState].
///
/// Use [MergedNetworkState::gen_state_for_apply()] for the edit plan and
/// [MergedNetworkState::verify()] to check post-apply state.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[non_exhaustive]
pub struct MergedNetworkState {
    pub version: Option<u32>,
    pub description: Option<String>,
    pub ifaces: MergedInterfaces,
    pub routes: MergedRoutes,
    pub rules: MergedRouteRules,
    pub dns: MergedDns,
    pub hostname: MergedHostNameState,
    pub ovsdb: MergedOvsDbGlobalConfig,
    pub option: NetstateApplyOption,
}

impl MergedNetworkState {
    pub fn new(
        desired: NetworkState,
        current: NetworkState,
        option: NetstateApplyOption,
    ) -> Result<Self, NetstateError> {
        desired.validate_version()?;
        let mut desired = desired;
        let mut current = current;
        if option.kernel_only {
            remove_user_ifaces(&mut desired.ifaces);
            remove_user_ifaces(&mut current.ifaces);
            if desired.ovsdb.take().is_some() {
                log::warn!("Ignoring ovs-db section in kernel only mode");
            }
        }

        let mut ifaces = MergedInterfaces::new(
            desired.ifaces,
            current.ifaces,
            option.gen_conf_mode,
        )?;
        let routes =
            MergedRoutes::new(desired.routes, current.routes, &ifaces)?;
        let mut rules = MergedRouteRules::new(
            desired.rules,
            current.rules,
            &ifaces,
            &routes,
        )?;
        rules.remove_rules_to_ignored_ifaces(&ifaces);
        let dns = MergedDns::new(
            desired.dns.unwrap_or_default(),
            current.dns.unwrap_or_default(),
        )?;

        ifaces.gen_route_metadata(&routes);
        ifaces.gen_route_rule_metadata(&rules, &routes);
        ifaces.gen_dns_metadata(&dns, &routes)?;
        ifaces.finalize()?;

        let hostname =
            MergedHostNameState::new(desired.hostname, current.hostname);
        let ovsdb = MergedOvsDbGlobalConfig::new(
            desired.ovsdb,
            current.ovsdb.unwrap_or_default(),
        );

        Ok(Self {
            version: desired.version,
            description: desired.description,
            ifaces,
            routes,
            rules,
            dns,
            hostname,
            ovsdb,
            option,
        })
    }

    /// Whether anything needs to be applied.
    pub fn is_changed(&self) -> bool {
        !self.ifaces.ifaces_for_apply().is_empty()
            || self.routes.is_changed()
            || self.rules.is_changed()
            || self.dns.is_changed()
            || self.hostname.is_changed()
            || self.ovsdb.is_changed()
    }

    /// Compare post-apply state against the desired state.
    pub fn verify(&self, current: &NetworkState) -> Result<(), NetstateError> {
        self.hostname.verify(current.hostname.as_ref())?;
        self.ifaces.verify(&current.ifaces)?;
        self.routes.verify(&current.routes)?;
        self.rules.verify(&current.rules)?;
        self.dns.verify(&current.dns.clone().unwrap_or_default())?;
        self.ovsdb.verify(&current.ovsdb.clone().unwrap_or_default())
    }

    /// The edit plan.
    pub fn gen_state_for_apply(&self) -> NetworkState {
        NetworkState {
            version: self.version,
            description: self.description.clone(),
            hostname: if self.hostname.is_changed() {
                self.hostname.desired.clone()
            } else {
                None
            },
            dns: self.dns.gen_state_for_apply(),
            rules: self.rules.gen_state_for_apply(),
            routes: self.routes.gen_state_for_apply(),
            ifaces: self.ifaces.gen_state_for_apply(),
            ovsdb: if self.ovsdb.is_changed() {
                Some(self.ovsdb.merged.clone())
            } else {
                None
            },
        }
    }

    pub fn hide_secrets(&mut self) {
        self.ifaces.hide_secrets()
    }
}

fn remove_user_ifaces(ifaces: &mut Interfaces) {
    for (iface_name, iface_type) in ifaces.user_ifaces.keys() {
        log::debug!(
            "Ignoring user space interface {iface_name}/{iface_type} in \
             kernel only mode"
        );
    }
    ifaces.user_ifaces.clear();
}
