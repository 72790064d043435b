// SPDX-License-Identifier: Apache-2.0

// This file is based on the work of nmstate project(https://nmstate.io/) which
// is under license of Apache 2.0, authors of original file are:
//  * Gris Ge <fge@redhat.com>
//  * Fernando Fernandez Mancera <ffmancera@riseup.net>
//  * Wen Liang <liangwen12year@gmail.com>
//  * Íñigo Huguet <ihuguet@redhat.com>
//  * Quique Llorente <ellorent@redhat.com>

use serde_json::{Map, Value};

use crate::{
    ErrorKind, Interface, InterfaceState, InterfaceType, IpMetadata,
    NetstateError, NetstateInterface,
};

/// Interface holding desired, current and merged state.
///
/// The `merged` interface carries the internal metadata (controller
/// pointer, port configuration, routes, route rules and DNS) generated
/// during planning.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[non_exhaustive]
pub struct MergedInterface {
    pub desired: Option<Interface>,
    pub current: Option<Interface>,
    pub merged: Interface,
    pub(crate) for_apply: Option<Interface>,
    pub(crate) for_verify: Option<Interface>,
    changed: bool,
}

impl MergedInterface {
    pub(crate) fn new(
        desired: Option<Interface>,
        current: Option<Interface>,
    ) -> Result<Self, NetstateError> {
        let merged = match (&desired, &current) {
            (Some(desired), Some(current)) => current.merge(desired)?,
            (Some(state), None) | (None, Some(state)) => state.clone(),
            (None, None) => {
                return Err(NetstateError::new(
                    ErrorKind::Bug,
                    "MergedInterface::new() got both desired and current \
                     set to None"
                        .to_string(),
                ));
            }
        };
        Ok(Self {
            for_verify: desired.clone(),
            desired,
            current,
            merged,
            for_apply: None,
            changed: false,
        })
    }

    pub fn is_desired(&self) -> bool {
        self.desired.is_some()
    }

    /// Not desired but changed due to other interface.
    pub fn is_changed(&self) -> bool {
        self.changed
    }

    /// Whether this interface should be included in edit plan.
    pub fn is_for_apply(&self) -> bool {
        (self.is_desired() || self.is_changed()) && !self.merged.is_ignore()
    }

    pub(crate) fn mark_as_changed(&mut self) {
        self.changed = true;
    }

    pub(crate) fn mark_as_absent(&mut self) {
        self.mark_as_changed();
        self.merged.base_iface_mut().state = InterfaceState::Absent;
        if let Some(verify_iface) = self.for_verify.as_mut() {
            verify_iface.base_iface_mut().state = InterfaceState::Absent;
        }
    }

    pub fn hide_secrets(&mut self) {
        for iface in [
            self.desired.as_mut(),
            self.current.as_mut(),
            Some(&mut self.merged),
            self.for_apply.as_mut(),
            self.for_verify.as_mut(),
        ]
        .into_iter()
        .flatten()
        {
            iface.hide_secrets();
        }
    }

    /// Attach to or detach from(empty `ctrl_name`) specified controller.
    pub(crate) fn apply_ctrller_change(
        &mut self,
        ctrl_name: String,
        ctrl_type: Option<InterfaceType>,
        ctrl_is_up: bool,
    ) -> Result<(), NetstateError> {
        // Some interface cannot live without controller
        if self.merged.base_iface().need_controller() && ctrl_name.is_empty()
        {
            if let Some(org_ctrl) = self
                .current
                .as_ref()
                .and_then(|c| c.base_iface().controller.as_deref())
                .filter(|c| !c.is_empty())
            {
                if self.is_desired() && self.merged.is_up() {
                    let e = NetstateError::new(
                        ErrorKind::InvalidArgument,
                        format!(
                            "Interface {} cannot live without controller, \
                             but it is detached from original controller \
                             {org_ctrl}, cannot apply desired `state: up`",
                            self.merged.name()
                        ),
                    );
                    log::error!("{e}");
                    return Err(e);
                }
                log::info!(
                    "Interface {} cannot live without controller, marking \
                     as absent as it has been detached from its original \
                     controller {org_ctrl}",
                    self.merged.name(),
                );
            }
            self.mark_as_absent();
            return Ok(());
        }

        if !self.is_desired() {
            self.mark_as_changed();
            if ctrl_is_up && !ctrl_name.is_empty() && !self.merged.is_up() {
                log::info!(
                    "Bringing up interface {} as its controller {ctrl_name} \
                     is up",
                    self.merged.name()
                );
                self.merged.base_iface_mut().state = InterfaceState::Up;
            }
        }

        let base_iface = self.merged.base_iface_mut();
        if ctrl_name.is_empty() {
            log::debug!(
                "Detaching interface {}/{} from its controller",
                base_iface.name,
                base_iface.iface_type
            );
            base_iface.controller = Some(String::new());
            base_iface.controller_type = None;
            base_iface.port_config = None;
        } else {
            log::debug!(
                "Changing controller of interface {}/{} to {ctrl_name}/{}",
                base_iface.name,
                base_iface.iface_type,
                ctrl_type.as_ref().map(|t| t.to_string()).unwrap_or_default()
            );
            base_iface.controller = Some(ctrl_name);
            base_iface.controller_type = ctrl_type;
            if !base_iface.can_have_ip() {
                base_iface.disable_ip();
            }
        }
        Ok(())
    }

    /// Generate the interface for edit plan from merged state.
    /// Absent interface only holds its name, type and state.
    pub(crate) fn gen_for_apply(&mut self) {
        self.for_apply = if self.is_for_apply() {
            if self.merged.is_absent() {
                let mut iface = self.merged.clone_name_type_only();
                iface.base_iface_mut().state = InterfaceState::Absent;
                Some(iface)
            } else {
                Some(self.merged.clone())
            }
        } else {
            None
        };
    }

    /// The interface of edit plan in JSON with internal metadata included
    /// as underscore prefixed keys.
    pub fn metadata_value(&self) -> Result<Value, NetstateError> {
        let iface = self.for_apply.as_ref().unwrap_or(&self.merged);
        let mut value = serde_json::to_value(iface)?;
        let Some(obj) = value.as_object_mut() else {
            return Ok(value);
        };
        let base_iface = iface.base_iface();
        if let Some(ctrl) =
            base_iface.controller.as_deref().filter(|c| !c.is_empty())
        {
            obj.insert("_controller".to_string(), Value::from(ctrl));
            if let Some(ctrl_type) = base_iface.controller_type.as_ref() {
                obj.insert(
                    "_controller_type".to_string(),
                    serde_json::to_value(ctrl_type)?,
                );
            }
        }
        if let Some(port_conf) = base_iface.port_config.as_ref() {
            obj.insert("_brport_options".to_string(), port_conf.clone());
        }
        for (family, metadata) in [
            ("ipv4", base_iface.ipv4.as_ref().map(|i| i.metadata())),
            ("ipv6", base_iface.ipv6.as_ref().map(|i| i.metadata())),
        ] {
            if let Some(metadata) = metadata.filter(|m| !m.is_empty())
                && let Some(ip_obj) =
                    obj.get_mut(family).and_then(|v| v.as_object_mut())
            {
                insert_ip_metadata(ip_obj, metadata)?;
            }
        }
        if let Interface::Ethernet(eth_iface) = iface
            && eth_iface.is_veth_peer()
        {
            obj.insert("_is_veth_peer".to_string(), Value::Bool(true));
        }
        if let Interface::Ethernet(eth_iface) = iface
            && let Some(vfs) = eth_iface
                .ethernet
                .as_ref()
                .and_then(|e| e.sr_iov.as_ref())
                .and_then(|s| s.vfs.as_ref())
            && let Some(vf_values) = obj
                .get_mut("ethernet")
                .and_then(|v| v.get_mut("sr-iov"))
                .and_then(|v| v.get_mut("vfs"))
                .and_then(|v| v.as_array_mut())
        {
            for (vf, vf_value) in vfs.iter().zip(vf_values.iter_mut()) {
                if let Some(vf_iface_name) = vf.vf_iface_name.as_deref()
                    && let Some(vf_obj) = vf_value.as_object_mut()
                {
                    vf_obj.insert(
                        "_vf_iface_name".to_string(),
                        Value::from(vf_iface_name),
                    );
                }
            }
        }
        Ok(value)
    }
}

fn insert_ip_metadata(
    ip_obj: &mut Map<String, Value>,
    metadata: &IpMetadata,
) -> Result<(), NetstateError> {
    if let Some(routes) = metadata.routes.as_ref() {
        ip_obj.insert("_routes".to_string(), serde_json::to_value(routes)?);
    }
    if let Some(rules) = metadata.route_rules.as_ref() {
        ip_obj
            .insert("_route_rules".to_string(), serde_json::to_value(rules)?);
    }
    if let Some(dns) = metadata.dns.as_ref() {
        ip_obj.insert("_dns".to_string(), serde_json::to_value(dns)?);
    }
    if metadata.routes_changed || metadata.rules_changed {
        ip_obj.insert(
            "_changed".to_string(),
            serde_json::json!({
                "routes": metadata.routes_changed,
                "route-rules": metadata.rules_changed,
            }),
        );
    }
    Ok(())
}
