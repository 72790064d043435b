// SPDX-License-Identifier: Apache-2.0

// This file is based on the work of nmstate project(https://nmstate.io/) which
// is under license of Apache 2.0, authors of original file are:
//  * Gris Ge <fge@redhat.com>
//  * Fernando Fernandez Mancera <ffmancera@riseup.net>
//  * Ales Musil <amusil@redhat.com>

use std::collections::HashMap;

use crate::{
    ErrorKind, Interface, InterfaceType, Interfaces, MergedInterface,
    NetstateError, NetstateInterface,
};

// The max loop count for MergedInterfaces.set_ifaces_up_priority()
// This allows interface with 4 nested levels in any order.
const INTERFACES_SET_PRIORITY_MAX_RETRY: u32 = 4;

/// Interfaces holding desired, current and merged state.
///
/// Building it runs the whole reconciliation of interfaces: type
/// resolution, merging, controller and parent handling, validation and
/// cleanup. The edit plan is generated by
/// [MergedInterfaces::gen_state_for_apply()].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[non_exhaustive]
pub struct MergedInterfaces {
    pub kernel_ifaces: HashMap<String, MergedInterface>,
    pub user_ifaces: HashMap<(String, InterfaceType), MergedInterface>,
    pub insert_order: Vec<(String, InterfaceType)>,
    pub(crate) gen_conf_mode: bool,
}

impl MergedInterfaces {
    pub fn hide_secrets(&mut self) {
        for merged_iface in self.iter_mut() {
            merged_iface.hide_secrets()
        }
    }

    pub(crate) fn new(
        desired: Interfaces,
        current: Interfaces,
        gen_conf_mode: bool,
    ) -> Result<Self, NetstateError> {
        let mut desired = desired;
        let mut current = current;
        let mut ret = Self {
            gen_conf_mode,
            ..Default::default()
        };

        let mut des_ifaces: Vec<Interface> = desired.drain().collect();
        des_ifaces.sort_unstable_by(|a, b| {
            (a.name(), a.iface_type()).cmp(&(b.name(), b.iface_type()))
        });

        for des_iface in des_ifaces {
            let Some(mut des_iface) =
                ret.resolve_iface_type(des_iface, &current)?
            else {
                continue;
            };
            let cur_iface = ret.take_current(&des_iface, &mut current);
            if des_iface.is_ignore() {
                log::info!(
                    "Ignoring interface {}/{} for `state: ignore`",
                    des_iface.name(),
                    des_iface.iface_type()
                );
                if let Some(cur_iface) = cur_iface {
                    let mut merged_iface =
                        MergedInterface::new(None, Some(cur_iface))?;
                    merged_iface.merged.base_iface_mut().state =
                        des_iface.iface_state();
                    ret.insert(merged_iface);
                }
                continue;
            }
            des_iface.sanitize(cur_iface.as_ref())?;
            ret.insert_order.push((
                des_iface.name().to_string(),
                des_iface.iface_type().clone(),
            ));
            ret.insert(MergedInterface::new(Some(des_iface), cur_iface)?);
        }

        for cur_iface in current.drain() {
            ret.insert(MergedInterface::new(None, Some(cur_iface))?);
        }

        ret.create_ovs_internal_ports()?;
        ret.shrink_sriov_vfs();
        ret.validate_unknown_ports()?;
        ret.validate_unknown_parents()?;
        ret.check_infiniband_as_ports()?;
        ret.apply_copy_mac_from()?;
        ret.validate_controller_and_port_list_confliction()?;
        ret.handle_changed_ports()?;
        ret.pre_edit_cleanup()?;
        ret.check_overbook_ports()?;
        ret.validate_child_over_parent()?;
        ret.apply_parent_state_to_children()?;
        ret.bring_ports_up();
        ret.validate_ovs_patch_peers()?;
        ret.handle_veth()?;
        ret.resolve_port_iface_controller_type();
        ret.validate_port_ip()?;
        ret.gen_port_metadata()?;
        ret.gen_sriov_metadata();

        Ok(ret)
    }

    // Interface without type defined in desired state takes the type from
    // current. Return None if this interface should be ignored.
    fn resolve_iface_type(
        &self,
        des_iface: Interface,
        current: &Interfaces,
    ) -> Result<Option<Interface>, NetstateError> {
        if !des_iface.iface_type().is_unknown() {
            return Ok(Some(des_iface));
        }
        let cur_types: Vec<&InterfaceType> = current
            .kernel_ifaces
            .get(des_iface.name())
            .into_iter()
            .chain(
                current
                    .user_ifaces
                    .values()
                    .filter(|i| i.name() == des_iface.name()),
            )
            .map(|i| i.iface_type())
            .collect();

        match cur_types.as_slice() {
            [cur_type] => {
                log::debug!(
                    "Using interface type {cur_type} of current state for \
                     desired interface {}",
                    des_iface.name()
                );
                Ok(Some(des_iface.with_iface_type(cur_type)?))
            }
            [] => {
                if self.gen_conf_mode {
                    log::debug!(
                        "Treating interface {} without type as ethernet",
                        des_iface.name()
                    );
                    Ok(Some(
                        des_iface.with_iface_type(&InterfaceType::Ethernet)?,
                    ))
                } else if des_iface.is_absent() || des_iface.is_ignore() {
                    log::debug!(
                        "Dropping desired interface {} without type as it \
                         does not exist in current state",
                        des_iface.name()
                    );
                    Ok(None)
                } else {
                    let e = NetstateError::new(
                        ErrorKind::InvalidArgument,
                        format!(
                            "Interface {} has no type defined neither in \
                             desired state nor current state",
                            des_iface.name()
                        ),
                    );
                    log::error!("{e}");
                    Err(e)
                }
            }
            _ => {
                let e = NetstateError::new(
                    ErrorKind::InvalidArgument,
                    format!(
                        "Interface {} has no type defined while multiple \
                         interfaces in current state are sharing this name: \
                         {}, please define the interface type",
                        des_iface.name(),
                        cur_types
                            .iter()
                            .map(|t| t.to_string())
                            .collect::<Vec<String>>()
                            .join(", ")
                    ),
                );
                log::error!("{e}");
                Err(e)
            }
        }
    }

    // Kernel interface changing its type is not merged with current.
    fn take_current(
        &self,
        des_iface: &Interface,
        current: &mut Interfaces,
    ) -> Option<Interface> {
        if des_iface.is_userspace() {
            return current
                .remove(des_iface.name(), Some(des_iface.iface_type()));
        }
        let cur_iface = current.remove(des_iface.name(), None)?;
        if cur_iface.iface_type() == des_iface.iface_type() {
            Some(cur_iface)
        } else {
            log::info!(
                "Interface {} is changing type from {} to {}",
                des_iface.name(),
                cur_iface.iface_type(),
                des_iface.iface_type()
            );
            None
        }
    }

    pub(crate) fn insert(&mut self, merged_iface: MergedInterface) {
        if merged_iface.merged.is_userspace() {
            self.user_ifaces.insert(
                (
                    merged_iface.merged.name().to_string(),
                    merged_iface.merged.iface_type().clone(),
                ),
                merged_iface,
            );
        } else {
            self.kernel_ifaces
                .insert(merged_iface.merged.name().to_string(), merged_iface);
        }
    }

    pub fn get_iface<'a>(
        &'a self,
        iface_name: &str,
        iface_type: &InterfaceType,
    ) -> Option<&'a MergedInterface> {
        if iface_type.is_userspace() {
            self.user_ifaces
                .get(&(iface_name.to_string(), iface_type.clone()))
        } else {
            self.kernel_ifaces.get(iface_name)
        }
    }

    pub(crate) fn get_iface_mut<'a>(
        &'a mut self,
        iface_name: &str,
        iface_type: &InterfaceType,
    ) -> Option<&'a mut MergedInterface> {
        if iface_type.is_userspace() {
            self.user_ifaces
                .get_mut(&(iface_name.to_string(), iface_type.clone()))
        } else {
            self.kernel_ifaces.get_mut(iface_name)
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &MergedInterface> {
        self.user_ifaces.values().chain(self.kernel_ifaces.values())
    }

    pub(crate) fn iter_mut(
        &mut self,
    ) -> impl Iterator<Item = &mut MergedInterface> {
        self.user_ifaces
            .values_mut()
            .chain(self.kernel_ifaces.values_mut())
    }

    fn pre_edit_cleanup(&mut self) -> Result<(), NetstateError> {
        for iface in self
            .iter_mut()
            .filter(|i| i.is_desired() && i.merged.is_up())
        {
            iface.merged.pre_edit_cleanup(iface.current.as_ref())?;
        }
        Ok(())
    }

    /// Generate the edit plan of each interface and the up priority.
    /// Should be invoked after all routes, route rules and DNS metadata
    /// been attached.
    pub(crate) fn finalize(&mut self) -> Result<(), NetstateError> {
        for iface in self.iter_mut() {
            iface.gen_for_apply();
        }
        self.remove_absent_non_exist_ifaces();
        self.set_up_priority()
    }

    fn set_up_priority(&mut self) -> Result<(), NetstateError> {
        for _ in 0..INTERFACES_SET_PRIORITY_MAX_RETRY {
            if self.set_ifaces_up_priority() {
                return Ok(());
            }
        }
        let e = NetstateError::new(
            ErrorKind::InvalidArgument,
            "Failed to set up priority: only support nested interface up \
             to 4 levels. To support more nest level, please order the \
             interfaces in desired state to place controller before its \
             ports"
                .to_string(),
        );
        log::error!("{e}");
        Err(e)
    }

    // Return true if we have all up_priority fixed.
    pub(crate) fn set_ifaces_up_priority(&mut self) -> bool {
        let mut ret = true;
        let mut pending_changes: HashMap<String, u32> = HashMap::new();
        // Use the insert order to allow user providing help on dependency
        // order
        for (iface_name, iface_type) in &self.insert_order {
            let Some(iface) = self
                .get_iface(iface_name, iface_type)
                .and_then(|i| i.for_apply.as_ref())
            else {
                continue;
            };
            if !iface.is_up() || iface.base_iface().is_up_priority_valid() {
                continue;
            }
            let Some(ctrl_name) = iface
                .base_iface()
                .controller
                .as_deref()
                .filter(|c| !c.is_empty())
            else {
                continue;
            };
            let Some(ctrl_iface) = self
                .get_controller(
                    ctrl_name,
                    iface.base_iface().controller_type.as_ref(),
                )
                .and_then(|i| i.for_apply.as_ref())
            else {
                // Controller is not included in edit plan
                continue;
            };
            if let Some(ctrl_pri) = pending_changes.get(ctrl_name).copied() {
                pending_changes.insert(iface_name.to_string(), ctrl_pri + 1);
            } else if ctrl_iface.base_iface().is_up_priority_valid() {
                pending_changes.insert(
                    iface_name.to_string(),
                    ctrl_iface.base_iface().up_priority + 1,
                );
            } else {
                log::debug!(
                    "Controller {ctrl_name} of {iface_name} has no up \
                     priority yet"
                );
                ret = false;
            }
        }

        // All controllers done, children should be activated after their
        // parents.
        if ret {
            for (iface_name, iface_type) in &self.insert_order {
                let Some(iface) = self
                    .get_iface(iface_name, iface_type)
                    .and_then(|i| i.for_apply.as_ref())
                else {
                    continue;
                };
                if !iface.is_up() || iface.base_iface().has_controller() {
                    continue;
                }
                let Some(parent) = iface.parent() else {
                    continue;
                };
                if let Some(parent_pri) = pending_changes.get(parent).copied()
                {
                    pending_changes
                        .insert(iface_name.to_string(), parent_pri + 1);
                } else if let Some(parent_iface) = self
                    .kernel_ifaces
                    .get(parent)
                    .and_then(|i| i.for_apply.as_ref())
                    && parent_iface.base_iface().up_priority != 0
                {
                    pending_changes.insert(
                        iface_name.to_string(),
                        parent_iface.base_iface().up_priority + 1,
                    );
                }
            }
        }

        if !pending_changes.is_empty() {
            log::debug!("Pending up priority changes {pending_changes:?}");
            for (iface_name, priority) in pending_changes.iter() {
                if let Some(iface) = self
                    .kernel_ifaces
                    .get_mut(iface_name)
                    .and_then(|i| i.for_apply.as_mut())
                {
                    iface.base_iface_mut().up_priority = *priority;
                }
            }
        }

        ret
    }

    /// Interfaces to apply, sorted by up priority and then by name.
    pub fn gen_state_for_apply(&self) -> Interfaces {
        let mut ret = Interfaces::default();
        for iface in self.iter().filter_map(|i| i.for_apply.as_ref()) {
            ret.push(iface.clone());
        }
        ret
    }

    /// [MergedInterface] included in edit plan sorted the same way as
    /// [Interfaces::to_vec()].
    pub fn ifaces_for_apply(&self) -> Vec<&MergedInterface> {
        let mut ret: Vec<&MergedInterface> =
            self.iter().filter(|i| i.for_apply.is_some()).collect();
        ret.sort_unstable_by(|a, b| {
            (a.merged.name(), a.merged.iface_type())
                .cmp(&(b.merged.name(), b.merged.iface_type()))
        });
        ret.sort_by_key(|i| {
            i.for_apply
                .as_ref()
                .map(|i| i.base_iface().up_priority)
                .unwrap_or_default()
        });
        ret
    }

    pub(crate) fn verify(
        &self,
        current: &Interfaces,
    ) -> Result<(), NetstateError> {
        let mut merged = self.clone();
        let mut current = current.clone();

        // Ignored interfaces are not verified on both sides.
        for iface in self.iter().filter(|i| i.merged.is_ignore()) {
            current
                .remove(iface.merged.name(), Some(iface.merged.iface_type()));
        }

        for des_iface in merged.iter_mut().filter(|i| i.is_desired()) {
            let Some(iface) = des_iface.for_verify.as_mut() else {
                continue;
            };
            iface.hide_secrets();

            if iface.is_absent() || (iface.is_virtual() && iface.is_down()) {
                if let Some(cur_iface) =
                    current.get(iface.name(), Some(iface.iface_type()))
                {
                    verify_desire_absent_but_found_in_current(
                        iface, cur_iface,
                    )?;
                }
            } else if let Some(cur_iface) =
                current.get(iface.name(), Some(iface.iface_type()))
            {
                let mut cur_iface = cur_iface.clone();
                cur_iface.hide_secrets();
                iface.state_for_verify();
                cur_iface.state_for_verify();
                iface.sanitize_before_verify(&mut cur_iface);
                // Do not verify physical interface with state:down
                if iface.is_up() {
                    iface.verify(&cur_iface)?;
                }
            } else if iface.is_up() {
                if iface.is_userspace() {
                    log::debug!(
                        "User space interface {}/{} not found in current \
                         state",
                        iface.name(),
                        iface.iface_type()
                    );
                }
                let e = NetstateError::new(
                    ErrorKind::VerificationError,
                    format!(
                        "Failed to find desired interface {} {}",
                        iface.name(),
                        iface.iface_type()
                    ),
                );
                log::error!("{e}");
                return Err(e);
            }
        }
        Ok(())
    }
}

fn verify_desire_absent_but_found_in_current(
    des_iface: &Interface,
    cur_iface: &Interface,
) -> Result<(), NetstateError> {
    if cur_iface.is_virtual() && !cur_iface.is_absent() {
        // Virtual interface should be deleted by absent action
        let e = NetstateError::new(
            ErrorKind::VerificationError,
            format!(
                "Absent/Down interface {}/{} still found as {}",
                des_iface.name(),
                des_iface.iface_type(),
                cur_iface
            ),
        );
        log::error!("{e}");
        Err(e)
    } else {
        // Hard to predict real hardware state due to backend variety.
        Ok(())
    }
}
