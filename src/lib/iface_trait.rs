// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};

use crate::{
    BaseInterface, ErrorKind, InterfaceState, InterfaceType, NetstateError,
    value::copy_undefined_value,
};

/// Trait implemented by all type of interfaces.
pub trait NetstateInterface:
    std::fmt::Debug + for<'a> Deserialize<'a> + Serialize + Default + Clone
{
    fn base_iface(&self) -> &BaseInterface;

    fn base_iface_mut(&mut self) -> &mut BaseInterface;

    /// Whether interface is created by kernel or userspace at runtime
    /// instead of backed by hardware.
    fn is_virtual(&self) -> bool;

    /// Whether specified interface only exist in user space configuration
    /// without any kernel interface index.
    fn is_userspace(&self) -> bool {
        self.iface_type().is_userspace()
    }

    /// Whether can hold ports
    fn is_controller(&self) -> bool {
        self.iface_type().is_controller()
    }

    fn name(&self) -> &str {
        self.base_iface().name.as_str()
    }

    fn iface_type(&self) -> &InterfaceType {
        &self.base_iface().iface_type
    }

    fn iface_state(&self) -> InterfaceState {
        self.base_iface().state
    }

    /// Invoke [BaseInterface::hide_secrets()] and interface specifics
    /// `hide_secrets_iface_specific()`.
    /// Please do not override this but implement
    /// `hide_secrets_iface_specific()` instead.
    fn hide_secrets(&mut self) {
        self.base_iface_mut().hide_secrets();
        self.hide_secrets_iface_specific();
    }

    fn hide_secrets_iface_specific(&mut self) {}

    fn is_ignore(&self) -> bool {
        self.base_iface().state.is_ignore()
    }

    fn is_up(&self) -> bool {
        self.base_iface().state.is_up()
    }

    fn is_down(&self) -> bool {
        self.base_iface().state.is_down()
    }

    fn is_absent(&self) -> bool {
        self.base_iface().state.is_absent()
    }

    /// Fill properties not mentioned in `desired` from `self` (the current
    /// state) without understanding the property meaning.
    /// Will invoke `post_merge_iface_specific()` at the end.
    /// Please do not override this function but implement
    /// `post_merge_iface_specific()` instead.
    fn merge(&self, desired: &Self) -> Result<Self, NetstateError> {
        let mut des_value = serde_json::to_value(desired)?;
        let cur_value = serde_json::to_value(self)?;
        copy_undefined_value(&mut des_value, &cur_value);

        let mut ret: Self = serde_json::from_value(des_value)?;
        ret.base_iface_mut()
            .post_merge(desired.base_iface(), self.base_iface());
        ret.post_merge_iface_specific(desired, self)?;
        Ok(ret)
    }

    /// Special merge action required for certain interface type. Do not
    /// need to worry about the merge of [BaseInterface].
    fn post_merge_iface_specific(
        &mut self,
        _desired: &Self,
        _current: &Self,
    ) -> Result<(), NetstateError> {
        Ok(())
    }

    /// Validate and clean up desired state before merging with current:
    ///  * Validate user inputs.
    ///  * Clean up properties which is for query only.
    fn sanitize(
        &mut self,
        current: Option<&Self>,
    ) -> Result<(), NetstateError> {
        self.base_iface_mut()
            .sanitize(current.map(|c| c.base_iface()))?;
        self.sanitize_iface_specfic(current)
    }

    fn sanitize_iface_specfic(
        &mut self,
        _current: Option<&Self>,
    ) -> Result<(), NetstateError> {
        Ok(())
    }

    /// Validate and fix merged state of desired and up interface right
    /// before generating the edit plan.
    fn pre_edit_cleanup(
        &mut self,
        current: Option<&Self>,
    ) -> Result<(), NetstateError> {
        self.base_iface_mut().pre_edit_cleanup();
        self.pre_edit_cleanup_iface_specific(current)
    }

    fn pre_edit_cleanup_iface_specific(
        &mut self,
        _current: Option<&Self>,
    ) -> Result<(), NetstateError> {
        Ok(())
    }

    /// Normalize state for verification. Should be idempotent.
    fn state_for_verify(&mut self) {
        self.base_iface_mut().state_for_verify();
        self.state_for_verify_iface_specific();
    }

    fn state_for_verify_iface_specific(&mut self) {}

    /// Invoke sanitize current for verify on the [BaseInterface] and
    /// `sanitize_before_verify_iface_specfic()`
    fn sanitize_before_verify(&mut self, current: &mut Self) {
        self.base_iface_mut()
            .sanitize_before_verify(current.base_iface_mut());
        self.sanitize_before_verify_iface_specfic(current);
    }

    fn sanitize_before_verify_iface_specfic(&mut self, _current: &mut Self) {}

    fn from_base(base_iface: BaseInterface) -> Self {
        let mut new = Self::default();
        *new.base_iface_mut() = base_iface;
        new
    }

    /// Return a list of port names. None means not desired or cannot hold
    /// ports
    fn ports(&self) -> Option<Vec<&str>> {
        None
    }

    /// Return parent interface name, None means not desired or no parent
    fn parent(&self) -> Option<&str> {
        None
    }

    /// Whether this interface cannot exist without its parent.
    fn need_parent(&self) -> bool {
        false
    }

    /// Whether this interface could hold IP even attached to a controller.
    fn can_have_ip_as_port(&self) -> bool {
        false
    }

    fn sort_ports(&mut self) {}

    fn remove_port(&mut self, port_name: &str) -> Result<(), NetstateError> {
        Err(NetstateError::new(
            ErrorKind::Bug,
            format!(
                "Cannot remove port {port_name} from interface {} of type {} \
                 which cannot hold ports",
                self.name(),
                self.iface_type()
            ),
        ))
    }
}
