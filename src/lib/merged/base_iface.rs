// SPDX-License-Identifier: Apache-2.0

use crate::BaseInterface;

impl BaseInterface {
    // `NetstateInterface::merge()` already done JSON level merging, this
    // function is doing special merging after that.
    pub(crate) fn post_merge(&mut self, desired: &Self, current: &Self) {
        if desired.iface_type.is_unknown() {
            self.iface_type = current.iface_type.clone();
        }
        // Explicitly detached from controller.
        if desired.controller.as_deref() == Some("") {
            self.controller_type = None;
        }
        if let (Some(ipv4), Some(cur_ipv4)) =
            (self.ipv4.as_mut(), current.ipv4.as_ref())
        {
            ipv4.post_merge(cur_ipv4);
        }
        if let (Some(ipv6), Some(cur_ipv6)) =
            (self.ipv6.as_mut(), current.ipv6.as_ref())
        {
            ipv6.post_merge(cur_ipv6);
        }
    }
}
