// SPDX-License-Identifier: Apache-2.0

// This file is based on the work of nmstate project(https://nmstate.io/) which
// is under license of Apache 2.0, authors of original file are:
//  * Gris Ge <fge@redhat.com>

use serde::{Deserialize, Serialize};

use crate::JsonDisplay;

/// Administrative state of interface, `up` when not defined.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    JsonDisplay,
)]
#[serde(rename_all = "kebab-case")]
#[non_exhaustive]
pub enum InterfaceState {
    #[default]
    Up,
    /// Keep the configuration but deactivate. Virtual interface will be
    /// deleted from kernel.
    Down,
    /// Remove the configuration and deactivate.
    Absent,
    /// Not managed: never included in edit plan and never fails
    /// verification. When listed as port of desired controller and not
    /// mentioned in desired state, it is changed to `up`.
    #[serde(alias = "unknown")]
    Ignore,
}

impl InterfaceState {
    pub fn is_ignore(&self) -> bool {
        self == &Self::Ignore
    }

    pub fn is_up(&self) -> bool {
        self == &Self::Up
    }

    pub fn is_down(&self) -> bool {
        self == &Self::Down
    }

    pub fn is_absent(&self) -> bool {
        self == &Self::Absent
    }
}
