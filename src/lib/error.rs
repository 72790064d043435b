// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};

use crate::JsonDisplay;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonDisplay,
)]
#[serde(rename_all = "kebab-case")]
#[non_exhaustive]
pub enum ErrorKind {
    /// Please report this as bug to upstream
    Bug,
    /// Invalid argument, user should amend the desired state
    InvalidArgument,
    /// Post applied state does not match with desired state
    VerificationError,
    /// Kernel rounded the integer value, the desired value should be
    /// adjusted to the one shown in error message
    KernelIntegerRoundedError,
    /// Feature not implemented yet
    NotImplementedError,
    /// Feature not supported by backend
    NotSupportedError,
    /// Required dependency missing
    DependencyError,
    /// Plugin failure
    PluginFailure,
    /// Permission deny
    PermissionError,
    /// Desired state conflicts with other in-flight change
    Conflict,
    /// Timeout
    Timeout,
    /// Invalid schema version
    InvalidSchemaVersion,
}

// Try not implement From for NetstateError here unless you are sure this
// error should always convert to certain type of ErrorKind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct NetstateError {
    pub kind: ErrorKind,
    pub msg: String,
}

impl std::fmt::Display for NetstateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.msg)
    }
}

impl NetstateError {
    pub fn new(kind: ErrorKind, msg: String) -> Self {
        Self { kind, msg }
    }

    /// Error of policy expression, the `position` is the index of character
    /// in `line` causing the failure.
    pub fn new_policy_error(msg: String, line: &str, position: usize) -> Self {
        Self::new(
            ErrorKind::InvalidArgument,
            format!("{msg}\n| {line}\n| {:>width$}", "^", width = position + 1),
        )
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn msg(&self) -> &str {
        self.msg.as_str()
    }
}

impl std::error::Error for NetstateError {}

impl From<serde_json::Error> for NetstateError {
    fn from(e: serde_json::Error) -> Self {
        Self::new(ErrorKind::InvalidArgument, format!("Invalid JSON: {e}"))
    }
}

impl From<serde_yaml::Error> for NetstateError {
    fn from(e: serde_yaml::Error) -> Self {
        Self::new(ErrorKind::InvalidArgument, format!("Invalid YAML: {e}"))
    }
}

impl From<std::net::AddrParseError> for NetstateError {
    fn from(e: std::net::AddrParseError) -> Self {
        Self::new(
            ErrorKind::InvalidArgument,
            format!("Invalid IP address: {e}"),
        )
    }
}
