// SPDX-License-Identifier: Apache-2.0

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{
    json::{get_json_value_or_err, value_to_string},
    token::parse_template_reference,
};
use crate::{NetstateError, NetworkState};

const CAPTURE_KEYWORD: &str = "capture";

/// Desired state holding `{{ capture.<name>.<path> }}` references.
#[derive(Clone, Debug, Deserialize, Serialize, Default, PartialEq, Eq)]
#[non_exhaustive]
pub struct NetworkStateTemplate(pub Value);

impl NetworkStateTemplate {
    pub fn is_empty(&self) -> bool {
        match &self.0 {
            Value::Null => true,
            Value::Object(map) => map.is_empty(),
            _ => false,
        }
    }

    pub(crate) fn fill_with_captured_data(
        &self,
        captures: &HashMap<String, Value>,
    ) -> Result<NetworkState, NetstateError> {
        let mut value = self.0.clone();
        resolve_capture_data(&mut value, captures)?;
        log::debug!("Desired state after template resolved: {value}");
        Ok(NetworkState::deserialize(&value)?)
    }
}

fn resolve_capture_data(
    value: &mut Value,
    captures: &HashMap<String, Value>,
) -> Result<(), NetstateError> {
    match value {
        Value::String(line) => {
            if let Some(new_value) = resolve_template_str(line, captures)? {
                *value = new_value;
            }
        }
        Value::Object(map) => {
            for v in map.values_mut() {
                resolve_capture_data(v, captures)?;
            }
        }
        Value::Array(items) => {
            for item in items.iter_mut() {
                resolve_capture_data(item, captures)?;
            }
        }
        _ => (),
    }
    Ok(())
}

fn resolve_template_str(
    line: &str,
    captures: &HashMap<String, Value>,
) -> Result<Option<Value>, NetstateError> {
    let line = line.trim();
    let Some(reference) = parse_template_reference(line)? else {
        return Ok(None);
    };
    let path = reference.path.as_slice();
    let pos = reference.path_pos;
    if path.len() < 3 || path[0] != CAPTURE_KEYWORD {
        return Err(NetstateError::new_policy_error(
            "Invalid capture reference string, should be in the format \
             capture.<capture_name>.<property_path>"
                .to_string(),
            line,
            pos,
        ));
    }
    let Some(captured) = captures.get(&path[1]) else {
        return Err(NetstateError::new_policy_error(
            format!("Failed to find capture {}", path[1]),
            line,
            pos + CAPTURE_KEYWORD.len() + 1,
        ));
    };
    let resolved = get_json_value_or_err(
        captured,
        &path[2..],
        line,
        pos + CAPTURE_KEYWORD.len() + path[1].len() + 2,
    )?;
    let is_leaf = !(resolved.is_object() || resolved.is_array());
    if reference.prefix.is_empty() && reference.suffix.is_empty() {
        Ok(Some(resolved.clone()))
    } else if is_leaf {
        Ok(Some(Value::String(format!(
            "{}{}{}",
            reference.prefix,
            value_to_string(resolved),
            reference.suffix
        ))))
    } else {
        Err(NetstateError::new_policy_error(
            "The resolved reference result is object or array, hence you \
             cannot add prefix or postfix"
                .to_string(),
            line,
            pos,
        ))
    }
}
