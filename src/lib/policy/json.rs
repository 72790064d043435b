// SPDX-License-Identifier: Apache-2.0

use serde_json::{Map, Value};

use crate::NetstateError;

/// Search property by path, array items are indexed by number.
pub(crate) fn get_json_value<'a>(
    value: &'a Value,
    prop_path: &[String],
) -> Option<&'a Value> {
    let mut cur = value;
    for prop in prop_path {
        cur = match cur {
            Value::Object(map) => map.get(prop)?,
            Value::Array(items) => items.get(prop.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(cur)
}

/// Like [get_json_value()] but with policy error pointing to the first
/// unknown property.
pub(crate) fn get_json_value_or_err<'a>(
    value: &'a Value,
    prop_path: &[String],
    line: &str,
    pos: usize,
) -> Result<&'a Value, NetstateError> {
    let mut cur = value;
    let mut pos = pos;
    for prop in prop_path {
        let next = match cur {
            Value::Object(map) => map.get(prop),
            Value::Array(items) => {
                prop.parse::<usize>().ok().and_then(|i| items.get(i))
            }
            _ => None,
        };
        let Some(next) = next else {
            return Err(NetstateError::new_policy_error(
                format!(
                    "Failed to find property {prop}, existing properties \
                     are {}",
                    existing_props(cur)
                ),
                line,
                pos,
            ));
        };
        cur = next;
        pos += prop.chars().count() + 1;
    }
    Ok(cur)
}

fn existing_props(value: &Value) -> String {
    match value {
        Value::Object(map) => {
            map.keys().map(String::as_str).collect::<Vec<_>>().join(",")
        }
        Value::Array(items) => format!("index 0 to {}", items.len()),
        _ => String::new(),
    }
}

/// Set property by path, creating missing mappings. A `None` new value
/// removes the property.
pub(crate) fn set_json_value(
    value: &mut Value,
    prop_path: &[String],
    new_value: Option<&Value>,
) {
    let Some((last, parents)) = prop_path.split_last() else {
        return;
    };
    let mut cur = value;
    for prop in parents {
        if !cur.is_object() {
            *cur = Value::Object(Map::new());
        }
        let Value::Object(map) = cur else {
            return;
        };
        cur = map
            .entry(prop.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }
    if !cur.is_object() {
        *cur = Value::Object(Map::new());
    }
    if let Value::Object(map) = cur {
        match new_value {
            Some(v) => {
                map.insert(last.to_string(), v.clone());
            }
            None => {
                map.remove(last);
            }
        }
    }
}

pub(crate) fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.to_string(),
        v => v.to_string(),
    }
}
