// SPDX-License-Identifier: Apache-2.0

use serde_json::Value;

/// For any property defined in `src` but not in `dst`, copy it from `src` to
/// `dst`. Arrays are treated as leaf: a defined array in `dst` is never
/// extended by `src`.
pub(crate) fn copy_undefined_value(dst: &mut Value, src: &Value) {
    if let (Some(dst), Some(src)) = (dst.as_object_mut(), src.as_object()) {
        for (src_key, src_value) in src.iter() {
            if let Some(dst_value) = dst.get_mut(src_key) {
                copy_undefined_value(dst_value, src_value);
            } else {
                dst.insert(src_key.clone(), src_value.clone());
            }
        }
    }
}

/// Recursive partial match of `desire` against `current`:
///  * Mapping: every key of desire should exist in current and match
///    recursively, extra keys in current are ignored.
///  * Sequence: same length and pairwise match.
///  * `null` in desire matches anything.
///  * Leaves: equal, or desire is the hidden password placeholder.
///
/// Return the first difference as `(reference, desire, current)`.
pub(crate) fn get_json_value_difference<'a, 'b>(
    reference: String,
    desire: &'a Value,
    current: &'b Value,
) -> Option<(String, &'a Value, &'b Value)> {
    match (desire, current) {
        (Value::Null, _) => None,
        (Value::Bool(_), Value::Bool(_))
        | (Value::Number(_), Value::Number(_)) => {
            if desire != current {
                Some((reference, desire, current))
            } else {
                None
            }
        }
        (Value::String(des), Value::String(cur)) => {
            if des != cur && des != crate::NetworkState::HIDE_PASSWORD_STR {
                Some((reference, desire, current))
            } else {
                None
            }
        }
        (Value::Array(des), Value::Array(cur)) => {
            if des.len() != cur.len() {
                return Some((reference, desire, current));
            }
            des.iter().zip(cur.iter()).enumerate().find_map(
                |(index, (des_element, cur_element))| {
                    get_json_value_difference(
                        format!("{reference}[{index}]"),
                        des_element,
                        cur_element,
                    )
                },
            )
        }
        (Value::Object(des), Value::Object(cur)) => {
            for (key, des_value) in des.iter() {
                let reference = format!("{reference}.{key}");
                match cur.get(key) {
                    Some(cur_value) => {
                        if let Some(difference) = get_json_value_difference(
                            reference, des_value, cur_value,
                        ) {
                            return Some(difference);
                        }
                    }
                    None => {
                        if !des_value.is_null() {
                            return Some((reference, des_value, &Value::Null));
                        }
                    }
                }
            }
            None
        }
        (_, _) => Some((reference, desire, current)),
    }
}

/// Whether every element of `desire` can be found in `current`.
pub(crate) fn is_subset_of<T: PartialEq>(desire: &[T], current: &[T]) -> bool {
    desire.iter().all(|d| current.contains(d))
}

/// Remove all keys not defined in `desire` from `current`, recursively for
/// mappings.
pub(crate) fn remove_undesired_keys(current: &mut Value, desire: &Value) {
    if let (Some(cur), Some(des)) =
        (current.as_object_mut(), desire.as_object())
    {
        cur.retain(|key, _| des.contains_key(key));
        for (key, cur_value) in cur.iter_mut() {
            if let Some(des_value) = des.get(key) {
                remove_undesired_keys(cur_value, des_value);
            }
        }
    }
}
