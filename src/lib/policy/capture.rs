// SPDX-License-Identifier: Apache-2.0

// This file is based on the work of nmstate project(https://nmstate.io/) which
// is under license of Apache 2.0, authors of original file are:
//  * Gris Ge <fge@redhat.com>

use std::collections::HashMap;

use serde::{
    Deserialize, Deserializer, Serialize, Serializer, ser::SerializeMap,
};
use serde_json::{Map, Value};

use super::{
    json::{
        get_json_value, get_json_value_or_err, set_json_value,
        value_to_string,
    },
    token::{CaptureToken, parse_capture_tokens},
};
use crate::{ErrorKind, NetstateError};

const CAPTURE_KEYWORD: &str = "capture";

/// Ordered capture rules, later rule may refer to the result of earlier one
/// via `capture.<name>`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[non_exhaustive]
pub struct NetworkCaptureRules {
    pub cmds: Vec<(String, NetworkCaptureCommand)>,
}

impl<'de> Deserialize<'de> for NetworkCaptureRules {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let map = Map::<String, Value>::deserialize(deserializer)?;
        let mut cmds = Vec::new();
        for (name, v) in map.iter() {
            let Value::String(line) = v else {
                return Err(serde::de::Error::custom(format!(
                    "Expecting a string for capture {name}, but got {v}"
                )));
            };
            cmds.push((
                name.to_string(),
                NetworkCaptureCommand::parse(line)
                    .map_err(serde::de::Error::custom)?,
            ));
        }
        Ok(Self { cmds })
    }
}

impl Serialize for NetworkCaptureRules {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.cmds.len()))?;
        for (name, cmd) in &self.cmds {
            map.serialize_entry(name, cmd.line.as_str())?;
        }
        map.end()
    }
}

impl NetworkCaptureRules {
    pub fn is_empty(&self) -> bool {
        self.cmds.is_empty()
    }

    /// Run all capture rules in order against current state in the form of
    /// JSON value, return the captured values indexed by capture name.
    pub(crate) fn execute(
        &self,
        current: &Value,
    ) -> Result<HashMap<String, Value>, NetstateError> {
        let mut ret: HashMap<String, Value> = HashMap::new();
        for (name, cmd) in self.cmds.iter() {
            let captured = cmd.execute(current, &ret)?;
            log::debug!("Captured {name}: {captured}");
            ret.insert(name.to_string(), captured);
        }
        Ok(ret)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) enum CaptureAction {
    /// Only keep the specified property
    #[default]
    None,
    Equal,
    Replace,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) enum CaptureValue {
    #[default]
    None,
    Null,
    Value(String),
    Path(Vec<String>, usize),
}

/// Single capture expression, examples:
///  * `routes.running.destination == "0.0.0.0/0"`
///  * `interfaces.name == capture.gw.routes.running.0.next-hop-interface`
///  * `capture.gw-routes | routes.running.next-hop-interface := "br0"`
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[non_exhaustive]
pub struct NetworkCaptureCommand {
    pub(crate) key: Option<(Vec<String>, usize)>,
    pub(crate) key_capture: Option<(String, usize)>,
    pub(crate) action: CaptureAction,
    pub(crate) value: CaptureValue,
    pub(crate) value_capture: Option<(String, usize)>,
    pub line: String,
}

impl NetworkCaptureCommand {
    pub(crate) fn parse(line: &str) -> Result<Self, NetstateError> {
        // Non-breaking space is commonly found in copied YAML
        let line = line.replace('\u{A0}', " ").trim().to_string();
        let tokens = parse_capture_tokens(&line)?;
        let mut ret = Self {
            line,
            ..Default::default()
        };

        let tokens = if let Some(pipe_index) =
            tokens.iter().position(|t| matches!(t, CaptureToken::Pipe(_)))
        {
            ret.key_capture = Some(
                ret.parse_pipe_source(
                    &tokens[..pipe_index],
                    &tokens[pipe_index],
                )?,
            );
            &tokens[pipe_index + 1..]
        } else {
            tokens.as_slice()
        };

        let action_index = tokens.iter().position(|t| {
            matches!(t, CaptureToken::Equal(_) | CaptureToken::Replace(_))
        });
        let Some(action_index) = action_index else {
            // Without action, only keep the specified property.
            if let Some(CaptureToken::Path(path, pos)) = tokens.first() {
                ret.key = Some((path.clone(), *pos));
            }
            return Ok(ret);
        };
        let action_token = &tokens[action_index];
        ret.action = if matches!(action_token, CaptureToken::Equal(_)) {
            CaptureAction::Equal
        } else {
            CaptureAction::Replace
        };
        ret.parse_key(&tokens[..action_index], action_token)?;
        ret.parse_value(&tokens[action_index + 1..], action_token)?;
        Ok(ret)
    }

    fn parse_pipe_source(
        &self,
        tokens: &[CaptureToken],
        pipe_token: &CaptureToken,
    ) -> Result<(String, usize), NetstateError> {
        match tokens {
            [CaptureToken::Path(path, pos)]
                if path.len() == 2 && path[0] == CAPTURE_KEYWORD =>
            {
                Ok((path[1].to_string(), *pos))
            }
            _ => Err(NetstateError::new_policy_error(
                "The pipe action should always in format of \
                 'capture.<capture_name>'"
                    .to_string(),
                &self.line,
                tokens.first().unwrap_or(pipe_token).pos(),
            )),
        }
    }

    fn parse_key(
        &mut self,
        tokens: &[CaptureToken],
        action_token: &CaptureToken,
    ) -> Result<(), NetstateError> {
        let [CaptureToken::Path(path, pos)] = tokens else {
            return Err(NetstateError::new_policy_error(
                "The equal or replace action should always start with \
                 property path"
                    .to_string(),
                &self.line,
                tokens.first().unwrap_or(action_token).pos(),
            ));
        };
        if path.first().map(String::as_str) == Some(CAPTURE_KEYWORD) {
            if path.len() <= 2 {
                return Err(NetstateError::new_policy_error(
                    "No property path after capture name".to_string(),
                    &self.line,
                    *pos,
                ));
            }
            if self.key_capture.is_none() {
                self.key_capture = Some((
                    path[1].to_string(),
                    pos + CAPTURE_KEYWORD.len() + 1,
                ));
            }
            self.key = Some((
                path[2..].to_vec(),
                pos + CAPTURE_KEYWORD.len() + path[1].len() + 2,
            ));
        } else {
            self.key = Some((path.clone(), *pos));
        }
        Ok(())
    }

    fn parse_value(
        &mut self,
        tokens: &[CaptureToken],
        action_token: &CaptureToken,
    ) -> Result<(), NetstateError> {
        let [token] = tokens else {
            return Err(NetstateError::new_policy_error(
                "The equal or replace action should end with single value \
                 or property path"
                    .to_string(),
                &self.line,
                tokens.first().unwrap_or(action_token).pos(),
            ));
        };
        self.value = match token {
            CaptureToken::Path(path, pos)
                if path.first().map(String::as_str)
                    == Some(CAPTURE_KEYWORD) =>
            {
                if path.len() < 3 {
                    return Err(NetstateError::new_policy_error(
                        "Referring captured data should be in the format \
                         of 'capture.<capture_name>.<property_path>'"
                            .to_string(),
                        &self.line,
                        *pos,
                    ));
                }
                self.value_capture = Some((
                    path[1].to_string(),
                    pos + CAPTURE_KEYWORD.len() + 1,
                ));
                CaptureValue::Path(
                    path[2..].to_vec(),
                    pos + CAPTURE_KEYWORD.len() + path[1].len() + 2,
                )
            }
            CaptureToken::Path(path, pos) => {
                CaptureValue::Path(path.clone(), *pos)
            }
            CaptureToken::Value(v, _) => CaptureValue::Value(v.to_string()),
            CaptureToken::Null(_) => CaptureValue::Null,
            t => {
                return Err(NetstateError::new_policy_error(
                    "The equal or replace action should end with single \
                     value or property path"
                        .to_string(),
                    &self.line,
                    t.pos(),
                ));
            }
        };
        Ok(())
    }

    fn get_capture<'a>(
        &self,
        cap: &(String, usize),
        captures: &'a HashMap<String, Value>,
    ) -> Result<&'a Value, NetstateError> {
        captures.get(&cap.0).ok_or_else(|| {
            NetstateError::new_policy_error(
                format!("Capture {} not found", cap.0),
                &self.line,
                cap.1,
            )
        })
    }

    pub(crate) fn execute(
        &self,
        current: &Value,
        captures: &HashMap<String, Value>,
    ) -> Result<Value, NetstateError> {
        let input = match self.key_capture.as_ref() {
            Some(cap) => self.get_capture(cap, captures)?,
            None => current,
        };
        let Some((keys, key_pos)) = self.key.as_ref() else {
            return Ok(Value::Object(Map::new()));
        };
        let mut ret = Value::Object(Map::new());

        if self.action == CaptureAction::None {
            if let Some(v) = get_json_value(input, keys) {
                set_json_value(&mut ret, keys, Some(v));
            }
            return Ok(ret);
        }

        let value_input = match self.value_capture.as_ref() {
            Some(cap) => self.get_capture(cap, captures)?,
            None => current,
        };
        let new_value: Option<Value> = match &self.value {
            CaptureValue::Path(path, pos) => match get_json_value_or_err(
                value_input,
                path,
                &self.line,
                *pos,
            )? {
                Value::Null => None,
                v => Some(v.clone()),
            },
            CaptureValue::Value(v) => Some(Value::String(v.to_string())),
            CaptureValue::Null | CaptureValue::None => None,
        };

        let (section, prop_path) =
            split_section(keys, &self.line, *key_pos)?;
        let mut items: Vec<Value> = get_json_value(input, &section)
            .and_then(|v| v.as_array())
            .cloned()
            .unwrap_or_default();

        match self.action {
            CaptureAction::Equal => {
                let matching = new_value.as_ref().map(value_to_string);
                items.retain(|item| {
                    get_json_value(item, prop_path)
                        .filter(|v| !v.is_null())
                        .map(value_to_string)
                        == matching
                });
            }
            CaptureAction::Replace => {
                for item in items.iter_mut() {
                    set_json_value(item, prop_path, new_value.as_ref());
                }
            }
            CaptureAction::None => (),
        }
        set_json_value(&mut ret, &section, Some(&Value::Array(items)));
        Ok(ret)
    }
}

// Split property path into the path of list and the property path of
// item in that list.
fn split_section<'a>(
    keys: &'a [String],
    line: &str,
    pos: usize,
) -> Result<(Vec<String>, &'a [String]), NetstateError> {
    let section_len = match keys.first().map(String::as_str) {
        Some("interfaces") => 1,
        Some("routes")
            if matches!(
                keys.get(1).map(String::as_str),
                Some("running" | "config")
            ) =>
        {
            2
        }
        Some("route-rules")
            if keys.get(1).map(String::as_str) == Some("config") =>
        {
            2
        }
        Some(keyword) => {
            return Err(NetstateError::new_policy_error(
                format!(
                    "Unsupported capture keyword '{keyword}', only support \
                     'interfaces', 'routes.running', 'routes.config' and \
                     'route-rules.config'"
                ),
                line,
                pos,
            ));
        }
        None => {
            return Err(NetstateError::new(
                ErrorKind::InvalidArgument,
                format!("Invalid empty property path in '{line}'"),
            ));
        }
    };
    if keys.len() <= section_len {
        return Err(NetstateError::new_policy_error(
            "No property path defined for list item".to_string(),
            line,
            pos,
        ));
    }
    Ok((keys[..section_len].to_vec(), &keys[section_len..]))
}
