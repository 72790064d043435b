// SPDX-License-Identifier: Apache-2.0

// This file is based on the work of nmstate project(https://nmstate.io/) which
// is under license of Apache 2.0, authors of original file are:
//  * Gris Ge <fge@redhat.com>

use crate::NetstateError;

const NEXT_TOKEN_START_CHARS: [char; 6] = [' ', '=', '!', '|', '"', ':'];

#[derive(Clone, Eq, PartialEq, Debug)]
pub(crate) enum CaptureToken {
    /// Example: routes.running.destination
    Path(Vec<String>, usize),
    /// Example: 13 or "Abc"
    Value(String, usize),
    /// |
    Pipe(usize),
    /// :=
    Replace(usize),
    /// ==
    Equal(usize),
    /// Unquoted null or NULL or Null
    Null(usize),
}

impl CaptureToken {
    pub(crate) fn pos(&self) -> usize {
        match self {
            Self::Path(_, p)
            | Self::Value(_, p)
            | Self::Pipe(p)
            | Self::Replace(p)
            | Self::Equal(p)
            | Self::Null(p) => *p,
        }
    }
}

// Consume the second char of a two-char operator like `==` and `:=`.
fn expect_equal_sign(
    line: &str,
    pos: usize,
    next: Option<char>,
    action: &str,
) -> Result<(), NetstateError> {
    match next {
        Some('=') => Ok(()),
        Some(_) => Err(NetstateError::new_policy_error(
            format!("Invalid {action} action, expecting '=' afterwards"),
            line,
            pos + 1,
        )),
        None => Err(NetstateError::new_policy_error(
            format!(
                "Invalid {action} action, expecting '=' afterwards, but got \
                 nothing"
            ),
            line,
            pos,
        )),
    }
}

fn reject_duplicate(
    tokens: &[CaptureToken],
    is_dup: impl Fn(&CaptureToken) -> bool,
    line: &str,
    pos: usize,
    action: &str,
) -> Result<(), NetstateError> {
    if tokens.iter().any(is_dup) {
        Err(NetstateError::new_policy_error(
            format!("Policy does not allow two {action} actions"),
            line,
            pos,
        ))
    } else {
        Ok(())
    }
}

pub(crate) fn parse_capture_tokens(
    line: &str,
) -> Result<Vec<CaptureToken>, NetstateError> {
    let mut ret: Vec<CaptureToken> = Vec::new();
    let mut line_iter = line.char_indices().peekable();

    while let Some((pos, c)) = line_iter.next() {
        match c {
            '=' => {
                expect_equal_sign(
                    line,
                    pos,
                    line_iter.next().map(|(_, c)| c),
                    "equal",
                )?;
                reject_duplicate(
                    &ret,
                    |t| matches!(t, CaptureToken::Equal(_)),
                    line,
                    pos,
                    "equal",
                )?;
                ret.push(CaptureToken::Equal(pos));
            }
            ':' => {
                expect_equal_sign(
                    line,
                    pos,
                    line_iter.next().map(|(_, c)| c),
                    "replace",
                )?;
                reject_duplicate(
                    &ret,
                    |t| matches!(t, CaptureToken::Replace(_)),
                    line,
                    pos,
                    "replace",
                )?;
                ret.push(CaptureToken::Replace(pos));
            }
            '|' => {
                reject_duplicate(
                    &ret,
                    |t| matches!(t, CaptureToken::Pipe(_)),
                    line,
                    pos,
                    "pipe",
                )?;
                ret.push(CaptureToken::Pipe(pos));
            }
            '"' => {
                let mut quoted = String::new();
                let mut closed = false;
                for (_, c) in line_iter.by_ref() {
                    if c == '"' {
                        closed = true;
                        break;
                    }
                    quoted.push(c);
                }
                if !closed {
                    return Err(NetstateError::new_policy_error(
                        "No ending double quote".to_string(),
                        line,
                        pos,
                    ));
                }
                ret.push(CaptureToken::Value(quoted, pos + 1));
            }
            _ if c.is_whitespace() => (),
            _ => {
                let mut block = String::from(c);
                while let Some((_, c)) = line_iter.peek() {
                    if NEXT_TOKEN_START_CHARS.contains(c) {
                        break;
                    }
                    block.push(*c);
                    line_iter.next();
                }
                let block = block.trim();
                if block.contains('.') {
                    ret.push(CaptureToken::Path(
                        block.split('.').map(|s| s.to_string()).collect(),
                        pos,
                    ));
                } else if block.eq_ignore_ascii_case("null") {
                    ret.push(CaptureToken::Null(pos));
                } else {
                    ret.push(CaptureToken::Value(block.to_string(), pos));
                }
            }
        }
    }

    if let Some(pipe_index) =
        ret.iter().position(|t| matches!(t, CaptureToken::Pipe(_)))
    {
        match ret.get(pipe_index + 1) {
            None => {
                return Err(NetstateError::new_policy_error(
                    "Invalid pipe action: no property path defined"
                        .to_string(),
                    line,
                    ret[pipe_index].pos(),
                ));
            }
            Some(CaptureToken::Path(..)) => (),
            Some(t) => {
                return Err(NetstateError::new_policy_error(
                    "Invalid pipe action: only property path allowed after \
                     pipe"
                        .to_string(),
                    line,
                    t.pos(),
                ));
            }
        }
    }
    Ok(ret)
}

/// Reference found in template string `prefix{{ capture.a.b }}suffix`.
#[derive(Clone, Eq, PartialEq, Debug)]
pub(crate) struct TemplateReference {
    pub(crate) prefix: String,
    pub(crate) path: Vec<String>,
    pub(crate) path_pos: usize,
    pub(crate) suffix: String,
}

/// Return None if no `{{` found in line.
pub(crate) fn parse_template_reference(
    line: &str,
) -> Result<Option<TemplateReference>, NetstateError> {
    let Some(start) = line.find("{{") else {
        return Ok(None);
    };
    let Some(end) = line[start..].find("}}").map(|e| e + start) else {
        return Err(NetstateError::new_policy_error(
            "No reference end '}}' found".to_string(),
            line,
            start,
        ));
    };
    let suffix = &line[end + 2..];
    if suffix.contains("{{") {
        return Err(NetstateError::new_policy_error(
            "Only one reference allowed in a string".to_string(),
            line,
            end + 2,
        ));
    }
    let inner = &line[start + 2..end];
    let trimmed = inner.trim_start();
    let path_pos = start + 2 + inner.len() - trimmed.len();
    let trimmed = trimmed.trim_end();
    if trimmed.is_empty() || trimmed.contains(char::is_whitespace) {
        return Err(NetstateError::new_policy_error(
            "Only allow single property path between reference start {{ \
             and reference end }}"
                .to_string(),
            line,
            path_pos,
        ));
    }
    Ok(Some(TemplateReference {
        prefix: line[..start].to_string(),
        path: trimmed.split('.').map(|s| s.to_string()).collect(),
        path_pos,
        suffix: suffix.to_string(),
    }))
}
