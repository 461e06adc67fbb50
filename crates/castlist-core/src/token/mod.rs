//! Module: token
//! Responsibility: navigation token wire format (encode/decode) and its limits.
//! Does not own: roster resolution, pagination math, or what an action means.
//! Boundary: the only string that crosses the UI control surface.
//!
//! Grammar: `<action>_<groupIndex>_<pageIndex>_<rosterId>_<displayMode>`.
//!
//! Invariants:
//! - `displayMode` is always the last segment.
//! - `action` never contains an all-digit segment, so the first all-digit
//!   segment pair after the action is the index pair.
//! - `rosterId` is never truncated and round-trips byte-for-byte, including
//!   embedded separators.

#[cfg(test)]
mod tests;

use crate::MAX_TOKEN_CHARS;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use thiserror::Error as ThisError;

/// Field separator shared by every segment of the token.
pub const SEPARATOR: char = '_';

///
/// Known actions
///

pub const ACTION_SHOW: &str = "show";
pub const ACTION_NEXT_PAGE: &str = "next_page";
pub const ACTION_PREV_PAGE: &str = "prev_page";
pub const ACTION_EDIT_MODE: &str = "edit_mode";

// Fallbacks used when the full action would push a token past the limit.
pub const ACTION_NEXT_PAGE_SHORT: &str = "n";
pub const ACTION_PREV_PAGE_SHORT: &str = "p";
pub const ACTION_EDIT_MODE_SHORT: &str = "e";

///
/// MalformedToken
///
/// Decode-time structural violations. A malformed token is never partially
/// applied; callers surface it as "invalid navigation request".
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum MalformedToken {
    #[error("navigation token is empty")]
    Empty,

    #[error("navigation token exceeds max length: {len} chars (max {max})")]
    TooLong { len: usize, max: usize },

    #[error("navigation token has no display mode segment")]
    MissingDisplayMode,

    #[error("unknown display mode '{mode}'")]
    UnknownDisplayMode { mode: String },

    #[error("navigation token has no group/page index pair")]
    MissingIndexPair,

    #[error("{field} index '{raw}' is out of range")]
    IndexOverflow { field: &'static str, raw: String },

    #[error("navigation token has an empty action")]
    EmptyAction,

    #[error("navigation token has an empty roster id")]
    EmptyRosterId,
}

///
/// TokenEncodeError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum TokenEncodeError {
    #[error("action must not be empty")]
    EmptyAction,

    #[error("action segment '{segment}' is all digits and would shadow the index pair")]
    NumericActionSegment { segment: String },

    #[error("roster id must not be empty")]
    EmptyRosterId,

    #[error("encoded token is {len} chars (max {max}); shorten the action")]
    TooLong { len: usize, max: usize },
}

///
/// DisplayMode
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayMode {
    #[default]
    View,
    Edit,
}

impl DisplayMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::View => "view",
            Self::Edit => "edit",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "view" => Some(Self::View),
            "edit" => Some(Self::Edit),
            _ => None,
        }
    }

    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::View => Self::Edit,
            Self::Edit => Self::View,
        }
    }
}

impl Display for DisplayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

///
/// NavigationToken
///
/// Decoded navigation state. Every request is rebuilt from one of these;
/// nothing else survives between clicks.
///

#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct NavigationToken {
    pub action: String,
    pub group_index: u32,
    pub page_index: u32,
    pub roster_id: String,
    pub display_mode: DisplayMode,
}

impl NavigationToken {
    #[must_use]
    pub fn new(
        action: impl Into<String>,
        group_index: u32,
        page_index: u32,
        roster_id: impl Into<String>,
        display_mode: DisplayMode,
    ) -> Self {
        Self {
            action: action.into(),
            group_index,
            page_index,
            roster_id: roster_id.into(),
            display_mode,
        }
    }

    /// Clone this state with a different action, keeping every other field.
    #[must_use]
    pub fn with_action(&self, action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            ..self.clone()
        }
    }

    /// Encode using the default 100-character control limit.
    pub fn encode(&self) -> Result<String, TokenEncodeError> {
        encode_with_limit(self, MAX_TOKEN_CHARS)
    }

    /// Decode using the default 100-character control limit.
    pub fn decode(token: &str) -> Result<Self, MalformedToken> {
        decode_with_limit(token, MAX_TOKEN_CHARS)
    }
}

/// Encode one navigation state, rejecting anything the decoder could not
/// recover exactly.
pub fn encode_with_limit(
    state: &NavigationToken,
    max_chars: usize,
) -> Result<String, TokenEncodeError> {
    validate_action(&state.action)?;

    if state.roster_id.is_empty() {
        return Err(TokenEncodeError::EmptyRosterId);
    }

    let encoded = format!(
        "{action}{SEPARATOR}{group}{SEPARATOR}{page}{SEPARATOR}{roster}{SEPARATOR}{mode}",
        action = state.action,
        group = state.group_index,
        page = state.page_index,
        roster = state.roster_id,
        mode = state.display_mode,
    );

    let len = encoded.chars().count();
    if len > max_chars {
        return Err(TokenEncodeError::TooLong {
            len,
            max: max_chars,
        });
    }

    Ok(encoded)
}

/// Encode with `action`, retrying once with `short_action` if the limit is
/// exceeded. The roster id is never shortened.
pub fn encode_or_shorten(
    state: &NavigationToken,
    short_action: &str,
    max_chars: usize,
) -> Result<String, TokenEncodeError> {
    match encode_with_limit(state, max_chars) {
        Err(TokenEncodeError::TooLong { .. }) => {
            encode_with_limit(&state.with_action(short_action), max_chars)
        }
        other => other,
    }
}

/// Decode one token by fixed positions: mode from the tail, then the index
/// pair, with the action before it and the roster id after it.
pub fn decode_with_limit(token: &str, max_chars: usize) -> Result<NavigationToken, MalformedToken> {
    if token.is_empty() {
        return Err(MalformedToken::Empty);
    }

    let len = token.chars().count();
    if len > max_chars {
        return Err(MalformedToken::TooLong {
            len,
            max: max_chars,
        });
    }

    // Phase 1: the display mode is always the final segment.
    let (head, mode_raw) = token
        .rsplit_once(SEPARATOR)
        .ok_or(MalformedToken::MissingDisplayMode)?;
    let display_mode = DisplayMode::parse(mode_raw).ok_or_else(|| {
        MalformedToken::UnknownDisplayMode {
            mode: mode_raw.to_string(),
        }
    })?;

    // Phase 2: locate the index pair. Everything left of it is the action,
    // everything right of it (separators included) is the roster id.
    let segments: Vec<&str> = head.split(SEPARATOR).collect();
    let pair_at = find_index_pair(&segments).ok_or(MalformedToken::MissingIndexPair)?;

    let action = segments[..pair_at].join(&SEPARATOR.to_string());
    if action.is_empty() {
        return Err(MalformedToken::EmptyAction);
    }

    let roster_id = segments[pair_at + 2..].join(&SEPARATOR.to_string());
    if roster_id.is_empty() {
        return Err(MalformedToken::EmptyRosterId);
    }

    let group_index = parse_index("group", segments[pair_at])?;
    let page_index = parse_index("page", segments[pair_at + 1])?;

    Ok(NavigationToken {
        action,
        group_index,
        page_index,
        roster_id,
        display_mode,
    })
}

// First position `i >= 1` where segments `i` and `i + 1` are both all-digit
// and at least one roster-id segment follows.
fn find_index_pair(segments: &[&str]) -> Option<usize> {
    if segments.len() < 4 {
        return None;
    }

    (1..segments.len() - 2)
        .find(|&i| is_index_segment(segments[i]) && is_index_segment(segments[i + 1]))
}

fn is_index_segment(segment: &str) -> bool {
    !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit())
}

fn parse_index(field: &'static str, raw: &str) -> Result<u32, MalformedToken> {
    raw.parse::<u32>().map_err(|_| MalformedToken::IndexOverflow {
        field,
        raw: raw.to_string(),
    })
}

fn validate_action(action: &str) -> Result<(), TokenEncodeError> {
    if action.is_empty() {
        return Err(TokenEncodeError::EmptyAction);
    }

    if let Some(segment) = action.split(SEPARATOR).find(|s| is_index_segment(s)) {
        return Err(TokenEncodeError::NumericActionSegment {
            segment: segment.to_string(),
        });
    }

    Ok(())
}
