use crate::error::SessionError;
use std::fmt;
use std::str::FromStr;

pub const MAX_SESSION_ID_LEN: usize = 128;

/// Client-supplied session key, checked before it reaches the store.
///
/// Allowed: 1..=128 ASCII alphanumerics or `-`, `_`, `.`, `:`. Covers UUIDs
/// and random base-36 ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(String);

impl SessionId {
    pub fn parse(raw: &str) -> Result<Self, SessionError> {
        if raw.trim().is_empty() {
            return Err(SessionError::InvalidId("must not be empty".into()));
        }
        if raw.len() > MAX_SESSION_ID_LEN {
            return Err(SessionError::InvalidId(format!(
                "must be at most {MAX_SESSION_ID_LEN} characters"
            )));
        }
        if let Some(bad) = raw
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ':')))
        {
            return Err(SessionError::InvalidId(format!(
                "unsupported character {bad:?}"
            )));
        }
        Ok(Self(raw.to_string()))
    }

    /// Required-field form used by request bodies.
    pub fn require(raw: Option<&str>) -> Result<Self, SessionError> {
        raw.map_or_else(
            || Err(SessionError::InvalidId("session_id is required".into())),
            Self::parse,
        )
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for SessionId {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
