use super::Config;
use crate::config::EvictionKind;
use std::str::FromStr;

/// Every variable [`Config::apply_env_overrides`] consults.
#[cfg(test)]
pub(crate) const RECOGNISED_VARS: [&str; 10] = [
    "CHATRELAY_PORT",
    "PORT",
    "CHATRELAY_HOST",
    "HOST",
    "CHATRELAY_BACKEND_URL",
    "CHATRELAY_MAX_LENGTH",
    "CHATRELAY_GENERATION_TIMEOUT_SECS",
    "CHATRELAY_MAX_SESSIONS",
    "CHATRELAY_EVICTION",
    "CHATRELAY_LOG_LEVEL",
];

fn trimmed_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// `primary` if set and non-blank, otherwise `fallback` under the same rule.
fn non_empty_var(primary: &str, fallback: Option<&str>) -> Option<String> {
    trimmed_var(primary).or_else(|| fallback.and_then(trimmed_var))
}

impl Config {
    pub fn apply_env_overrides(&mut self) {
        if let Some(port_str) = non_empty_var("CHATRELAY_PORT", Some("PORT")) {
            match port_str.parse::<u16>() {
                Ok(port) => self.gateway.port = port,
                Err(_) => tracing::warn!(value = %port_str, "ignoring unparseable port override"),
            }
        }

        if let Some(host) = non_empty_var("CHATRELAY_HOST", Some("HOST")) {
            self.gateway.host = host;
        }

        if let Some(url) = non_empty_var("CHATRELAY_BACKEND_URL", None) {
            self.generation.base_url = url;
        }

        if let Some(raw) = non_empty_var("CHATRELAY_MAX_LENGTH", None)
            && let Ok(max_length) = raw.parse::<usize>()
        {
            self.generation.max_length = max_length;
        }

        if let Some(raw) = non_empty_var("CHATRELAY_GENERATION_TIMEOUT_SECS", None)
            && let Ok(secs) = raw.parse::<u64>()
        {
            self.generation.timeout_secs = secs;
        }

        if let Some(raw) = non_empty_var("CHATRELAY_MAX_SESSIONS", None)
            && let Ok(max_sessions) = raw.parse::<usize>()
        {
            self.session.max_sessions = max_sessions;
        }

        if let Some(raw) = non_empty_var("CHATRELAY_EVICTION", None) {
            match EvictionKind::from_str(&raw) {
                Ok(kind) => self.session.eviction = kind,
                Err(_) => tracing::warn!(value = %raw, "ignoring unknown eviction policy override"),
            }
        }

        if let Some(level) = non_empty_var("CHATRELAY_LOG_LEVEL", None) {
            self.log_level = level;
        }
    }
}
