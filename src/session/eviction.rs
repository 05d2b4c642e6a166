use crate::config::{EvictionKind, SessionConfig};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Bookkeeping the store keeps next to each session.
#[derive(Debug, Clone, Copy)]
pub struct SessionMeta {
    pub last_access: Instant,
    pub turns: usize,
}

impl SessionMeta {
    pub fn new(now: Instant) -> Self {
        Self {
            last_access: now,
            turns: 0,
        }
    }

    pub fn idle_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_access)
    }
}

/// Decides which sessions leave the store.
pub trait EvictionPolicy: Send + Sync + fmt::Debug {
    fn name(&self) -> &'static str;

    /// Whether an idle session should be dropped by the sweeper.
    fn is_expired(&self, _meta: &SessionMeta, _now: Instant) -> bool {
        false
    }

    /// Sort key for capacity eviction; the smallest goes first.
    fn rank(&self, meta: &SessionMeta) -> Instant {
        meta.last_access
    }
}

/// Least recently used first; nothing expires.
#[derive(Debug, Default, Clone, Copy)]
pub struct LruPolicy;

impl EvictionPolicy for LruPolicy {
    fn name(&self) -> &'static str {
        "lru"
    }
}

/// Least recently used first, and sessions idle for `idle_ttl` expire.
#[derive(Debug, Clone, Copy)]
pub struct TtlPolicy {
    idle_ttl: Duration,
}

impl TtlPolicy {
    pub fn new(idle_ttl: Duration) -> Self {
        Self { idle_ttl }
    }
}

impl EvictionPolicy for TtlPolicy {
    fn name(&self) -> &'static str {
        "ttl"
    }

    fn is_expired(&self, meta: &SessionMeta, now: Instant) -> bool {
        meta.idle_for(now) >= self.idle_ttl
    }
}

pub fn policy_from_config(config: &SessionConfig) -> Arc<dyn EvictionPolicy> {
    match config.eviction {
        EvictionKind::Lru => Arc::new(LruPolicy),
        EvictionKind::Ttl => Arc::new(TtlPolicy::new(Duration::from_secs(config.idle_ttl_secs))),
    }
}
