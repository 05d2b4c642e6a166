use super::eviction::{EvictionPolicy, SessionMeta, policy_from_config};
use super::id::SessionId;
use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::model::TokenId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// One prior user turn, as encoded by the tokenizer.
pub type Fragment = Vec<TokenId>;

#[derive(Debug, Default)]
struct SessionState {
    fragments: Vec<Fragment>,
    /// Set when the session leaves the map. Anyone still holding the slot
    /// must resolve the id again.
    retired: bool,
}

impl SessionState {
    fn retire(&mut self) {
        self.retired = true;
        self.fragments.clear();
    }
}

type Slot = Arc<AsyncMutex<SessionState>>;

struct Entry {
    slot: Slot,
    meta: SessionMeta,
}

/// Retire a slot unless a turn is in progress on it.
fn retire_if_idle(slot: &Slot) -> bool {
    match slot.try_lock() {
        Ok(mut state) => {
            state.retire();
            true
        }
        Err(_) => false,
    }
}

/// Process-wide conversation store.
///
/// The map lock is synchronous and never held across an await. Each session
/// has its own async lock, held by a [`SessionLease`] for a whole chat turn,
/// so turns on one session run strictly one after another.
pub struct SessionManager {
    entries: Mutex<HashMap<SessionId, Entry>>,
    policy: Arc<dyn EvictionPolicy>,
    max_sessions: usize,
}

impl SessionManager {
    pub fn new(policy: Arc<dyn EvictionPolicy>, max_sessions: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            policy,
            max_sessions: max_sessions.max(1),
        }
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(policy_from_config(config), config.max_sessions)
    }

    fn lock_entries(&self) -> MutexGuard<'_, HashMap<SessionId, Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn len(&self) -> usize {
        self.lock_entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, id: &SessionId) -> bool {
        self.lock_entries().contains_key(id)
    }

    pub fn capacity(&self) -> usize {
        self.max_sessions
    }

    pub fn policy_name(&self) -> &'static str {
        self.policy.name()
    }

    /// Lock the session for one turn, creating it if unknown.
    ///
    /// Waits behind any turn already running on the same id.
    pub async fn checkout(&self, id: &SessionId) -> Result<SessionLease<'_>, SessionError> {
        loop {
            let slot = self.resolve(id)?;
            let guard = Arc::clone(&slot).lock_owned().await;
            if guard.retired {
                // Reset or evicted while we queued.
                continue;
            }
            return Ok(SessionLease {
                manager: self,
                id: id.clone(),
                slot,
                guard,
            });
        }
    }

    /// History snapshot, creating an empty session if unknown.
    pub async fn get_or_create(&self, id: &SessionId) -> Result<Vec<Fragment>, SessionError> {
        let lease = self.checkout(id).await?;
        Ok(lease.history().to_vec())
    }

    pub async fn append(&self, id: &SessionId, fragment: Fragment) -> Result<(), SessionError> {
        let mut lease = self.checkout(id).await?;
        lease.append(fragment);
        Ok(())
    }

    /// History snapshot without creating anything.
    pub async fn snapshot(&self, id: &SessionId) -> Option<Vec<Fragment>> {
        let slot = self.lookup(id)?;
        let state = slot.lock().await;
        (!state.retired).then(|| state.fragments.clone())
    }

    /// Remove a session. Waits for a running turn on it to finish first.
    /// Returns whether the session existed.
    pub async fn delete(&self, id: &SessionId) -> bool {
        let Some(slot) = self.lookup(id) else {
            return false;
        };
        let mut state = slot.lock().await;
        if state.retired {
            return false;
        }

        let mut entries = self.lock_entries();
        if entries
            .get(id)
            .is_some_and(|entry| Arc::ptr_eq(&entry.slot, &slot))
        {
            entries.remove(id);
        }
        state.retire();
        true
    }

    /// Drop every idle session the policy reports as expired.
    pub fn sweep_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.lock_entries();
        let before = entries.len();
        entries.retain(|id, entry| {
            let expired = self.policy.is_expired(&entry.meta, now) && retire_if_idle(&entry.slot);
            if expired {
                tracing::debug!(session = %id, turns = entry.meta.turns, "expired idle session");
            }
            !expired
        });
        before - entries.len()
    }

    /// Run [`SessionManager::sweep_expired`] every `every` until `shutdown` fires.
    pub fn spawn_sweeper(
        self: &Arc<Self>,
        every: Duration,
        shutdown: CancellationToken,
    ) -> JoinHandle<()> {
        let manager = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately.
            ticker.tick().await;
            loop {
                tokio::select! {
                    () = shutdown.cancelled() => break,
                    _ = ticker.tick() => {
                        let removed = manager.sweep_expired();
                        if removed > 0 {
                            tracing::info!(removed, remaining = manager.len(), "swept expired sessions");
                        }
                    }
                }
            }
            tracing::debug!("session sweeper stopped");
        })
    }

    fn lookup(&self, id: &SessionId) -> Option<Slot> {
        self.lock_entries()
            .get(id)
            .map(|entry| Arc::clone(&entry.slot))
    }

    fn resolve(&self, id: &SessionId) -> Result<Slot, SessionError> {
        let now = Instant::now();
        let mut entries = self.lock_entries();

        if let Some(entry) = entries.get_mut(id) {
            let expired = self.policy.is_expired(&entry.meta, now) && retire_if_idle(&entry.slot);
            if !expired {
                entry.meta.last_access = now;
                return Ok(Arc::clone(&entry.slot));
            }
            tracing::debug!(session = %id, "session expired; starting fresh");
            entries.remove(id);
        }

        if entries.len() >= self.max_sessions {
            self.evict_one(&mut entries)?;
        }

        let slot = Slot::default();
        entries.insert(
            id.clone(),
            Entry {
                slot: Arc::clone(&slot),
                meta: SessionMeta::new(now),
            },
        );
        Ok(slot)
    }

    fn evict_one(&self, entries: &mut HashMap<SessionId, Entry>) -> Result<(), SessionError> {
        let mut candidates: Vec<(Instant, SessionId)> = entries
            .iter()
            .map(|(id, entry)| (self.policy.rank(&entry.meta), id.clone()))
            .collect();
        candidates.sort();

        for (_, id) in candidates {
            if entries
                .get(&id)
                .is_some_and(|entry| retire_if_idle(&entry.slot))
            {
                entries.remove(&id);
                tracing::warn!(
                    session = %id,
                    capacity = self.max_sessions,
                    policy = self.policy.name(),
                    "evicted session to stay within capacity"
                );
                return Ok(());
            }
        }

        Err(SessionError::CapacityExhausted {
            capacity: self.max_sessions,
        })
    }

    fn touch(&self, id: &SessionId, slot: &Slot, turns: usize) {
        let mut entries = self.lock_entries();
        if let Some(entry) = entries.get_mut(id)
            && Arc::ptr_eq(&entry.slot, slot)
        {
            entry.meta.last_access = Instant::now();
            entry.meta.turns = turns;
        }
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("policy", &self.policy)
            .field("max_sessions", &self.max_sessions)
            .finish_non_exhaustive()
    }
}

/// Exclusive access to one session for the duration of a chat turn.
pub struct SessionLease<'a> {
    manager: &'a SessionManager,
    id: SessionId,
    slot: Slot,
    guard: OwnedMutexGuard<SessionState>,
}

impl SessionLease<'_> {
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// Stored fragments, oldest first.
    pub fn history(&self) -> &[Fragment] {
        &self.guard.fragments
    }

    /// Every stored fragment in order, followed by `next`.
    pub fn prompt_with(&self, next: &[TokenId]) -> Vec<TokenId> {
        let stored: usize = self.guard.fragments.iter().map(Vec::len).sum();
        let mut prompt = Vec::with_capacity(stored + next.len());
        for fragment in &self.guard.fragments {
            prompt.extend_from_slice(fragment);
        }
        prompt.extend_from_slice(next);
        prompt
    }

    pub fn append(&mut self, fragment: Fragment) {
        self.guard.fragments.push(fragment);
        let turns = self.guard.fragments.len();
        self.manager.touch(&self.id, &self.slot, turns);
    }
}
