pub mod eviction;
pub mod id;
pub mod manager;

pub use eviction::{EvictionPolicy, LruPolicy, SessionMeta, TtlPolicy, policy_from_config};
pub use id::{MAX_SESSION_ID_LEN, SessionId};
pub use manager::{Fragment, SessionLease, SessionManager};
