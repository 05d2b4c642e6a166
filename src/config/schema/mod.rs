mod core;
mod gateway;
mod generation;
mod session;

pub use core::Config;
pub use gateway::GatewayConfig;
pub use generation::GenerationConfig;
pub use session::{EvictionKind, SessionConfig};
