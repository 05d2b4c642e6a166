pub mod schema;

pub use schema::{Config, EvictionKind, GatewayConfig, GenerationConfig, SessionConfig};
