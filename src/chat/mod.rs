//! Chat turns: history replay, generation, and append.

#[cfg(test)]
pub(crate) mod mock;
mod service;

pub use service::ChatService;
