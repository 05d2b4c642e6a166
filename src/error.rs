use thiserror::Error;

// ─── Top-level error hierarchy ───────────────────────────────────────────────

/// Structured error hierarchy for `chatrelay`.
///
/// Each subsystem defines its own error variant. The gateway matches on
/// [`ChatError`] to pick a status code; starting the gateway returns a
/// `RelayError`, with ad-hoc anyhow chains landing in `Other`.
#[derive(Debug, Error)]
pub enum RelayError {
    // ── Config ───────────────────────────────────────────────────────────
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    // ── Session store ────────────────────────────────────────────────────
    #[error("session: {0}")]
    Session(#[from] SessionError),

    // ── Model backend ────────────────────────────────────────────────────
    #[error("model: {0}")]
    Model(#[from] ModelError),

    // ── Chat turn ────────────────────────────────────────────────────────
    #[error("chat: {0}")]
    Chat(#[from] ChatError),

    // ── Generic fallthrough (wraps anyhow for interop) ──────────────────
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ─── Config errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("validation failed: {0}")]
    Validation(String),
}

// ─── Session errors ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("invalid session_id: {0}")]
    InvalidId(String),

    #[error("session capacity ({capacity}) exhausted and every session is busy")]
    CapacityExhausted { capacity: usize },
}

// ─── Model backend errors ───────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("unknown model backend: {0}")]
    UnknownBackend(String),
}

// ─── Chat turn errors ───────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ChatError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(
        "conversation is {prompt_len} tokens, at or over the {max_length}-token limit; reset the session"
    )]
    ContextExhausted { prompt_len: usize, max_length: usize },

    #[error("tokenizer failed: {0}")]
    Tokenizer(anyhow::Error),

    #[error("generation failed: {0}")]
    Generation(anyhow::Error),

    #[error("generation timed out after {after_secs}s")]
    GenerationTimeout { after_secs: u64 },
}

// ─── Convenience re-exports ─────────────────────────────────────────────────

/// Shorthand result type for the crate.
pub type Result<T> = std::result::Result<T, RelayError>;
