use crate::config::GenerationConfig;
use crate::error::ChatError;
use crate::model::{ModelBackend, TokenId, continuation, sanitize_error_text};
use crate::session::{SessionId, SessionManager};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

/// Runs chat turns against the session store and the model backend.
pub struct ChatService {
    sessions: Arc<SessionManager>,
    backend: ModelBackend,
    max_length: usize,
    generation_timeout: Duration,
    permits: Semaphore,
}

impl ChatService {
    pub fn new(
        sessions: Arc<SessionManager>,
        backend: ModelBackend,
        config: &GenerationConfig,
    ) -> Self {
        Self {
            sessions,
            backend,
            max_length: config.max_length,
            generation_timeout: Duration::from_secs(config.timeout_secs),
            permits: Semaphore::new(config.max_concurrent.max(1)),
        }
    }

    pub fn with_generation_timeout(mut self, timeout: Duration) -> Self {
        self.generation_timeout = timeout;
        self
    }

    pub fn sessions(&self) -> &Arc<SessionManager> {
        &self.sessions
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    /// One conversational turn.
    ///
    /// The session stays locked from history read to append. On any error,
    /// and when the returned future is dropped early, the history is left as
    /// it was.
    pub async fn chat(&self, id: &SessionId, message: &str) -> Result<String, ChatError> {
        let mut lease = self.sessions.checkout(id).await?;
        let tokenizer = &self.backend.tokenizer;

        let turn = tokenizer
            .encode_turn(message)
            .await
            .map_err(ChatError::Tokenizer)?;
        let prompt = lease.prompt_with(&turn);
        if prompt.len() >= self.max_length {
            tracing::warn!(
                session = %id,
                prompt_tokens = prompt.len(),
                max_length = self.max_length,
                "conversation exceeds the context window"
            );
            return Err(ChatError::ContextExhausted {
                prompt_len: prompt.len(),
                max_length: self.max_length,
            });
        }

        let output = self.generate(id, &prompt).await?;
        let generated = continuation(&prompt, &output);
        let reply = tokenizer
            .decode_skip_special(generated)
            .await
            .map_err(ChatError::Tokenizer)?;

        tracing::debug!(
            session = %id,
            turn = lease.history().len() + 1,
            prompt_tokens = prompt.len(),
            reply_tokens = generated.len(),
            "chat turn complete"
        );
        lease.append(turn);
        Ok(reply)
    }

    /// Forget a session. Returns whether it existed.
    pub async fn reset(&self, id: &SessionId) -> bool {
        let existed = self.sessions.delete(id).await;
        tracing::debug!(session = %id, existed, "session reset");
        existed
    }

    async fn generate(
        &self,
        id: &SessionId,
        prompt: &[TokenId],
    ) -> Result<Vec<TokenId>, ChatError> {
        let run = async {
            let _permit = self
                .permits
                .acquire()
                .await
                .map_err(|e| ChatError::Generation(e.into()))?;
            self.backend
                .generator
                .generate(prompt, self.max_length)
                .await
                .map_err(ChatError::Generation)
        };

        match tokio::time::timeout(self.generation_timeout, run).await {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(err)) => {
                tracing::error!(
                    session = %id,
                    backend = self.backend.name(),
                    error = %sanitize_error_text(&err.to_string()),
                    "generation failed"
                );
                Err(err)
            }
            Err(_) => {
                let after_ms =
                    u64::try_from(self.generation_timeout.as_millis()).unwrap_or(u64::MAX);
                tracing::warn!(session = %id, after_ms, "generation timed out");
                Err(ChatError::GenerationTimeout {
                    after_secs: self.generation_timeout.as_secs(),
                })
            }
        }
    }
}
