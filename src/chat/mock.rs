//! In-process stand-ins for the model backend.

use crate::model::{Generator, ModelBackend, TokenId, Tokenizer};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub(crate) const EOS: TokenId = 0;

/// Each byte becomes `byte + 1`, so `0` is free for end-of-sequence.
pub(crate) struct ByteTokenizer;

#[async_trait]
impl Tokenizer for ByteTokenizer {
    fn name(&self) -> &str {
        "bytes"
    }

    async fn encode(&self, text: &str) -> anyhow::Result<Vec<TokenId>> {
        Ok(text.bytes().map(|b| TokenId::from(b) + 1).collect())
    }

    async fn decode(&self, tokens: &[TokenId]) -> anyhow::Result<String> {
        let bytes = tokens
            .iter()
            .map(|t| u8::try_from(t - 1))
            .collect::<Result<Vec<u8>, _>>()?;
        Ok(String::from_utf8(bytes)?)
    }

    fn eos_token_id(&self) -> TokenId {
        EOS
    }
}

pub(crate) fn bytes_of(text: &str) -> Vec<TokenId> {
    text.bytes().map(|b| TokenId::from(b) + 1).collect()
}

/// Replies with a fixed continuation and records every prompt it saw.
pub(crate) struct ScriptedGenerator {
    reply: Vec<TokenId>,
    delay: Duration,
    fail: bool,
    prompts: Mutex<Vec<Vec<TokenId>>>,
}

impl ScriptedGenerator {
    pub(crate) fn replying(text: &str) -> Self {
        let mut reply = bytes_of(text);
        reply.push(EOS);
        Self {
            reply,
            delay: Duration::ZERO,
            fail: false,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn failing() -> Self {
        Self {
            fail: true,
            ..Self::replying("")
        }
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub(crate) fn prompts(&self) -> Vec<Vec<TokenId>> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(
        &self,
        prompt: &[TokenId],
        max_length: usize,
    ) -> anyhow::Result<Vec<TokenId>> {
        self.prompts.lock().unwrap().push(prompt.to_vec());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.fail {
            anyhow::bail!("model crashed");
        }
        let mut output = prompt.to_vec();
        output.extend_from_slice(&self.reply);
        output.truncate(max_length.max(prompt.len()));
        Ok(output)
    }
}

pub(crate) fn backend(generator: &Arc<ScriptedGenerator>) -> ModelBackend {
    let generator: Arc<dyn Generator> = generator.clone();
    ModelBackend::new(Arc::new(ByteTokenizer), generator)
}
