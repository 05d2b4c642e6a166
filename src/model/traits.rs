use async_trait::async_trait;

/// Vocabulary index produced by a [`Tokenizer`].
pub type TokenId = u32;

/// Text <-> token conversion, owned by the model backend.
#[async_trait]
pub trait Tokenizer: Send + Sync {
    /// Backend name for logs and `/health`.
    fn name(&self) -> &str;

    async fn encode(&self, text: &str) -> anyhow::Result<Vec<TokenId>>;

    async fn decode(&self, tokens: &[TokenId]) -> anyhow::Result<String>;

    fn eos_token_id(&self) -> TokenId;

    /// Tokens dropped by [`Tokenizer::decode_skip_special`].
    fn is_special(&self, token: TokenId) -> bool {
        token == self.eos_token_id()
    }

    /// Encode one user turn: the message followed by the end-of-sequence token.
    async fn encode_turn(&self, text: &str) -> anyhow::Result<Vec<TokenId>> {
        let mut tokens = self.encode(text).await?;
        tokens.push(self.eos_token_id());
        Ok(tokens)
    }

    async fn decode_skip_special(&self, tokens: &[TokenId]) -> anyhow::Result<String> {
        let kept: Vec<TokenId> = tokens
            .iter()
            .copied()
            .filter(|token| !self.is_special(*token))
            .collect();
        if kept.is_empty() {
            return Ok(String::new());
        }
        self.decode(&kept).await
    }
}

/// The pretrained causal language model.
#[async_trait]
pub trait Generator: Send + Sync {
    fn name(&self) -> &str;

    /// Continue `prompt`. Returns the full sequence, prompt first, holding at
    /// most `max_length` tokens in total. Identical inputs give identical
    /// outputs.
    async fn generate(&self, prompt: &[TokenId], max_length: usize)
    -> anyhow::Result<Vec<TokenId>>;

    /// Open connections ahead of the first request. Default is a no-op.
    async fn warmup(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

/// The part of `output` generated after `prompt`.
pub fn continuation<'a>(prompt: &[TokenId], output: &'a [TokenId]) -> &'a [TokenId] {
    output.get(prompt.len()..).unwrap_or(&[])
}
