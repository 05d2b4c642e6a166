//! Client for a llama.cpp-compatible inference server.
//!
//! Uses the token-level endpoints so the session history can be stored and
//! replayed exactly as the model saw it:
//! - `POST /tokenize`   `{content, add_special}` -> `{tokens}`
//! - `POST /detokenize` `{tokens}` -> `{content}`
//! - `POST /completion` `{prompt: [tokens], n_predict, ...}` -> `{tokens, content}`

use super::http_client::build_backend_client;
use super::traits::{Generator, TokenId, Tokenizer};
use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

const BACKEND_NAME: &str = "llama.cpp";

pub struct LlamaCppBackend {
    base_url: String,
    api_key: Option<String>,
    eos_token_id: TokenId,
    temperature: f64,
    client: Client,
}

#[derive(Debug, Serialize)]
struct TokenizeRequest<'a> {
    content: &'a str,
    add_special: bool,
}

#[derive(Debug, Deserialize)]
struct TokenizeResponse {
    tokens: Vec<TokenId>,
}

#[derive(Debug, Serialize)]
struct DetokenizeRequest<'a> {
    tokens: &'a [TokenId],
}

#[derive(Debug, Deserialize)]
struct DetokenizeResponse {
    content: String,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    prompt: &'a [TokenId],
    n_predict: usize,
    temperature: f64,
    cache_prompt: bool,
    return_tokens: bool,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    tokens: Vec<TokenId>,
    #[serde(default)]
    content: String,
}

impl LlamaCppBackend {
    pub fn new(
        base_url: &str,
        api_key: Option<String>,
        eos_token_id: TokenId,
        temperature: f64,
        timeout_secs: u64,
    ) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            eos_token_id,
            temperature,
            client: build_backend_client(timeout_secs),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post<Req, Resp>(&self, endpoint: &str, body: &Req) -> anyhow::Result<Resp>
    where
        Req: Serialize + ?Sized + Sync,
        Resp: DeserializeOwned,
    {
        let url = format!("{}{endpoint}", self.base_url);
        let mut request = self.client.post(&url).json(body);
        if let Some(key) = self.api_key.as_deref() {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("{BACKEND_NAME} request to {url} failed"))?;

        if !response.status().is_success() {
            let err = super::api_error(BACKEND_NAME, response).await;
            anyhow::bail!(
                "{err}. Is the llama.cpp server running at {}?",
                self.base_url
            );
        }

        response
            .json()
            .await
            .with_context(|| format!("{BACKEND_NAME} returned an unexpected body from {endpoint}"))
    }
}

#[async_trait]
impl Tokenizer for LlamaCppBackend {
    fn name(&self) -> &str {
        BACKEND_NAME
    }

    async fn encode(&self, text: &str) -> anyhow::Result<Vec<TokenId>> {
        if text.is_empty() {
            return Ok(Vec::new());
        }
        let response: TokenizeResponse = self
            .post(
                "/tokenize",
                &TokenizeRequest {
                    content: text,
                    add_special: false,
                },
            )
            .await?;
        Ok(response.tokens)
    }

    async fn decode(&self, tokens: &[TokenId]) -> anyhow::Result<String> {
        if tokens.is_empty() {
            return Ok(String::new());
        }
        let response: DetokenizeResponse = self
            .post("/detokenize", &DetokenizeRequest { tokens })
            .await?;
        Ok(response.content)
    }

    fn eos_token_id(&self) -> TokenId {
        self.eos_token_id
    }
}

#[async_trait]
impl Generator for LlamaCppBackend {
    fn name(&self) -> &str {
        BACKEND_NAME
    }

    async fn generate(
        &self,
        prompt: &[TokenId],
        max_length: usize,
    ) -> anyhow::Result<Vec<TokenId>> {
        let budget = max_length.saturating_sub(prompt.len());
        if budget == 0 {
            return Ok(prompt.to_vec());
        }

        let response: CompletionResponse = self
            .post(
                "/completion",
                &CompletionRequest {
                    prompt,
                    n_predict: budget,
                    temperature: self.temperature,
                    cache_prompt: true,
                    return_tokens: true,
                    stream: false,
                },
            )
            .await?;

        // Older servers ignore `return_tokens`; recover ids from the text.
        let mut generated = if response.tokens.is_empty() && !response.content.is_empty() {
            self.encode(&response.content).await?
        } else {
            response.tokens
        };
        generated.truncate(budget);

        let mut output = Vec::with_capacity(prompt.len() + generated.len());
        output.extend_from_slice(prompt);
        output.extend(generated);
        Ok(output)
    }

    async fn warmup(&self) -> anyhow::Result<()> {
        let url = format!("{}/health", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("{BACKEND_NAME} health check at {url} failed"))?;
        if !response.status().is_success() {
            return Err(super::api_error(BACKEND_NAME, response).await);
        }
        Ok(())
    }
}
