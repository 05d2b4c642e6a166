use super::llamacpp::LlamaCppBackend;
use super::traits::{Generator, Tokenizer};
use crate::config::GenerationConfig;
use crate::error::ModelError;
use std::sync::Arc;

/// The tokenizer and generator the chat service talks to. Usually both halves
/// are the same backend object.
#[derive(Clone)]
pub struct ModelBackend {
    pub tokenizer: Arc<dyn Tokenizer>,
    pub generator: Arc<dyn Generator>,
}

impl ModelBackend {
    pub fn new(tokenizer: Arc<dyn Tokenizer>, generator: Arc<dyn Generator>) -> Self {
        Self {
            tokenizer,
            generator,
        }
    }

    pub fn name(&self) -> &str {
        self.generator.name()
    }
}

/// Resolve the backend API key: config first, then `CHATRELAY_BACKEND_API_KEY`.
fn resolve_api_key(explicit_api_key: Option<&str>) -> Option<String> {
    if let Some(key) = explicit_api_key.map(str::trim).filter(|k| !k.is_empty()) {
        return Some(key.to_string());
    }

    std::env::var("CHATRELAY_BACKEND_API_KEY")
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Build the model backend named by `config.backend`.
pub fn create_backend(config: &GenerationConfig) -> Result<ModelBackend, ModelError> {
    match config.backend.trim().to_ascii_lowercase().as_str() {
        "llamacpp" | "llama.cpp" | "llama-cpp" => {
            let backend = Arc::new(LlamaCppBackend::new(
                &config.base_url,
                resolve_api_key(config.api_key.as_deref()),
                config.eos_token_id,
                config.temperature,
                config.timeout_secs,
            ));
            let tokenizer: Arc<dyn Tokenizer> = backend.clone();
            Ok(ModelBackend::new(tokenizer, backend))
        }
        other => Err(ModelError::UnknownBackend(other.to_string())),
    }
}
