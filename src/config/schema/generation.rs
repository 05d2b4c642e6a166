use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Model backend name (default: "llamacpp")
    #[serde(default = "default_backend")]
    pub backend: String,
    /// Base URL of the backend server
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Bearer key for backends started with an API key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Hard cap on total sequence length (prompt + continuation), in tokens
    #[serde(default = "default_max_length")]
    pub max_length: usize,
    /// End-of-sequence token id. 50256 is the GPT-2 / `DialoGPT` vocabulary.
    #[serde(default = "default_eos_token_id")]
    pub eos_token_id: u32,
    /// Sampling temperature; 0 selects greedy decoding
    #[serde(default)]
    pub temperature: f64,
    /// Upper bound on a single generation call
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Maximum generation calls in flight across all sessions
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
}

fn default_backend() -> String {
    "llamacpp".into()
}

fn default_base_url() -> String {
    "http://127.0.0.1:8080".into()
}

fn default_max_length() -> usize {
    500
}

fn default_eos_token_id() -> u32 {
    50_256
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_max_concurrent() -> usize {
    4
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            base_url: default_base_url(),
            api_key: None,
            max_length: default_max_length(),
            eos_token_id: default_eos_token_id(),
            temperature: 0.0,
            timeout_secs: default_timeout_secs(),
            max_concurrent: default_max_concurrent(),
        }
    }
}
