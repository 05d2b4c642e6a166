pub mod factory;
pub mod http_client;
pub mod llamacpp;
pub mod scrub;
pub mod traits;

pub use factory::{ModelBackend, create_backend};
pub use llamacpp::LlamaCppBackend;
pub use scrub::{api_error, sanitize_error_text, scrub_secret_patterns};
pub use traits::{Generator, TokenId, Tokenizer, continuation};
