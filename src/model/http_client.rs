use reqwest::Client;
use std::time::Duration;

/// HTTP client for model backends.
///
/// The per-request timeout is a backstop; the chat service enforces the
/// configured generation timeout itself and cancels by dropping the request.
pub fn build_backend_client(timeout_secs: u64) -> Client {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs.saturating_add(5)))
        .connect_timeout(Duration::from_secs(10))
        .pool_max_idle_per_host(10)
        .pool_idle_timeout(Duration::from_secs(90))
        .tcp_keepalive(Duration::from_secs(60))
        .build()
        .unwrap_or_else(|_| Client::new())
}
