use reqwest::Client;
use std::time::Duration;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

pub struct HttpClientFactory;

impl HttpClientFactory {
    /// Creates a plain HTTP client. Each request is attempted once.
    pub fn create_client(timeout: Duration, user_agent: &str) -> Client {
        Client::builder()
            .pool_max_idle_per_host(5)
            .timeout(timeout)
            .connect_timeout(CONNECT_TIMEOUT.min(timeout))
            .user_agent(user_agent.to_string())
            .build()
            .unwrap_or_else(|_| Client::new())
    }
}
