//! Reused near-verbatim from the teacher's
//! `infrastructure/core/http_client_factory.rs`: exponential backoff with
//! jitter on transient errors (spec §4.3(c)), via `reqwest-middleware` +
//! `reqwest-retry`.

use reqwest::Client;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use std::time::Duration;

pub struct HttpClientFactory;

impl HttpClientFactory {
    pub fn create_client() -> ClientWithMiddleware {
        Self::with_timeout(Duration::from_secs(30))
    }

    /// Build a client whose per-request deadline is `timeout` (spec §4.2's
    /// per-source timeout, default 5s for aggregator sources; exchange
    /// adapters use a longer deadline).
    pub fn with_timeout(timeout: Duration) -> ClientWithMiddleware {
        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(3);

        let client = Client::builder()
            .pool_max_idle_per_host(5)
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| Client::new());

        ClientBuilder::new(client)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build()
    }
}

pub fn build_url_with_query<K, V>(base_url: &str, params: &[(K, V)]) -> String
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    if params.is_empty() {
        return base_url.to_string();
    }

    let query_string: String = params
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding_encode(k.as_ref()), urlencoding_encode(v.as_ref())))
        .collect::<Vec<_>>()
        .join("&");

    if base_url.contains('?') {
        format!("{}&{}", base_url, query_string)
    } else {
        format!("{}?{}", base_url, query_string)
    }
}

fn urlencoding_encode(s: &str) -> String {
    let mut encoded = String::new();
    for c in s.chars() {
        match c {
            'A'..='Z' | 'a'..='z' | '0'..='9' | '-' | '_' | '.' | '~' => encoded.push(c),
            _ => {
                for byte in c.to_string().as_bytes() {
                    encoded.push_str(&format!("%{:02X}", byte));
                }
            }
        }
    }
    encoded
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appends_query_params() {
        let url = build_url_with_query("https://api.example.com/ticker", &[("symbol", "BTCUSDT")]);
        assert_eq!(url, "https://api.example.com/ticker?symbol=BTCUSDT");
    }

    #[test]
    fn encodes_special_characters() {
        let url = build_url_with_query("https://api.example.com/x", &[("q", "a b&c")]);
        assert_eq!(url, "https://api.example.com/x?q=a%20b%26c");
    }
}
