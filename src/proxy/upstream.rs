//! HTTP client for the upstream API.

use std::error::Error as _;
use std::time::Duration;

use thiserror::Error;

use crate::config::UpstreamConfig;

/// Failure talking to the upstream API.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("failed to build upstream client: {0}")]
    Build(#[source] reqwest::Error),

    /// DNS, connect, timeout or TLS failure. Displays the full cause chain.
    #[error("{}", describe(.source))]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// No response head within `response_timeout_secs`.
    #[error("upstream did not respond within {secs}s ({url})")]
    Timeout { url: String, secs: u64 },
}

fn describe(err: &reqwest::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

/// Client for the fixed upstream base URL.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    client: reqwest::Client,
    base_url: String,
    response_timeout: Duration,
}

impl UpstreamClient {
    /// Build the client. Certificate checks are skipped only when
    /// `accept_invalid_certs` is set, and only for this client.
    ///
    /// Redirects are never followed: a 3xx goes back to the caller as is.
    pub fn new(config: &UpstreamConfig) -> Result<Self, ProxyError> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .read_timeout(Duration::from_secs(config.read_timeout_secs))
            .no_proxy()
            .build()
            .map_err(ProxyError::Build)?;

        if config.accept_invalid_certs {
            tracing::warn!(base_url = %config.base_url, "Upstream certificate verification disabled");
        }

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            response_timeout: Duration::from_secs(config.response_timeout_secs),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `<base> + <path> + <query>`, unaltered.
    pub fn target_url(&self, path_and_query: &str) -> String {
        format!("{}{}", self.base_url, path_and_query)
    }

    /// Issue a single GET to the upstream. The body is left unread.
    ///
    /// The response head must arrive within the response timeout, which
    /// validation keeps below the inbound request deadline.
    pub async fn forward(&self, path_and_query: &str) -> Result<reqwest::Response, ProxyError> {
        let url = self.target_url(path_and_query);
        tracing::info!(target_url = %url, "Proxying request");

        match tokio::time::timeout(self.response_timeout, self.client.get(&url).send()).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(source)) => Err(ProxyError::Request { url, source }),
            Err(_) => Err(ProxyError::Timeout {
                url,
                secs: self.response_timeout.as_secs(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base_url: &str) -> UpstreamClient {
        UpstreamClient::new(&UpstreamConfig {
            base_url: base_url.to_string(),
            ..UpstreamConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_target_url_keeps_path_and_query() {
        let upstream = client("https://swapi.dev/api");
        assert_eq!(upstream.target_url("/people/1/"), "https://swapi.dev/api/people/1/");
        assert_eq!(
            upstream.target_url("/people/?search=sky&page=2"),
            "https://swapi.dev/api/people/?search=sky&page=2"
        );
        assert_eq!(upstream.target_url("/"), "https://swapi.dev/api/");
    }

    #[tokio::test]
    async fn test_connection_refused_is_a_request_error() {
        // Bind then drop to get a port nobody listens on.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let upstream = client(&format!("http://{addr}"));
        let err = upstream.forward("/people/1/").await.unwrap_err();
        match &err {
            ProxyError::Request { url, .. } => assert_eq!(url, &format!("http://{addr}/people/1/")),
            other => panic!("unexpected error: {other}"),
        }
        assert!(!err.to_string().is_empty());
    }

    #[tokio::test]
    async fn test_silent_upstream_is_a_timeout() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let upstream = UpstreamClient::new(&UpstreamConfig {
            base_url: format!("http://{addr}"),
            response_timeout_secs: 1,
            ..UpstreamConfig::default()
        })
        .unwrap();
        let err = upstream.forward("/films/").await.unwrap_err();
        assert!(matches!(err, ProxyError::Timeout { secs: 1, .. }), "unexpected error: {err}");
    }
}
