use std::collections::BTreeMap;

use chrono::Local;
use reqwest::Client;
use serde_json::Value;

use crate::sink::{FallbackPolicy, LocalSink, RemoteSink, Report};

/// Where a report ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// Stored by the gateway in this file.
    Remote(String),
    /// Gateway unreachable; kept in the local sink under this file name.
    Local(String),
}

pub struct GatewayClient {
    client: Client,
    base_url: String,
    remote: RemoteSink,
    local: LocalSink,
    policy: FallbackPolicy,
}

impl GatewayClient {
    pub fn new(base_url: &str) -> Self {
        Self::with_policy(base_url, FallbackPolicy::default())
    }

    pub fn with_policy(base_url: &str, policy: FallbackPolicy) -> Self {
        // The gateway is a local helper; never route to it through a proxy.
        let client = Client::builder().no_proxy().build().unwrap_or_default();
        let base_url = base_url.trim_end_matches('/').to_string();
        Self {
            remote: RemoteSink::new(client.clone(), &base_url),
            client,
            base_url,
            local: LocalSink::new(),
            policy,
        }
    }

    /// File an error report stamped with the current local time.
    pub async fn report_error(&self, context: &str, error: &str) -> Delivery {
        let report = Report::new(context, error, Local::now());
        let (file, remote) = self.policy.deliver(&self.remote, &self.local, &report).await;
        if remote {
            Delivery::Remote(file)
        } else {
            Delivery::Local(file)
        }
    }

    /// All stored logs; the local sink's contents if the gateway is unavailable.
    pub async fn read_logs(&self) -> BTreeMap<String, String> {
        match self.fetch_logs().await {
            Ok(logs) => logs,
            Err(_) => self.local.snapshot(),
        }
    }

    async fn fetch_logs(&self) -> Result<BTreeMap<String, String>, Box<dyn std::error::Error>> {
        let resp = self.client.get(format!("{}/get-logs", self.base_url)).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(format!("Gateway returned error status {}", status).into());
        }
        Ok(resp.json().await?)
    }

    /// Browse an upstream path through the gateway.
    pub async fn get(&self, path: &str) -> Result<(u16, Value), Box<dyn std::error::Error>> {
        let resp = self.client.get(format!("{}{}", self.base_url, path)).send().await?;
        let status = resp.status().as_u16();
        let text = resp.text().await?;
        Ok((status, serde_json::from_str(&text)?))
    }

    pub fn local_logs(&self) -> BTreeMap<String, String> {
        self.local.snapshot()
    }
}
