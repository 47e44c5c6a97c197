use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Local};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Wire form of an error report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub error: String,
    pub context: String,
    pub timestamp: String,
}

impl Report {
    pub fn new(context: &str, error: &str, at: DateTime<Local>) -> Self {
        Self {
            error: error.to_string(),
            context: context.to_string(),
            timestamp: at.to_rfc3339(),
        }
    }

    fn local_time(&self) -> DateTime<Local> {
        DateTime::parse_from_rfc3339(&self.timestamp)
            .map(|dt| dt.with_timezone(&Local))
            .unwrap_or_else(|_| Local::now())
    }
}

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("gateway unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("gateway returned status {0}")]
    Status(u16),
}

/// Somewhere a report can be written. Returns the file it landed in.
pub trait ReportSink {
    fn write(&self, report: &Report) -> impl Future<Output = Result<String, SinkError>> + Send;
}

#[derive(Debug, Deserialize)]
struct Stored {
    file: String,
}

/// `POST /log-error` on a gateway.
#[derive(Debug, Clone)]
pub struct RemoteSink {
    client: Client,
    base_url: String,
}

impl RemoteSink {
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

impl ReportSink for RemoteSink {
    fn write(&self, report: &Report) -> impl Future<Output = Result<String, SinkError>> + Send {
        let request = self
            .client
            .post(format!("{}/log-error", self.base_url))
            .json(report);
        async move {
            let resp = request.send().await?;
            let status = resp.status();
            if !status.is_success() {
                return Err(SinkError::Status(status.as_u16()));
            }
            let stored: Stored = resp.json().await?;
            Ok(stored.file)
        }
    }
}

/// In-memory stand-in for the gateway's files, same naming and line format.
#[derive(Debug, Default)]
pub struct LocalSink {
    files: Mutex<BTreeMap<String, String>>,
}

impl LocalSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.files.lock().map(|files| files.clone()).unwrap_or_default()
    }

    fn append(&self, report: &Report) -> String {
        let at = report.local_time();
        let file = format!("{} ErrLog.txt", at.format("%Y-%m-%d"));
        let line = format!(
            "{} - [{}] {}\n",
            at.format("%H:%M:%S"),
            single_line(&report.context),
            single_line(&report.error)
        );
        if let Ok(mut files) = self.files.lock() {
            files.entry(file.clone()).or_default().push_str(&line);
        }
        file
    }
}

impl ReportSink for LocalSink {
    fn write(&self, report: &Report) -> impl Future<Output = Result<String, SinkError>> + Send {
        let file = self.append(report);
        async move { Ok(file) }
    }
}

// Mirrors the gateway: one report, one line.
fn single_line(text: &str) -> String {
    text.replace("\r\n", " ").replace(['\r', '\n'], " ")
}

/// How hard to try the primary sink before falling back.
#[derive(Debug, Clone, Copy)]
pub struct FallbackPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl Default for FallbackPolicy {
    fn default() -> Self {
        Self {
            attempts: 2,
            delay: Duration::from_millis(200),
        }
    }
}

impl FallbackPolicy {
    /// Try `primary` up to `attempts` times, then write to `fallback`.
    ///
    /// Returns the file name and whether the primary accepted the report.
    pub async fn deliver<P, F>(&self, primary: &P, fallback: &F, report: &Report) -> (String, bool)
    where
        P: ReportSink,
        F: ReportSink,
    {
        let attempts = self.attempts.max(1);
        for attempt in 1..=attempts {
            match primary.write(report).await {
                Ok(file) => return (file, true),
                Err(_) if attempt < attempts => tokio::time::sleep(self.delay).await,
                Err(_) => {}
            }
        }

        match fallback.write(report).await {
            Ok(file) => (file, false),
            Err(_) => (String::new(), false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct Flaky {
        failures: u32,
        calls: AtomicU32,
    }

    impl ReportSink for Flaky {
        fn write(&self, _report: &Report) -> impl Future<Output = Result<String, SinkError>> + Send {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            let failures = self.failures;
            async move {
                if call < failures {
                    Err(SinkError::Status(503))
                } else {
                    Ok("remote.txt".to_string())
                }
            }
        }
    }

    fn report() -> Report {
        let at = Local.with_ymd_and_hms(2024, 2, 3, 4, 5, 6).unwrap();
        Report::new("people", "HTTP error! status: 500", at)
    }

    fn policy(attempts: u32) -> FallbackPolicy {
        FallbackPolicy {
            attempts,
            delay: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn test_primary_retry_then_success() {
        let primary = Flaky { failures: 1, calls: AtomicU32::new(0) };
        let local = LocalSink::new();

        let (file, remote) = policy(2).deliver(&primary, &local, &report()).await;
        assert_eq!(file, "remote.txt");
        assert!(remote);
        assert!(local.snapshot().is_empty());
    }

    #[tokio::test]
    async fn test_falls_back_after_attempts() {
        let primary = Flaky { failures: 10, calls: AtomicU32::new(0) };
        let local = LocalSink::new();

        let (file, remote) = policy(3).deliver(&primary, &local, &report()).await;
        assert!(!remote);
        assert_eq!(file, "2024-02-03 ErrLog.txt");
        assert_eq!(primary.calls.load(Ordering::SeqCst), 3);
        assert_eq!(
            local.snapshot()["2024-02-03 ErrLog.txt"],
            "04:05:06 - [people] HTTP error! status: 500\n"
        );
    }

    #[tokio::test]
    async fn test_local_sink_keeps_one_line_per_report() {
        let at = Local.with_ymd_and_hms(2024, 2, 3, 4, 5, 6).unwrap();
        let local = LocalSink::new();

        local
            .write(&Report::new("films\nlist", "TypeError: x\r\n    at fetch\rend", at))
            .await
            .unwrap();
        assert_eq!(
            local.snapshot()["2024-02-03 ErrLog.txt"],
            "04:05:06 - [films list] TypeError: x     at fetch end\n"
        );
    }
}
