//! Upstream forwarding.
//!
//! # Data Flow
//! ```text
//! GET <path>?<query>
//!     → upstream.rs (join onto base URL, send with per-client TLS policy)
//!     → status + streamed body handed back to the HTTP layer
//! ```
//!
//! # Design Decisions
//! - One shared client, built once from `UpstreamConfig`
//! - Certificate validation is a property of that client instance only
//! - No retries: a connection failure is terminal for the request

pub mod upstream;

pub use upstream::{ProxyError, UpstreamClient};
