//! SWAPI forwarding gateway library.
//!
//! A local helper that relays browsing GETs to the upstream API (with its
//! own certificate policy), appends client error reports to per-day files,
//! and serves those files back.

pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod logstore;
pub mod observability;
pub mod proxy;

pub use config::schema::GatewayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
