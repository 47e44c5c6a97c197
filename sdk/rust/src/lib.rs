//! Rust client for the SWAPI forwarding gateway.
//!
//! Error reports go to the gateway first; if it cannot be reached after the
//! configured attempts they are kept in an in-process sink instead.

pub mod client;
pub mod sink;

pub use client::{Delivery, GatewayClient};
pub use sink::{FallbackPolicy, LocalSink, RemoteSink, Report, ReportSink, SinkError};
