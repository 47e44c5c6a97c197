//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing, limits)
//!     → middleware/cors.rs (preflight short-circuit, CORS headers)
//!     → dispatch by (method, path):
//!         POST /log-error → handlers::log_error  → logstore
//!         GET  /get-logs  → handlers::get_logs   → logstore
//!         anything else   → handlers::forward    → proxy (GET only, else 405)
//!     → Send to client
//! ```

pub mod handlers;
pub mod middleware;
pub mod server;

pub use server::{AppState, HttpServer};
