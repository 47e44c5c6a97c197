//! Middleware applied to every route.

pub mod cors;
pub mod metrics;

pub use self::cors::cors_middleware;
pub use self::metrics::metrics_middleware;
