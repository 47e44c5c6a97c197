//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Check the upstream base URL is usable as a prefix
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::GatewayConfig;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid {field} address '{value}'")]
    InvalidAddress { field: &'static str, value: String },

    #[error("upstream.base_url '{0}' is not an absolute http(s) URL")]
    InvalidUpstream(String),

    #[error("upstream.base_url '{0}' must not end with '/'")]
    TrailingSlash(String),

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("{0} must not be empty")]
    Empty(&'static str),

    #[error("logs.file_suffix must end in .txt, got {0:?}")]
    SuffixNotTxt(String),

    #[error("{field} ({value}s) must be shorter than timeouts.request_secs ({limit}s)")]
    ExceedsRequestTimeout {
        field: &'static str,
        value: u64,
        limit: u64,
    },
}

/// Check a configuration, collecting every problem.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }

    let base = &config.upstream.base_url;
    match Url::parse(base) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => {
            if base.ends_with('/') {
                errors.push(ValidationError::TrailingSlash(base.clone()));
            }
        }
        _ => errors.push(ValidationError::InvalidUpstream(base.clone())),
    }

    if config.upstream.connect_timeout_secs == 0 {
        errors.push(ValidationError::Zero("upstream.connect_timeout_secs"));
    }
    if config.upstream.response_timeout_secs == 0 {
        errors.push(ValidationError::Zero("upstream.response_timeout_secs"));
    }
    for (field, value) in [
        ("upstream.connect_timeout_secs", config.upstream.connect_timeout_secs),
        ("upstream.response_timeout_secs", config.upstream.response_timeout_secs),
    ] {
        if config.timeouts.request_secs > 0 && value >= config.timeouts.request_secs {
            errors.push(ValidationError::ExceedsRequestTimeout {
                field,
                value,
                limit: config.timeouts.request_secs,
            });
        }
    }
    if config.upstream.read_timeout_secs == 0 {
        errors.push(ValidationError::Zero("upstream.read_timeout_secs"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::Zero("timeouts.request_secs"));
    }
    if config.security.max_body_size == 0 {
        errors.push(ValidationError::Zero("security.max_body_size"));
    }
    if config.logs.root_dir.trim().is_empty() {
        errors.push(ValidationError::Empty("logs.root_dir"));
    }
    if config.logs.file_suffix.is_empty() {
        errors.push(ValidationError::Empty("logs.file_suffix"));
    } else if !config.logs.file_suffix.ends_with(".txt") {
        // Retrieval lists .txt files only.
        errors.push(ValidationError::SuffixNotTxt(config.logs.file_suffix.clone()));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
