//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check referential integrity (cacheable services must be routed)
//! - Validate value ranges (limits, windows, timeouts > 0; windows and TTLs
//!   no longer than a year)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use axum::http::HeaderValue;
use thiserror::Error;
use url::Url;

use crate::config::schema::GatewayConfig;

/// Upper bound for windows, TTLs and sweep intervals.
pub const MAX_PERIOD_SECS: u64 = 365 * 24 * 60 * 60;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address '{0}' is not a socket address")]
    BindAddress(String),

    #[error("at least one service must be configured")]
    NoServices,

    #[error("service name '{0}' must be non-empty and contain no '/'")]
    ServiceName(String),

    #[error("service '{0}' is configured more than once")]
    DuplicateService(String),

    #[error("service '{name}' has an invalid base_url '{url}': {reason}")]
    BaseUrl {
        name: String,
        url: String,
        reason: String,
    },

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("{field} must be at most {max}")]
    TooLarge { field: &'static str, max: u64 },

    #[error("cache.cacheable_services names unknown service '{0}'")]
    UnknownCacheableService(String),

    #[error("cache.vary_headers entry '{0}' is not a valid header name")]
    VaryHeader(String),

    #[error("cors.allowed_origins entry '{0}' is not a valid origin")]
    CorsOrigin(String),
}

/// Check a parsed configuration, collecting every problem found.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(
            config.listener.bind_address.clone(),
        ));
    }
    if config.listener.max_body_bytes == 0 {
        errors.push(ValidationError::Zero {
            field: "listener.max_body_bytes",
        });
    }

    if config.services.is_empty() {
        errors.push(ValidationError::NoServices);
    }

    let mut seen = HashSet::new();
    for service in config.services.iter() {
        if service.name.is_empty() || service.name.contains('/') {
            errors.push(ValidationError::ServiceName(service.name.clone()));
        }
        if !seen.insert(service.name.as_str()) {
            errors.push(ValidationError::DuplicateService(service.name.clone()));
        }
        if let Err(reason) = check_base_url(&service.base_url) {
            errors.push(ValidationError::BaseUrl {
                name: service.name.clone(),
                url: service.base_url.clone(),
                reason,
            });
        }
    }

    if config.rate_limit.enabled {
        if config.rate_limit.limit == 0 {
            errors.push(ValidationError::Zero {
                field: "rate_limit.limit",
            });
        }
        check_period(
            &mut errors,
            "rate_limit.window_secs",
            config.rate_limit.window_secs,
        );
    }

    if config.cache.enabled {
        check_period(&mut errors, "cache.ttl_secs", config.cache.ttl_secs);
        for name in &config.cache.cacheable_services {
            if !seen.contains(name.as_str()) {
                errors.push(ValidationError::UnknownCacheableService(name.clone()));
            }
        }
        for header in &config.cache.vary_headers {
            if axum::http::HeaderName::from_bytes(header.as_bytes()).is_err() {
                errors.push(ValidationError::VaryHeader(header.clone()));
            }
        }
    }

    if config.store.op_timeout_ms == 0 {
        errors.push(ValidationError::Zero {
            field: "store.op_timeout_ms",
        });
    }
    check_period(
        &mut errors,
        "store.sweep_interval_secs",
        config.store.sweep_interval_secs,
    );
    if config.upstream.timeout_ms == 0 {
        errors.push(ValidationError::Zero {
            field: "upstream.timeout_ms",
        });
    }

    if config.cors.enabled {
        for origin in &config.cors.allowed_origins {
            if origin == "*" || HeaderValue::from_str(origin).is_err() {
                errors.push(ValidationError::CorsOrigin(origin.clone()));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_period(errors: &mut Vec<ValidationError>, field: &'static str, secs: u64) {
    if secs == 0 {
        errors.push(ValidationError::Zero { field });
    } else if secs > MAX_PERIOD_SECS {
        errors.push(ValidationError::TooLarge {
            field,
            max: MAX_PERIOD_SECS,
        });
    }
}

fn check_base_url(raw: &str) -> Result<(), String> {
    let url = Url::parse(raw).map_err(|e| e.to_string())?;
    if url.scheme() != "http" {
        return Err(format!("scheme '{}' is not supported", url.scheme()));
    }
    if url.host_str().is_none() {
        return Err("missing host".to_string());
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err("must not carry a query or fragment".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{ServiceConfig, Services};

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(validate_config(&GatewayConfig::default()), Ok(()));
    }

    #[test]
    fn test_reports_every_error() {
        let mut config = GatewayConfig::default();
        config.listener.bind_address = "not-an-address".into();
        config.services = Services(vec![
            ServiceConfig::new("persons", "http://localhost:5000/api/persons"),
            ServiceConfig::new("persons", "https://localhost:5000/api/persons"),
            ServiceConfig::new("a/b", "nonsense"),
        ]);
        config.rate_limit.limit = 0;
        config.cache.cacheable_services = vec!["analytics".into()];

        let errors = validate_config(&config).unwrap_err();

        assert!(errors.contains(&ValidationError::BindAddress("not-an-address".into())));
        assert!(errors.contains(&ValidationError::DuplicateService("persons".into())));
        assert!(errors.contains(&ValidationError::ServiceName("a/b".into())));
        assert!(errors.contains(&ValidationError::Zero {
            field: "rate_limit.limit"
        }));
        assert!(errors.contains(&ValidationError::UnknownCacheableService(
            "analytics".into()
        )));
        let bad_urls = errors
            .iter()
            .filter(|e| matches!(e, ValidationError::BaseUrl { .. }))
            .count();
        assert_eq!(bad_urls, 2);
    }

    #[test]
    fn test_disabled_sections_are_not_checked() {
        let mut config = GatewayConfig::default();
        config.rate_limit.enabled = false;
        config.rate_limit.limit = 0;
        config.cache.enabled = false;
        config.cache.cacheable_services = vec!["nowhere".into()];

        assert_eq!(validate_config(&config), Ok(()));
    }

    #[test]
    fn test_periods_are_bounded() {
        let mut config = GatewayConfig::default();
        config.rate_limit.window_secs = u64::MAX;
        config.cache.ttl_secs = MAX_PERIOD_SECS + 1;
        config.store.sweep_interval_secs = 0;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::TooLarge {
                    field: "rate_limit.window_secs",
                    max: MAX_PERIOD_SECS
                },
                ValidationError::TooLarge {
                    field: "cache.ttl_secs",
                    max: MAX_PERIOD_SECS
                },
                ValidationError::Zero {
                    field: "store.sweep_interval_secs"
                },
            ]
        );

        config.rate_limit.window_secs = MAX_PERIOD_SECS;
        config.cache.ttl_secs = MAX_PERIOD_SECS;
        config.store.sweep_interval_secs = 60;
        assert_eq!(validate_config(&config), Ok(()));
    }

    #[test]
    fn test_wildcard_origin_rejected() {
        let mut config = GatewayConfig::default();
        config.cors.allowed_origins = vec!["*".into()];

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors, vec![ValidationError::CorsOrigin("*".into())]);
    }
}
