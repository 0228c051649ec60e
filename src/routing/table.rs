//! Service route lookup.
//!
//! # Responsibilities
//! - Store the configured service → base URL mapping
//! - Resolve the full backend URL for a request
//! - Return the target or an explicit `UnknownService`
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(1) exact-match lookup via HashMap
//! - No normalization, redirection or wildcard matching of the request path

use std::collections::HashMap;

use thiserror::Error;

use crate::config::ServiceConfig;

/// Error returned when a request cannot be mapped to a backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoutingError {
    #[error("Unknown service '{0}'")]
    UnknownService(String),
}

/// A service name and the backend base URL it forwards to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub service: String,
    pub base_url: String,
}

/// Static mapping from service name to backend.
#[derive(Debug, Clone, Default)]
pub struct RoutingTable {
    routes: HashMap<String, Route>,
}

impl RoutingTable {
    /// Build the table from configured services.
    ///
    /// A trailing slash on a base URL is dropped so joining always yields
    /// exactly one separator.
    pub fn from_config(services: &[ServiceConfig]) -> Self {
        let routes = services
            .iter()
            .map(|service| {
                let route = Route {
                    service: service.name.clone(),
                    base_url: service.base_url.trim_end_matches('/').to_string(),
                };
                (service.name.clone(), route)
            })
            .collect();
        Self { routes }
    }

    /// Resolve the backend URL for `service`, appending the remaining path and
    /// the raw query string.
    pub fn resolve(
        &self,
        service: &str,
        remaining_path: &str,
        query: Option<&str>,
    ) -> Result<String, RoutingError> {
        let route = self
            .routes
            .get(service)
            .ok_or_else(|| RoutingError::UnknownService(service.to_string()))?;

        let mut target = route.base_url.clone();
        if !remaining_path.is_empty() {
            target.push('/');
            target.push_str(remaining_path);
        }
        if let Some(query) = query.filter(|q| !q.is_empty()) {
            target.push('?');
            target.push_str(query);
        }
        Ok(target)
    }

    /// Iterate over every configured route.
    pub fn routes(&self) -> impl Iterator<Item = &Route> {
        self.routes.values()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
