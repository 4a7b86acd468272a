//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check referential integrity (routes reference existing services)
//! - Validate value ranges (timeouts > 0, URLs absolute http(s))
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Overlapping prefixes are legal; the route table reports shadowing at boot

use std::collections::HashSet;

use thiserror::Error;
use url::Url;

use crate::config::schema::GatewayConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("service '{service}' has invalid base URL '{url}': {reason}")]
    InvalidServiceUrl {
        service: String,
        url: String,
        reason: String,
    },

    #[error("route '{route}' references unknown service '{service}'")]
    UnknownService { route: String, service: String },

    #[error("route '{route}' declares no prefixes")]
    NoPrefixes { route: String },

    #[error("route '{route}' has prefix '{prefix}' that does not start with '/'")]
    RelativePrefix { route: String, prefix: String },

    #[error("route '{route}' has rewrite '{from}' -> '{to}'; both sides must start with '/'")]
    RelativeRewrite {
        route: String,
        from: String,
        to: String,
    },

    #[error("duplicate route name '{route}'")]
    DuplicateRoute { route: String },

    #[error("timeout '{field}' must be greater than zero")]
    ZeroTimeout { field: &'static str },
}

/// Validate a fully assembled configuration.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    for (service, url) in &config.services {
        if let Err(reason) = check_base_url(url) {
            errors.push(ValidationError::InvalidServiceUrl {
                service: service.clone(),
                url: url.clone(),
                reason,
            });
        }
    }

    let mut names = HashSet::new();
    for route in &config.routes {
        if !names.insert(route.name.as_str()) {
            errors.push(ValidationError::DuplicateRoute {
                route: route.name.clone(),
            });
        }
        if !config.services.contains_key(&route.service) {
            errors.push(ValidationError::UnknownService {
                route: route.name.clone(),
                service: route.service.clone(),
            });
        }
        if route.prefixes.is_empty() {
            errors.push(ValidationError::NoPrefixes {
                route: route.name.clone(),
            });
        }
        for prefix in route.prefixes.iter().filter(|p| !p.starts_with('/')) {
            errors.push(ValidationError::RelativePrefix {
                route: route.name.clone(),
                prefix: prefix.clone(),
            });
        }
        for rule in &route.rewrite {
            if !rule.from.starts_with('/') || !rule.to.starts_with('/') {
                errors.push(ValidationError::RelativeRewrite {
                    route: route.name.clone(),
                    from: rule.from.clone(),
                    to: rule.to.clone(),
                });
            }
        }
    }

    let timeouts = [
        ("timeouts.connect_secs", config.timeouts.connect_secs),
        ("timeouts.read_idle_secs", config.timeouts.read_idle_secs),
        ("timeouts.pool_idle_secs", config.timeouts.pool_idle_secs),
    ];
    for (field, value) in timeouts {
        if value == 0 {
            errors.push(ValidationError::ZeroTimeout { field });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_base_url(raw: &str) -> Result<(), String> {
    let url = Url::parse(raw).map_err(|e| e.to_string())?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("unsupported scheme '{}'", url.scheme()));
    }
    if url.host_str().is_none() {
        return Err("missing host".to_string());
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err("query and fragment are not allowed".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{RewriteConfig, RouteConfig};

    #[test]
    fn default_config_is_valid() {
        assert_eq!(validate_config(&GatewayConfig::default()), Ok(()));
    }

    #[test]
    fn reports_every_problem() {
        let mut config = GatewayConfig::default();
        config.services.insert("broken".into(), "not a url".into());
        config.timeouts.connect_secs = 0;
        config.routes.push(RouteConfig {
            name: "ghost".into(),
            service: "nowhere".into(),
            prefixes: vec!["ghost".into()],
            rewrite: vec![RewriteConfig {
                from: "/ghost".into(),
                to: "ghost".into(),
            }],
        });

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 5);
        assert!(errors.contains(&ValidationError::ZeroTimeout {
            field: "timeouts.connect_secs"
        }));
        assert!(errors.contains(&ValidationError::UnknownService {
            route: "ghost".into(),
            service: "nowhere".into(),
        }));
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::InvalidServiceUrl { service, .. } if service == "broken")));
    }

    #[test]
    fn rejects_non_http_upstreams() {
        let mut config = GatewayConfig::default();
        config.services.insert("ftp".into(), "ftp://files.internal".into());
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("unsupported scheme 'ftp'"));
    }

    #[test]
    fn duplicate_route_names_and_empty_prefixes() {
        let mut config = GatewayConfig::default();
        config.routes.push(RouteConfig {
            name: "users".into(),
            service: "users".into(),
            prefixes: Vec::new(),
            rewrite: Vec::new(),
        });
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::DuplicateRoute { route: "users".into() },
                ValidationError::NoPrefixes { route: "users".into() },
            ]
        );
    }
}
