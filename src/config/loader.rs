//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::{GatewayConfig, SERVICE_DEFAULTS};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value '{value}' for {var}")]
    InvalidEnv { var: &'static str, value: String },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration: defaults, then the optional TOML file, then the
/// process environment. The result is validated before it is returned.
pub fn load_config(path: Option<&Path>) -> Result<GatewayConfig, ConfigError> {
    load_config_from(path, |var| std::env::var(var).ok())
}

/// [`load_config`] with the environment supplied by `lookup`.
pub fn load_config_from<F>(path: Option<&Path>, lookup: F) -> Result<GatewayConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            parse_config(&content)?
        }
        None => GatewayConfig::default(),
    };

    apply_env_overrides(&mut config, lookup)?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Parse a TOML document. Services the document leaves out keep their
/// built-in base URLs.
pub fn parse_config(content: &str) -> Result<GatewayConfig, ConfigError> {
    let mut config: GatewayConfig = toml::from_str(content)?;
    for (name, _, url) in SERVICE_DEFAULTS {
        config
            .services
            .entry(name.to_string())
            .or_insert_with(|| url.to_string());
    }
    Ok(config)
}

/// Apply `PORT` and the per-service `*_SERVICE_URL` variables.
///
/// `lookup` abstracts the environment so callers can supply their own source.
pub fn apply_env_overrides<F>(config: &mut GatewayConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(raw) = lookup("PORT") {
        config.listener.port = raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidEnv { var: "PORT", value: raw.clone() })?;
    }

    for (service, var, _) in SERVICE_DEFAULTS {
        if let Some(url) = lookup(var).filter(|v| !v.trim().is_empty()) {
            tracing::debug!(service = %service, var = %var, "Service URL overridden from environment");
            config.services.insert(service.to_string(), url.trim().to_string());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn env_overrides_port_and_services() {
        let vars = env(&[
            ("PORT", "8088"),
            ("THREADS_SERVICE_URL", "http://threads.internal:9000"),
            ("SEARCH_SERVICE_URL", "  "),
        ]);
        let mut config = GatewayConfig::default();
        apply_env_overrides(&mut config, |k| vars.get(k).cloned()).unwrap();

        assert_eq!(config.listener.port, 8088);
        assert_eq!(config.services["threads"], "http://threads.internal:9000");
        assert_eq!(config.services["search"], "https://searchservice.inf326.nursoft.dev");
    }

    #[test]
    fn invalid_port_is_rejected() {
        let vars = env(&[("PORT", "eighty")]);
        let mut config = GatewayConfig::default();
        let err = apply_env_overrides(&mut config, |k| vars.get(k).cloned()).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { var: "PORT", .. }));
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let config = parse_config(
            r#"
            [listener]
            port = 4000

            [services]
            users = "http://127.0.0.1:7001"
            "#,
        )
        .unwrap();

        assert_eq!(config.listener.port, 4000);
        assert_eq!(config.listener.host, "0.0.0.0");
        assert_eq!(config.services["users"], "http://127.0.0.1:7001");
        assert_eq!(config.services["prog_bot"], "https://chatbotprogra.inf326.nursoft.dev");
        assert_eq!(config.routes.len(), 15);
        assert_eq!(config.timeouts.connect_secs, 5);
    }

    #[test]
    fn file_routes_replace_the_default_table() {
        let config = parse_config(
            r#"
            [services]
            legacy = "http://legacy.internal"

            [[routes]]
            name = "legacy"
            service = "legacy"
            prefixes = ["/old"]
            rewrite = [{ from = "/old", to = "/v2" }]
            "#,
        )
        .unwrap();

        assert_eq!(config.routes.len(), 1);
        assert_eq!(config.routes[0].rewrite[0].to, "/v2");
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn load_reports_validation_errors() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[timeouts]\nread_idle_secs = 0").unwrap();

        let err = load_config_from(Some(file.path()), |_| None).unwrap_err();
        assert!(err.to_string().contains("timeouts.read_idle_secs"));
    }

    #[test]
    fn load_reports_parse_errors() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[listener\nport = ").unwrap();

        assert!(matches!(
            load_config_from(Some(file.path()), |_| None),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn load_applies_env_after_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[listener]\nport = 4000\n\n[services]\nfiles = \"http://files.local\"").unwrap();
        let vars = env(&[("PORT", "5000")]);

        let config = load_config_from(Some(file.path()), |k| vars.get(k).cloned()).unwrap();
        assert_eq!(config.listener.port, 5000);
        assert_eq!(config.services["files"], "http://files.local");
    }

    #[test]
    fn load_without_file_uses_defaults() {
        let config = load_config_from(None, |_| None).unwrap();
        assert_eq!(config.listener.port, 3000);
        assert_eq!(config.routes.len(), 15);
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("gateway.toml");
        assert!(matches!(
            load_config_from(Some(&missing), |_| None),
            Err(ConfigError::Io(_))
        ));
    }
}
