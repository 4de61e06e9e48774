use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_path: String,
    pub host: String,
    pub port: u16,
    pub frontend_path: String,
    /// Map not-found/conflict/datastore failures to 404/409/500 instead of
    /// zero-valued 200 responses.
    pub strict_status: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: "test.db".into(),
            host: "0.0.0.0".into(),
            port: 8080,
            frontend_path: "index.html".into(),
            strict_status: false,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    pub fn from_vars<F>(var: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let port = match var("APP_PORT") {
            Some(v) => v
                .parse::<u16>()
                .with_context(|| format!("invalid APP_PORT `{v}`"))?,
            None => defaults.port,
        };
        let strict_status = match var("STRICT_STATUS") {
            Some(v) => parse_flag(&v).with_context(|| format!("invalid STRICT_STATUS `{v}`"))?,
            None => defaults.strict_status,
        };

        Ok(Self {
            database_path: var("DATABASE_PATH").unwrap_or(defaults.database_path),
            host: var("APP_HOST").unwrap_or(defaults.host),
            port,
            frontend_path: var("FRONTEND_PATH").unwrap_or(defaults.frontend_path),
            strict_status,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_flag(v: &str) -> anyhow::Result<bool> {
    match v.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => anyhow::bail!("expected a boolean, got `{other}`"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> anyhow::Result<AppConfig> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_vars(|k| vars.get(k).cloned())
    }

    #[test]
    fn defaults_match_fixed_service_layout() {
        let cfg = config_from(&[]).unwrap();
        assert_eq!(cfg.database_path, "test.db");
        assert_eq!(cfg.frontend_path, "index.html");
        assert_eq!(cfg.bind_addr(), "0.0.0.0:8080");
        assert!(!cfg.strict_status);
    }

    #[test]
    fn overrides_are_applied() {
        let cfg = config_from(&[
            ("DATABASE_PATH", "/tmp/users.db"),
            ("APP_HOST", "127.0.0.1"),
            ("APP_PORT", "3000"),
            ("FRONTEND_PATH", "web/index.html"),
            ("STRICT_STATUS", "true"),
        ])
        .unwrap();
        assert_eq!(cfg.database_path, "/tmp/users.db");
        assert_eq!(cfg.bind_addr(), "127.0.0.1:3000");
        assert_eq!(cfg.frontend_path, "web/index.html");
        assert!(cfg.strict_status);
    }

    #[test]
    fn rejects_bad_port() {
        let err = config_from(&[("APP_PORT", "eighty")]).unwrap_err();
        assert!(err.to_string().contains("APP_PORT"));
    }

    #[test]
    fn rejects_bad_flag() {
        assert!(config_from(&[("STRICT_STATUS", "maybe")]).is_err());
        assert!(!config_from(&[("STRICT_STATUS", "0")]).unwrap().strict_status);
    }
}
