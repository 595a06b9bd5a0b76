//! Service configuration.
//!
//! Read from `REEF_`-prefixed environment variables (after `.env` has been
//! loaded by `main`), layered over defaults.
//!
//! | Env var                 | Default                         |
//! |-------------------------|---------------------------------|
//! | `REEF_LISTEN_ADDR`      | `0.0.0.0:8080`                  |
//! | `REEF_DATABASE_URL`     | unset: in-memory store          |
//! | `REEF_MAX_CONNECTIONS`  | `5`                             |

use anyhow::{Context, Result};
use config::{Config, Environment};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    pub listen_addr: String,
    #[serde(default)]
    pub database_url: Option<String>,
    pub max_connections: u32,
}

impl ServiceConfig {
    pub fn load() -> Result<Self> {
        Self::from_env(Environment::with_prefix("REEF"))
    }

    fn from_env(env: Environment) -> Result<Self> {
        Config::builder()
            .set_default("listen_addr", "0.0.0.0:8080")?
            .set_default("max_connections", 5)?
            .add_source(env.try_parsing(true))
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Invalid configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> Environment {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Environment::with_prefix("REEF").source(Some(map))
    }

    #[test]
    fn defaults_without_env() {
        let cfg = ServiceConfig::from_env(env(&[])).unwrap();
        assert_eq!(cfg.listen_addr, "0.0.0.0:8080");
        assert_eq!(cfg.database_url, None);
        assert_eq!(cfg.max_connections, 5);
    }

    #[test]
    fn env_overrides_defaults() {
        let cfg = ServiceConfig::from_env(env(&[
            ("REEF_LISTEN_ADDR", "127.0.0.1:9000"),
            ("REEF_DATABASE_URL", "postgres://reef@localhost/reef"),
            ("REEF_MAX_CONNECTIONS", "12"),
        ]))
        .unwrap();
        assert_eq!(cfg.listen_addr, "127.0.0.1:9000");
        assert_eq!(cfg.database_url.as_deref(), Some("postgres://reef@localhost/reef"));
        assert_eq!(cfg.max_connections, 12);
    }
}
