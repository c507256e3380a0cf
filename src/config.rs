//! Runtime settings from environment variables.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `DATABASE_URL` | `postgres://localhost/edu_directory` |
//! | `EDU_SCHEMA` | `edu` |
//! | `BIND_ADDR` | `0.0.0.0:3000` |
//! | `DB_MAX_CONNECTIONS` | `5` |
//! | `ADMIN_TOKENS` / `USER_TOKENS` | empty (comma-separated) |
//! | `STORE` | `postgres` (`memory` for a throwaway in-process store) |

use crate::error::ConfigError;
use regex::Regex;
use std::net::SocketAddr;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreKind {
    Postgres,
    Memory,
}

#[derive(Clone, Debug)]
pub struct Settings {
    pub database_url: String,
    /// PostgreSQL schema holding the document tables.
    pub schema: String,
    pub bind_addr: SocketAddr,
    pub max_connections: u32,
    pub admin_tokens: Vec<String>,
    pub user_tokens: Vec<String>,
    pub store: StoreKind,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds settings from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = lookup("DATABASE_URL").unwrap_or_else(|| "postgres://localhost/edu_directory".into());

        let schema = lookup("EDU_SCHEMA").unwrap_or_else(|| "edu".into());
        let ident = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]{0,62}$").map_err(|e| ConfigError::InvalidSetting {
            name: "EDU_SCHEMA",
            value: e.to_string(),
        })?;
        if !ident.is_match(&schema) {
            return Err(ConfigError::InvalidSetting { name: "EDU_SCHEMA", value: schema });
        }

        let bind_raw = lookup("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".into());
        let bind_addr = bind_raw
            .parse()
            .map_err(|_| ConfigError::InvalidSetting { name: "BIND_ADDR", value: bind_raw.clone() })?;

        let max_connections = match lookup("DB_MAX_CONNECTIONS") {
            None => 5,
            Some(raw) => raw
                .parse()
                .ok()
                .filter(|n| *n > 0)
                .ok_or(ConfigError::InvalidSetting { name: "DB_MAX_CONNECTIONS", value: raw })?,
        };

        let store = match lookup("STORE").as_deref().map(str::to_lowercase).as_deref() {
            None | Some("postgres") => StoreKind::Postgres,
            Some("memory") => StoreKind::Memory,
            Some(other) => {
                return Err(ConfigError::InvalidSetting { name: "STORE", value: other.to_string() })
            }
        };

        Ok(Settings {
            database_url,
            schema,
            bind_addr,
            max_connections,
            admin_tokens: token_list(lookup("ADMIN_TOKENS")),
            user_tokens: token_list(lookup("USER_TOKENS")),
            store,
        })
    }
}

fn token_list(raw: Option<String>) -> Vec<String> {
    raw.map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(vars: &[(&str, &str)]) -> Result<Settings, ConfigError> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Settings::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults() {
        let s = settings(&[]).unwrap();
        assert_eq!(s.schema, "edu");
        assert_eq!(s.bind_addr.port(), 3000);
        assert_eq!(s.max_connections, 5);
        assert_eq!(s.store, StoreKind::Postgres);
        assert!(s.admin_tokens.is_empty());
    }

    #[test]
    fn tokens_are_split_and_trimmed() {
        let s = settings(&[("ADMIN_TOKENS", " a , b,,"), ("STORE", "Memory")]).unwrap();
        assert_eq!(s.admin_tokens, vec!["a", "b"]);
        assert_eq!(s.store, StoreKind::Memory);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(settings(&[("EDU_SCHEMA", "edu; drop")]).is_err());
        assert!(settings(&[("BIND_ADDR", "nowhere")]).is_err());
        assert!(settings(&[("DB_MAX_CONNECTIONS", "0")]).is_err());
        assert!(settings(&[("STORE", "redis")]).is_err());
    }
}
