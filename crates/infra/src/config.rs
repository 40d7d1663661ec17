//! Environment-driven application configuration.
//!
//! `USE_PERSISTENT_STORES`, `DATABASE_URL` and `RUST_LOG` keep their usual
//! unprefixed names; everything else lives under `STOCKROOM_`.

use std::net::SocketAddr;

use thiserror::Error;

use stockroom_inventory::{DeletePolicy, MovementRules};

use crate::store::StoreOptions;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_DATABASE_URL: &str = "sqlite://inventory.db?mode=rwc";
pub const DEFAULT_MOVEMENT_LIST_LIMIT: usize = 200;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var}: invalid value '{value}': {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    fn invalid(var: &'static str, value: &str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            var,
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

/// Which ledger store backend to run against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    InMemory,
    Sqlite { url: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub store: StoreBackend,
    pub store_options: StoreOptions,
    /// Default page size for `GET /movements`.
    pub movement_list_limit: usize,
    pub seed_sample_data: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bind_addr = match var("STOCKROOM_BIND_ADDR") {
            Some(raw) => raw
                .parse()
                .map_err(|e| ConfigError::invalid("STOCKROOM_BIND_ADDR", &raw, format!("{e}")))?,
            None => SocketAddr::from(([0, 0, 0, 0], 8080)),
        };

        let store = if parse_flag("USE_PERSISTENT_STORES", var("USE_PERSISTENT_STORES"))? {
            StoreBackend::Sqlite {
                url: var("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            }
        } else {
            StoreBackend::InMemory
        };

        let movement_list_limit = match var("STOCKROOM_MOVEMENT_LIST_LIMIT") {
            Some(raw) => match raw.parse::<usize>() {
                Ok(0) => {
                    return Err(ConfigError::invalid(
                        "STOCKROOM_MOVEMENT_LIST_LIMIT",
                        &raw,
                        "must be at least 1",
                    ));
                }
                Ok(n) => n,
                Err(e) => {
                    return Err(ConfigError::invalid(
                        "STOCKROOM_MOVEMENT_LIST_LIMIT",
                        &raw,
                        format!("{e}"),
                    ));
                }
            },
            None => DEFAULT_MOVEMENT_LIST_LIMIT,
        };

        let rules = MovementRules {
            allow_negative_qty: parse_flag(
                "STOCKROOM_ALLOW_NEGATIVE_QTY",
                var("STOCKROOM_ALLOW_NEGATIVE_QTY"),
            )?,
            allow_unplaced: parse_flag(
                "STOCKROOM_ALLOW_UNPLACED_MOVEMENTS",
                var("STOCKROOM_ALLOW_UNPLACED_MOVEMENTS"),
            )?,
        };

        let delete_policy = match var("STOCKROOM_DELETE_POLICY") {
            Some(raw) => raw
                .parse::<DeletePolicy>()
                .map_err(|e| ConfigError::invalid("STOCKROOM_DELETE_POLICY", &raw, e.to_string()))?,
            None => DeletePolicy::default(),
        };

        Ok(Self {
            bind_addr,
            store,
            store_options: StoreOptions {
                rules,
                delete_policy,
            },
            movement_list_limit,
            seed_sample_data: parse_flag(
                "STOCKROOM_SEED_SAMPLE_DATA",
                var("STOCKROOM_SEED_SAMPLE_DATA"),
            )?,
        })
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            store: StoreBackend::InMemory,
            store_options: StoreOptions::default(),
            movement_list_limit: DEFAULT_MOVEMENT_LIST_LIMIT,
            seed_sample_data: false,
        }
    }
}

fn parse_flag(var: &'static str, raw: Option<String>) -> Result<bool, ConfigError> {
    let Some(raw) = raw else {
        return Ok(false);
    };
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::invalid(var, &raw, "expected true or false")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn empty_environment_gives_defaults() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg, AppConfig::default());
        assert_eq!(cfg.bind_addr.to_string(), DEFAULT_BIND_ADDR);
        assert_eq!(cfg.movement_list_limit, 200);
        assert_eq!(cfg.store_options.delete_policy, DeletePolicy::Restrict);
        assert!(!cfg.store_options.rules.allow_negative_qty);
    }

    #[test]
    fn persistent_flag_selects_sqlite() {
        let cfg = config(&[("USE_PERSISTENT_STORES", "true")]).unwrap();
        assert_eq!(
            cfg.store,
            StoreBackend::Sqlite {
                url: DEFAULT_DATABASE_URL.to_string()
            }
        );

        let cfg = config(&[
            ("USE_PERSISTENT_STORES", "1"),
            ("DATABASE_URL", "sqlite:///var/lib/stockroom.db"),
        ])
        .unwrap();
        assert_eq!(
            cfg.store,
            StoreBackend::Sqlite {
                url: "sqlite:///var/lib/stockroom.db".to_string()
            }
        );
    }

    #[test]
    fn database_url_alone_does_not_switch_backend() {
        let cfg = config(&[("DATABASE_URL", "sqlite://x.db")]).unwrap();
        assert_eq!(cfg.store, StoreBackend::InMemory);
    }

    #[test]
    fn rules_and_policy_are_read() {
        let cfg = config(&[
            ("STOCKROOM_ALLOW_NEGATIVE_QTY", "TRUE"),
            ("STOCKROOM_ALLOW_UNPLACED_MOVEMENTS", "yes"),
            ("STOCKROOM_DELETE_POLICY", "Cascade"),
            ("STOCKROOM_MOVEMENT_LIST_LIMIT", "25"),
            ("STOCKROOM_SEED_SAMPLE_DATA", "on"),
            ("STOCKROOM_BIND_ADDR", "127.0.0.1:9000"),
        ])
        .unwrap();
        assert!(cfg.store_options.rules.allow_negative_qty);
        assert!(cfg.store_options.rules.allow_unplaced);
        assert_eq!(cfg.store_options.delete_policy, DeletePolicy::Cascade);
        assert_eq!(cfg.movement_list_limit, 25);
        assert!(cfg.seed_sample_data);
        assert_eq!(cfg.bind_addr.port(), 9000);
    }

    #[test]
    fn invalid_values_are_errors() {
        for (var, value) in [
            ("USE_PERSISTENT_STORES", "maybe"),
            ("STOCKROOM_MOVEMENT_LIST_LIMIT", "0"),
            ("STOCKROOM_MOVEMENT_LIST_LIMIT", "-5"),
            ("STOCKROOM_DELETE_POLICY", "archive"),
            ("STOCKROOM_BIND_ADDR", "localhost"),
        ] {
            let err = config(&[(var, value)]).unwrap_err();
            let ConfigError::Invalid { var: got, .. } = err;
            assert_eq!(got, var);
        }
    }

    #[test]
    fn blank_values_count_as_unset() {
        let cfg = config(&[("STOCKROOM_DELETE_POLICY", "  "), ("USE_PERSISTENT_STORES", "")]).unwrap();
        assert_eq!(cfg, AppConfig::default());
    }
}
