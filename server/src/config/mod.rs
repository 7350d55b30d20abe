//! Server configuration loaded from the environment.

use std::env;
use std::str::FromStr;

use oracle_registry::{Identity, RegistryConfig, RegistryError};

const DEFAULT_PORT: u16 = 3001;
const DEFAULT_EXPIRY_SWEEP_SECONDS: u64 = 60;
const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 256;
const DEFAULT_CORS_ORIGINS: &str = "http://localhost:3000";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{key} is invalid: {reason}")]
    Invalid { key: &'static str, reason: String },
    #[error("registry configuration rejected: {0}")]
    Registry(#[from] RegistryError),
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub port: u16,
    /// Initial admin signer (hex Ed25519 public key).
    pub admin_public_key: Identity,
    pub registry: RegistryConfig,
    pub expiry_sweep_seconds: u64,
    pub event_channel_capacity: usize,
    pub cors_allowed_origins: Vec<String>,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let admin_public_key = lookup("ADMIN_PUBLIC_KEY")
            .ok_or(ConfigError::Missing("ADMIN_PUBLIC_KEY"))?
            .parse::<Identity>()
            .map_err(|e| ConfigError::Invalid {
                key: "ADMIN_PUBLIC_KEY",
                reason: e.to_string(),
            })?;

        let defaults = RegistryConfig::default();
        let registry = RegistryConfig {
            required_consensus: parse_or(&lookup, "REQUIRED_CONSENSUS", defaults.required_consensus)?,
            max_oracles: parse_or(&lookup, "MAX_ORACLES", defaults.max_oracles)?,
            outcome_count: parse_or(&lookup, "OUTCOME_COUNT", defaults.outcome_count)?,
            round_ttl_secs: parse_or(&lookup, "ROUND_TTL_SECONDS", defaults.round_ttl_secs)?,
            required_signatures: parse_or(
                &lookup,
                "REQUIRED_SIGNATURES",
                defaults.required_signatures,
            )?,
            override_cooldown_secs: parse_or(
                &lookup,
                "OVERRIDE_COOLDOWN_SECONDS",
                defaults.override_cooldown_secs,
            )?,
        };
        registry.validate()?;

        let expiry_sweep_seconds =
            parse_or(&lookup, "EXPIRY_SWEEP_SECONDS", DEFAULT_EXPIRY_SWEEP_SECONDS)?;
        if expiry_sweep_seconds == 0 {
            return Err(ConfigError::Invalid {
                key: "EXPIRY_SWEEP_SECONDS",
                reason: "must be greater than zero".to_string(),
            });
        }

        let event_channel_capacity = parse_or(
            &lookup,
            "EVENT_CHANNEL_CAPACITY",
            DEFAULT_EVENT_CHANNEL_CAPACITY,
        )?;
        if event_channel_capacity == 0 {
            return Err(ConfigError::Invalid {
                key: "EVENT_CHANNEL_CAPACITY",
                reason: "must be greater than zero".to_string(),
            });
        }

        let cors_allowed_origins = lookup("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|| DEFAULT_CORS_ORIGINS.to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        Ok(Self {
            port: parse_or(&lookup, "PORT", DEFAULT_PORT)?,
            admin_public_key,
            registry,
            expiry_sweep_seconds,
            event_channel_capacity,
            cors_allowed_origins,
        })
    }
}

fn parse_or<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}
