//! Configuration loading for the contract client.

use std::time::Duration;

use anyhow::Context;
use common::Address;
use serde::Deserialize;

use crate::confirm::{
    ConfirmConfig, DEFAULT_BLOCK_INTERVAL, DEFAULT_INITIAL_SETTLE, DEFAULT_MAX_ATTEMPTS,
};

/// Client configuration loaded from TOML + environment overrides.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitterConfig {
    /// Seconds to wait before the first receipt lookup
    #[serde(default = "default_initial_settle_secs")]
    pub initial_settle_secs: u64,

    /// Seconds between later receipt lookups
    #[serde(default = "default_block_interval_secs")]
    pub block_interval_secs: u64,

    /// Receipt lookups before a transaction is reported as not packaged
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Keys allowed to authorize setting changes
    #[serde(default)]
    pub authorized_signers: Vec<Address>,
}

fn default_initial_settle_secs() -> u64 {
    DEFAULT_INITIAL_SETTLE.as_secs()
}

fn default_block_interval_secs() -> u64 {
    DEFAULT_BLOCK_INTERVAL.as_secs()
}

fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

impl Default for SubmitterConfig {
    fn default() -> Self {
        Self {
            initial_settle_secs: default_initial_settle_secs(),
            block_interval_secs: default_block_interval_secs(),
            max_attempts: default_max_attempts(),
            authorized_signers: Vec::new(),
        }
    }
}

impl SubmitterConfig {
    /// Polling schedule for transaction confirmation.
    pub fn confirm_config(&self) -> ConfirmConfig {
        ConfirmConfig {
            initial_settle: Duration::from_secs(self.initial_settle_secs),
            block_interval: Duration::from_secs(self.block_interval_secs),
            max_attempts: self.max_attempts,
        }
    }
}

/// Load configuration from TOML file with environment variable overrides.
pub fn load_config(path: Option<&str>) -> anyhow::Result<SubmitterConfig> {
    let config_path = path.map(std::path::Path::new).or_else(|| {
        let default = std::path::Path::new("proof.toml");
        default.exists().then_some(default)
    });

    let config = match config_path {
        Some(p) => toml::from_str(&std::fs::read_to_string(p)?)?,
        None => SubmitterConfig::default(),
    };

    apply_env_overrides(config)
}

/// Read an env var and parse it, returning None if missing or parse fails.
fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

/// Apply `PROOF_*` environment variables on top of `config`.
///
/// A malformed signer list is an error rather than silently shrinking the
/// authorized set.
pub fn apply_env_overrides(mut config: SubmitterConfig) -> anyhow::Result<SubmitterConfig> {
    if let Some(v) = env_parse("PROOF_INITIAL_SETTLE_SECS") {
        config.initial_settle_secs = v;
    }
    if let Some(v) = env_parse("PROOF_BLOCK_INTERVAL_SECS") {
        config.block_interval_secs = v;
    }
    if let Some(v) = env_parse("PROOF_MAX_ATTEMPTS") {
        config.max_attempts = v;
    }
    if let Ok(val) = std::env::var("PROOF_AUTHORIZED_SIGNERS") {
        config.authorized_signers = parse_signers(&val)?;
    }
    Ok(config)
}

/// Parse a comma-separated list of signer addresses.
pub fn parse_signers(list: &str) -> anyhow::Result<Vec<Address>> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<Address>()
                .with_context(|| format!("Invalid authorized signer address: {s}"))
        })
        .collect()
}
