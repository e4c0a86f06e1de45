//! Configuration loading for the challenge loop.

use std::path::PathBuf;
use std::time::Duration;

use chain_submitter::SubmitterConfig;
use serde::Deserialize;

use crate::tracker::Role;

/// Warden configuration loaded from TOML + environment overrides.
#[derive(Debug, Clone, Deserialize)]
pub struct WardenConfig {
    /// Side of the challenge this instance plays
    #[serde(default = "default_role")]
    pub role: Role,

    /// Seconds between challenge state reads while waiting on the counterparty
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// File with the holder's file commitments, one hex G1 point per line,
    /// in file index order
    #[serde(default = "default_commitments_path")]
    pub commitments_path: PathBuf,

    /// Contract client settings
    #[serde(default)]
    pub submitter: SubmitterConfig,
}

fn default_role() -> Role {
    Role::Holder
}

fn default_poll_interval_secs() -> u64 {
    1
}

fn default_commitments_path() -> PathBuf {
    PathBuf::from("data/warden/commitments.txt")
}

impl Default for WardenConfig {
    fn default() -> Self {
        Self {
            role: default_role(),
            poll_interval_secs: default_poll_interval_secs(),
            commitments_path: default_commitments_path(),
            submitter: SubmitterConfig::default(),
        }
    }
}

impl WardenConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

/// Load configuration from TOML file with environment variable overrides.
///
/// `PROOF_*` variables still apply to the nested submitter section.
pub fn load_config(path: Option<&str>) -> anyhow::Result<WardenConfig> {
    let config_path = path.map(std::path::Path::new).or_else(|| {
        let default = std::path::Path::new("warden.toml");
        default.exists().then_some(default)
    });

    let config = match config_path {
        Some(p) => toml::from_str(&std::fs::read_to_string(p)?)?,
        None => WardenConfig::default(),
    };

    apply_env_overrides(config)
}

/// Read an env var and parse it, returning None if missing or parse fails.
fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

fn apply_env_overrides(mut config: WardenConfig) -> anyhow::Result<WardenConfig> {
    if let Some(role) = env_parse("WARDEN_ROLE") {
        config.role = role;
    }
    if let Some(v) = env_parse("WARDEN_POLL_INTERVAL_SECS") {
        config.poll_interval_secs = v;
    }
    if let Ok(val) = std::env::var("WARDEN_COMMITMENTS_PATH") {
        config.commitments_path = PathBuf::from(val);
    }
    config.submitter = chain_submitter::config::apply_env_overrides(config.submitter)?;
    Ok(config)
}
