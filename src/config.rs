// src/config.rs
//! Service configuration: `config/service.toml` plus env overrides.
//!
//! Everything has a default, so the binary boots with no config file at
//! all. Env vars win over the file.

use serde::Deserialize;
use std::{fs, path::Path};
use tracing::warn;

pub const DEFAULT_CONFIG_PATH: &str = "config/service.toml";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";
pub const DEFAULT_AI_CONFIG_PATH: &str = "config/ai.json";
pub const DEFAULT_HISTORY_CAPACITY: usize = 2000;

pub const ENV_CONFIG_PATH: &str = "REFERRAL_CONFIG_PATH";
pub const ENV_BIND_ADDR: &str = "REFERRAL_BIND_ADDR";
pub const ENV_AI_CONFIG_PATH: &str = "REFERRAL_AI_CONFIG_PATH";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub bind_addr: String,
    pub ai_config_path: String,
    pub history_capacity: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            ai_config_path: DEFAULT_AI_CONFIG_PATH.to_string(),
            history_capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }
}

impl ServiceConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let data = fs::read_to_string(path)?;
        let cfg: ServiceConfig = toml::from_str(&data)?;
        Ok(cfg)
    }

    /// Load from the env-selected path, falling back to defaults when the
    /// file is missing or broken, then apply env overrides.
    pub fn load() -> Self {
        let path =
            std::env::var(ENV_CONFIG_PATH).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let mut cfg = match Self::load_from_file(&path) {
            Ok(cfg) => cfg,
            Err(e) => {
                warn!(path = %path, error = %e, "service config unavailable, using defaults");
                Self::default()
            }
        };
        cfg.apply_env_overrides();
        cfg
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(addr) = std::env::var(ENV_BIND_ADDR) {
            if !addr.trim().is_empty() {
                self.bind_addr = addr;
            }
        }
        if let Ok(path) = std::env::var(ENV_AI_CONFIG_PATH) {
            if !path.trim().is_empty() {
                self.ai_config_path = path;
            }
        }
    }
}
