//! TOML configuration loading and validation.

use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;
use serde::Deserialize;

use crate::error::{Error, Result};

/// Tolerance around 1.0 for the target weight sum.
const TARGET_SUM_TOLERANCE: f64 = 0.01;

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub credentials: CredentialsConfig,
    pub groups: GroupsConfig,
    #[serde(default)]
    pub plan: PlanConfig,
}

/// Brokerage login credentials and the account to trade in.
#[derive(Debug, Clone, Deserialize)]
pub struct CredentialsConfig {
    pub username: String,
    pub password: String,
    pub account: String,
}

/// Asset-class group tables: which symbol belongs to which group, the target
/// weight per group, and the representative symbol bought for each group.
#[derive(Debug, Clone, Deserialize)]
pub struct GroupsConfig {
    pub symbol_groups: FxHashMap<String, String>,
    pub targets: FxHashMap<String, f64>,
    pub symbols: FxHashMap<String, String>,
    #[serde(default = "default_cash_symbol")]
    pub cash_symbol: String,
    #[serde(default = "default_cash_buffer")]
    pub cash_buffer: f64,
}

fn default_cash_symbol() -> String {
    "FCASH".into()
}
fn default_cash_buffer() -> f64 {
    3000.0
}

/// Where the computed plan is persisted between calculate and execute.
#[derive(Debug, Clone, Deserialize)]
pub struct PlanConfig {
    #[serde(default = "default_plan_path")]
    pub path: PathBuf,
}

impl Default for PlanConfig {
    fn default() -> Self {
        Self {
            path: default_plan_path(),
        }
    }
}

fn default_plan_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("autofolio").join("plan.json"))
        .unwrap_or_else(|| PathBuf::from("plan.json"))
}

/// Default per-user config file location.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("autofolio").join("config.toml"))
        .unwrap_or_else(|| PathBuf::from("config.toml"))
}

impl Config {
    /// Load config from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::ConfigRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_toml(&contents)
    }

    /// Parse from a TOML string (useful for testing).
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate config invariants.
    fn validate(&self) -> Result<()> {
        if self.credentials.username.is_empty() {
            return Err(Error::Config("username must not be empty".into()));
        }
        if self.credentials.account.is_empty() {
            return Err(Error::Config("account must not be empty".into()));
        }
        self.groups.validate()
    }
}

impl GroupsConfig {
    fn validate(&self) -> Result<()> {
        if self.targets.is_empty() {
            return Err(Error::Config("targets table is empty".into()));
        }

        for (group, &weight) in &self.targets {
            if !(weight > 0.0 && weight <= 1.0) {
                return Err(Error::Config(format!(
                    "target weight for {group} ({weight}) must be in (0.0, 1.0]"
                )));
            }
        }

        let sum: f64 = self.targets.values().sum();
        if !(sum > 1.0 - TARGET_SUM_TOLERANCE && sum < 1.0 + TARGET_SUM_TOLERANCE) {
            return Err(Error::Config(format!(
                "target weights sum to {sum:.4}, expected 1.0 \u{b1} {TARGET_SUM_TOLERANCE}"
            )));
        }

        // Every target group needs exactly one tradable symbol to buy.
        for group in self.targets.keys() {
            if !self.symbols.contains_key(group) {
                return Err(Error::Config(format!(
                    "group '{group}' has no tradable symbol in [groups.symbols]"
                )));
            }
        }

        // A held symbol mapped to a group outside the target table would
        // inflate the grand total without ever receiving an allocation.
        for (symbol, group) in &self.symbol_groups {
            if !self.targets.contains_key(group) {
                return Err(Error::Config(format!(
                    "symbol '{symbol}' maps to unknown group '{group}'"
                )));
            }
        }

        if self.cash_symbol.is_empty() {
            return Err(Error::Config("cash_symbol must not be empty".into()));
        }
        if self.cash_buffer < 0.0 {
            return Err(Error::Config("cash_buffer must be >= 0".into()));
        }

        Ok(())
    }
}
