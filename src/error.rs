//! Error types for autofolio.

use std::path::PathBuf;

/// All errors that can occur during a rebalancer run.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("failed to read config file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("failed to parse numeric field '{field}' from value '{value}'")]
    Field { field: String, value: String },

    #[error("positions feed error: {0}")]
    Positions(String),

    #[error("failed to parse positions feed: {0}")]
    PositionsFeed(#[from] csv::Error),

    #[error("cash position '{0}' not found in holdings")]
    CashPositionMissing(String),

    #[error("no plan found at {0} — run `autofolio calculate` first")]
    NoPlan(PathBuf),

    #[error("failed to read plan file {path}: {source}")]
    PlanRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write plan file {path}: {source}")]
    PlanWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse plan JSON: {0}")]
    PlanParse(#[from] serde_json::Error),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("login failed: {0}")]
    Login(String),

    #[error("trade failed: {0}")]
    Trade(String),

    #[error("execution aborted: {0}")]
    Aborted(String),
}

pub type Result<T> = std::result::Result<T, Error>;
